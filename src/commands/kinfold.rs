//! Kinfold command implementation.
//!
//! The kinfold command:
//! 1. Reads the sequence and builds the time grid
//! 2. Prepares the working directory
//! 3. Runs the requested Kinfold calls on a worker pool, resampling each
//!    stream into its own trajectory file as it is produced
//! 4. Combines all trajectories into one table

use super::job::{combine_job, prepare_job, prepare_tmpdir};
use super::models::KinfoldArgs;
use crate::resample::{KinfoldResampler, RateConversion};
use crate::simulator::kinfold::{run_kinfold, KinfoldOptions};
use crate::simulator::{locate_executable, next_run_number, run_stem};
use anyhow::{Context, Result};
use log::info;
use rayon::prelude::*;
use std::path::PathBuf;
use std::time::Instant;

/// Execute the kinfold command
///
/// **Public** - main entry point called from main.rs
///
/// # Returns
/// Number of runs in the combined table
pub fn execute_kinfold(args: KinfoldArgs) -> Result<usize> {
    let start_time = Instant::now();

    // Step 1: Sequence and grid
    info!("Step 1/4: Reading sequence and building time grid...");
    let job = prepare_job(&args.job)?;
    let rates = RateConversion::new(args.k0, job.config.t_ext)?;

    // Step 2: Working directory
    info!("Step 2/4: Preparing {}...", args.job.tmpdir.display());
    let tmpdir = &args.job.tmpdir;
    prepare_tmpdir(tmpdir)?;
    let first = next_run_number(tmpdir, &job.name, "drf")?;

    // Step 3: Simulations
    if args.job.processes > 0 {
        info!(
            "Step 3/4: Running {} Kinfold call(s) with {} run(s) each...",
            args.job.processes, args.num
        );
        locate_executable(&args.executable)?;

        let options = KinfoldOptions {
            executable: args.executable.clone(),
            num: args.num,
            time: rates.total_time(job.seqlen(), job.config.t_end),
            params: args.params.clone(),
            dangle: args.dangle,
            temperature: args.temperature,
            rate_model: args.rate_model,
            move_set: args.move_set,
            grow: Some(rates.atu_per_nuc),
            ..KinfoldOptions::default()
        };
        options.validate()?;

        let bases: Vec<PathBuf> = (first..first + args.job.processes)
            .map(|run| run_stem(tmpdir, &job.name, run))
            .collect();

        let mut builder = rayon::ThreadPoolBuilder::new();
        if let Some(cpus) = args.cpus {
            builder = builder.num_threads(cpus);
        }
        let pool = builder.build().context("Failed to build worker pool")?;

        let resampler = KinfoldResampler::new(&job.grid, &rates);
        let runs: usize = pool
            .install(|| {
                bases
                    .par_iter()
                    .map(|base| {
                        run_kinfold(&options, &job.sequence, base, &resampler)
                            .with_context(|| format!("Kinfold call {} failed", base.display()))
                    })
                    .collect::<Result<Vec<usize>>>()
            })?
            .into_iter()
            .sum();
        info!("Kinfold finished {} run(s)", runs);
    } else {
        info!("Step 3/4: Skipping simulations (combining existing data only)");
    }

    // Step 4: Combination
    info!("Step 4/4: Combining trajectories...");
    let table = combine_job(&job, &args.job, "kinfold")?;

    info!(
        "Kinfold job {} completed in {:.2}s ({} runs, {} structures)",
        job.name,
        start_time.elapsed().as_secs_f64(),
        table.runs,
        table.structures
    );
    Ok(table.runs)
}

/// Validate kinfold arguments
///
/// **Public** - can be called before execute_kinfold for early validation
pub fn validate_kinfold_args(args: &KinfoldArgs) -> Result<()> {
    if args.num == 0 {
        anyhow::bail!("num must be greater than 0");
    }
    if args.cpus == Some(0) {
        anyhow::bail!("cpus must be greater than 0");
    }
    if !args.k0.is_finite() || args.k0 <= 0.0 {
        anyhow::bail!("k0 must be positive");
    }
    args.job.grid.config(1).validate()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_args_defaults() {
        assert!(validate_kinfold_args(&KinfoldArgs::default()).is_ok());
    }

    #[test]
    fn test_validate_args_rejects_zero_runs() {
        let args = KinfoldArgs {
            num: 0,
            ..Default::default()
        };
        assert!(validate_kinfold_args(&args).is_err());
    }

    #[test]
    fn test_validate_args_rejects_zero_cpus() {
        let args = KinfoldArgs {
            cpus: Some(0),
            ..Default::default()
        };
        assert!(validate_kinfold_args(&args).is_err());
    }
}
