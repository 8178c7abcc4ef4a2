//! Kinefold command implementation.
//!
//! The kinefold command:
//! 1. Reads the sequence and builds the time grid
//! 2. Prepares the working directory
//! 3. Runs the requested Kinefold calls
//! 4. Converts every `*.rnm` log of the job into a trajectory file
//! 5. Combines all trajectories into one table

use super::job::{combine_job, prepare_job, prepare_tmpdir};
use super::models::KinefoldArgs;
use crate::aggregator::find_trajectories;
use crate::parser::PairTableCanonicalizer;
use crate::resample::KinefoldResampler;
use crate::simulator::kinefold::{remove_scratch_files, run_kinefold, write_dat_file, KinefoldOptions};
use crate::simulator::{locate_executable, next_run_number};
use anyhow::{Context, Result};
use log::{debug, info};
use std::time::Instant;

/// Execute the kinefold command
///
/// **Public** - main entry point called from main.rs
///
/// # Returns
/// Number of runs in the combined table
pub fn execute_kinefold(args: KinefoldArgs) -> Result<usize> {
    let start_time = Instant::now();

    // Step 1: Sequence and grid
    info!("Step 1/5: Reading sequence and building time grid...");
    let job = prepare_job(&args.job)?;

    // Step 2: Working directory
    info!("Step 2/5: Preparing {}...", args.job.tmpdir.display());
    let tmpdir = &args.job.tmpdir;
    prepare_tmpdir(tmpdir)?;
    let first = next_run_number(tmpdir, &job.name, "rnm")?;

    // Step 3: Simulations
    if args.job.processes > 0 {
        info!("Step 3/5: Running {} Kinefold call(s)...", args.job.processes);
        locate_executable(&args.executable)?;

        let options = KinefoldOptions {
            executable: args.executable.clone(),
            t_ext: job.config.t_ext,
            t_end: job.config.t_end,
            helix_min_free_energy: args.helix_min_free_energy,
        };
        write_dat_file(tmpdir, &job.name, &job.sequence).context("Failed to write Kinefold .dat file")?;

        let stem = std::env::current_dir()
            .context("Failed to resolve working directory")?
            .join(tmpdir)
            .join(&job.name);
        for run in first..first + args.job.processes {
            run_kinefold(&stem, run, &job.sequence, &options)
                .with_context(|| format!("Kinefold call #{} failed", run))?;
        }
        remove_scratch_files(&stem);
    } else {
        info!("Step 3/5: Skipping simulations (converting existing data only)");
    }

    // Step 4: Conversion
    info!("Step 4/5: Converting Kinefold logs...");
    let resampler = KinefoldResampler::new(&job.grid, &job.config);
    let logs = find_trajectories(&job.run_pattern(tmpdir, "rnm"))?;
    for rnm_path in &logs {
        let drf_path = rnm_path.with_extension("drf");
        let events = resampler
            .convert_file(rnm_path, &drf_path, &job.name, &job.sequence, &PairTableCanonicalizer)
            .with_context(|| format!("Failed to convert {}", rnm_path.display()))?;
        debug!("{}: {} snapshot(s)", rnm_path.display(), events);
    }
    info!("Converted {} Kinefold log(s)", logs.len());

    // Step 5: Combination
    info!("Step 5/5: Combining trajectories...");
    let table = combine_job(&job, &args.job, "kinefold")?;

    info!(
        "Kinefold job {} completed in {:.2}s ({} runs, {} structures)",
        job.name,
        start_time.elapsed().as_secs_f64(),
        table.runs,
        table.structures
    );
    Ok(table.runs)
}

/// Validate kinefold arguments
///
/// **Public** - can be called before execute_kinefold for early validation
pub fn validate_kinefold_args(args: &KinefoldArgs) -> Result<()> {
    if args.executable.is_empty() {
        anyhow::bail!("Kinefold executable cannot be empty");
    }
    if !args.helix_min_free_energy.is_finite() {
        anyhow::bail!("Helix minimum free energy must be finite");
    }
    args.job.grid.config(1).validate()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_args_defaults() {
        assert!(validate_kinefold_args(&KinefoldArgs::default()).is_ok());
    }

    #[test]
    fn test_validate_args_rejects_degenerate_grid() {
        let mut args = KinefoldArgs::default();
        args.job.grid.t_lin = 0;
        assert!(validate_kinefold_args(&args).is_err());
    }
}
