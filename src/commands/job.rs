//! Steps shared by the simulator commands.

use super::models::JobArgs;
use crate::aggregator::{combine_trajectories, find_trajectories, CombinedTable};
use crate::output::{write_combined_table, write_final_distribution, write_manifest, JobManifest};
use crate::parser::read_sequence_record;
use crate::resample::grid::{GridConfig, TimeGrid};
use crate::utils::files::run_pattern;
use anyhow::{Context, Result};
use log::{info, warn};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Sequence, name and grid of one conversion job
#[derive(Debug, Clone)]
pub struct Job {
    pub name: String,
    pub sequence: String,
    pub config: GridConfig,
    pub grid: TimeGrid,
}

impl Job {
    pub fn seqlen(&self) -> usize {
        self.sequence.len()
    }

    /// Glob pattern matching the per-run files of this job
    pub fn run_pattern(&self, dir: &Path, extension: &str) -> String {
        run_pattern(dir, &self.name, extension)
    }
}

/// Read the sequence, resolve the job name and build the grid
pub fn prepare_job(args: &JobArgs) -> Result<Job> {
    let record = match &args.input {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open sequence file {}", path.display()))?;
            read_sequence_record(BufReader::new(file))
        }
        None => read_sequence_record(std::io::stdin().lock()),
    }
    .context("Failed to read sequence record")?;

    let Some(name) = args.name.clone().or(record.name) else {
        anyhow::bail!("The sequence has no name: pass --name or add a '>name' header");
    };
    if name.is_empty() || name.contains(std::path::MAIN_SEPARATOR) || name.contains('/') {
        anyhow::bail!("Invalid job name '{}'", name);
    }

    let config = args.grid.config(record.sequence.len());
    let grid = config.build().context("Invalid time grid")?;
    info!(
        "Job {}: {} nt, {} grid points",
        name,
        record.sequence.len(),
        grid.len()
    );

    Ok(Job {
        name,
        sequence: record.sequence,
        config,
        grid,
    })
}

/// Create the per-run directory if needed
pub fn prepare_tmpdir(dir: &Path) -> Result<()> {
    if !dir.exists() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory {}", dir.display()))?;
    }
    Ok(())
}

/// Combine all trajectories of a job and write table, kp8 and manifest
///
/// # Returns
/// The combined table
pub fn combine_job(job: &Job, args: &JobArgs, engine: &str) -> Result<CombinedTable> {
    let pattern = job.run_pattern(&args.tmpdir, "drf");
    let paths = find_trajectories(&pattern)?;
    if paths.is_empty() {
        anyhow::bail!("No trajectory files match {}", pattern);
    }

    let table = combine_trajectories(&paths, &job.grid, job.seqlen(), args.use_counts)
        .context("Failed to combine trajectories")?;

    let output = args.output_dir.join(format!("{}.drf", job.name));
    write_combined_outputs(&table, &output, args.kp8)?;

    let manifest = JobManifest::new(
        job.name.clone(),
        job.sequence.clone(),
        engine,
        &job.config,
        &job.grid,
        table.runs,
    );
    write_manifest(&manifest, JobManifest::default_path(&args.output_dir, &job.name))
        .context("Failed to write job manifest")?;

    Ok(table)
}

/// Write the combined table and, if requested, the `*.kp8` export next to it
pub fn write_combined_outputs(table: &CombinedTable, output: &Path, kp8: bool) -> Result<()> {
    if output.exists() {
        warn!("Overwriting existing file: {}", output.display());
    }
    write_combined_table(&table.rows, output).context("Failed to write combined table")?;
    info!("✓ Combined table written to: {}", output.display());

    if kp8 {
        let path = kp8_path(output);
        write_final_distribution(&table.final_distribution, &path)
            .context("Failed to write final distribution")?;
        info!("✓ Final distribution written to: {}", path.display());
    }
    Ok(())
}

fn kp8_path(output: &Path) -> PathBuf {
    output.with_extension("kp8")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::models::GridArgs;
    use tempfile::TempDir;

    fn job_args(dir: &Path, input: &str) -> JobArgs {
        let path = dir.join("input.fa");
        std::fs::write(&path, input).unwrap();
        JobArgs {
            input: Some(path),
            name: None,
            tmpdir: dir.join("runs"),
            output_dir: dir.to_path_buf(),
            processes: 0,
            grid: GridArgs::default(),
            use_counts: false,
            kp8: false,
        }
    }

    #[test]
    fn test_prepare_job_uses_header_name() {
        let dir = TempDir::new().unwrap();
        let job = prepare_job(&job_args(dir.path(), ">hairpin\nGGGAAACCC\n")).unwrap();

        assert_eq!(job.name, "hairpin");
        assert_eq!(job.seqlen(), 9);
        assert_eq!(job.grid.len(), 1 + 9 * 10 + 30);
    }

    #[test]
    fn test_prepare_job_requires_a_name() {
        let dir = TempDir::new().unwrap();
        assert!(prepare_job(&job_args(dir.path(), "GGGAAACCC\n")).is_err());

        let mut args = job_args(dir.path(), "GGGAAACCC\n");
        args.name = Some("override".to_string());
        assert_eq!(prepare_job(&args).unwrap().name, "override");
    }

    #[test]
    fn test_kp8_path() {
        assert_eq!(kp8_path(Path::new("out/seq.drf")), PathBuf::from("out/seq.kp8"));
    }
}
