use super::models::GridArgs;
use crate::aggregator::Aggregation;
use crate::output::read_manifest;
use crate::resample::grid::GridConfig;
use crate::utils::config::SCHEMA_VERSION;
use anyhow::{Context, Result};
use log::warn;
use std::path::{Path, PathBuf};

/// Grid of commands that work on existing trajectories
///
/// A manifest takes precedence; timing flags that differ from their defaults
/// are reported as ignored.
///
/// # Errors
/// * unreadable manifest, or neither a manifest nor a sequence length
pub fn resolve_grid(
    manifest: Option<&Path>,
    seqlen: Option<usize>,
    timing: &GridArgs,
) -> Result<GridConfig> {
    match (manifest, seqlen) {
        (Some(path), _) => {
            let manifest = read_manifest(path)
                .with_context(|| format!("Failed to read manifest {}", path.display()))?;
            let ignored = changed_timing_flags(timing);
            if !ignored.is_empty() {
                warn!(
                    "Ignoring {} in favour of the grid stored in {}",
                    ignored.join(", "),
                    path.display()
                );
            }
            Ok(manifest.grid)
        }
        (None, Some(seqlen)) => Ok(timing.config(seqlen)),
        (None, None) => anyhow::bail!("Either --manifest or --seqlen is required"),
    }
}

/// Timing flags set to something other than their default
pub fn changed_timing_flags(timing: &GridArgs) -> Vec<&'static str> {
    let defaults = GridArgs::default();
    let mut changed = Vec::new();
    if timing.t_ext != defaults.t_ext {
        changed.push("--t-ext");
    }
    if timing.t_end != defaults.t_end {
        changed.push("--t-end");
    }
    if timing.t_lin != defaults.t_lin {
        changed.push("--t-lin");
    }
    if timing.t_log != defaults.t_log {
        changed.push("--t-log");
    }
    changed
}

/// Check trajectory files against a grid
///
/// # Returns
/// Total number of runs found
pub fn validate_trajectory_files(files: &[PathBuf], config: &GridConfig) -> Result<usize> {
    let grid = config.build().context("Invalid time grid")?;
    let mut aggregation = Aggregation::new(&grid, config.seqlen);

    for file in files {
        println!("Validating trajectory: {}", file.display());
        let runs = aggregation
            .add_file(file)
            .with_context(|| format!("Invalid trajectory file {}", file.display()))?;
        println!("✓ {} run(s) on a {}-point grid", runs, grid.len());
    }

    Ok(aggregation.runs())
}

/// Display the time grid
pub fn display_grid(config: &GridConfig) -> Result<()> {
    let grid = config.build().context("Invalid time grid")?;

    println!("# {} grid points, growth ends at index {}", grid.len(), grid.growth_end());
    for (index, time) in grid.times().iter().enumerate() {
        let marker = if index == grid.growth_end() { " *" } else { "" };
        println!("{:>5} {:13.9}{}", index, time, marker);
    }
    Ok(())
}

/// Display version information
pub fn display_version() {
    println!("DrForna converters v{}", env!("CARGO_PKG_VERSION"));
    println!("Manifest Schema: v{}", SCHEMA_VERSION);
    println!();
    println!("Resample Kinefold and Kinfold simulations into DrForna trajectory tables.");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::{write_manifest, JobManifest};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_manifest_grid_wins_over_timing_flags() {
        let dir = TempDir::new().unwrap();
        let config = GridArgs::default().config(12);
        let grid = config.build().unwrap();
        let path = dir.path().join("seq.manifest.json");
        write_manifest(&JobManifest::new("seq", "GGGGAAAACCCC", "kinfold", &config, &grid, 3), &path)
            .unwrap();

        let timing = GridArgs {
            t_ext: 0.5,
            t_log: 4,
            ..GridArgs::default()
        };
        assert_eq!(changed_timing_flags(&timing), ["--t-ext", "--t-log"]);
        assert_eq!(resolve_grid(Some(path.as_path()), None, &timing).unwrap(), config);
        assert_eq!(resolve_grid(None, Some(12), &timing).unwrap(), timing.config(12));
        assert!(resolve_grid(None, None, &timing).is_err());
    }

    #[test]
    fn test_default_timing_flags_are_unchanged() {
        assert!(changed_timing_flags(&GridArgs::default()).is_empty());
    }

    #[test]
    fn test_validate_rejects_other_grid() {
        let dir = TempDir::new().unwrap();
        let config = GridConfig {
            seqlen: 1,
            t_ext: 1.0,
            t_end: 1.0,
            t_lin: 1,
            t_log: 1,
        };
        // Grid: 0 1 2
        let path = dir.path().join("run.drf");
        std::fs::write(
            &path,
            "id time occupancy structure energy\n\
             0 0.000000000 1 . 0.00\n\
             0 1.000000000 1 . 0.00\n\
             0 2.000000000 1 . 0.00\n",
        )
        .unwrap();

        assert_eq!(validate_trajectory_files(&[path.clone()], &config).unwrap(), 1);

        let other = GridConfig {
            t_end: 2.0,
            ..config
        };
        assert!(validate_trajectory_files(&[path], &other).is_err());
    }
}
