//! Combine command implementation.
//!
//! Combines trajectory files produced earlier (by either simulator) into one
//! table, using the grid they were sampled on.

use super::job::write_combined_outputs;
use super::models::CombineArgs;
use crate::aggregator::{combine_trajectories, find_trajectories};
use anyhow::{Context, Result};
use log::info;

/// Execute the combine command
///
/// **Public** - main entry point called from main.rs
///
/// # Returns
/// Number of runs in the combined table
pub fn execute_combine(args: CombineArgs) -> Result<usize> {
    info!("Step 1/3: Building time grid...");
    let grid = args.grid.build().context("Invalid time grid")?;

    info!("Step 2/3: Combining trajectories matching {}...", args.pattern);
    let paths = find_trajectories(&args.pattern)?;
    if paths.is_empty() {
        anyhow::bail!("No trajectory files match {}", args.pattern);
    }
    let table = combine_trajectories(&paths, &grid, args.grid.seqlen, args.use_counts)
        .context("Failed to combine trajectories")?;

    info!("Step 3/3: Writing output files...");
    write_combined_outputs(&table, &args.output, args.kp8)?;

    info!(
        "Combined {} run(s) from {} file(s) into {} structures",
        table.runs, table.files, table.structures
    );
    Ok(table.runs)
}

/// Validate combine arguments
///
/// **Public** - can be called before execute_combine for early validation
pub fn validate_combine_args(args: &CombineArgs) -> Result<()> {
    if args.pattern.is_empty() {
        anyhow::bail!("Trajectory pattern cannot be empty");
    }
    args.grid.validate()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::models::GridArgs;
    use std::path::PathBuf;

    #[test]
    fn test_validate_args_requires_pattern() {
        assert!(validate_combine_args(&CombineArgs::default()).is_err());

        let args = CombineArgs {
            pattern: "runs/*.drf".to_string(),
            output: PathBuf::from("out.drf"),
            grid: GridArgs::default().config(20),
            ..Default::default()
        };
        assert!(validate_combine_args(&args).is_ok());
    }
}
