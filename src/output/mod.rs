//! Output writers for trajectory tables and job manifests.
//!
//! This module handles writing data to disk in various formats:
//! - Per-run and combined `*.drf` trajectory tables
//! - The `*.kp8` final-distribution export
//! - JSON job manifests

pub mod drf;
pub mod manifest;

// Re-export main functions
pub use drf::{
    format_centi, to_centi, write_combined_table, write_final_distribution, TrajectoryReader,
    TrajectoryRow, TrajectoryWriter,
};
pub use manifest::{read_manifest, write_manifest, JobManifest};

use crate::utils::error::OutputError;
use log::debug;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Common path validation for output files
pub fn validate_path(path: &Path) -> Result<(), OutputError> {
    if path.as_os_str().is_empty() {
        return Err(OutputError::InvalidPath("Path is empty".to_string()));
    }

    if path.exists() && path.is_dir() {
        return Err(OutputError::InvalidPath(format!(
            "Path is a directory: {}",
            path.display()
        )));
    }

    Ok(())
}

/// Validate `path`, create its parent directories and open it for writing
///
/// **Public** - shared by all writers
pub fn create_output_file(path: &Path) -> Result<BufWriter<File>, OutputError> {
    validate_path(path)?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            debug!("Creating parent directories: {}", parent.display());
            std::fs::create_dir_all(parent).map_err(|e| {
                OutputError::InvalidPath(format!(
                    "Cannot create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
    }

    let file = File::create(path).map_err(OutputError::WriteFailed)?;
    Ok(BufWriter::new(file))
}
