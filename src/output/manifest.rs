//! JSON job manifest.
//!
//! Records the grid parameters a job's trajectories were sampled with, so
//! that later `combine` and `validate` runs rebuild the same grid.

use super::create_output_file;
use crate::resample::grid::{GridConfig, TimeGrid};
use crate::utils::config::SCHEMA_VERSION;
use crate::utils::error::OutputError;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

/// Metadata of one conversion job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobManifest {
    /// Manifest schema version
    pub version: String,

    pub name: String,
    pub sequence: String,

    /// Simulator that produced the trajectories (`kinefold` or `kinfold`)
    pub engine: String,

    pub grid: GridConfig,
    pub grid_points: usize,
    pub growth_end: usize,

    /// Runs contained in the combined table
    pub runs: usize,

    /// RFC 3339 timestamp
    pub generated_at: String,
}

impl JobManifest {
    pub fn new(
        name: impl Into<String>,
        sequence: impl Into<String>,
        engine: impl Into<String>,
        config: &GridConfig,
        grid: &TimeGrid,
        runs: usize,
    ) -> Self {
        Self {
            version: SCHEMA_VERSION.to_string(),
            name: name.into(),
            sequence: sequence.into(),
            engine: engine.into(),
            grid: config.clone(),
            grid_points: grid.len(),
            growth_end: grid.growth_end(),
            runs,
            generated_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// `<dir>/<name>.manifest.json`
    pub fn default_path(dir: &Path, name: &str) -> PathBuf {
        dir.join(format!("{}.manifest.json", name))
    }
}

/// Write a manifest as pretty-printed JSON
///
/// **Public** - written by every job that produces a combined table
///
/// # Errors
/// * `OutputError::WriteFailed` - I/O error during write
/// * `OutputError::SerializationFailed` - JSON serialization error
/// * `OutputError::InvalidPath` - path cannot be created or is invalid
pub fn write_manifest(manifest: &JobManifest, output_path: impl AsRef<Path>) -> Result<(), OutputError> {
    let output_path = output_path.as_ref();
    info!("Writing manifest to: {}", output_path.display());

    let mut writer = create_output_file(output_path)?;
    serde_json::to_writer_pretty(&mut writer, manifest)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

/// Read a manifest back
///
/// # Errors
/// * `OutputError::WriteFailed` - file read error
/// * `OutputError::SerializationFailed` - JSON parse error
pub fn read_manifest(input_path: impl AsRef<Path>) -> Result<JobManifest, OutputError> {
    let input_path = input_path.as_ref();
    debug!("Reading manifest from: {}", input_path.display());

    let file = File::open(input_path)?;
    let manifest: JobManifest = serde_json::from_reader(BufReader::new(file))?;

    debug!(
        "Manifest loaded: version {}, {} ({} grid points)",
        manifest.version, manifest.name, manifest.grid_points
    );
    Ok(manifest)
}
