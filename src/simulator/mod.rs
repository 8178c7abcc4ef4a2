//! External folding simulators.
//!
//! This module handles:
//! - Locating simulator executables
//! - Run numbering of the files a job leaves in its working directory
//! - Kinefold input files and invocation
//! - Kinfold option mapping and invocation

pub mod kinefold;
pub mod kinfold;

// Re-export main types
pub use kinefold::{render_input_file, run_kinefold, write_dat_file, KinefoldOptions};
pub use kinfold::{build_command_args, run_kinfold, KinfoldOptions, MoveSet, RateModel};

use crate::utils::error::{ConvertError, DependencyError};
use crate::utils::files::{find_trajectories, run_pattern};
use log::debug;
use std::path::{Path, PathBuf};

/// Resolve `program` to an existing file
///
/// Names containing a path separator are checked as given, bare names are
/// searched on `PATH`.
///
/// # Errors
/// * `DependencyError::ExecutableNotFound` - nothing found
pub fn locate_executable(program: &str) -> Result<PathBuf, DependencyError> {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        return if candidate.is_file() {
            Ok(candidate.to_path_buf())
        } else {
            Err(DependencyError::ExecutableNotFound(program.to_string()))
        };
    }

    let search_path = std::env::var_os("PATH")
        .ok_or_else(|| DependencyError::ExecutableNotFound(program.to_string()))?;
    std::env::split_paths(&search_path)
        .map(|dir| dir.join(program))
        .find(|path| path.is_file())
        .ok_or_else(|| DependencyError::ExecutableNotFound(program.to_string()))
}

/// `<dir>/<name>.<NNN>`, the base name of all files of one run
pub fn run_stem(dir: &Path, name: &str, number: usize) -> PathBuf {
    dir.join(format!("{}.{:03}", name, number))
}

/// First run number not used by an existing `<name>.<NNN>.<extension>` file
///
/// Numbering starts at 1 and continues after the highest number found.
pub fn next_run_number(dir: &Path, name: &str, extension: &str) -> Result<usize, ConvertError> {
    let pattern = run_pattern(dir, name, extension);
    let prefix = format!("{}.", name);
    let suffix = format!(".{}", extension);

    let mut next = 1;
    for path in find_trajectories(&pattern)? {
        let number = path
            .file_name()
            .and_then(|f| f.to_str())
            .and_then(|f| f.strip_prefix(&prefix))
            .and_then(|f| f.strip_suffix(&suffix))
            .and_then(|n| n.parse::<usize>().ok());
        if let Some(number) = number {
            next = next.max(number + 1);
        }
    }

    debug!("Next {} run number for {}: {}", extension, name, next);
    Ok(next)
}
