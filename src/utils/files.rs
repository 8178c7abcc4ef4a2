//! Discovery of the per-run files a job leaves in its working directory.

use crate::utils::error::{ConfigurationError, ConvertError};
use std::path::{Path, PathBuf};

/// Glob pattern `<dir>/<name>.*.<extension>` with `dir` and `name` escaped
pub fn run_pattern(dir: &Path, name: &str, extension: &str) -> String {
    format!(
        "{}/{}.*.{}",
        glob::Pattern::escape(&dir.to_string_lossy()),
        glob::Pattern::escape(name),
        extension
    )
}

/// Files matching `pattern`, in sorted path order
///
/// # Errors
/// * `ConfigurationError::InvalidParameter` - invalid glob pattern
pub fn find_trajectories(pattern: &str) -> Result<Vec<PathBuf>, ConvertError> {
    let entries = glob::glob(pattern).map_err(|e| ConfigurationError::InvalidParameter {
        name: "pattern",
        reason: e.to_string(),
    })?;

    let mut paths = entries
        .map(|entry| entry.map_err(|e| ConvertError::Io(e.into())))
        .collect::<Result<Vec<_>, _>>()?;
    paths.sort();
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_run_pattern_escapes_metacharacters() {
        assert_eq!(
            run_pattern(Path::new("runs[1]"), "seq*", "drf"),
            "runs[[]1[]]/seq[*].*.drf"
        );
    }

    #[test]
    fn test_find_trajectories_is_sorted() {
        let dir = TempDir::new().unwrap();
        for file in ["seq.010.drf", "seq.002.drf", "seq.001.rnm", "other.001.drf"] {
            std::fs::write(dir.path().join(file), "").unwrap();
        }

        let paths = find_trajectories(&run_pattern(dir.path(), "seq", "drf")).unwrap();
        let names: Vec<_> = paths
            .iter()
            .filter_map(|p| p.file_name().and_then(|f| f.to_str()))
            .collect();
        assert_eq!(names, ["seq.002.drf", "seq.010.drf"]);
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(matches!(
            find_trajectories("runs/[.drf"),
            Err(ConvertError::Configuration(ConfigurationError::InvalidParameter {
                name: "pattern",
                ..
            }))
        ));
    }
}
