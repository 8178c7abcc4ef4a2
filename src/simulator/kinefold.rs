//! Kinefold invocation.
//!
//! Kinefold reads all parameters from an input file and needs a `.dat`
//! file holding the sequence. Each call writes one `<name>.<NNN>.rnm` log
//! plus scratch files (`.w`, `.i`) shared by all calls of a job.

use crate::output::create_output_file;
use crate::utils::config::{
    DEFAULT_T_END, DEFAULT_T_EXT, KINEFOLD_EXECUTABLE, KINEFOLD_HELIX_MIN_FREE_ENERGY,
};
use crate::utils::error::{ConvertError, DependencyError, OutputError};
use log::{debug, info, warn};
use rand::Rng;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Parameters of a Kinefold job
#[derive(Debug, Clone)]
pub struct KinefoldOptions {
    pub executable: String,

    /// Time per nucleotide extension [s/nt]
    pub t_ext: f64,

    /// Post-growth simulation time [s]
    pub t_end: f64,

    /// Minimum free energy of a helix to be considered [kcal/mol]
    pub helix_min_free_energy: f64,
}

impl Default for KinefoldOptions {
    fn default() -> Self {
        Self {
            executable: KINEFOLD_EXECUTABLE.to_string(),
            t_ext: DEFAULT_T_EXT,
            t_end: DEFAULT_T_END,
            helix_min_free_energy: KINEFOLD_HELIX_MIN_FREE_ENERGY,
        }
    }
}

impl KinefoldOptions {
    /// Requested folding time for `seqlen` nucleotides [ms]
    pub fn folding_time_ms(&self, seqlen: usize) -> f64 {
        (seqlen as f64 * self.t_ext + self.t_end) * 1e3
    }
}

/// Render the input file of one Kinefold call
///
/// # Arguments
/// * `stem` - absolute `<dir>/<name>` prefix of all files of the job
/// * `run` - run number of the `*.rnm` log to produce
/// * `seqlen` - length of the sequence
/// * `seed` - random seed for this call
pub fn render_input_file(stem: &Path, run: usize, seqlen: usize, options: &KinefoldOptions, seed: u32) -> String {
    let stem = stem.display();
    format!(
        "{seed}\t# random seed\n\
         {stem}.w\n\
         {stem}.w\n\
         {stem}.{run:03}.rnm\n\
         {stem}.w\n\
         {stem}.w\n\
         {stem}.w\n\
         {stem}.dat\n\
         0\t\t# 0=RNA ; 1=DNA\n\
         {hmfe}\t# helix minimum free energy in kcal/mol: 6.3460741=10kT\n\
         10000000\t# NA\n\
         {time:.0}\t# folding time requested in msec\n\
         1\t\t# pseudoknots   1=yes 0=no\n\
         0\t\t# entanglements\t1=yes 0=no\n\
         2 {rate}\t# simulation type: 1=renaturation; 2 20=cotrans. @ 20msec/nt\n",
        seed = seed,
        stem = stem,
        run = run,
        hmfe = options.helix_min_free_energy,
        time = options.folding_time_ms(seqlen),
        rate = options.t_ext * 1e3,
    )
}

/// Write the `<dir>/<name>.dat` sequence file Kinefold expects
pub fn write_dat_file(dir: &Path, name: &str, sequence: &str) -> Result<PathBuf, OutputError> {
    let path = dir.join(format!("{}.dat", name));
    if path.exists() {
        warn!("Overwriting existing file: {}", path.display());
    }
    let mut out = create_output_file(&path)?;
    writeln!(out, "< {}", name)?;
    writeln!(out, "{}", sequence)?;
    out.flush()?;
    Ok(path)
}

/// Run one Kinefold call producing `<stem>.<run>.rnm`
///
/// **Public** - Kinefold calls of a job run one after another
///
/// # Errors
/// * `DependencyError::SpawnFailed` - the executable could not be started
/// * `DependencyError::SimulatorFailed` - non-zero exit status
pub fn run_kinefold(
    stem: &Path,
    run: usize,
    sequence: &str,
    options: &KinefoldOptions,
) -> Result<PathBuf, ConvertError> {
    let seed = rand::thread_rng().gen_range(1..=10_000);
    let input_path = PathBuf::from(format!("{}.{:03}.in", stem.display(), run));
    let mut input = create_output_file(&input_path)?;
    input
        .write_all(render_input_file(stem, run, sequence.len(), options, seed).as_bytes())
        .map_err(OutputError::from)?;
    input.flush().map_err(OutputError::from)?;
    drop(input);

    info!("Calling Kinefold #{} (seed {})", run, seed);
    let output = Command::new(&options.executable)
        .arg(&input_path)
        .arg("-noprint")
        .stdin(Stdio::null())
        .output()
        .map_err(|source| DependencyError::SpawnFailed {
            program: options.executable.clone(),
            source,
        })?;

    if !output.status.success() {
        debug!("Kinefold stderr: {}", String::from_utf8_lossy(&output.stderr));
        return Err(DependencyError::SimulatorFailed {
            program: options.executable.clone(),
            status: output.status.to_string(),
        }
        .into());
    }

    Ok(PathBuf::from(format!("{}.{:03}.rnm", stem.display(), run)))
}

/// Remove the scratch files shared by all calls of a job
pub fn remove_scratch_files(stem: &Path) {
    for extension in ["w", "i"] {
        let path = PathBuf::from(format!("{}.{}", stem.display(), extension));
        if path.exists() {
            debug!("Removing {}", path.display());
            if let Err(e) = std::fs::remove_file(&path) {
                warn!("Could not remove {}: {}", path.display(), e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_render_input_file() {
        let text = render_input_file(Path::new("/work/kf/seq"), 3, 10, &KinefoldOptions::default(), 42);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 15);
        assert_eq!(lines[0], "42\t# random seed");
        assert_eq!(lines[3], "/work/kf/seq.003.rnm");
        assert_eq!(lines[7], "/work/kf/seq.dat");
        assert!(lines[9].starts_with("6.3460741\t"));
        assert!(lines[11].starts_with("30200\t"));
        assert!(lines[14].starts_with("2 20\t"));
    }

    #[test]
    fn test_write_dat_file() {
        let dir = TempDir::new().unwrap();
        let path = write_dat_file(dir.path(), "seq", "GGGAAACCC").unwrap();

        assert_eq!(std::fs::read_to_string(path).unwrap(), "< seq\nGGGAAACCC\n");
    }

    #[test]
    fn test_missing_executable_fails_to_spawn() {
        let dir = TempDir::new().unwrap();
        let options = KinefoldOptions {
            executable: dir.path().join("missing").display().to_string(),
            ..KinefoldOptions::default()
        };

        assert!(matches!(
            run_kinefold(&dir.path().join("seq"), 1, "GGG", &options),
            Err(ConvertError::Dependency(DependencyError::SpawnFailed { .. }))
        ));
    }

    #[test]
    fn test_remove_scratch_files() {
        let dir = TempDir::new().unwrap();
        let stem = dir.path().join("seq");
        std::fs::write(dir.path().join("seq.w"), "").unwrap();

        remove_scratch_files(&stem);
        assert!(!dir.path().join("seq.w").exists());
    }
}
