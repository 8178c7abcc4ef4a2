//! Kinfold invocation and option mapping.
//!
//! Kinfold reads the sequence from stdin and streams one event per line to
//! stdout. Its `--fpt` and `--logML` flags switch features *off*, so the
//! options below are phrased positively and mapped to the inverted flags.

use crate::resample::kinfold::KinfoldResampler;
use crate::utils::config::{KINFOLD_ENERGY_CUTOFF, KINFOLD_EXECUTABLE};
use crate::utils::error::{ConfigurationError, ConvertError, DependencyError, OutputError};
use log::{debug, info, warn};
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::str::FromStr;

/// Transition rate model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RateModel {
    #[default]
    Metropolis,
    Kawasaki,
}

impl FromStr for RateModel {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "metropolis" => Ok(Self::Metropolis),
            "kawasaki" => Ok(Self::Kawasaki),
            _ => Err(ConfigurationError::UnknownRateModel(s.to_string())),
        }
    }
}

impl fmt::Display for RateModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Metropolis => write!(f, "Metropolis"),
            Self::Kawasaki => write!(f, "Kawasaki"),
        }
    }
}

/// Elementary move set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MoveSet {
    /// Base-pair insertion and deletion only
    #[default]
    SingleBasePair,
    /// Additionally allow shift moves
    Shift,
}

impl FromStr for MoveSet {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single-base-pair" => Ok(Self::SingleBasePair),
            "shift" => Ok(Self::Shift),
            _ => Err(ConfigurationError::UnknownMoveSet(s.to_string())),
        }
    }
}

impl fmt::Display for MoveSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SingleBasePair => write!(f, "single-base-pair"),
            Self::Shift => write!(f, "shift"),
        }
    }
}

/// Parameters of one Kinfold call
#[derive(Debug, Clone)]
pub struct KinfoldOptions {
    pub executable: String,

    /// Independent runs per call
    pub num: usize,

    /// Simulated time per run [atu]
    pub time: f64,

    /// Energy range of printed structures [kcal/mol]
    pub cut: u64,

    /// Energy parameter file
    pub params: Option<PathBuf>,

    pub dangle: u8,

    /// Temperature [°C]
    pub temperature: f64,

    pub rate_model: RateModel,
    pub move_set: MoveSet,

    /// Stop at local minima
    pub lmin: bool,

    /// Stop at the first passage of the stop structure
    pub first_passage: bool,

    /// Logarithmic multiloop energies
    pub log_multiloop: bool,

    /// Initial transcript length
    pub glen: usize,

    /// Time units per nucleotide extension [atu/nt], `None` disables growth
    pub grow: Option<f64>,
}

impl Default for KinfoldOptions {
    fn default() -> Self {
        Self {
            executable: KINFOLD_EXECUTABLE.to_string(),
            num: 1,
            time: 5000.0,
            cut: KINFOLD_ENERGY_CUTOFF,
            params: None,
            dangle: 2,
            temperature: 37.0,
            rate_model: RateModel::default(),
            move_set: MoveSet::default(),
            lmin: false,
            first_passage: false,
            log_multiloop: false,
            glen: 1,
            grow: None,
        }
    }
}

impl KinfoldOptions {
    /// # Errors
    /// * `ConfigurationError::InvalidParameter` - zero runs, non-positive time
    ///   or growth rate
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.num == 0 {
            return Err(ConfigurationError::InvalidParameter {
                name: "num",
                reason: "at least one run per call is required".to_string(),
            });
        }
        if !self.time.is_finite() || self.time <= 0.0 {
            return Err(ConfigurationError::InvalidParameter {
                name: "time",
                reason: format!("must be positive, got {}", self.time),
            });
        }
        if let Some(grow) = self.grow {
            if !grow.is_finite() || grow <= 0.0 {
                return Err(ConfigurationError::InvalidParameter {
                    name: "grow",
                    reason: format!("must be positive, got {}", grow),
                });
            }
        }
        Ok(())
    }
}

/// Command-line arguments of one Kinfold call
///
/// # Arguments
/// * `log_base` - base name Kinfold uses for its own `.log` file
pub fn build_command_args(options: &KinfoldOptions, log_base: &Path) -> Vec<String> {
    let mut args = vec![
        "--num".to_string(),
        options.num.to_string(),
        "--time".to_string(),
        options.time.to_string(),
        "--log".to_string(),
        log_base.display().to_string(),
        "--cut".to_string(),
        options.cut.to_string(),
    ];

    if let Some(params) = &options.params {
        args.push("--Par".to_string());
        args.push(params.display().to_string());
    }
    if options.dangle != 2 {
        args.push("--dangle".to_string());
        args.push(options.dangle.to_string());
    }
    if options.temperature != 37.0 {
        args.push("-T".to_string());
        args.push(options.temperature.to_string());
    }
    if options.rate_model == RateModel::Metropolis {
        args.push("--met".to_string());
    }
    if options.lmin {
        args.push("--lmin".to_string());
    }
    if !options.first_passage {
        args.push("--fpt".to_string());
    }
    if !options.log_multiloop {
        args.push("--logML".to_string());
    }
    if options.move_set == MoveSet::SingleBasePair {
        args.push("--noShift".to_string());
    }
    if let Some(grow) = options.grow {
        args.push("--glen".to_string());
        args.push(options.glen.to_string());
        args.push("--grow".to_string());
        args.push(grow.to_string());
    }
    args
}

/// Run one Kinfold call and resample its stream into `<base>.drf`
///
/// **Public** - one unit of work of the Kinfold worker pool
///
/// Stderr goes to `<base>.err`. The child is killed if resampling fails.
///
/// # Returns
/// Number of completed runs
///
/// # Errors
/// * `DependencyError::SpawnFailed` - the executable could not be started
/// * `DependencyError::SimulatorFailed` - non-zero exit status
/// * any error of [`KinfoldResampler::convert_stream`]
pub fn run_kinfold(
    options: &KinfoldOptions,
    sequence: &str,
    base: &Path,
    resampler: &KinfoldResampler<'_>,
) -> Result<usize, ConvertError> {
    let args = build_command_args(options, base);
    info!("Calling {} {}", options.executable, args.join(" "));

    let err_path = PathBuf::from(format!("{}.err", base.display()));
    let drf_path = PathBuf::from(format!("{}.drf", base.display()));
    let stderr = File::create(&err_path).map_err(OutputError::from)?;

    let spawn_failed = |source| DependencyError::SpawnFailed {
        program: options.executable.clone(),
        source,
    };
    let mut child = Command::new(&options.executable)
        .args(&args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(stderr)
        .spawn()
        .map_err(spawn_failed)?;

    if let Some(mut stdin) = child.stdin.take() {
        writeln!(stdin, "{}", sequence).map_err(spawn_failed)?;
    }
    let stdout = child.stdout.take().ok_or_else(|| {
        spawn_failed(std::io::Error::new(
            std::io::ErrorKind::BrokenPipe,
            "child stdout is not captured",
        ))
    })?;

    let runs = match resampler.convert_stream(BufReader::new(stdout), &drf_path) {
        Ok(runs) => runs,
        Err(e) => {
            warn!("Stopping {} after failed conversion of {}", options.executable, drf_path.display());
            // The child may already have exited
            let _ = child.kill();
            let _ = child.wait();
            return Err(e);
        }
    };

    let status = child.wait().map_err(spawn_failed)?;
    if !status.success() {
        return Err(DependencyError::SimulatorFailed {
            program: options.executable.clone(),
            status: status.to_string(),
        }
        .into());
    }

    debug!("{}: {} run(s)", drf_path.display(), runs);
    Ok(runs)
}
