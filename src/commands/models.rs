use crate::resample::grid::GridConfig;
use crate::simulator::kinfold::{MoveSet, RateModel};
use crate::utils::config::{
    DEFAULT_K0, DEFAULT_T_END, DEFAULT_T_EXT, DEFAULT_T_LIN, DEFAULT_T_LOG, KINEFOLD_EXECUTABLE,
    KINEFOLD_HELIX_MIN_FREE_ENERGY, KINFOLD_EXECUTABLE,
};
use std::path::PathBuf;

/// Time-grid flags shared by all commands
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridArgs {
    /// Time per nucleotide extension [s/nt]
    pub t_ext: f64,

    /// Post-growth simulation time [s]
    pub t_end: f64,

    /// Linear samples per extension
    pub t_lin: usize,

    /// Logarithmic samples after growth
    pub t_log: usize,
}

impl Default for GridArgs {
    fn default() -> Self {
        Self {
            t_ext: DEFAULT_T_EXT,
            t_end: DEFAULT_T_END,
            t_lin: DEFAULT_T_LIN,
            t_log: DEFAULT_T_LOG,
        }
    }
}

impl GridArgs {
    pub fn config(&self, seqlen: usize) -> GridConfig {
        GridConfig {
            seqlen,
            t_ext: self.t_ext,
            t_end: self.t_end,
            t_lin: self.t_lin,
            t_log: self.t_log,
        }
    }
}

/// Arguments shared by the simulator commands
///
/// **Public** - used by main.rs to construct from CLI args
#[derive(Debug, Clone)]
pub struct JobArgs {
    /// Sequence file (`None` = stdin)
    pub input: Option<PathBuf>,

    /// Job name, overrides the sequence header
    pub name: Option<String>,

    /// Directory for per-run simulator files
    pub tmpdir: PathBuf,

    /// Directory for the combined table and manifest
    pub output_dir: PathBuf,

    /// Number of simulator calls (0 = only convert existing data)
    pub processes: usize,

    pub grid: GridArgs,

    /// Report raw counts instead of fractions
    pub use_counts: bool,

    /// Also export the final-grid-point distribution
    pub kp8: bool,
}

impl JobArgs {
    fn with_tmpdir(tmpdir: &str) -> Self {
        Self {
            input: None,
            name: None,
            tmpdir: PathBuf::from(tmpdir),
            output_dir: PathBuf::from("."),
            processes: 0,
            grid: GridArgs::default(),
            use_counts: false,
            kp8: false,
        }
    }
}

/// Arguments for the kinefold command
#[derive(Debug, Clone)]
pub struct KinefoldArgs {
    pub job: JobArgs,
    pub executable: String,

    /// Helix minimum free energy [kcal/mol]
    pub helix_min_free_energy: f64,
}

impl Default for KinefoldArgs {
    fn default() -> Self {
        Self {
            job: JobArgs::with_tmpdir("drkinefold"),
            executable: KINEFOLD_EXECUTABLE.to_string(),
            helix_min_free_energy: KINEFOLD_HELIX_MIN_FREE_ENERGY,
        }
    }
}

/// Arguments for the kinfold command
#[derive(Debug, Clone)]
pub struct KinfoldArgs {
    pub job: JobArgs,
    pub executable: String,

    /// Worker threads (`None` = one per core)
    pub cpus: Option<usize>,

    /// Runs per Kinfold call
    pub num: usize,

    /// Arrhenius prefactor [atu/s]
    pub k0: f64,

    /// Temperature [°C]
    pub temperature: f64,

    /// Energy parameter file
    pub params: Option<PathBuf>,

    pub dangle: u8,
    pub rate_model: RateModel,
    pub move_set: MoveSet,
}

impl Default for KinfoldArgs {
    fn default() -> Self {
        Self {
            job: JobArgs::with_tmpdir("drkinfold"),
            executable: KINFOLD_EXECUTABLE.to_string(),
            cpus: None,
            num: 1,
            k0: DEFAULT_K0,
            temperature: 37.0,
            params: None,
            dangle: 2,
            rate_model: RateModel::default(),
            move_set: MoveSet::default(),
        }
    }
}

/// Arguments for the combine command
#[derive(Debug, Clone)]
pub struct CombineArgs {
    /// Glob pattern of the trajectory files
    pub pattern: String,

    /// Combined table to write
    pub output: PathBuf,

    pub grid: GridConfig,
    pub use_counts: bool,
    pub kp8: bool,
}

impl Default for CombineArgs {
    fn default() -> Self {
        Self {
            pattern: String::new(),
            output: PathBuf::from("combined.drf"),
            grid: GridArgs::default().config(1),
            use_counts: false,
            kp8: false,
        }
    }
}
