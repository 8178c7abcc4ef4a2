//! DrForna converters CLI
//!
//! Runs Kinefold or Kinfold, resamples their output onto a shared time grid
//! and combines the runs into one DrForna `*.drf` table.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use env_logger::Env;
use std::path::PathBuf;

use drforna_converters::commands::{
    display_grid, display_version, execute_combine, execute_kinefold, execute_kinfold, resolve_grid,
    validate_combine_args, validate_kinefold_args, validate_kinfold_args, validate_trajectory_files,
    CombineArgs, GridArgs, JobArgs, KinefoldArgs, KinfoldArgs,
};
use drforna_converters::resample::grid::GridConfig;
use drforna_converters::simulator::{MoveSet, RateModel};
use drforna_converters::utils::config::{
    DEFAULT_K0, DEFAULT_T_END, DEFAULT_T_EXT, DEFAULT_T_LIN, DEFAULT_T_LOG, KINEFOLD_EXECUTABLE,
    KINEFOLD_HELIX_MIN_FREE_ENERGY, KINFOLD_EXECUTABLE,
};

/// DrForna converters - cotranscriptional folding trajectories for DrForna
#[derive(Parser, Debug)]
#[command(name = "drconvert")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Time-grid flags
#[derive(Args, Debug, Clone)]
struct GridFlags {
    /// Time per nucleotide extension, the inverse transcription rate [s/nt]
    #[arg(long, default_value_t = DEFAULT_T_EXT)]
    t_ext: f64,

    /// Post-transcriptional simulation time [s]
    #[arg(long, default_value_t = DEFAULT_T_END)]
    t_end: f64,

    /// Evenly spaced output times per nucleotide extension
    #[arg(long, default_value_t = DEFAULT_T_LIN)]
    t_lin: usize,

    /// Logarithmically spaced output times after transcription
    #[arg(long, default_value_t = DEFAULT_T_LOG)]
    t_log: usize,
}

impl From<GridFlags> for GridArgs {
    fn from(flags: GridFlags) -> Self {
        Self {
            t_ext: flags.t_ext,
            t_end: flags.t_end,
            t_lin: flags.t_lin,
            t_log: flags.t_log,
        }
    }
}

/// Flags shared by the simulator commands
#[derive(Args, Debug, Clone)]
struct JobFlags {
    /// Sequence file (reads stdin if omitted)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Name of the output files, overrides the sequence header
    #[arg(long)]
    name: Option<String>,

    /// Directory for per-run simulator files
    #[arg(long)]
    tmpdir: Option<PathBuf>,

    /// Directory for the combined table and manifest
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Number of simulator calls (0 = only process existing data)
    #[arg(short, long, default_value_t = 0)]
    processes: usize,

    /// Report counts instead of occupancy fractions
    #[arg(long)]
    use_counts: bool,

    /// Also write the final-grid-point distribution (*.kp8)
    #[arg(long)]
    kp8: bool,

    #[command(flatten)]
    grid: GridFlags,
}

impl JobFlags {
    fn into_job_args(self, default_tmpdir: PathBuf) -> JobArgs {
        JobArgs {
            input: self.input,
            name: self.name,
            tmpdir: self.tmpdir.unwrap_or(default_tmpdir),
            output_dir: self.output_dir,
            processes: self.processes,
            grid: self.grid.into(),
            use_counts: self.use_counts,
            kp8: self.kp8,
        }
    }
}

/// Grid source for commands working on existing trajectories
#[derive(Args, Debug, Clone)]
struct GridSource {
    /// Job manifest holding the grid parameters
    #[arg(short, long, conflicts_with = "seqlen")]
    manifest: Option<PathBuf>,

    /// Full sequence length (when no manifest is given)
    #[arg(long, required_unless_present = "manifest")]
    seqlen: Option<usize>,

    #[command(flatten)]
    grid: GridFlags,
}

impl GridSource {
    fn resolve(self) -> Result<GridConfig> {
        resolve_grid(self.manifest.as_deref(), self.seqlen, &self.grid.into())
    }
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run Kinefold and convert its *.rnm logs
    Kinefold {
        #[command(flatten)]
        job: JobFlags,

        /// Kinefold executable
        #[arg(long, default_value = KINEFOLD_EXECUTABLE)]
        executable: String,

        /// Helix minimum free energy [kcal/mol]
        #[arg(long, default_value_t = KINEFOLD_HELIX_MIN_FREE_ENERGY)]
        helix_min_free_energy: f64,
    },

    /// Run Kinfold and resample its event streams
    Kinfold {
        #[command(flatten)]
        job: JobFlags,

        /// Kinfold executable
        #[arg(long, default_value = KINFOLD_EXECUTABLE)]
        executable: String,

        /// Maximal number of worker threads
        #[arg(short, long)]
        cpus: Option<usize>,

        /// Number of simulations per Kinfold call
        #[arg(short, long, default_value_t = 1)]
        num: usize,

        /// Arrhenius rate constant [atu/s]
        #[arg(long, default_value_t = DEFAULT_K0)]
        k0: f64,

        /// Rescale energy parameters to this temperature [°C]
        #[arg(short = 'T', long, default_value_t = 37.0)]
        temp: f64,

        /// Energy parameter file
        #[arg(short = 'P', long)]
        param_file: Option<PathBuf>,

        /// Dangling-end model
        #[arg(long, default_value_t = 2)]
        dangle: u8,

        /// Rate model (Metropolis or Kawasaki)
        #[arg(long, default_value = "Metropolis")]
        rate_model: RateModel,

        /// Move set (single-base-pair or shift)
        #[arg(long, default_value = "single-base-pair")]
        moves: MoveSet,
    },

    /// Combine existing trajectory files into one table
    Combine {
        /// Glob pattern of the trajectory files
        #[arg(long)]
        pattern: String,

        /// Combined table to write
        #[arg(short, long, default_value = "combined.drf")]
        output: PathBuf,

        /// Report counts instead of occupancy fractions
        #[arg(long)]
        use_counts: bool,

        /// Also write the final-grid-point distribution (*.kp8)
        #[arg(long)]
        kp8: bool,

        #[command(flatten)]
        source: GridSource,
    },

    /// Print the output time grid
    Grid {
        #[command(flatten)]
        source: GridSource,
    },

    /// Check trajectory files against a time grid
    Validate {
        /// Trajectory files to check
        #[arg(required = true)]
        files: Vec<PathBuf>,

        #[command(flatten)]
        source: GridSource,
    },

    /// Display version information
    Version,
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    // Execute command
    match cli.command {
        Commands::Kinefold {
            job,
            executable,
            helix_min_free_energy,
        } => {
            let args = KinefoldArgs {
                job: job.into_job_args(PathBuf::from("drkinefold")),
                executable,
                helix_min_free_energy,
            };
            validate_kinefold_args(&args)?;
            execute_kinefold(args)?;
        }

        Commands::Kinfold {
            job,
            executable,
            cpus,
            num,
            k0,
            temp,
            param_file,
            dangle,
            rate_model,
            moves,
        } => {
            let args = KinfoldArgs {
                job: job.into_job_args(PathBuf::from("drkinfold")),
                executable,
                cpus,
                num,
                k0,
                temperature: temp,
                params: param_file,
                dangle,
                rate_model,
                move_set: moves,
            };
            validate_kinfold_args(&args)?;
            execute_kinfold(args)?;
        }

        Commands::Combine {
            pattern,
            output,
            use_counts,
            kp8,
            source,
        } => {
            let args = CombineArgs {
                pattern,
                output,
                grid: source.resolve()?,
                use_counts,
                kp8,
            };
            validate_combine_args(&args)?;
            execute_combine(args)?;
        }

        Commands::Grid { source } => {
            display_grid(&source.resolve()?)?;
        }

        Commands::Validate { files, source } => {
            let runs = validate_trajectory_files(&files, &source.resolve()?)?;
            println!("✓ {} file(s), {} run(s) in total", files.len(), runs);
        }

        Commands::Version => {
            display_version();
        }
    }

    Ok(())
}
