//! Error types for the entire application.
//!
//! We use `thiserror` for library-style errors with custom types,
//! and `anyhow` for application-level error propagation in main.rs and commands.
//!
//! Every error here is fatal for the run or job in which it occurs.

use std::path::PathBuf;
use thiserror::Error;

/// Malformed input: sequence records, simulator logs, trajectory tables
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Only single-sequence input is supported (found a second record: {0})")]
    MultipleRecords(String),

    #[error("Unsupported character(s) in RNA: {0}")]
    UnsupportedCharacters(String),

    #[error("Input contains no sequence")]
    EmptySequence,

    #[error("Malformed annotation at column {column}: both lines hold '{found}'")]
    MalformedAnnotation { column: usize, found: char },

    #[error("Malformed simulator log at line {line}: {reason}")]
    MalformedLog { line: usize, reason: String },

    #[error("Malformed simulator event at line {line}: {reason}")]
    MalformedEvent { line: usize, reason: String },

    #[error("Malformed trajectory table {file} at line {line}: {reason}")]
    MalformedTable {
        file: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("Simulator output belongs to '{found}', expected '{expected}'")]
    SequenceMismatch { expected: String, found: String },
}

/// Internal invariant violated
#[derive(Error, Debug)]
pub enum ConsistencyError {
    #[error("Held structure must shrink from {held} to {target} nucleotides at t = {time:.9}")]
    ShrinkingStructure {
        held: usize,
        target: usize,
        time: f64,
    },

    #[error(
        "Time mismatch in {file} at grid index {index}: expected {expected:.9}, found {actual:.9} \
         (was the data generated with different grid parameters?)"
    )]
    GridMismatch {
        file: PathBuf,
        index: usize,
        expected: f64,
        actual: f64,
    },

    #[error("Run ended at grid index {reached} of {expected}: {context}")]
    IncompleteRun {
        reached: usize,
        expected: usize,
        context: String,
    },

    #[error("Run boundary at t = {event_time} does not match grid time {grid_time}")]
    RunBoundaryMismatch { event_time: f64, grid_time: f64 },

    #[error("Unbalanced structure '{structure}': {reason}")]
    UnbalancedStructure { structure: String, reason: String },

    #[error("All {0} helix slots are in use")]
    SlotPoolExhausted(usize),

    #[error("Helix '{0}' appears more than twice in one snapshot")]
    HelixReused(String),
}

/// Unsupported parameter combination
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("Degenerate time grid: {0}")]
    DegenerateGrid(String),

    #[error("Unknown rate model: {0}")]
    UnknownRateModel(String),

    #[error("Unknown move set: {0}")]
    UnknownMoveSet(String),

    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

/// A required external collaborator is unavailable or failed
#[derive(Error, Debug)]
pub enum DependencyError {
    #[error("Executable not found: {0}")]
    ExecutableNotFound(String),

    #[error("Failed to run {program}: {source}")]
    SpawnFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}")]
    SimulatorFailed { program: String, status: String },
}

/// Errors that can occur during file output
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to write file: {0}")]
    WriteFailed(#[from] std::io::Error),

    #[error("Failed to serialize JSON: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    #[error("Invalid output path: {0}")]
    InvalidPath(String),
}

/// Umbrella error for operations touching several concerns
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Consistency(#[from] ConsistencyError),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Dependency(#[from] DependencyError),

    #[error(transparent)]
    Output(#[from] OutputError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
