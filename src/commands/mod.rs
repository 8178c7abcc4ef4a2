//! CLI command implementations.
//!
//! Each command is implemented in its own module.
//! Commands orchestrate the various library components to perform user tasks.

pub mod combine;
pub mod job;
pub mod kinefold;
pub mod kinfold;
pub mod models;
pub mod utils;

// Re-export main command functions
pub use combine::{execute_combine, validate_combine_args};
pub use kinefold::{execute_kinefold, validate_kinefold_args};
pub use kinfold::{execute_kinfold, validate_kinfold_args};
pub use models::{CombineArgs, GridArgs, JobArgs, KinefoldArgs, KinfoldArgs};
pub use utils::{
    changed_timing_flags, display_grid, display_version, resolve_grid, validate_trajectory_files,
};
