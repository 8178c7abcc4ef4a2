//! Aggregation of per-run trajectories into population statistics.
//!
//! This module merges many resampled runs into:
//! - Per-grid-point occupancy and energy of every structure
//! - Stable structure ids shared across all grid points
//! - The final-grid-point distribution

pub mod combine;
pub mod registry;

// Re-export main types and functions
pub use combine::{
    combine_trajectories, Aggregation, CombinedRow, CombinedTable, Occupancy, StructureTally,
};
pub use crate::utils::files::find_trajectories;
pub use registry::StructureRegistry;
