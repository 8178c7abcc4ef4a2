//! Resampling of simulator event streams onto the shared time grid.
//!
//! This module handles:
//! - Building the shared time grid
//! - Step-hold bookkeeping
//! - The Kinefold (`*.rnm` snapshot) adapter
//! - The Kinfold (streamed event) adapter

pub mod grid;
pub mod hold;
pub mod kinefold;
pub mod kinfold;

// Re-export main types
pub use grid::{is_close, GridConfig, TimeGrid};
pub use hold::StepHold;
pub use kinefold::KinefoldResampler;
pub use kinfold::{parse_kinfold_event, KinfoldEvent, KinfoldResampler, RateConversion};

/// Value held at a grid point: structure and its free energy [kcal/mol]
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub structure: String,
    pub energy: f64,
}

impl Sample {
    pub fn new(structure: impl Into<String>, energy: f64) -> Self {
        Self {
            structure: structure.into(),
            energy,
        }
    }

    /// Single unpaired nucleotide, the value held before the first event
    pub fn unfolded() -> Self {
        Self::new(".", 0.0)
    }
}
