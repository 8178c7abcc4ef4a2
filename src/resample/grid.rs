//! Shared output time grid.
//!
//! All trajectories of one job are sampled at the same absolute times:
//! `t_lin` evenly spaced points per nucleotide extension during growth,
//! followed by `t_log` logarithmically spaced points covering the
//! post-growth phase.
//!
//! Example (N=2, t_ext=1, t_end=1, t_lin=2, t_log=2):
//! `[0, 0.5, 1, 1.5, 2, 2.449.., 3]`

use crate::utils::config::{
    DEFAULT_T_END, DEFAULT_T_EXT, DEFAULT_T_LIN, DEFAULT_T_LOG, GRID_ATOL, GRID_RTOL,
};
use crate::utils::error::ConfigurationError;
use log::debug;
use serde::{Deserialize, Serialize};

/// Parameters of the shared time grid
///
/// **Public** - persisted in the job manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridConfig {
    /// Number of nucleotide-addition steps (full target length)
    pub seqlen: usize,

    /// Time per nucleotide extension [s/nt]
    pub t_ext: f64,

    /// Post-growth simulation time [s]
    pub t_end: f64,

    /// Linear samples per nucleotide extension
    pub t_lin: usize,

    /// Logarithmic samples after growth
    pub t_log: usize,
}

impl GridConfig {
    /// Grid parameters with default timing for a sequence of `seqlen` nucleotides
    pub fn new(seqlen: usize) -> Self {
        Self {
            seqlen,
            t_ext: DEFAULT_T_EXT,
            t_end: DEFAULT_T_END,
            t_lin: DEFAULT_T_LIN,
            t_log: DEFAULT_T_LOG,
        }
    }

    /// Check parameters without building the grid
    ///
    /// **Public** - commands call this before spawning simulators
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if !self.t_ext.is_finite() || self.t_ext <= 0.0 {
            return Err(ConfigurationError::DegenerateGrid(format!(
                "t_ext must be positive, got {}",
                self.t_ext
            )));
        }
        if !self.t_end.is_finite() || self.t_end <= 0.0 {
            return Err(ConfigurationError::DegenerateGrid(format!(
                "t_end must be positive, got {}",
                self.t_end
            )));
        }
        if self.t_lin == 0 {
            return Err(ConfigurationError::DegenerateGrid(
                "t_lin must be at least 1".to_string(),
            ));
        }
        if self.t_log == 0 {
            return Err(ConfigurationError::DegenerateGrid(
                "t_log must be at least 1".to_string(),
            ));
        }
        if self.seqlen == 0 {
            // The post-growth phase would start at t = 0
            return Err(ConfigurationError::DegenerateGrid(
                "cannot space post-growth samples logarithmically from t = 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Build the time grid
    ///
    /// **Public** - main entry point for grid construction
    ///
    /// # Returns
    /// Strictly increasing grid of length `1 + seqlen * t_lin + t_log`
    ///
    /// # Errors
    /// * `ConfigurationError::DegenerateGrid` - non-positive timing, zero
    ///   sample counts, or an empty growth phase
    pub fn build(&self) -> Result<TimeGrid, ConfigurationError> {
        self.validate()?;

        let mut times = Vec::with_capacity(1 + self.seqlen * self.t_lin + self.t_log);
        times.push(0.0);

        for _ in 0..self.seqlen {
            let start = last(&times);
            times.extend(linspace(start, start + self.t_ext, self.t_lin + 1).skip(1));
        }
        let growth_end = times.len() - 1;

        let start = last(&times);
        times.extend(
            linspace(start.log10(), (start + self.t_end).log10(), self.t_log + 1)
                .skip(1)
                .map(|exponent| 10f64.powf(exponent)),
        );

        debug!(
            "Built time grid with {} points (growth ends at index {}, t = {:.9})",
            times.len(),
            growth_end,
            times[growth_end]
        );

        Ok(TimeGrid { times, growth_end })
    }
}

fn last(times: &[f64]) -> f64 {
    times.last().copied().unwrap_or(0.0)
}

/// Evenly spaced values over `[start, stop]`, endpoint exact
fn linspace(start: f64, stop: f64, num: usize) -> impl Iterator<Item = f64> {
    let step = (stop - start) / (num - 1) as f64;
    (0..num).map(move |i| {
        if i == num - 1 {
            stop
        } else {
            start + i as f64 * step
        }
    })
}

/// Floating comparison with numpy's `isclose` contract
pub fn is_close(actual: f64, expected: f64) -> bool {
    (actual - expected).abs() <= GRID_ATOL + GRID_RTOL * expected.abs()
}

/// Immutable ascending time grid
#[derive(Debug, Clone, PartialEq)]
pub struct TimeGrid {
    times: Vec<f64>,
    growth_end: usize,
}

impl TimeGrid {
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.times.get(index).copied()
    }

    pub fn last(&self) -> f64 {
        last(&self.times)
    }

    /// Index of the last growth-phase grid point
    pub fn growth_end(&self) -> usize {
        self.growth_end
    }

    /// Whether `time` matches the grid value at `index` within tolerance
    ///
    /// **Public** - used to detect data produced with other grid parameters
    pub fn matches(&self, index: usize, time: f64) -> bool {
        self.get(index).is_some_and(|expected| is_close(time, expected))
    }
}
