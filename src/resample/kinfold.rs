//! Kinfold adapter: streamed events to per-run trajectory files.
//!
//! Kinfold prints one `structure energy time` line per move, in its own
//! arbitrary time units (atu). A fourth field marks the last event of a run.
//! Each event is adopted first, then every grid point it reaches is emitted.

use super::grid::{is_close, TimeGrid};
use super::hold::StepHold;
use super::Sample;
use crate::output::TrajectoryWriter;
use crate::utils::error::{ConfigurationError, ConsistencyError, ConvertError, ValidationError};
use log::{debug, warn};
use std::io::{BufRead, Write};
use std::path::Path;

/// Conversion between seconds and Kinfold time units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateConversion {
    /// Arrhenius prefactor k0 [atu/s]
    pub atu_per_sec: f64,

    /// Time units per nucleotide extension [atu/nt]
    pub atu_per_nuc: f64,
}

impl RateConversion {
    /// # Errors
    /// * `ConfigurationError::InvalidParameter` - non-positive `k0` or `t_ext`
    pub fn new(k0: f64, t_ext: f64) -> Result<Self, ConfigurationError> {
        if !k0.is_finite() || k0 <= 0.0 {
            return Err(ConfigurationError::InvalidParameter {
                name: "k0",
                reason: format!("must be positive, got {}", k0),
            });
        }
        if !t_ext.is_finite() || t_ext <= 0.0 {
            return Err(ConfigurationError::InvalidParameter {
                name: "t_ext",
                reason: format!("must be positive, got {}", t_ext),
            });
        }
        Ok(Self {
            atu_per_sec: k0,
            atu_per_nuc: k0 * t_ext,
        })
    }

    /// Simulated time covering growth of `seqlen` nucleotides plus `t_end` seconds [atu]
    pub fn total_time(&self, seqlen: usize, t_end: f64) -> f64 {
        self.atu_per_nuc * seqlen as f64 + self.atu_per_sec * t_end
    }
}

/// One parsed Kinfold output line
#[derive(Debug, Clone, PartialEq)]
pub struct KinfoldEvent {
    pub structure: String,
    pub energy: f64,
    /// Simulated time [atu]
    pub time: f64,
    pub ends_run: bool,
}

/// Parse one line of Kinfold output
///
/// # Errors
/// * `ValidationError::MalformedEvent` - fewer than three fields or
///   unparseable numbers
pub fn parse_kinfold_event(line: &str, line_no: usize) -> Result<KinfoldEvent, ValidationError> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 3 {
        return Err(ValidationError::MalformedEvent {
            line: line_no,
            reason: format!("expected 'structure energy time', found {} field(s)", fields.len()),
        });
    }

    let energy = fields[1].parse().map_err(|_| ValidationError::MalformedEvent {
        line: line_no,
        reason: format!("invalid energy '{}'", fields[1]),
    })?;
    let time = fields[2].parse().map_err(|_| ValidationError::MalformedEvent {
        line: line_no,
        reason: format!("invalid time '{}'", fields[2]),
    })?;

    Ok(KinfoldEvent {
        structure: fields[0].to_string(),
        energy,
        time,
        ends_run: fields.len() > 3,
    })
}

/// Resampler for Kinfold streams of one job
#[derive(Debug, Clone, Copy)]
pub struct KinfoldResampler<'g> {
    grid: &'g TimeGrid,
    atu_per_sec: f64,
}

impl<'g> KinfoldResampler<'g> {
    pub fn new(grid: &'g TimeGrid, rates: &RateConversion) -> Self {
        Self {
            grid,
            atu_per_sec: rates.atu_per_sec,
        }
    }

    /// Resample a stream of one or more concatenated runs
    ///
    /// **Public** - core of the Kinfold conversion
    ///
    /// # Returns
    /// Number of completed runs
    ///
    /// # Errors
    /// * `ValidationError::MalformedEvent` - unparseable line
    /// * `ConsistencyError::RunBoundaryMismatch` - end-of-run event does not
    ///   coincide with the next grid time
    /// * `ConsistencyError::IncompleteRun` - a run ends before the last grid
    ///   point, or the stream ends inside a run (or holds no run at all)
    pub fn resample<R: BufRead, W: Write>(
        &self,
        stream: R,
        out: &mut TrajectoryWriter<W>,
    ) -> Result<usize, ConvertError> {
        let k0 = self.atu_per_sec;
        let times = self.grid.times();
        let mut hold = StepHold::new(self.grid, Sample::unfolded());
        let mut event = 0;
        let mut runs = 0;

        for (index, line) in stream.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let current = parse_kinfold_event(&line, index + 1)?;

            hold.adopt(Sample::new(current.structure, current.energy));
            for point in hold.advance_while(|time| time * k0 <= current.time) {
                out.write_sample(event, times[point], hold.held())?;
            }

            if current.ends_run {
                if let Some(grid_time) = hold.next_time() {
                    if !is_close(grid_time * k0, current.time) {
                        return Err(ConsistencyError::RunBoundaryMismatch {
                            event_time: current.time,
                            grid_time: grid_time * k0,
                        }
                        .into());
                    }
                    if let Some(point) = hold.step() {
                        out.write_sample(event, times[point], hold.held())?;
                    }
                }
                if !hold.is_complete() {
                    return Err(ConsistencyError::IncompleteRun {
                        reached: hold.cursor(),
                        expected: self.grid.len(),
                        context: format!("run {} ended at t = {} atu", runs + 1, current.time),
                    }
                    .into());
                }
                runs += 1;
                debug!("Completed run {} after {} events", runs, event + 1);
                hold.reset(Sample::unfolded());
            }
            event += 1;
        }

        if hold.cursor() != 0 || runs == 0 {
            return Err(ConsistencyError::IncompleteRun {
                reached: hold.cursor(),
                expected: self.grid.len(),
                context: format!("stream ended after {} complete run(s)", runs),
            }
            .into());
        }

        Ok(runs)
    }

    /// Resample a stream into a new trajectory file
    ///
    /// A trajectory file left behind by a failed conversion is removed.
    pub fn convert_stream<R: BufRead>(&self, stream: R, drf_path: &Path) -> Result<usize, ConvertError> {
        let result = TrajectoryWriter::create(drf_path)
            .map_err(ConvertError::from)
            .and_then(|mut writer| {
                let runs = self.resample(stream, &mut writer)?;
                writer.finish()?;
                Ok(runs)
            });

        if result.is_err() && drf_path.exists() {
            warn!("Removing incomplete trajectory: {}", drf_path.display());
            if let Err(e) = std::fs::remove_file(drf_path) {
                warn!("Could not remove {}: {}", drf_path.display(), e);
            }
        }
        result
    }
}
