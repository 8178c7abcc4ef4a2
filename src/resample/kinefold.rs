//! Kinefold adapter: `*.rnm` snapshot logs to per-run trajectory files.
//!
//! Snapshot times are relative to the start of each transcript
//! intermediate, so one fixed delay (full length times `t_ext`) is added to
//! all of them. Every grid point that falls due at a snapshot is emitted
//! with the structure held *before* that snapshot, fitted to the transcript
//! length at the grid time.

use super::grid::{GridConfig, TimeGrid};
use super::hold::StepHold;
use super::Sample;
use crate::output::{create_output_file, format_centi, to_centi, TrajectoryWriter};
use crate::parser::kinefold::{read_kinefold_log, KinefoldLog};
use crate::parser::structure::StructureCanonicalizer;
use crate::utils::error::{ConsistencyError, ConvertError, OutputError, ValidationError};
use log::{debug, warn};
use std::fs::File;
use std::io::{BufReader, Write};
use std::ops::Range;
use std::path::{Path, PathBuf};

/// Resampler for Kinefold logs of one job
#[derive(Debug, Clone, Copy)]
pub struct KinefoldResampler<'g> {
    grid: &'g TimeGrid,
    t_ext: f64,
    seqlen: usize,
}

impl<'g> KinefoldResampler<'g> {
    /// # Arguments
    /// * `grid` - grid built from `config`
    /// * `config` - supplies the full length and the extension time
    pub fn new(grid: &'g TimeGrid, config: &GridConfig) -> Self {
        Self {
            grid,
            t_ext: config.t_ext,
            seqlen: config.seqlen,
        }
    }

    /// Transcript length at absolute time `time`, clamped to `[1, N]`
    ///
    /// Times snap to the nearest extension step (ties to even).
    pub fn partial_length(&self, time: f64) -> usize {
        let steps = (time / self.t_ext).round_ties_even();
        (steps.max(0.0) as usize).clamp(1, self.seqlen.max(1))
    }

    /// Offset added to every snapshot time
    pub fn delay(&self) -> f64 {
        self.seqlen as f64 * self.t_ext
    }

    /// Resample one parsed log onto the grid
    ///
    /// **Public** - core of the Kinefold conversion
    ///
    /// # Arguments
    /// * `log` - parsed `*.rnm` log
    /// * `out` - receives exactly `len(grid)` samples
    /// * `event_log` - optional sink for one line per snapshot
    ///
    /// # Returns
    /// Number of snapshots consumed
    ///
    /// # Errors
    /// * `ConsistencyError::ShrinkingStructure` - a held structure is longer
    ///   than the transcript at a later grid time
    pub fn resample<W: Write>(
        &self,
        log: &KinefoldLog,
        out: &mut TrajectoryWriter<W>,
        mut event_log: Option<&mut dyn Write>,
    ) -> Result<usize, ConvertError> {
        let delay = self.delay();
        let mut hold = StepHold::new(self.grid, Sample::unfolded());

        for (event, snapshot) in log.events.iter().enumerate() {
            let elapsed = snapshot.elapsed_ms * 1e-3;
            let time = elapsed + delay;

            if let Some(sink) = event_log.as_deref_mut() {
                writeln!(
                    sink,
                    "# {:13.9} {:13.9} {} {}",
                    elapsed,
                    time,
                    snapshot.structure,
                    format_centi(to_centi(snapshot.energy))
                )
                .map_err(OutputError::from)?;
            }

            let due = hold.advance_to(time);
            self.emit(&mut hold, due, event, out)?;
            hold.adopt(Sample::new(snapshot.structure.clone(), snapshot.energy));
        }

        let due = hold.drain();
        self.emit(&mut hold, due, log.events.len(), out)?;

        Ok(log.events.len())
    }

    fn emit<W: Write>(
        &self,
        hold: &mut StepHold<'_>,
        due: Range<usize>,
        event: usize,
        out: &mut TrajectoryWriter<W>,
    ) -> Result<(), ConvertError> {
        let times = self.grid.times();
        for index in due {
            let time = times[index];
            self.fit(hold.held_mut(), time)?;
            out.write_sample(event, time, hold.held())?;
        }
        Ok(())
    }

    /// Pad the held structure to the transcript length at `time`
    fn fit(&self, held: &mut Sample, time: f64) -> Result<(), ConsistencyError> {
        let target = self.partial_length(time);
        let length = held.structure.len();
        if length > target {
            return Err(ConsistencyError::ShrinkingStructure {
                held: length,
                target,
                time,
            });
        }
        held.structure.extend(std::iter::repeat('.').take(target - length));
        Ok(())
    }

    /// Convert one `*.rnm` file into a trajectory file
    ///
    /// **Public** - used by the `kinefold` command for every log found
    ///
    /// Also writes `<rnm>.log` with the absolute time of every snapshot. A
    /// trajectory file left behind by a failed conversion is removed.
    ///
    /// # Errors
    /// * `ValidationError::SequenceMismatch` - the log belongs to another
    ///   name or sequence
    /// * any error of [`read_kinefold_log`] or [`Self::resample`]
    pub fn convert_file(
        &self,
        rnm_path: &Path,
        drf_path: &Path,
        name: &str,
        sequence: &str,
        canonicalizer: &impl StructureCanonicalizer,
    ) -> Result<usize, ConvertError> {
        let result = self.convert_file_inner(rnm_path, drf_path, name, sequence, canonicalizer);
        if result.is_err() && drf_path.exists() {
            warn!("Removing incomplete trajectory: {}", drf_path.display());
            if let Err(e) = std::fs::remove_file(drf_path) {
                warn!("Could not remove {}: {}", drf_path.display(), e);
            }
        }
        result
    }

    fn convert_file_inner(
        &self,
        rnm_path: &Path,
        drf_path: &Path,
        name: &str,
        sequence: &str,
        canonicalizer: &impl StructureCanonicalizer,
    ) -> Result<usize, ConvertError> {
        debug!("Converting {} -> {}", rnm_path.display(), drf_path.display());

        let reader = BufReader::new(File::open(rnm_path)?);
        let log = read_kinefold_log(reader, canonicalizer)?;

        if log.header.name != name {
            return Err(ValidationError::SequenceMismatch {
                expected: name.to_string(),
                found: log.header.name,
            }
            .into());
        }
        if log.header.sequence != sequence {
            return Err(ValidationError::SequenceMismatch {
                expected: sequence.to_string(),
                found: log.header.sequence,
            }
            .into());
        }

        let mut event_log = create_output_file(&event_log_path(rnm_path))?;
        let mut writer = TrajectoryWriter::create(drf_path)?;
        let events = self.resample(&log, &mut writer, Some(&mut event_log))?;
        writer.finish()?;
        event_log.flush().map_err(OutputError::from)?;

        Ok(events)
    }
}

/// `<rnm>.log` next to the log it describes
pub fn event_log_path(rnm_path: &Path) -> PathBuf {
    let mut path = rnm_path.as_os_str().to_owned();
    path.push(".log");
    PathBuf::from(path)
}
