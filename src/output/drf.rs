//! DrForna `*.drf` trajectory tables.
//!
//! Per-run and combined tables share one layout:
//!
//! ```text
//! id time occupancy structure energy
//!     0   0.000000000 1 .   0.00
//! ```
//!
//! Energies are carried as integer hundredths of a kcal/mol so that
//! reading and re-writing a table never drifts.

use super::create_output_file;
use crate::aggregator::{CombinedRow, Occupancy, StructureTally};
use crate::resample::Sample;
use crate::utils::config::DRF_HEADER;
use crate::utils::error::{ConvertError, OutputError, ValidationError};
use log::{debug, info};
use std::fs::File;
use std::io::{BufRead, BufReader, Lines, Write};
use std::path::{Path, PathBuf};

/// Convert an energy to integer hundredths
pub fn to_centi(energy: f64) -> i64 {
    (energy * 100.0).round() as i64
}

/// Render integer hundredths as a right-aligned two-decimal field (`{:6.2}`)
pub fn format_centi(centi: i64) -> String {
    let sign = if centi < 0 { "-" } else { "" };
    let magnitude = centi.unsigned_abs();
    let text = format!("{}{}.{:02}", sign, magnitude / 100, magnitude % 100);
    format!("{:>6}", text)
}

/// Writer for per-run trajectory files
///
/// **Public** - sink of both resampling adapters
pub struct TrajectoryWriter<W: Write> {
    out: W,
    rows: usize,
}

impl TrajectoryWriter<std::io::BufWriter<File>> {
    /// Create (or overwrite) a trajectory file and write its header
    pub fn create(path: impl AsRef<Path>) -> Result<Self, OutputError> {
        let path = path.as_ref();
        debug!("Writing trajectory to: {}", path.display());
        Self::new(create_output_file(path)?)
    }
}

impl<W: Write> TrajectoryWriter<W> {
    pub fn new(mut out: W) -> Result<Self, OutputError> {
        writeln!(out, "{}", DRF_HEADER)?;
        Ok(Self { out, rows: 0 })
    }

    /// Append one sample
    ///
    /// # Arguments
    /// * `event` - index of the simulator event the sample was held from
    /// * `time` - absolute grid time of the sample
    pub fn write_sample(&mut self, event: usize, time: f64, sample: &Sample) -> Result<(), OutputError> {
        writeln!(
            self.out,
            "{:>5} {:13.9} 1 {} {}",
            event,
            time,
            sample.structure,
            format_centi(to_centi(sample.energy))
        )?;
        self.rows += 1;
        Ok(())
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Flush and hand back the underlying writer
    pub fn finish(mut self) -> Result<W, OutputError> {
        self.out.flush()?;
        Ok(self.out)
    }
}

/// One parsed row of a trajectory table
#[derive(Debug, Clone, PartialEq)]
pub struct TrajectoryRow {
    pub id: usize,
    pub time: f64,
    pub occupancy: String,
    pub structure: String,
    pub energy_centi: i64,
}

/// Streaming reader for trajectory tables
///
/// **Public** - input of the aggregator and the `validate` command
pub struct TrajectoryReader<R: BufRead> {
    lines: Lines<R>,
    path: PathBuf,
    line_no: usize,
}

impl TrajectoryReader<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ConvertError> {
        let path = path.as_ref();
        let file = File::open(path)?;
        Self::new(BufReader::new(file), path)
    }
}

impl<R: BufRead> TrajectoryReader<R> {
    /// Wrap a reader and consume the header row
    ///
    /// # Errors
    /// * `ValidationError::MalformedTable` - missing or unexpected header
    pub fn new(reader: R, path: impl Into<PathBuf>) -> Result<Self, ConvertError> {
        let mut lines = reader.lines();
        let path = path.into();
        let header = lines.next().transpose()?;
        if header.as_deref().map(str::trim) != Some(DRF_HEADER) {
            return Err(ValidationError::MalformedTable {
                file: path,
                line: 1,
                reason: format!("expected header '{}'", DRF_HEADER),
            }
            .into());
        }
        Ok(Self {
            lines,
            path,
            line_no: 1,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parse_row(&self, line: &str) -> Result<TrajectoryRow, ValidationError> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        let [id, time, occupancy, structure, energy] = fields[..] else {
            return Err(self.malformed(format!("expected 5 columns, found {}", fields.len())));
        };

        let id = id
            .parse()
            .map_err(|_| self.malformed(format!("invalid id '{}'", id)))?;
        let time = time
            .parse()
            .map_err(|_| self.malformed(format!("invalid time '{}'", time)))?;
        let energy: f64 = energy
            .parse()
            .map_err(|_| self.malformed(format!("invalid energy '{}'", energy)))?;

        Ok(TrajectoryRow {
            id,
            time,
            occupancy: occupancy.to_string(),
            structure: structure.to_string(),
            energy_centi: to_centi(energy),
        })
    }

    fn malformed(&self, reason: String) -> ValidationError {
        ValidationError::MalformedTable {
            file: self.path.clone(),
            line: self.line_no,
            reason,
        }
    }
}

impl<R: BufRead> Iterator for TrajectoryReader<R> {
    type Item = Result<TrajectoryRow, ConvertError>;

    fn next(&mut self) -> Option<Self::Item> {
        let line = match self.lines.next()? {
            Ok(line) => line,
            Err(e) => return Some(Err(e.into())),
        };
        self.line_no += 1;
        Some(self.parse_row(&line).map_err(ConvertError::from))
    }
}

fn format_combined_row(row: &CombinedRow) -> String {
    let occupancy = match row.occupancy {
        Occupancy::Count(count) => format!("{:>5}", count),
        Occupancy::Fraction(fraction) => format!("{:.4}", fraction),
    };
    format!(
        "{:>5} {:13.9} {} {} {}",
        row.id,
        row.time,
        occupancy,
        row.structure,
        format_centi(row.energy_centi)
    )
}

/// Write the combined table of an aggregation
///
/// **Public** - final output of the `combine` step
pub fn write_combined_table(rows: &[CombinedRow], output_path: impl AsRef<Path>) -> Result<(), OutputError> {
    let output_path = output_path.as_ref();
    info!("Writing combined table to: {}", output_path.display());

    let mut out = create_output_file(output_path)?;
    writeln!(out, "{}", DRF_HEADER)?;
    for row in rows {
        writeln!(out, "{}", format_combined_row(row))?;
    }
    out.flush()?;

    info!("Combined table written successfully ({} rows)", rows.len());
    Ok(())
}

/// Write the final-grid-point distribution (`*.kp8`)
///
/// One line per structure: `structure count energy`, lowest energy first.
pub fn write_final_distribution(
    tallies: &[StructureTally],
    output_path: impl AsRef<Path>,
) -> Result<(), OutputError> {
    let output_path = output_path.as_ref();
    info!("Writing final distribution to: {}", output_path.display());

    let mut out = create_output_file(output_path)?;
    for tally in tallies {
        writeln!(
            out,
            "{} {:>5} {}",
            tally.structure,
            tally.count,
            format_centi(tally.energy_centi)
        )?;
    }
    out.flush()?;
    Ok(())
}
