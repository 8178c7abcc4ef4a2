//! Combine per-run trajectory files into one table.
//!
//! Every trajectory file holds one or more runs of exactly `len(grid)` rows.
//! Rows are tallied per grid point and keyed by the structure padded to the
//! full length, so partial structures of different runs meet under one id.

use super::registry::StructureRegistry;
use crate::output::{TrajectoryReader, TrajectoryRow};
use crate::parser::structure::pad_structure;
use crate::resample::grid::TimeGrid;
use crate::utils::error::{ConsistencyError, ConvertError, ValidationError};
use log::{debug, info};
use std::collections::HashMap;
use std::io::BufRead;
use std::path::{Path, PathBuf};

/// Occupancy column of a combined row
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Occupancy {
    /// Number of runs in the structure
    Count(u64),
    /// Fraction of runs in the structure
    Fraction(f64),
}

/// One row of the combined table
#[derive(Debug, Clone, PartialEq)]
pub struct CombinedRow {
    pub id: usize,
    pub time: f64,
    pub occupancy: Occupancy,
    /// Structure padded to the full length
    pub structure: String,
    pub energy_centi: i64,
}

/// Count and latest energy of one structure at one grid point
#[derive(Debug, Clone, PartialEq)]
pub struct StructureTally {
    pub structure: String,
    pub count: u64,
    pub energy_centi: i64,
}

/// Tallies of one grid point in first-seen order
#[derive(Debug, Clone, Default)]
struct PointRecord {
    tallies: Vec<StructureTally>,
    index: HashMap<String, usize>,
}

impl PointRecord {
    fn record(&mut self, structure: String, energy_centi: i64) {
        match self.index.get(&structure) {
            Some(&i) => {
                let tally = &mut self.tallies[i];
                tally.count += 1;
                tally.energy_centi = energy_centi;
            }
            None => {
                self.index.insert(structure.clone(), self.tallies.len());
                self.tallies.push(StructureTally {
                    structure,
                    count: 1,
                    energy_centi,
                });
            }
        }
    }

    /// Tallies ordered by energy, ties broken by structure
    fn sorted(&self) -> Vec<&StructureTally> {
        let mut tallies: Vec<&StructureTally> = self.tallies.iter().collect();
        tallies.sort_by(|a, b| {
            a.energy_centi
                .cmp(&b.energy_centi)
                .then_with(|| a.structure.cmp(&b.structure))
        });
        tallies
    }
}

/// Result of one aggregation
#[derive(Debug, Clone, PartialEq)]
pub struct CombinedTable {
    pub rows: Vec<CombinedRow>,

    /// Last grid point, lowest energy first
    pub final_distribution: Vec<StructureTally>,

    pub runs: usize,
    pub files: usize,
    pub structures: usize,
}

/// In-progress aggregation over one grid
///
/// **Public** - feed trajectory files with [`Aggregation::add_file`], then
/// call [`Aggregation::finish`]
#[derive(Debug)]
pub struct Aggregation<'g> {
    grid: &'g TimeGrid,
    seqlen: usize,
    records: Vec<PointRecord>,
    runs: usize,
    files: usize,
}

impl<'g> Aggregation<'g> {
    /// # Arguments
    /// * `grid` - grid every file must have been sampled on
    /// * `seqlen` - full length used for padding
    pub fn new(grid: &'g TimeGrid, seqlen: usize) -> Self {
        Self {
            grid,
            seqlen,
            records: vec![PointRecord::default(); grid.len()],
            runs: 0,
            files: 0,
        }
    }

    pub fn runs(&self) -> usize {
        self.runs
    }

    pub fn files(&self) -> usize {
        self.files
    }

    /// Add all runs of one trajectory file
    ///
    /// # Returns
    /// Number of runs the file contributed
    pub fn add_file(&mut self, path: &Path) -> Result<usize, ConvertError> {
        debug!("Reading trajectory: {}", path.display());
        self.add_reader(TrajectoryReader::open(path)?)
    }

    /// Add all runs read from `reader`
    ///
    /// # Errors
    /// * `ValidationError::MalformedTable` - unparseable row or a structure
    ///   longer than the full length
    /// * `ConsistencyError::GridMismatch` - a row time differs from its grid time
    /// * `ConsistencyError::IncompleteRun` - the file ends inside a run or
    ///   holds no complete run
    pub fn add_reader<R: BufRead>(&mut self, reader: TrajectoryReader<R>) -> Result<usize, ConvertError> {
        let path = reader.path().to_path_buf();
        let points = self.grid.len();
        let mut rows = 0;

        for row in reader {
            let TrajectoryRow {
                time,
                structure,
                energy_centi,
                ..
            } = row?;
            let index = rows % points;

            if !self.grid.matches(index, time) {
                return Err(ConsistencyError::GridMismatch {
                    file: path,
                    index,
                    expected: self.grid.times()[index],
                    actual: time,
                }
                .into());
            }
            if structure.len() > self.seqlen {
                return Err(ValidationError::MalformedTable {
                    file: path,
                    line: rows + 2,
                    reason: format!(
                        "structure of length {} exceeds the full length {}",
                        structure.len(),
                        self.seqlen
                    ),
                }
                .into());
            }

            self.records[index].record(pad_structure(&structure, self.seqlen), energy_centi);
            rows += 1;
        }

        if rows == 0 || rows % points != 0 {
            return Err(ConsistencyError::IncompleteRun {
                reached: rows % points,
                expected: points,
                context: format!("{} ends inside a run", path.display()),
            }
            .into());
        }

        let runs = rows / points;
        self.runs += runs;
        self.files += 1;
        debug!("{}: {} run(s)", path.display(), runs);
        Ok(runs)
    }

    /// Assign ids and build the combined table
    ///
    /// # Arguments
    /// * `use_counts` - report raw counts instead of fractions
    pub fn finish(self, use_counts: bool) -> CombinedTable {
        let mut registry = StructureRegistry::new();
        for record in &self.records {
            for tally in &record.tallies {
                registry.id_for(&tally.structure);
            }
        }

        let times = self.grid.times();
        let runs = self.runs as f64;
        let mut rows = Vec::new();

        for (record, &time) in self.records.iter().zip(times) {
            for tally in record.sorted() {
                let occupancy = if use_counts {
                    Occupancy::Count(tally.count)
                } else {
                    Occupancy::Fraction(tally.count as f64 / runs)
                };
                rows.push(CombinedRow {
                    // Every tallied structure was registered above
                    id: registry.get(&tally.structure).unwrap_or_default(),
                    time,
                    occupancy,
                    structure: tally.structure.clone(),
                    energy_centi: tally.energy_centi,
                });
            }
        }

        let final_distribution = self
            .records
            .last()
            .map(|record| record.sorted().into_iter().cloned().collect())
            .unwrap_or_default();

        CombinedTable {
            rows,
            final_distribution,
            runs: self.runs,
            files: self.files,
            structures: registry.len(),
        }
    }
}

/// Combine trajectory files into one table
///
/// **Public** - main entry point for aggregation
///
/// # Arguments
/// * `paths` - trajectory files, processed in the given order
/// * `grid` - grid all files were sampled on
/// * `seqlen` - full length
/// * `use_counts` - report raw counts instead of fractions
pub fn combine_trajectories(
    paths: &[PathBuf],
    grid: &TimeGrid,
    seqlen: usize,
    use_counts: bool,
) -> Result<CombinedTable, ConvertError> {
    let mut aggregation = Aggregation::new(grid, seqlen);
    for path in paths {
        aggregation.add_file(path)?;
    }

    info!(
        "Parsed {} simulation(s) from {} file(s)",
        aggregation.runs(),
        aggregation.files()
    );
    Ok(aggregation.finish(use_counts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resample::grid::GridConfig;
    use pretty_assertions::assert_eq;

    // Grid: 0 .5 1 1.5 2 2.449.. 3
    fn grid() -> TimeGrid {
        GridConfig {
            seqlen: 2,
            t_ext: 1.0,
            t_end: 1.0,
            t_lin: 2,
            t_log: 2,
        }
        .build()
        .unwrap()
    }

    fn table(runs: &[[(&str, &str); 7]]) -> String {
        let times = grid().times().to_vec();
        let mut text = String::from("id time occupancy structure energy\n");
        for run in runs {
            for (time, (structure, energy)) in times.iter().zip(run) {
                text.push_str(&format!("    0 {:13.9} 1 {} {}\n", time, structure, energy));
            }
        }
        text
    }

    fn add(aggregation: &mut Aggregation, text: &str) -> Result<usize, ConvertError> {
        aggregation.add_reader(TrajectoryReader::new(text.as_bytes(), "mem.drf").unwrap())
    }

    const RUN_A: [(&str, &str); 7] = [
        (".", "0.00"),
        (".", "0.00"),
        (".", "0.00"),
        ("..", "0.00"),
        ("..", "0.00"),
        ("()", "-1.00"),
        ("()", "-1.00"),
    ];
    const RUN_B: [(&str, &str); 7] = [
        (".", "0.00"),
        (".", "0.00"),
        (".", "0.00"),
        ("..", "0.00"),
        ("()", "-1.00"),
        ("..", "0.00"),
        ("..", "0.00"),
    ];

    #[test]
    fn test_fractions_sum_to_one() {
        let grid = grid();
        let mut aggregation = Aggregation::new(&grid, 2);
        add(&mut aggregation, &table(&[RUN_A, RUN_B])).unwrap();
        add(&mut aggregation, &table(&[RUN_A])).unwrap();
        let combined = aggregation.finish(false);

        assert_eq!(combined.runs, 3);
        assert_eq!(combined.files, 2);
        for &time in grid.times() {
            let total: f64 = combined
                .rows
                .iter()
                .filter(|row| row.time == time)
                .map(|row| match row.occupancy {
                    Occupancy::Fraction(f) => f,
                    Occupancy::Count(_) => unreachable!(),
                })
                .sum();
            assert!((total - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_ids_follow_time_then_first_sight() {
        let grid = grid();
        let mut aggregation = Aggregation::new(&grid, 2);
        add(&mut aggregation, &table(&[RUN_A, RUN_B])).unwrap();
        let combined = aggregation.finish(true);

        // "." and ".." pad to the same structure
        let ids: Vec<(usize, &str)> = combined
            .rows
            .iter()
            .map(|row| (row.id, row.structure.as_str()))
            .collect();
        assert_eq!(ids[0], (0, ".."));
        assert!(ids.contains(&(1, "()")));
        assert_eq!(combined.structures, 2);

        // Grid point 4 (t = 2) holds both, lowest energy first
        let at_two: Vec<&CombinedRow> = combined.rows.iter().filter(|r| r.time == 2.0).collect();
        assert_eq!(at_two[0].structure, "()");
        assert_eq!(at_two[0].occupancy, Occupancy::Count(1));
        assert_eq!(at_two[1].structure, "..");
    }

    #[test]
    fn test_file_order_does_not_change_rows() {
        let grid = grid();
        let combine = |first: &str, second: &str| {
            let mut aggregation = Aggregation::new(&grid, 2);
            add(&mut aggregation, first).unwrap();
            add(&mut aggregation, second).unwrap();
            aggregation.finish(false)
        };
        let (a, b) = (table(&[RUN_A]), table(&[RUN_B]));
        let forward = combine(&a, &b);
        let backward = combine(&b, &a);

        let content = |table: &CombinedTable| -> Vec<(f64, String, Occupancy, i64)> {
            table
                .rows
                .iter()
                .map(|r| (r.time, r.structure.clone(), r.occupancy, r.energy_centi))
                .collect()
        };
        assert_eq!(content(&forward), content(&backward));
        assert_eq!(forward.final_distribution, backward.final_distribution);

        for combined in [&forward, &backward] {
            let mut seen: HashMap<&str, usize> = HashMap::new();
            for row in &combined.rows {
                assert_eq!(*seen.entry(&row.structure).or_insert(row.id), row.id);
            }
            let mut ids: Vec<usize> = seen.values().copied().collect();
            ids.sort();
            ids.dedup();
            assert_eq!(ids.len(), combined.structures);
        }
    }

    #[test]
    fn test_final_distribution() {
        let grid = grid();
        let mut aggregation = Aggregation::new(&grid, 2);
        add(&mut aggregation, &table(&[RUN_A, RUN_B, RUN_A])).unwrap();
        let combined = aggregation.finish(false);

        assert_eq!(
            combined.final_distribution,
            vec![
                StructureTally {
                    structure: "()".to_string(),
                    count: 2,
                    energy_centi: -100,
                },
                StructureTally {
                    structure: "..".to_string(),
                    count: 1,
                    energy_centi: 0,
                },
            ]
        );
    }

    #[test]
    fn test_grid_mismatch_names_file_and_index() {
        let grid = grid();
        let mut aggregation = Aggregation::new(&grid, 2);
        let text = table(&[RUN_A]).replace("  1.500000000", "  1.600000000");

        match add(&mut aggregation, &text) {
            Err(ConvertError::Consistency(ConsistencyError::GridMismatch {
                file,
                index,
                expected,
                actual,
            })) => {
                assert_eq!(file, PathBuf::from("mem.drf"));
                assert_eq!(index, 3);
                assert_eq!(expected, 1.5);
                assert_eq!(actual, 1.6);
            }
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_truncated_file_is_incomplete() {
        let grid = grid();
        let mut aggregation = Aggregation::new(&grid, 2);
        let text = table(&[RUN_A]);
        let truncated: String = text.lines().take(5).map(|l| format!("{}\n", l)).collect();

        assert!(matches!(
            add(&mut aggregation, &truncated),
            Err(ConvertError::Consistency(ConsistencyError::IncompleteRun {
                reached: 4,
                expected: 7,
                ..
            }))
        ));
        assert!(matches!(
            add(&mut aggregation, "id time occupancy structure energy\n"),
            Err(ConvertError::Consistency(
                ConsistencyError::IncompleteRun { .. }
            ))
        ));
    }

    #[test]
    fn test_overlong_structure_is_rejected() {
        let grid = grid();
        let mut aggregation = Aggregation::new(&grid, 1);

        assert!(matches!(
            add(&mut aggregation, &table(&[RUN_A])),
            Err(ConvertError::Validation(
                ValidationError::MalformedTable { .. }
            ))
        ));
    }
}
