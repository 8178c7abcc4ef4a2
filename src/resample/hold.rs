//! Step-hold (zero-order-hold) cursor over the shared time grid.
//!
//! The state is the value currently held and the index of the next grid
//! point that has not been emitted yet. Adapters decide whether a new event
//! is adopted before or after the grid points it makes due are emitted.

use super::grid::TimeGrid;
use super::Sample;
use std::ops::Range;

/// Held value plus emission cursor
#[derive(Debug, Clone)]
pub struct StepHold<'g> {
    grid: &'g TimeGrid,
    cursor: usize,
    held: Sample,
}

impl<'g> StepHold<'g> {
    pub fn new(grid: &'g TimeGrid, initial: Sample) -> Self {
        Self {
            grid,
            cursor: 0,
            held: initial,
        }
    }

    pub fn held(&self) -> &Sample {
        &self.held
    }

    pub fn held_mut(&mut self) -> &mut Sample {
        &mut self.held
    }

    /// Index of the next grid point to emit
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Time of the next grid point to emit
    pub fn next_time(&self) -> Option<f64> {
        self.grid.get(self.cursor)
    }

    /// Whether every grid point has been emitted
    pub fn is_complete(&self) -> bool {
        self.cursor == self.grid.len()
    }

    /// Replace the held value, returning the previous one
    pub fn adopt(&mut self, sample: Sample) -> Sample {
        std::mem::replace(&mut self.held, sample)
    }

    /// Advance over grid points while `due(time)` holds
    ///
    /// # Returns
    /// Indices of the grid points that became due
    pub fn advance_while(&mut self, mut due: impl FnMut(f64) -> bool) -> Range<usize> {
        let start = self.cursor;
        let times = self.grid.times();
        while self.cursor < times.len() && due(times[self.cursor]) {
            self.cursor += 1;
        }
        start..self.cursor
    }

    /// Advance over all grid points with time `<= limit`
    pub fn advance_to(&mut self, limit: f64) -> Range<usize> {
        self.advance_while(|time| time <= limit)
    }

    /// Advance over exactly one grid point, if any remains
    pub fn step(&mut self) -> Option<usize> {
        if self.is_complete() {
            return None;
        }
        self.cursor += 1;
        Some(self.cursor - 1)
    }

    /// Advance over all remaining grid points
    pub fn drain(&mut self) -> Range<usize> {
        let start = self.cursor;
        self.cursor = self.grid.len();
        start..self.cursor
    }

    /// Rewind to the first grid point for the next run
    pub fn reset(&mut self, initial: Sample) {
        self.cursor = 0;
        self.held = initial;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resample::grid::GridConfig;

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

    #[test]
    fn test_advance_to_is_inclusive() {
        let grid = grid();
        let mut hold = StepHold::new(&grid, Sample::unfolded());

        assert_eq!(hold.advance_to(1.0), 0..3);
        assert_eq!(hold.advance_to(1.2), 3..3);
        assert_eq!(hold.next_time(), Some(1.5));
        assert_eq!(hold.drain(), 3..7);
        assert!(hold.is_complete());
        assert_eq!(hold.step(), None);
    }

    #[test]
    fn test_adopt_returns_previous_value() {
        let grid = grid();
        let mut hold = StepHold::new(&grid, Sample::unfolded());
        let previous = hold.adopt(Sample::new("()", -1.0));

        assert_eq!(previous.structure, ".");
        assert_eq!(hold.held().structure, "()");
    }

    #[test]
    fn test_reset_rewinds_cursor() {
        let grid = grid();
        let mut hold = StepHold::new(&grid, Sample::new("()", -1.0));
        hold.drain();
        hold.reset(Sample::unfolded());

        assert_eq!(hold.cursor(), 0);
        assert_eq!(hold.held().structure, ".");
        assert_eq!(hold.step(), Some(0));
    }
}
