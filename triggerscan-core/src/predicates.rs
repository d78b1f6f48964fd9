//! Row predicates — the three conditions that make up a trigger week.
//!
//! Each predicate is a pure function of the table and returns the sorted row
//! indices where it holds. Rows whose inputs are NaN are left out rather than
//! treated as errors.
//!
//! - `BearishOpen`: Close > Open (the name follows the screener's historic
//!   label for the condition)
//! - `NewLow`: Low below the minimum Low of the preceding `lookback` rows
//! - `VolumeSurge`: Volume > VolumeAverage

use serde::{Deserialize, Serialize};

use crate::domain::{TimeSeriesTable, WeeklyRecord};
use crate::params::{ParamsError, ScreenParams};

/// A row-level condition over a weekly table.
pub trait RowPredicate: Send + Sync {
    /// Human-readable name (e.g. "new_low_5").
    fn name(&self) -> &str;

    /// First row index at which the predicate can hold.
    fn first_row(&self) -> usize {
        0
    }

    /// Whether the predicate holds at `index`. Out-of-range indices never hold.
    fn holds(&self, table: &TimeSeriesTable, index: usize) -> bool;

    /// All row indices where the predicate holds, ascending.
    fn matching_rows(&self, table: &TimeSeriesTable) -> Vec<usize> {
        (self.first_row()..table.len())
            .filter(|&i| self.holds(table, i))
            .collect()
    }
}

/// Close > Open.
#[derive(Debug, Clone, Default)]
pub struct BearishOpen;

impl RowPredicate for BearishOpen {
    fn name(&self) -> &str {
        "close_gt_open"
    }

    fn holds(&self, table: &TimeSeriesTable, index: usize) -> bool {
        table.get(index).is_some_and(WeeklyRecord::closed_above_open)
    }
}

/// Volume > VolumeAverage.
#[derive(Debug, Clone, Default)]
pub struct VolumeSurge;

impl RowPredicate for VolumeSurge {
    fn name(&self) -> &str {
        "volume_gt_average"
    }

    fn holds(&self, table: &TimeSeriesTable, index: usize) -> bool {
        table.get(index).is_some_and(WeeklyRecord::volume_above_average)
    }
}

/// Low strictly below every Low in the preceding `lookback` rows.
#[derive(Debug, Clone)]
pub struct NewLow {
    lookback: usize,
    first_row: usize,
    name: String,
}

impl NewLow {
    pub fn new(lookback: usize, warmup_rows: usize) -> Result<Self, ParamsError> {
        if lookback == 0 {
            return Err(ParamsError::ZeroLookback);
        }
        Ok(Self {
            lookback,
            first_row: warmup_rows.max(lookback),
            name: format!("new_low_{lookback}"),
        })
    }

    pub fn lookback(&self) -> usize {
        self.lookback
    }
}

impl RowPredicate for NewLow {
    fn name(&self) -> &str {
        &self.name
    }

    fn first_row(&self) -> usize {
        self.first_row
    }

    fn holds(&self, table: &TimeSeriesTable, index: usize) -> bool {
        if index < self.first_row {
            return false;
        }
        let Some(row) = table.get(index) else {
            return false;
        };
        let window = table.prior_window(index, self.lookback);
        if window.is_empty() || row.low.is_nan() {
            return false;
        }

        let mut min_low = f64::INFINITY;
        for prior in window {
            if prior.low.is_nan() {
                return false;
            }
            if prior.low < min_low {
                min_low = prior.low;
            }
        }
        row.low < min_low
    }
}

/// Row sets produced by the three predicates for one table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredicateSets {
    pub bearish_open: Vec<usize>,
    pub new_low: Vec<usize>,
    pub volume_surge: Vec<usize>,
}

impl PredicateSets {
    /// The sets that take part in the trigger intersection.
    pub fn active_sets(&self, require_volume_surge: bool) -> Vec<&[usize]> {
        let mut sets = vec![self.bearish_open.as_slice(), self.new_low.as_slice()];
        if require_volume_surge {
            sets.push(self.volume_surge.as_slice());
        }
        sets
    }
}

/// Evaluates all three predicates for a table.
#[derive(Debug, Clone)]
pub struct PredicateEvaluator {
    bearish_open: BearishOpen,
    new_low: NewLow,
    volume_surge: VolumeSurge,
}

impl PredicateEvaluator {
    pub fn new(params: &ScreenParams) -> Result<Self, ParamsError> {
        Ok(Self {
            bearish_open: BearishOpen,
            new_low: NewLow::new(params.lookback, params.first_new_low_row())?,
            volume_surge: VolumeSurge,
        })
    }

    pub fn evaluate(&self, table: &TimeSeriesTable) -> PredicateSets {
        PredicateSets {
            bearish_open: self.bearish_open.matching_rows(table),
            new_low: self.new_low.matching_rows(table),
            volume_surge: self.volume_surge.matching_rows(table),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a table from (open, low, close, volume, volume_average) tuples.
    fn make_table(rows: &[(f64, f64, f64, f64, f64)]) -> TimeSeriesTable {
        rows.iter()
            .enumerate()
            .map(|(i, &(open, low, close, volume, volume_average))| WeeklyRecord {
                date: format!("2020-01-{:02}", i + 1),
                open,
                high: open.max(close) + 1.0,
                low,
                close,
                volume,
                volume_average,
            })
            .collect::<Vec<_>>()
            .into()
    }

    fn lows_table(lows: &[f64]) -> TimeSeriesTable {
        make_table(
            &lows
                .iter()
                .map(|&l| (l + 1.0, l, l + 2.0, 10.0, 5.0))
                .collect::<Vec<_>>(),
        )
    }

    #[test]
    fn bearish_open_matches_close_above_open() {
        let table = make_table(&[
            (10.0, 9.0, 11.0, 1.0, 1.0),
            (11.0, 9.0, 10.0, 1.0, 1.0),
            (10.0, 9.0, 10.0, 1.0, 1.0),
            (10.0, 9.0, 12.0, 1.0, 1.0),
        ]);
        assert_eq!(BearishOpen.matching_rows(&table), vec![0, 3]);
    }

    #[test]
    fn volume_surge_skips_nan_average() {
        let table = make_table(&[
            (10.0, 9.0, 11.0, 200.0, 100.0),
            (10.0, 9.0, 11.0, 200.0, f64::NAN),
            (10.0, 9.0, 11.0, 50.0, 100.0),
            (10.0, 9.0, 11.0, 100.0, 100.0),
        ]);
        assert_eq!(VolumeSurge.matching_rows(&table), vec![0]);
    }

    #[test]
    fn new_low_requires_strictly_lower_low() {
        // [5] = 3 < min(8,7,6,5,4); [6] = 4 is not below min(7,6,5,4,3); [7] = 2 < 3
        let table = lows_table(&[8.0, 7.0, 6.0, 5.0, 4.0, 3.0, 4.0, 2.0]);
        let p = NewLow::new(5, 5).unwrap();
        assert_eq!(p.matching_rows(&table), vec![5, 7]);
    }

    #[test]
    fn new_low_tie_is_not_new_low() {
        let table = lows_table(&[5.0, 6.0, 7.0, 8.0, 9.0, 5.0]);
        assert!(NewLow::new(5, 5).unwrap().matching_rows(&table).is_empty());
    }

    #[test]
    fn new_low_respects_warmup() {
        let table = lows_table(&[8.0, 7.0, 6.0, 5.0, 4.0, 3.0, 2.0, 1.0]);
        assert_eq!(NewLow::new(5, 5).unwrap().matching_rows(&table), vec![5, 6, 7]);
        assert_eq!(NewLow::new(5, 7).unwrap().matching_rows(&table), vec![7]);
    }

    #[test]
    fn new_low_warmup_never_below_lookback() {
        let p = NewLow::new(5, 0).unwrap();
        assert_eq!(p.first_row(), 5);
    }

    #[test]
    fn new_low_nan_in_window_excludes_row() {
        let mut table_rows: Vec<(f64, f64, f64, f64, f64)> = [9.0, 8.0, 7.0, 6.0, 5.0, 4.0]
            .iter()
            .map(|&l| (l + 1.0, l, l + 2.0, 10.0, 5.0))
            .collect();
        table_rows[2].1 = f64::NAN;
        let table = make_table(&table_rows);
        assert!(NewLow::new(5, 5).unwrap().matching_rows(&table).is_empty());
    }

    #[test]
    fn new_low_on_short_table_is_empty() {
        let table = lows_table(&[5.0, 4.0, 3.0]);
        assert!(NewLow::new(5, 5).unwrap().matching_rows(&table).is_empty());
    }

    #[test]
    fn zero_lookback_is_an_error() {
        assert_eq!(NewLow::new(0, 5).unwrap_err(), ParamsError::ZeroLookback);
        let params = ScreenParams {
            lookback: 0,
            ..Default::default()
        };
        assert_eq!(
            PredicateEvaluator::new(&params).unwrap_err(),
            ParamsError::ZeroLookback
        );
    }

    #[test]
    fn predicate_names() {
        assert_eq!(NewLow::new(5, 5).unwrap().name(), "new_low_5");
        assert_eq!(BearishOpen.name(), "close_gt_open");
        assert_eq!(VolumeSurge.name(), "volume_gt_average");
    }

    #[test]
    fn active_sets_drops_volume_when_disabled() {
        let sets = PredicateSets {
            bearish_open: vec![1],
            new_low: vec![1],
            volume_surge: vec![],
        };
        assert_eq!(sets.active_sets(true).len(), 3);
        assert_eq!(sets.active_sets(false).len(), 2);
    }

    #[test]
    fn evaluator_uses_params() {
        let table = lows_table(&[8.0, 7.0, 6.0, 5.0, 4.0, 3.0, 2.0]);
        let params = ScreenParams {
            lookback: 3,
            ..Default::default()
        };
        let sets = PredicateEvaluator::new(&params).unwrap().evaluate(&table);
        assert_eq!(sets.new_low, vec![3, 4, 5, 6]);
        assert_eq!(sets.bearish_open.len(), 7);
        assert_eq!(sets.volume_surge.len(), 7);
    }
}
