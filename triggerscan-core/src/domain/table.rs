//! TimeSeriesTable — immutable, positionally indexed weekly series.
//!
//! All window lookups are bounds-checked and return empty slices near the
//! edges instead of panicking.

use serde::{Deserialize, Serialize};

use super::record::WeeklyRecord;

/// Ordered sequence of weekly records. Index `i` is the i-th week.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesTable {
    records: Vec<WeeklyRecord>,
}

impl TimeSeriesTable {
    pub fn new(records: Vec<WeeklyRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&WeeklyRecord> {
        self.records.get(index)
    }

    pub fn records(&self) -> &[WeeklyRecord] {
        &self.records
    }

    /// The `n` rows strictly before `index`.
    ///
    /// Empty when fewer than `n` rows precede `index`, when `n == 0`, or when
    /// `index` is out of range.
    pub fn prior_window(&self, index: usize, n: usize) -> &[WeeklyRecord] {
        if n == 0 || index < n || index >= self.records.len() {
            return &[];
        }
        &self.records[index - n..index]
    }

    /// Up to `k` rows strictly after `index`, truncated at the end of the table.
    pub fn forward_window(&self, index: usize, k: usize) -> &[WeeklyRecord] {
        if index >= self.records.len() {
            return &[];
        }
        let start = index + 1;
        let end = start.saturating_add(k).min(self.records.len());
        &self.records[start..end]
    }

    /// Number of rows available after `index`.
    pub fn rows_after(&self, index: usize) -> usize {
        self.records.len().saturating_sub(index + 1)
    }

    /// Rows at `indices` paired with their position, skipping out-of-range ones.
    pub fn select(&self, indices: &[usize]) -> Vec<(usize, &WeeklyRecord)> {
        indices
            .iter()
            .filter_map(|&i| self.records.get(i).map(|r| (i, r)))
            .collect()
    }
}

impl From<Vec<WeeklyRecord>> for TimeSeriesTable {
    fn from(records: Vec<WeeklyRecord>) -> Self {
        Self::new(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_table(lows: &[f64]) -> TimeSeriesTable {
        lows.iter()
            .enumerate()
            .map(|(i, &low)| WeeklyRecord {
                date: format!("w{i}"),
                open: low + 1.0,
                high: low + 2.0,
                low,
                close: low + 1.5,
                volume: 100.0,
                volume_average: 100.0,
            })
            .collect::<Vec<_>>()
            .into()
    }

    #[test]
    fn prior_window_returns_preceding_rows() {
        let table = make_table(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let window = table.prior_window(5, 3);
        let lows: Vec<f64> = window.iter().map(|r| r.low).collect();
        assert_eq!(lows, vec![3.0, 4.0, 5.0]);
    }

    #[test]
    fn prior_window_empty_near_start() {
        let table = make_table(&[1.0, 2.0, 3.0]);
        assert!(table.prior_window(2, 3).is_empty());
        assert!(table.prior_window(0, 1).is_empty());
        assert_eq!(table.prior_window(2, 2).len(), 2);
    }

    #[test]
    fn prior_window_empty_out_of_range_or_zero() {
        let table = make_table(&[1.0, 2.0, 3.0]);
        assert!(table.prior_window(10, 2).is_empty());
        assert!(table.prior_window(2, 0).is_empty());
    }

    #[test]
    fn forward_window_truncates_at_end() {
        let table = make_table(&[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(table.forward_window(0, 4).len(), 3);
        assert_eq!(table.forward_window(1, 2).len(), 2);
        assert!(table.forward_window(3, 4).is_empty());
        assert!(table.forward_window(9, 4).is_empty());
    }

    #[test]
    fn forward_window_huge_k_does_not_overflow() {
        let table = make_table(&[1.0, 2.0]);
        assert_eq!(table.forward_window(0, usize::MAX).len(), 1);
    }

    #[test]
    fn rows_after_counts_remaining() {
        let table = make_table(&[1.0, 2.0, 3.0]);
        assert_eq!(table.rows_after(0), 2);
        assert_eq!(table.rows_after(2), 0);
        assert_eq!(table.rows_after(7), 0);
    }

    #[test]
    fn select_skips_out_of_range() {
        let table = make_table(&[1.0, 2.0, 3.0]);
        let rows = table.select(&[0, 2, 5]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].0, 2);
        assert_eq!(rows[1].1.low, 3.0);
    }
}
