//! Forward outcome analysis — what happens in the weeks after each trigger.
//!
//! For a trigger at row `i` the analyzer looks at:
//! - the next week's direction (Close[i+1] > Open[i+1])
//! - the first week k in 1..=4 where the trigger Low is broken (Low[i] > Low[i+k])
//! - the first week k in 1..=4 where the trigger Close is broken (Close[i] > Close[i+k])
//!
//! Only the first violating week is recorded. Ties are not violations, and
//! weeks past the end of the table are "no data".

use serde::{Deserialize, Serialize};

use crate::domain::{TimeSeriesTable, WeeklyRecord};
use crate::params::HORIZON_WEEKS;

/// Price field compared in a violation scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceField {
    Low,
    Close,
}

impl PriceField {
    fn value(self, record: &WeeklyRecord) -> f64 {
        match self {
            PriceField::Low => record.low,
            PriceField::Close => record.close,
        }
    }
}

/// Classification of a single trigger week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerOutcome {
    pub index: usize,
    /// `None` when the trigger is the last row.
    pub next_week_up: Option<bool>,
    /// Week offset (1-based) of the first Low violation.
    pub low_violation_week: Option<usize>,
    /// Week offset (1-based) of the first Close violation.
    pub close_violation_week: Option<usize>,
}

/// Per-series accumulators. Created fresh for each series.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeCounters {
    pub triggers: usize,
    pub next_week_up: usize,
    /// Triggers that had a following week to inspect.
    pub next_week_observed: usize,
    pub low_violations: [usize; HORIZON_WEEKS],
    pub close_violations: [usize; HORIZON_WEEKS],
}

impl OutcomeCounters {
    pub fn record(&mut self, outcome: &TriggerOutcome) {
        self.triggers += 1;
        if let Some(up) = outcome.next_week_up {
            self.next_week_observed += 1;
            if up {
                self.next_week_up += 1;
            }
        }
        if let Some(week) = outcome.low_violation_week {
            self.low_violations[week - 1] += 1;
        }
        if let Some(week) = outcome.close_violation_week {
            self.close_violations[week - 1] += 1;
        }
    }

    pub fn total_low_violations(&self) -> usize {
        self.low_violations.iter().sum()
    }

    pub fn total_close_violations(&self) -> usize {
        self.close_violations.iter().sum()
    }
}

/// First week in the horizon where `field` drops strictly below the trigger's value.
///
/// Returns the 1-based week offset. A NaN on either side is not a violation.
pub fn first_violation(table: &TimeSeriesTable, index: usize, field: PriceField) -> Option<usize> {
    let reference = field.value(table.get(index)?);
    table
        .forward_window(index, HORIZON_WEEKS)
        .iter()
        .position(|later| reference > field.value(later))
        .map(|offset| offset + 1)
}

/// Classifies triggers and accumulates the counters for one series.
#[derive(Debug)]
pub struct ForwardOutcomeAnalyzer<'a> {
    table: &'a TimeSeriesTable,
}

impl<'a> ForwardOutcomeAnalyzer<'a> {
    pub fn new(table: &'a TimeSeriesTable) -> Self {
        Self { table }
    }

    /// Classify one trigger week. Out-of-range triggers classify as "no data".
    pub fn classify(&self, index: usize) -> TriggerOutcome {
        let next_week_up = self
            .table
            .forward_window(index, 1)
            .first()
            .map(WeeklyRecord::closed_above_open);

        TriggerOutcome {
            index,
            next_week_up,
            low_violation_week: first_violation(self.table, index, PriceField::Low),
            close_violation_week: first_violation(self.table, index, PriceField::Close),
        }
    }

    /// Classify every trigger and fold the results into fresh counters.
    pub fn analyze(&self, triggers: &[usize]) -> (Vec<TriggerOutcome>, OutcomeCounters) {
        let mut counters = OutcomeCounters::default();
        let outcomes: Vec<TriggerOutcome> = triggers.iter().map(|&i| self.classify(i)).collect();
        for outcome in &outcomes {
            counters.record(outcome);
        }
        (outcomes, counters)
    }
}
