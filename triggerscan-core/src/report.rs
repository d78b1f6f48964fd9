//! Report aggregation — counters to ratios and percentages.
//!
//! Two shapes:
//! - `SeriesReport`: raw counts plus unrounded ratios for one series
//! - `SummaryRow`: one row of the multi-series table, violation percentages
//!   rounded to a fixed number of decimals
//!
//! A series with zero triggers has no percentages at all. It produces no
//! summary row and is reported as such instead of as "0%".

use serde::{Deserialize, Serialize};

use crate::outcome::OutcomeCounters;
use crate::params::HORIZON_WEEKS;

/// Default rounding for summary-table percentages.
pub const DEFAULT_SUMMARY_DECIMALS: u32 = 4;

/// Percentages that only exist when the series has at least one trigger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerPercentages {
    /// Share of triggers whose following week closed above its open. A
    /// trigger on the last row has no following week and counts as not up.
    pub next_week_up_pct: f64,
    pub low_violation_pct: [f64; HORIZON_WEEKS],
    pub close_violation_pct: [f64; HORIZON_WEEKS],
}

/// Detailed report for one series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesReport {
    pub total_rows: usize,
    pub counters: OutcomeCounters,
    /// Triggers / total rows. Zero when there are no triggers.
    pub trigger_ratio: f64,
    /// `None` when the series has no triggers.
    pub percentages: Option<TriggerPercentages>,
}

impl SeriesReport {
    pub fn trigger_count(&self) -> usize {
        self.counters.triggers
    }

    pub fn has_triggers(&self) -> bool {
        self.counters.triggers > 0
    }

    /// Summary-table row for this series, or `None` when it has no triggers.
    pub fn summary_row(&self, code: &str, decimals: u32) -> Option<SummaryRow> {
        let pct = self.percentages.as_ref()?;
        Some(SummaryRow {
            code: code.to_string(),
            trigger_ratio: self.trigger_ratio,
            next_week_up_pct: pct.next_week_up_pct,
            low_violation_pct: pct.low_violation_pct.map(|p| round_to(p, decimals)),
            close_violation_pct: pct.close_violation_pct.map(|p| round_to(p, decimals)),
        })
    }
}

/// One row of the multi-series summary table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub code: String,
    pub trigger_ratio: f64,
    pub next_week_up_pct: f64,
    pub low_violation_pct: [f64; HORIZON_WEEKS],
    pub close_violation_pct: [f64; HORIZON_WEEKS],
}

/// Turns finished counters into a `SeriesReport`.
pub struct ReportAggregator;

impl ReportAggregator {
    pub fn finalize(counters: OutcomeCounters, total_rows: usize) -> SeriesReport {
        let triggers = counters.triggers;
        let trigger_ratio = if total_rows == 0 {
            0.0
        } else {
            triggers as f64 / total_rows as f64
        };

        let percentages = (triggers > 0).then(|| TriggerPercentages {
            next_week_up_pct: percentage(counters.next_week_up, triggers),
            low_violation_pct: counters.low_violations.map(|c| percentage(c, triggers)),
            close_violation_pct: counters.close_violations.map(|c| percentage(c, triggers)),
        });

        SeriesReport {
            total_rows,
            counters,
            trigger_ratio,
            percentages,
        }
    }
}

/// `count / total × 100`, zero when `total` is zero.
pub fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 * 100.0 / total as f64
    }
}

/// Round half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}
