//! Triggerscan Core — weekly trigger screening engine.
//!
//! This crate contains the pure, I/O-free part of the screener:
//! - Domain types (weekly records, positional time-series table)
//! - Row predicates (close above open, new N-week low, volume surge)
//! - Trigger set construction (sorted intersection + boundary policy)
//! - Forward outcome analysis (first-hit Low/Close violations over 4 weeks)
//! - Report aggregation (trigger ratio, percentages, summary rows)

pub mod domain;
pub mod outcome;
pub mod params;
pub mod predicates;
pub mod report;
pub mod screen;
pub mod trigger;

pub use domain::{TimeSeriesTable, WeeklyRecord};
pub use outcome::{ForwardOutcomeAnalyzer, OutcomeCounters, PriceField, TriggerOutcome};
pub use params::{BoundaryPolicy, ParamsError, ScreenParams, DEFAULT_LOOKBACK, HORIZON_WEEKS};
pub use predicates::{PredicateEvaluator, PredicateSets, RowPredicate};
pub use report::{ReportAggregator, SeriesReport, SummaryRow, DEFAULT_SUMMARY_DECIMALS};
pub use screen::{screen, ScreenOutcome};
