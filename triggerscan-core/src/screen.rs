//! One screening pass over a table.
//!
//! predicates → trigger intersection → boundary policy → forward outcomes →
//! report. Pure and deterministic: the same table and parameters always give
//! the same `ScreenOutcome`.

use serde::{Deserialize, Serialize};

use crate::domain::TimeSeriesTable;
use crate::outcome::{ForwardOutcomeAnalyzer, OutcomeCounters, TriggerOutcome};
use crate::params::{ParamsError, ScreenParams};
use crate::predicates::{PredicateEvaluator, PredicateSets};
use crate::report::{ReportAggregator, SeriesReport};
use crate::trigger::{apply_boundary, intersect};

/// Everything produced by a screening pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenOutcome {
    pub predicates: PredicateSets,
    /// Sorted ascending.
    pub triggers: Vec<usize>,
    pub outcomes: Vec<TriggerOutcome>,
    pub report: SeriesReport,
}

impl ScreenOutcome {
    pub fn counters(&self) -> &OutcomeCounters {
        &self.report.counters
    }
}

/// Run a full screening pass.
pub fn screen(table: &TimeSeriesTable, params: &ScreenParams) -> Result<ScreenOutcome, ParamsError> {
    params.validate()?;

    let predicates = PredicateEvaluator::new(params)?.evaluate(table);
    let triggers = intersect(&predicates.active_sets(params.require_volume_surge));
    let triggers = apply_boundary(triggers, table, params.boundary);

    let (outcomes, counters) = ForwardOutcomeAnalyzer::new(table).analyze(&triggers);
    let report = ReportAggregator::finalize(counters, table.len());

    Ok(ScreenOutcome {
        predicates,
        triggers,
        outcomes,
        report,
    })
}
