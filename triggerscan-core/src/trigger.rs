//! Trigger set — rows present in every active predicate set.

use std::collections::BTreeSet;

use crate::domain::TimeSeriesTable;
use crate::params::{BoundaryPolicy, HORIZON_WEEKS};

/// Intersect any number of row-index sets.
///
/// The result is sorted ascending and deduplicated, so it does not depend on
/// the order of `sets` or of the indices inside them. No sets, or any empty
/// set, gives an empty result.
pub fn intersect(sets: &[&[usize]]) -> Vec<usize> {
    let Some((first, rest)) = sets.split_first() else {
        return Vec::new();
    };

    let mut acc: BTreeSet<usize> = first.iter().copied().collect();
    for set in rest {
        if acc.is_empty() {
            break;
        }
        let other: BTreeSet<usize> = set.iter().copied().collect();
        acc = acc.intersection(&other).copied().collect();
    }
    acc.into_iter().collect()
}

/// Apply the lookahead boundary policy to a sorted trigger list.
pub fn apply_boundary(
    triggers: Vec<usize>,
    table: &TimeSeriesTable,
    policy: BoundaryPolicy,
) -> Vec<usize> {
    match policy {
        BoundaryPolicy::Partial => triggers,
        BoundaryPolicy::RequireFullHorizon => triggers
            .into_iter()
            .filter(|&i| table.rows_after(i) >= HORIZON_WEEKS)
            .collect(),
    }
}
