//! Screening parameters and the lookahead boundary policy.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of weeks scanned after a trigger for violations.
pub const HORIZON_WEEKS: usize = 4;

/// Default lookback for the new-low predicate.
pub const DEFAULT_LOOKBACK: usize = 5;

/// How triggers near the end of the table are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryPolicy {
    /// Keep every trigger; forward offsets past the end count as "no data".
    #[default]
    Partial,
    /// Drop triggers with fewer than `HORIZON_WEEKS` rows after them.
    RequireFullHorizon,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParamsError {
    #[error("lookback must be at least 1 week")]
    ZeroLookback,
}

/// Parameters for one screening pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenParams {
    /// Weeks before a row examined by the new-low predicate.
    pub lookback: usize,
    /// Rows skipped before the new-low predicate is evaluated. `None` means
    /// "just enough to fill the lookback window".
    pub warmup_rows: Option<usize>,
    /// Include the volume-surge predicate in the trigger intersection.
    pub require_volume_surge: bool,
    pub boundary: BoundaryPolicy,
}

impl Default for ScreenParams {
    fn default() -> Self {
        Self {
            lookback: DEFAULT_LOOKBACK,
            warmup_rows: None,
            require_volume_surge: true,
            boundary: BoundaryPolicy::Partial,
        }
    }
}

impl ScreenParams {
    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.lookback == 0 {
            return Err(ParamsError::ZeroLookback);
        }
        Ok(())
    }

    /// First row index at which the new-low predicate is evaluated.
    ///
    /// Never below `lookback`, so the window is always fully populated.
    pub fn first_new_low_row(&self) -> usize {
        self.warmup_rows.unwrap_or(self.lookback).max(self.lookback)
    }
}
