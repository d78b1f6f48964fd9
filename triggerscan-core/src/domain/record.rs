//! WeeklyRecord — one row of a weekly OHLCV series.

use serde::{Deserialize, Serialize};

/// One week of price and volume data plus the precomputed volume average.
///
/// `date` is kept as the source text so trigger rows can be written back
/// exactly as they were read. Missing numeric cells are carried as `f64::NAN`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyRecord {
    pub date: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub volume_average: f64,
}

impl WeeklyRecord {
    /// Returns true if any price field is NaN.
    pub fn has_missing_prices(&self) -> bool {
        self.open.is_nan() || self.high.is_nan() || self.low.is_nan() || self.close.is_nan()
    }

    /// Close above open. NaN on either side is never bullish.
    pub fn closed_above_open(&self) -> bool {
        self.close > self.open
    }

    /// Volume above its average. NaN on either side is never a surge.
    pub fn volume_above_average(&self) -> bool {
        self.volume > self.volume_average
    }
}
