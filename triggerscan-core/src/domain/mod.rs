//! Domain types for the weekly screener.

pub mod record;
pub mod table;

pub use record::WeeklyRecord;
pub use table::TimeSeriesTable;
