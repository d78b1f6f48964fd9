//! Triggerscan Runner — loading, configuration, orchestration, exports.
//!
//! This crate builds on `triggerscan-core` to provide:
//! - CSV table loading with column validation and a BLAKE3 dataset hash
//! - TOML run configuration
//! - Single-file and multi-symbol runs with per-series failure isolation
//! - Trigger-row and summary CSV writers, JSON report with schema versioning

pub mod config;
pub mod data_loader;
pub mod export;
pub mod runner;

pub use config::{ConfigError, PathsConfig, ReportConfig, RunConfig};
pub use data_loader::{compute_dataset_hash, load_table, read_table, LoadError, LoadedTable};
pub use export::{
    export_report_json, import_report_json, summary_csv, trigger_rows_csv, ExportError,
    ScreenReport, SCHEMA_VERSION,
};
pub use runner::{
    parse_names_list, run_multi_symbol, run_single_file, series_path, MultiRunResult, RunError,
    SeriesRun, SeriesStatus, SingleRunResult,
};
