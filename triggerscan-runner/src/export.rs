//! Result export: trigger-row CSV, multi-series summary CSV, JSON report.
//!
//! CSV layouts follow the dataframe convention of a leading unnamed index
//! column:
//! - trigger rows: `,Date,Open,High,Low,Close,Vol,VolAvg`, keyed by the
//!   original row index
//! - summary: `,Code,Trigger Ratio,Close > Open Percentage,Low Violation N
//!   week...,Close Violation N week...`, keyed by a 0-based row number
//!
//! The JSON report carries a `schema_version`. Newer versions are rejected on
//! import.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use triggerscan_core::{
    ScreenOutcome, ScreenParams, SeriesReport, SummaryRow, TimeSeriesTable, TriggerOutcome,
    HORIZON_WEEKS,
};

/// Current schema version of the JSON report.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to flush CSV output: {0}")]
    Flush(String),

    #[error("CSV output is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported schema version {found} (max supported: {supported})")]
    UnsupportedSchema { found: u32, supported: u32 },

    #[error("cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("trigger index {index} is outside a table of {len} rows")]
    IndexOutOfRange { index: usize, len: usize },
}

// ─── CSV ────────────────────────────────────────────────────────────

/// Trigger rows with their original index, in the order given.
pub fn trigger_rows_csv(table: &TimeSeriesTable, triggers: &[usize]) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["", "Date", "Open", "High", "Low", "Close", "Vol", "VolAvg"])?;

    for &i in triggers {
        let r = table.get(i).ok_or(ExportError::IndexOutOfRange {
            index: i,
            len: table.len(),
        })?;
        wtr.write_record([
            i.to_string(),
            r.date.clone(),
            fmt_float(r.open),
            fmt_float(r.high),
            fmt_float(r.low),
            fmt_float(r.close),
            fmt_float(r.volume),
            fmt_float(r.volume_average),
        ])?;
    }

    finish(wtr)
}

/// Header of the multi-series summary table, including the leading index
/// column.
pub fn summary_header() -> Vec<String> {
    let mut header = vec![
        String::new(),
        "Code".to_string(),
        "Trigger Ratio".to_string(),
        "Close > Open Percentage".to_string(),
    ];
    header.extend((1..=HORIZON_WEEKS).map(|k| format!("Low Violation {k} week")));
    header.extend((1..=HORIZON_WEEKS).map(|k| format!("Close Violation {k} week")));
    header
}

/// Summary table, one row per series that had triggers.
pub fn summary_csv(rows: &[SummaryRow]) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(summary_header())?;

    for (n, row) in rows.iter().enumerate() {
        let mut record = vec![
            n.to_string(),
            row.code.clone(),
            fmt_float(row.trigger_ratio),
            fmt_float(row.next_week_up_pct),
        ];
        record.extend(row.low_violation_pct.iter().copied().map(fmt_float));
        record.extend(row.close_violation_pct.iter().copied().map(fmt_float));
        wtr.write_record(&record)?;
    }

    finish(wtr)
}

fn finish(wtr: csv::Writer<Vec<u8>>) -> Result<String, ExportError> {
    let data = wtr.into_inner().map_err(|e| ExportError::Flush(e.to_string()))?;
    Ok(String::from_utf8(data)?)
}

/// Float cell text: empty for NaN, a trailing `.0` on whole numbers.
pub fn fmt_float(value: f64) -> String {
    if value.is_nan() {
        String::new()
    } else if value.is_finite() && value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}

// ─── JSON report ────────────────────────────────────────────────────

/// Persisted report of one screened series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenReport {
    pub schema_version: u32,
    /// RFC 3339 timestamp of when the report was produced.
    pub generated_at: String,
    pub code: String,
    pub source: PathBuf,
    pub dataset_hash: String,
    pub params: ScreenParams,
    pub triggers: Vec<usize>,
    pub outcomes: Vec<TriggerOutcome>,
    pub report: SeriesReport,
}

impl ScreenReport {
    pub fn new(
        code: &str,
        source: &Path,
        dataset_hash: &str,
        params: &ScreenParams,
        outcome: &ScreenOutcome,
    ) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            generated_at: chrono::Utc::now().to_rfc3339(),
            code: code.to_string(),
            source: source.to_path_buf(),
            dataset_hash: dataset_hash.to_string(),
            params: params.clone(),
            triggers: outcome.triggers.clone(),
            outcomes: outcome.outcomes.clone(),
            report: outcome.report.clone(),
        }
    }
}

pub fn export_report_json(report: &ScreenReport) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// Deserialize a report, rejecting schema versions newer than this build.
pub fn import_report_json(json: &str) -> Result<ScreenReport, ExportError> {
    let report: ScreenReport = serde_json::from_str(json)?;
    if report.schema_version > SCHEMA_VERSION {
        return Err(ExportError::UnsupportedSchema {
            found: report.schema_version,
            supported: SCHEMA_VERSION,
        });
    }
    Ok(report)
}

// ─── Paths and files ────────────────────────────────────────────────

/// `<input-stem>_trigger_weeks.csv`, next to the input unless an output
/// directory is given.
pub fn trigger_weeks_path(input: &Path, output_dir: Option<&Path>) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "series".to_string());
    let name = format!("{stem}_trigger_weeks.csv");
    match output_dir {
        Some(dir) => dir.join(name),
        None => input.parent().unwrap_or_else(|| Path::new("")).join(name),
    }
}

/// `<first>_to_<last>_metrics.csv` under the output directory (or the
/// current directory).
pub fn metrics_path(first: &str, last: &str, output_dir: Option<&Path>) -> PathBuf {
    let name = format!("{first}_to_{last}_metrics.csv");
    match output_dir {
        Some(dir) => dir.join(name),
        None => PathBuf::from(name),
    }
}

/// Write `contents` to `path`, creating parent directories as needed.
pub fn write_file(path: &Path, contents: &str) -> Result<(), ExportError> {
    let io_err = |source| ExportError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    std::fs::write(path, contents).map_err(io_err)
}
