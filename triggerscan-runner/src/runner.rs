//! Run orchestration: load → screen → export, for one file or a code list.
//!
//! Single-file runs fail fast. Multi-symbol runs isolate failures per series:
//! a missing or malformed file marks that series `Failed` and the rest keep
//! going. The summary is written once every series has been processed.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, info, warn};
use triggerscan_core::{screen, ParamsError, ScreenOutcome, SeriesReport, SummaryRow};

use crate::config::{ConfigError, RunConfig};
use crate::data_loader::{load_table, LoadError};
use crate::export::{
    export_report_json, metrics_path, summary_csv, trigger_rows_csv, trigger_weeks_path,
    write_file, ExportError, ScreenReport,
};

/// Suffix of per-symbol input files: `<CODE>_WEEKLY.csv`.
pub const SERIES_FILE_SUFFIX: &str = "_WEEKLY.csv";

#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("parameter error: {0}")]
    Params(#[from] ParamsError),
    #[error("export error: {0}")]
    Export(#[from] ExportError),
    #[error("no series codes given")]
    EmptyCodeList,
    #[error("failed to build thread pool: {0}")]
    ThreadPool(String),
}

/// Result of screening a single file.
#[derive(Debug, Clone)]
pub struct SingleRunResult {
    pub code: String,
    pub input: PathBuf,
    pub dataset_hash: String,
    pub outcome: ScreenOutcome,
    pub trigger_file: PathBuf,
    pub report_file: Option<PathBuf>,
}

/// Per-series status in a multi-symbol run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeriesStatus {
    Screened,
    /// Loaded and screened, but no week met every condition.
    ZeroTriggers,
    Failed(String),
}

impl SeriesStatus {
    pub fn label(&self) -> &str {
        match self {
            SeriesStatus::Screened => "screened",
            SeriesStatus::ZeroTriggers => "zero triggers",
            SeriesStatus::Failed(_) => "failed",
        }
    }
}

/// Outcome of one series in a multi-symbol run.
#[derive(Debug, Clone)]
pub struct SeriesRun {
    pub code: String,
    pub input: PathBuf,
    pub status: SeriesStatus,
    pub trigger_file: Option<PathBuf>,
    pub report: Option<SeriesReport>,
}

/// Result of a multi-symbol run, series in input order.
#[derive(Debug, Clone)]
pub struct MultiRunResult {
    pub series: Vec<SeriesRun>,
    pub summary_rows: Vec<SummaryRow>,
    pub summary_file: PathBuf,
}

impl MultiRunResult {
    pub fn failed_count(&self) -> usize {
        self.series
            .iter()
            .filter(|s| matches!(s.status, SeriesStatus::Failed(_)))
            .count()
    }

    pub fn any_failed(&self) -> bool {
        self.failed_count() > 0
    }
}

/// Split a whitespace-separated code list.
pub fn parse_names_list(names: &str) -> Vec<String> {
    names.split_whitespace().map(str::to_string).collect()
}

/// `<data_dir>/<CODE>_WEEKLY.csv`.
pub fn series_path(data_dir: &Path, code: &str) -> PathBuf {
    data_dir.join(format!("{code}{SERIES_FILE_SUFFIX}"))
}

/// Series code for a file: the stem without a trailing `_WEEKLY`.
pub fn code_from_path(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    match stem.strip_suffix("_WEEKLY") {
        Some(code) if !code.is_empty() => code.to_string(),
        _ => stem,
    }
}

/// Screen one file and write its trigger rows (plus an optional JSON report).
pub fn run_single_file(
    path: &Path,
    config: &RunConfig,
    report_path: Option<&Path>,
) -> Result<SingleRunResult, RunError> {
    config.validate()?;
    let code = code_from_path(path);
    let loaded = load_table(path)?;
    let outcome = screen(&loaded.table, &config.screen)?;
    debug!(
        code = %code,
        bearish_open = outcome.predicates.bearish_open.len(),
        new_low = outcome.predicates.new_low.len(),
        volume_surge = outcome.predicates.volume_surge.len(),
        "predicate sets"
    );

    let trigger_file = trigger_weeks_path(path, config.paths.output_dir.as_deref());
    write_file(&trigger_file, &trigger_rows_csv(&loaded.table, &outcome.triggers)?)?;

    let report_file = match report_path {
        Some(p) => {
            let report = ScreenReport::new(
                &code,
                path,
                &loaded.dataset_hash,
                &config.screen,
                &outcome,
            );
            write_file(p, &export_report_json(&report)?)?;
            Some(p.to_path_buf())
        }
        None => None,
    };

    info!(
        code = %code,
        rows = loaded.table.len(),
        triggers = outcome.triggers.len(),
        "screened series"
    );

    Ok(SingleRunResult {
        code,
        input: path.to_path_buf(),
        dataset_hash: loaded.dataset_hash,
        outcome,
        trigger_file,
        report_file,
    })
}

/// Screen every code in `codes` and write the summary table.
///
/// Repeated codes are screened once, at their first position. `jobs > 1`
/// spreads series over a rayon pool of that size. Results are collected in
/// input order either way.
pub fn run_multi_symbol(
    codes: &[String],
    config: &RunConfig,
    jobs: usize,
) -> Result<MultiRunResult, RunError> {
    config.validate()?;
    let codes = unique_codes(codes);
    let (first, last) = match (codes.first(), codes.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return Err(RunError::EmptyCodeList),
    };

    let series: Vec<SeriesRun> = if jobs > 1 {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build()
            .map_err(|e| RunError::ThreadPool(e.to_string()))?;
        pool.install(|| {
            codes
                .par_iter()
                .map(|code| screen_series(code, config))
                .collect()
        })
    } else {
        codes.iter().map(|code| screen_series(code, config)).collect()
    };

    let decimals = config.report.summary_decimals;
    let summary_rows: Vec<SummaryRow> = series
        .iter()
        .filter_map(|s| s.report.as_ref()?.summary_row(&s.code, decimals))
        .collect();

    let summary_file = metrics_path(first, last, config.paths.output_dir.as_deref());
    write_file(&summary_file, &summary_csv(&summary_rows)?)?;
    info!(
        series = series.len(),
        with_triggers = summary_rows.len(),
        path = %summary_file.display(),
        "summary written"
    );

    Ok(MultiRunResult {
        series,
        summary_rows,
        summary_file,
    })
}

/// First occurrence of each code, in order.
fn unique_codes(codes: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut unique = Vec::with_capacity(codes.len());
    for code in codes {
        if seen.insert(code.as_str()) {
            unique.push(code.clone());
        } else {
            warn!(code = %code, "duplicate code skipped");
        }
    }
    unique
}

/// Load, screen and export one series. Never fails: errors become
/// `SeriesStatus::Failed`.
fn screen_series(code: &str, config: &RunConfig) -> SeriesRun {
    let input = series_path(&config.paths.data_dir, code);
    let mut run = SeriesRun {
        code: code.to_string(),
        input: input.clone(),
        status: SeriesStatus::Screened,
        trigger_file: None,
        report: None,
    };

    match try_screen_series(&input, config) {
        Ok((trigger_file, report)) => {
            if report.has_triggers() {
                info!(code, triggers = report.trigger_count(), "screened series");
            } else {
                warn!(code, "no triggers, series left out of the summary");
                run.status = SeriesStatus::ZeroTriggers;
            }
            run.trigger_file = Some(trigger_file);
            run.report = Some(report);
        }
        Err(e) => {
            warn!(code, error = %e, "series failed");
            run.status = SeriesStatus::Failed(e.to_string());
        }
    }
    run
}

fn try_screen_series(input: &Path, config: &RunConfig) -> Result<(PathBuf, SeriesReport), RunError> {
    let loaded = load_table(input)?;
    let outcome = screen(&loaded.table, &config.screen)?;
    let trigger_file = trigger_weeks_path(input, config.paths.output_dir.as_deref());
    write_file(&trigger_file, &trigger_rows_csv(&loaded.table, &outcome.triggers)?)?;
    Ok((trigger_file, outcome.report))
}
