//! Triggerscan CLI — screen weekly price tables for bullish new-low triggers.
//!
//! Commands:
//! - `single` — screen one CSV or spreadsheet file and print its trigger statistics
//! - `multi` — screen `<CODE>_WEEKLY.csv` for each code and write a summary table

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_appender::non_blocking;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{prelude::*, EnvFilter};
use triggerscan_core::{BoundaryPolicy, HORIZON_WEEKS};
use triggerscan_runner::{
    parse_names_list, run_multi_symbol, run_single_file, MultiRunResult, RunConfig, SeriesStatus,
    SingleRunResult,
};

#[derive(Parser)]
#[command(
    name = "triggerscan",
    about = "Triggerscan CLI — weekly new-low trigger screener"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Screen a single weekly table (CSV or spreadsheet).
    Single {
        /// Weekly table with Date, Open, High, Low, Close, Vol, VolAvg
        /// columns: `.csv`, or the first sheet of an `.xls`/`.xlsx` workbook.
        #[arg(short = 'f', long)]
        file: PathBuf,

        /// Also write a JSON report of the run to this path.
        #[arg(long)]
        json: Option<PathBuf>,

        #[command(flatten)]
        screen: ScreenArgs,
    },
    /// Screen several series and write a summary table.
    Multi {
        /// Space-separated series codes, e.g. "BHP RIO WES".
        #[arg(short = 'n', long)]
        names_list: String,

        /// Directory holding `<CODE>_WEEKLY.csv` files.
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Worker threads. 1 processes series sequentially.
        #[arg(long, default_value_t = 1)]
        jobs: usize,

        #[command(flatten)]
        screen: ScreenArgs,
    },
}

/// Options shared by both commands. Flags override values from `--config`.
#[derive(Args)]
struct ScreenArgs {
    /// TOML run configuration.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Weeks examined by the new-low condition.
    #[arg(long)]
    lookback: Option<usize>,

    /// Rows skipped before the new-low condition is evaluated.
    #[arg(long)]
    warmup: Option<usize>,

    /// Drop the volume-above-average condition.
    #[arg(long, default_value_t = false)]
    ignore_volume: bool,

    /// Drop triggers with fewer than four following weeks.
    #[arg(long, default_value_t = false)]
    require_full_horizon: bool,

    /// Output directory. Defaults to next to each input.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Also append logs to this file.
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl ScreenArgs {
    fn to_config(&self) -> Result<RunConfig> {
        let mut config = match &self.config {
            Some(path) => RunConfig::from_file(path)?,
            None => RunConfig::default(),
        };
        if let Some(lookback) = self.lookback {
            config.screen.lookback = lookback;
        }
        if let Some(warmup) = self.warmup {
            config.screen.warmup_rows = Some(warmup);
        }
        if self.ignore_volume {
            config.screen.require_volume_surge = false;
        }
        if self.require_full_horizon {
            config.screen.boundary = BoundaryPolicy::RequireFullHorizon;
        }
        if let Some(dir) = &self.output_dir {
            config.paths.output_dir = Some(dir.clone());
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Each arm holds the log guard until it returns so the file layer is
    // flushed on every exit path.
    match cli.command {
        Commands::Single { file, json, screen } => {
            let _guard = init_tracing(screen.log_file.as_deref())?;
            let config = screen.to_config()?;
            run_single_cmd(&file, json.as_deref(), &config)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Multi {
            names_list,
            data_dir,
            jobs,
            screen,
        } => {
            let _guard = init_tracing(screen.log_file.as_deref())?;
            let mut config = screen.to_config()?;
            if let Some(dir) = data_dir {
                config.paths.data_dir = dir;
            }
            run_multi_cmd(&names_list, jobs, &config)
        }
    }
}

/// Logs go to stderr so stdout stays clean for the result lines. The
/// returned guard flushes the log file when dropped.
fn init_tracing(log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    if let Some(path) = log_file {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create log directory {}", parent.display()))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("failed to open log file {}", path.display()))?;
        let (writer, guard) = non_blocking(file);
        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(writer);
        tracing_subscriber::registry()
            .with(filter)
            .with(stderr_layer)
            .with(file_layer)
            .try_init()
            .map_err(|err| anyhow!("failed to initialize tracing: {err}"))?;
        Ok(Some(guard))
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(stderr_layer)
            .try_init()
            .map_err(|err| anyhow!("failed to initialize tracing: {err}"))?;
        Ok(None)
    }
}

fn run_single_cmd(file: &Path, json: Option<&Path>, config: &RunConfig) -> Result<()> {
    let result = run_single_file(file, config, json)?;
    print_single_summary(&result, config.screen.require_volume_surge);
    if let Some(path) = &result.report_file {
        println!("Report written to {}", path.display());
    }
    Ok(())
}

fn print_single_summary(result: &SingleRunResult, with_volume: bool) {
    let report = &result.outcome.report;
    let counters = &report.counters;
    let triggers = counters.triggers;

    println!("Results written to {}", result.trigger_file.display());
    println!("Total number of samples: {}", report.total_rows);
    println!("Number of triggers: {triggers}");
    let condition = if with_volume { "with" } else { "without" };
    println!(
        "Trigger ratio({condition} Volume Average condition): {}",
        report.trigger_ratio
    );
    println!();

    let Some(pct) = &report.percentages else {
        println!("No week met every condition; percentages are not reported.");
        return;
    };

    println!(
        "Close is greater than open for the week after {} out of {} weeks, which is {}% of the time.",
        counters.next_week_up, triggers, pct.next_week_up_pct
    );
    println!();

    for k in 0..HORIZON_WEEKS {
        println!(
            "Low is first violated {} week(s) later for {} out of {} triggers ({}%).",
            k + 1,
            counters.low_violations[k],
            triggers,
            pct.low_violation_pct[k]
        );
    }
    for k in 0..HORIZON_WEEKS {
        println!(
            "Close is first violated {} week(s) later for {} out of {} triggers ({}%).",
            k + 1,
            counters.close_violations[k],
            triggers,
            pct.close_violation_pct[k]
        );
    }
}

fn run_multi_cmd(names_list: &str, jobs: usize, config: &RunConfig) -> Result<ExitCode> {
    let codes = parse_names_list(names_list);
    if codes.is_empty() {
        bail!("--names-list must contain at least one code");
    }
    if jobs == 0 {
        bail!("--jobs must be at least 1");
    }

    info!(series = codes.len(), jobs, "starting multi-symbol run");
    let result = run_multi_symbol(&codes, config, jobs)?;
    print_multi_summary(&result);

    if result.any_failed() {
        eprintln!(
            "{} of {} series failed",
            result.failed_count(),
            result.series.len()
        );
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

fn print_multi_summary(result: &MultiRunResult) {
    println!("{:<10} {:<14} {:>8}  detail", "code", "status", "triggers");
    for s in &result.series {
        let triggers = s
            .report
            .as_ref()
            .map(|r| r.trigger_count().to_string())
            .unwrap_or_else(|| "-".to_string());
        let detail = match &s.status {
            SeriesStatus::Failed(reason) => reason.clone(),
            _ => s
                .trigger_file
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
        };
        println!(
            "{:<10} {:<14} {:>8}  {}",
            s.code,
            s.status.label(),
            triggers,
            detail
        );
    }
    println!();
    println!(
        "Summary of {} series written to {}",
        result.summary_rows.len(),
        result.summary_file.display()
    );
}
