//! TOML run configuration.
//!
//! Every key is optional; a missing file section falls back to defaults.
//!
//! ```toml
//! [screen]
//! lookback = 5
//! warmup_rows = 59
//! require_volume_surge = true
//! boundary = "partial"
//!
//! [report]
//! summary_decimals = 4
//!
//! [paths]
//! data_dir = "data"
//! output_dir = "results"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use triggerscan_core::{ParamsError, ScreenParams, DEFAULT_SUMMARY_DECIMALS};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid screen parameters: {0}")]
    InvalidParams(#[from] ParamsError),

    #[error("summary_decimals must be at most 12, got {0}")]
    InvalidDecimals(u32),
}

/// Report formatting options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Decimal places for violation percentages in the summary table.
    pub summary_decimals: u32,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            summary_decimals: DEFAULT_SUMMARY_DECIMALS,
        }
    }
}

/// Where inputs are read from and results written to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory holding `<CODE>_WEEKLY.csv` files in multi-symbol mode.
    pub data_dir: PathBuf,
    /// Output directory. `None` writes trigger files next to their input and
    /// the summary into the current directory.
    pub output_dir: Option<PathBuf>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            output_dir: None,
        }
    }
}

/// Complete configuration for a screening run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub screen: ScreenParams,
    pub report: ReportConfig,
    pub paths: PathsConfig,
}

impl RunConfig {
    /// Load and validate a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: RunConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.screen.validate()?;
        if self.report.summary_decimals > 12 {
            return Err(ConfigError::InvalidDecimals(self.report.summary_decimals));
        }
        Ok(())
    }
}
