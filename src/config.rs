//! Run configuration: input file, data and incident windows, countries.
//!
//! Defaults reproduce the 2022-07-15 payments SEV analysis. A TOML file can
//! override any subset of fields.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::analysis::TimeWindow;
use crate::ingest::parse_timestamp;

/// Environment variable naming a config file.
pub const CONFIG_ENV: &str = "SEVIMPACT_CONFIG";

/// Config file picked up from the working directory when present.
pub const LOCAL_CONFIG: &str = "sevimpact.toml";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{name} window: unparsable timestamp {value:?}")]
    Timestamp { name: &'static str, value: String },

    #[error("{name} window ends ({end}) before it starts ({start})")]
    InvalidWindow {
        name: &'static str,
        start: String,
        end: String,
    },

    #[error("SEV window {sev_start} to {sev_end} lies outside the data window")]
    WindowNotContained { sev_start: String, sev_end: String },

    #[error("no countries configured")]
    EmptyCountryList,
}

/// Root configuration for a report run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// CSV export produced by the warehouse query.
    pub input_path: PathBuf,
    /// Countries reported individually, in print order.
    pub countries: Vec<String>,
    /// Span covered by the export.
    pub data_window: WindowConfig,
    /// Incident span; rows inside it are excluded from the baseline.
    pub sev_window: WindowConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from("bquxjob_319a0a35_1821370d7b6.csv"),
            countries: ["US", "CA", "GB", "JP", "IE", "ES", "FR", "AU"]
                .into_iter()
                .map(String::from)
                .collect(),
            data_window: WindowConfig::new("2022-07-15 17:00:00+00", "2022-07-15 20:59:59+00"),
            sev_window: WindowConfig::new("2022-07-15 18:30:00+00", "2022-07-15 19:30:00+00"),
        }
    }
}

/// Window endpoints as written in the report preamble.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowConfig {
    pub start: String,
    pub end: String,
}

impl WindowConfig {
    pub fn new(start: &str, end: &str) -> Self {
        Self {
            start: start.to_string(),
            end: end.to_string(),
        }
    }

    pub fn resolve(&self, name: &'static str) -> Result<TimeWindow, ConfigError> {
        let parse = |value: &str| {
            parse_timestamp(value).ok_or_else(|| ConfigError::Timestamp {
                name,
                value: value.to_string(),
            })
        };
        let window = TimeWindow::new(parse(&self.start)?, parse(&self.end)?);
        if window.end < window.start {
            return Err(ConfigError::InvalidWindow {
                name,
                start: self.start.clone(),
                end: self.end.clone(),
            });
        }
        Ok(window)
    }
}

/// Windows parsed and checked against each other.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedWindows {
    pub data: TimeWindow,
    pub sev: TimeWindow,
}

impl AnalysisConfig {
    /// Load configuration from a TOML file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?;
        info!(path = %path.display(), "Loaded analysis configuration");
        Ok(config)
    }

    /// Resolve configuration from, in order:
    /// 1. `explicit` (a `--config` flag); errors are returned.
    /// 2. The file named by `SEVIMPACT_CONFIG`.
    /// 3. `sevimpact.toml` in the working directory.
    /// 4. Compiled-in defaults.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        if let Ok(env_path) = std::env::var(CONFIG_ENV) {
            let path = Path::new(&env_path);
            match Self::load(path) {
                Ok(cfg) => return Ok(cfg),
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        error = %e,
                        "SEVIMPACT_CONFIG set but file could not be loaded, trying fallback"
                    );
                }
            }
        }

        let local = Path::new(LOCAL_CONFIG);
        if local.exists() {
            return Self::load(local);
        }

        debug!("no config file found, using compiled-in defaults");
        Ok(Self::default())
    }

    /// Parse both windows and check the incident lies inside the data span.
    pub fn validate(&self) -> Result<ResolvedWindows, ConfigError> {
        if self.countries.is_empty() {
            return Err(ConfigError::EmptyCountryList);
        }
        let data = self.data_window.resolve("data")?;
        let sev = self.sev_window.resolve("SEV")?;
        if !data.encloses(&sev) {
            return Err(ConfigError::WindowNotContained {
                sev_start: self.sev_window.start.clone(),
                sev_end: self.sev_window.end.clone(),
            });
        }
        Ok(ResolvedWindows { data, sev })
    }
}
