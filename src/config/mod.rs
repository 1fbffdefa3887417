//! Pipeline configuration
//!
//! Settings come from an optional TOML file, every field falling back to its
//! default, and are then overridden by `AGROTILE_*` environment variables.

use crate::collector::{CollectorOptions, TimeWindow};
use crate::error::{AgroError, ErrorCode};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tokio::fs;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub log_level: String,
    /// Cell size used when a request does not name one
    pub default_cell_size_m: u32,
    pub min_cell_size_m: u32,
    pub max_cell_size_m: u32,
    /// Tiles collected concurrently
    pub max_workers: usize,
    /// Provider calls in flight per tile
    pub provider_concurrency: usize,
    #[serde(with = "humantime_serde")]
    pub provider_timeout: Duration,
    /// Length of the collection time window in days
    pub lookback_days: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            default_cell_size_m: 15,
            min_cell_size_m: 5,
            max_cell_size_m: 100,
            max_workers: 4,
            provider_concurrency: 4,
            provider_timeout: Duration::from_secs(60),
            lookback_days: 7,
        }
    }
}

impl PipelineConfig {
    /// Parse TOML content; missing fields keep their defaults
    pub fn from_toml_str(content: &str) -> Result<Self, AgroError> {
        Ok(toml::from_str(content)?)
    }

    /// Load from a TOML file, apply environment overrides and validate
    pub async fn load(path: Option<&Path>) -> Result<Self, AgroError> {
        let mut config = match path {
            Some(path) => {
                debug!("Loading configuration from {}", path.display());
                let content = fs::read_to_string(path).await.map_err(|e| {
                    AgroError::config_with_code(
                        ErrorCode::CONFIG_NOT_FOUND,
                        format!("cannot read {}", path.display()),
                    )
                    .with_source(e)
                })?;
                Self::from_toml_str(&content)?
            }
            None => Self::default(),
        };
        config.merge_env_vars();
        config.validate()?;
        Ok(config)
    }

    pub fn merge_env_vars(&mut self) {
        self.merge_env_with(|key| std::env::var(key).ok());
    }

    /// Apply overrides from `lookup`; unparsable values are ignored
    pub fn merge_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(level) = lookup("AGROTILE_LOG_LEVEL") {
            self.log_level = level;
        }
        if let Some(value) = parse_env(&lookup, "AGROTILE_CELL_SIZE") {
            self.default_cell_size_m = value;
        }
        if let Some(value) = parse_env(&lookup, "AGROTILE_MAX_WORKERS") {
            self.max_workers = value;
        }
        if let Some(value) = parse_env(&lookup, "AGROTILE_PROVIDER_CONCURRENCY") {
            self.provider_concurrency = value;
        }
        if let Some(value) = parse_env(&lookup, "AGROTILE_LOOKBACK_DAYS") {
            self.lookback_days = value;
        }
        if let Some(raw) = lookup("AGROTILE_PROVIDER_TIMEOUT") {
            match humantime_serde::re::humantime::parse_duration(&raw) {
                Ok(timeout) => self.provider_timeout = timeout,
                Err(e) => warn!("Ignoring AGROTILE_PROVIDER_TIMEOUT={}: {}", raw, e),
            }
        }
    }

    pub fn validate(&self) -> Result<(), AgroError> {
        let invalid = |message: String| {
            AgroError::config_with_code(ErrorCode::CONFIG_INVALID_VALUE, message)
        };

        if self.max_workers == 0 {
            return Err(invalid("max_workers must be at least 1".to_string()));
        }
        if self.provider_concurrency == 0 {
            return Err(invalid("provider_concurrency must be at least 1".to_string()));
        }
        if self.lookback_days == 0 {
            return Err(invalid("lookback_days must be at least 1".to_string()));
        }
        if self.provider_timeout.is_zero() {
            return Err(invalid("provider_timeout must be positive".to_string()));
        }
        if self.min_cell_size_m == 0
            || self.min_cell_size_m > self.default_cell_size_m
            || self.default_cell_size_m > self.max_cell_size_m
        {
            return Err(invalid(format!(
                "cell sizes must satisfy 0 < min <= default <= max, got {} / {} / {}",
                self.min_cell_size_m, self.default_cell_size_m, self.max_cell_size_m
            )));
        }
        Ok(())
    }

    pub fn collector_options(&self) -> CollectorOptions {
        CollectorOptions {
            concurrency: self.provider_concurrency,
            timeout: self.provider_timeout,
        }
    }

    /// Collection window ending today (UTC)
    pub fn time_window(&self) -> TimeWindow {
        TimeWindow::ending_today(self.lookback_days)
    }
}

fn parse_env<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring {}={}: not a valid number", key, raw);
            None
        }
    }
}
