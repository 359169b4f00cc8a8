//! Structured logging initialization

use crate::config::{ConfigLoader, ENV_PREFIX};
use crate::error::CoreError;
use crate::Result;
use serde::{Deserialize, Serialize};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable output for local runs
    Pretty,
    /// One JSON object per event
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}

/// Logging configuration
///
/// # Environment Variables
///
/// - `BASKET_REC_LOG_LEVEL` (optional, falls back to `RUST_LOG`): filter directive (default: "info")
/// - `BASKET_REC_LOG_FORMAT` (optional): `pretty` or `json` (default: pretty)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Filter directive, e.g. `info` or `basket_rec_engine=debug`
    pub level: String,
    pub format: LogFormat,
    /// Include the event target (module path)
    pub with_target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            with_target: true,
        }
    }
}

impl ConfigLoader for LogConfig {
    fn from_env() -> Result<Self> {
        let level_key = format!("{}LOG_LEVEL", ENV_PREFIX);
        let level = std::env::var(&level_key)
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or_else(|_| LogConfig::default().level);

        let format_key = format!("{}LOG_FORMAT", ENV_PREFIX);
        let format = crate::config::parse_env_var(&format_key, LogConfig::default().format)?;

        Ok(Self {
            level,
            format,
            with_target: true,
        })
    }

    fn validate(&self) -> Result<()> {
        EnvFilter::try_new(&self.level).map_err(|e| {
            CoreError::config(
                format!("Invalid log level '{}': {}", self.level, e),
                "BASKET_REC_LOG_LEVEL",
            )
        })?;
        Ok(())
    }
}

/// Install the global tracing subscriber
///
/// # Errors
///
/// Returns `CoreError::Logging` if the filter is invalid or a global
/// subscriber has already been installed.
pub fn init_logging(config: &LogConfig) -> Result<()> {
    let env_filter =
        EnvFilter::try_new(&config.level).map_err(|e| CoreError::Logging(e.to_string()))?;

    let registry = tracing_subscriber::registry().with(env_filter);

    match config.format {
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(config.with_target),
            )
            .try_init(),
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_target(config.with_target))
            .try_init(),
    }
    .map_err(|e| CoreError::Logging(e.to_string()))?;

    tracing::debug!(level = %config.level, format = ?config.format, "Logging initialized");
    Ok(())
}
