//! Shared configuration loader for basket-rec crates
//!
//! Configuration is read from environment variables carrying the
//! `BASKET_REC_` prefix, optionally seeded from a `.env` file. Each
//! configuration struct provides defaults for every field, so an empty
//! environment always yields a usable configuration.
//!
//! Override hierarchy: defaults < .env < environment. `ConfigLoader::load`
//! reads `.env` first; variables already set in the process are never
//! overwritten by it.
//!
//! # Example
//!
//! ```no_run
//! use basket_rec_core::config::{load_dotenv, parse_env_var};
//!
//! # fn example() -> basket_rec_core::Result<()> {
//! load_dotenv();
//! let factors: usize = parse_env_var("BASKET_REC_ALS_FACTORS", 20)?;
//! # Ok(())
//! # }
//! ```

use crate::error::CoreError;
use crate::Result;
use std::path::Path;

/// Environment variable prefix used by every basket-rec setting
pub const ENV_PREFIX: &str = "BASKET_REC_";

/// Configuration loader trait
///
/// Provides standardized methods for loading and validating configuration from
/// environment variables.
pub trait ConfigLoader: Sized {
    /// Load configuration from environment variables
    ///
    /// Missing variables fall back to the type's defaults.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigurationError` if a variable is set but cannot be parsed.
    fn from_env() -> Result<Self>;

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns a `ConfigurationError` naming the offending key if any check fails.
    fn validate(&self) -> Result<()>;

    /// Load `.env`, read the environment and validate in one step
    fn load() -> Result<Self> {
        load_dotenv();
        let config = Self::from_env()?;
        config.validate()?;
        Ok(config)
    }
}

/// Parse an environment variable, falling back to `default` when unset
///
/// # Errors
///
/// Returns a `ConfigurationError` if the value is set but cannot be parsed
pub fn parse_env_var<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    std::env::var(key)
        .ok()
        .map(|v| {
            v.trim()
                .parse::<T>()
                .map_err(|e| CoreError::config(format!("Failed to parse {}: {}", key, e), key))
        })
        .unwrap_or(Ok(default))
}

/// Parse an optional environment variable; unset yields `None`
pub fn parse_optional_env_var<T>(key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(v) => v
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| CoreError::config(format!("Failed to parse {}: {}", key, e), key)),
        Err(_) => Ok(None),
    }
}

/// Load .env file if present
///
/// A missing `.env` file is not an error.
pub fn load_dotenv() {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            tracing::warn!(error = %e, "Failed to load .env file");
        }
    }
}

/// Load variables from a specific env file
///
/// Variables already present in the environment keep their values.
///
/// # Errors
///
/// Returns a `ConfigurationError` if the file is missing or malformed.
pub fn load_dotenv_from(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    dotenvy::from_path(path).map_err(|e| CoreError::ConfigurationError {
        message: format!("Failed to load {}: {}", path.display(), e),
        key: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn test_parse_env_var_with_default() {
        let result: u32 = parse_env_var("BASKET_REC_TEST_NON_EXISTENT", 42).unwrap();
        assert_eq!(result, 42);
    }

    #[test]
    fn test_parse_env_var_with_value() {
        env::set_var("BASKET_REC_TEST_PARSE_VAR", " 100 ");
        let result: u32 = parse_env_var("BASKET_REC_TEST_PARSE_VAR", 42).unwrap();
        assert_eq!(result, 100);
        env::remove_var("BASKET_REC_TEST_PARSE_VAR");
    }

    #[test]
    fn test_parse_env_var_invalid_value() {
        env::set_var("BASKET_REC_TEST_INVALID_VAR", "not-a-number");
        let result = parse_env_var::<u32>("BASKET_REC_TEST_INVALID_VAR", 42);
        match result.unwrap_err() {
            CoreError::ConfigurationError { message, key } => {
                assert!(message.contains("BASKET_REC_TEST_INVALID_VAR"));
                assert_eq!(key.as_deref(), Some("BASKET_REC_TEST_INVALID_VAR"));
            }
            _ => panic!("Expected ConfigurationError"),
        }
        env::remove_var("BASKET_REC_TEST_INVALID_VAR");
    }

    #[test]
    fn test_parse_optional_env_var() {
        let unset: Option<u64> = parse_optional_env_var("BASKET_REC_TEST_OPTIONAL_UNSET").unwrap();
        assert!(unset.is_none());

        env::set_var("BASKET_REC_TEST_OPTIONAL_SET", "7");
        let set: Option<u64> = parse_optional_env_var("BASKET_REC_TEST_OPTIONAL_SET").unwrap();
        assert_eq!(set, Some(7));
        env::remove_var("BASKET_REC_TEST_OPTIONAL_SET");
    }

    #[test]
    fn test_load_dotenv_without_file_is_silent() {
        load_dotenv();
    }

    #[test]
    fn test_env_file_does_not_override_environment() {
        let path = env::temp_dir().join(format!("basket-rec-{}.env", std::process::id()));
        std::fs::write(
            &path,
            "BASKET_REC_TEST_DOTENV_SHADOWED=file\nBASKET_REC_TEST_DOTENV_ONLY=file\n",
        )
        .unwrap();
        env::set_var("BASKET_REC_TEST_DOTENV_SHADOWED", "process");

        load_dotenv_from(&path).unwrap();
        assert_eq!(env::var("BASKET_REC_TEST_DOTENV_SHADOWED").unwrap(), "process");
        assert_eq!(env::var("BASKET_REC_TEST_DOTENV_ONLY").unwrap(), "file");

        std::fs::remove_file(&path).unwrap();
        env::remove_var("BASKET_REC_TEST_DOTENV_SHADOWED");
        env::remove_var("BASKET_REC_TEST_DOTENV_ONLY");
    }

    #[test]
    fn test_load_dotenv_from_missing_file() {
        let err = load_dotenv_from("/nonexistent/basket-rec.env").unwrap_err();
        assert!(matches!(err, CoreError::ConfigurationError { key: None, .. }));
    }

    struct ThreadsConfig {
        threads: usize,
    }

    impl ConfigLoader for ThreadsConfig {
        fn from_env() -> Result<Self> {
            Ok(Self {
                threads: parse_env_var("BASKET_REC_TEST_LOAD_THREADS", 4)?,
            })
        }

        fn validate(&self) -> Result<()> {
            if self.threads == 0 {
                return Err(CoreError::config(
                    "threads must be greater than 0",
                    "BASKET_REC_TEST_LOAD_THREADS",
                ));
            }
            Ok(())
        }
    }

    #[test]
    fn test_load_reads_and_validates() {
        assert_eq!(ThreadsConfig::load().unwrap().threads, 4);

        env::set_var("BASKET_REC_TEST_LOAD_THREADS", "0");
        assert!(ThreadsConfig::load().is_err());
        env::remove_var("BASKET_REC_TEST_LOAD_THREADS");
    }
}
