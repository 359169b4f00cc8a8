//! Error types shared by basket-rec crates

use thiserror::Error;

/// Errors raised by the shared configuration and logging layers
#[derive(Debug, Error)]
pub enum CoreError {
    /// A configuration value is missing, unparsable or out of range
    #[error("Configuration error: {message}")]
    ConfigurationError {
        message: String,
        /// Environment variable the value was read from, if any
        key: Option<String>,
    },

    #[error("Failed to initialize logging: {0}")]
    Logging(String),
}

impl CoreError {
    /// Shorthand for a configuration error tied to an environment key
    pub fn config(message: impl Into<String>, key: &str) -> Self {
        CoreError::ConfigurationError {
            message: message.into(),
            key: Some(key.to_string()),
        }
    }
}
