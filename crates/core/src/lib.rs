//! # basket-rec core
//!
//! Ambient building blocks shared by the basket-rec crates.
//!
//! ## Modules
//!
//! - `config`: Environment-driven configuration loading and validation
//! - `error`: Shared error type
//! - `observability`: Structured logging initialization

pub mod config;
pub mod error;
pub mod observability;

pub use config::{
    load_dotenv, load_dotenv_from, parse_env_var, parse_optional_env_var, ConfigLoader,
};
pub use error::CoreError;
pub use observability::{init_logging, LogConfig, LogFormat};

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
