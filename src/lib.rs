//! Post-Harvest: a resumable, time-windowed post history collector
//!
//! This crate walks the cursor-paginated search API of a social-media data
//! provider one calendar month at a time, deduplicates posts across windows
//! and runs, and appends them to a per-account SQLite store that doubles as
//! the resume checkpoint.

pub mod collector;
pub mod config;
pub mod output;
pub mod record;
pub mod state;
pub mod storage;
pub mod window;

use thiserror::Error;

/// Main error type for Post-Harvest operations
#[derive(Debug, Error)]
pub enum CollectError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid account name: '{0}'")]
    InvalidAccount(String),

    #[error("Invalid date range: {0}")]
    InvalidRange(String),

    #[error("No collected data at {}", .0.display())]
    StoreNotFound(std::path::PathBuf),

    #[error("Missing API key: pass --api-key or set API_KEY")]
    MissingApiKey,
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Post-Harvest operations
pub type Result<T> = std::result::Result<T, CollectError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use collector::{CollectionReport, CollectionRequest, Collector};
pub use config::Config;
pub use record::Record;
pub use state::{CoverageSet, ResumeState, SeenIdentitySet, WindowOutcome};
pub use window::{generate_windows, TimeWindow};
