//! Configuration module for Post-Harvest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every section is optional, so an empty file (or no file at all) yields the
//! provider's free-tier defaults.
//!
//! # Example
//!
//! ```no_run
//! use post_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Retry backoff: {}ms", config.pacing.retry_backoff);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{ApiConfig, CollectionConfig, Config, OutputConfig, PacingConfig};

// Re-export parser functions
pub use parser::{
    compute_config_hash, hash_content, load_config, load_config_with_hash, parse_config,
};
pub use validation::validate;
