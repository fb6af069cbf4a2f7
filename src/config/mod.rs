//! Configuration module for Page-Harvest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use page_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Retries per fetch: {}", config.settings.retries);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, JobConfig, OutputConfig, Settings, StrategyKind, Viewport};

// Re-export parser functions
pub use parser::{compute_config_hash, config_hash, load_config, load_config_with_hash, parse_config};
