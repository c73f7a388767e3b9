//! Configuration module for the crash scraper
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every key has a default, so an empty file (or no file at all) is valid.
//!
//! # Example
//!
//! ```no_run
//! use gibdd_crashes::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("gibdd.toml")).unwrap();
//! println!("Fan-out concurrency: {}", config.fetch.concurrency);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{ClientConfig, Config, FetchConfig, OutputConfig, ProxyConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use validation::validate;
