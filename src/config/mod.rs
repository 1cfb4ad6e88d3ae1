//! Configuration module for acx-harvest
//!
//! This module handles loading, parsing, and validating the optional TOML
//! configuration file. Every key has a default, so a missing file simply
//! yields [`Config::default`].
//!
//! # Example
//!
//! ```no_run
//! use acx_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Listing pages of {} articles", config.api.page_size);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{ApiConfig, Config, CrawlerConfig, UserAgentConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, DEFAULT_CONFIG_HASH};
