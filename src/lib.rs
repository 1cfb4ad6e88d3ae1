//! acx-harvest: an archive crawler for Substack publications
//!
//! This crate walks a publication's public JSON API and mirrors its article
//! metadata, comment trees and article bodies into a local SQLite file.
//! Every page or article is committed in its own transaction, so an
//! interrupted run keeps everything up to the last finished batch.

pub mod config;
pub mod crawler;
pub mod models;
pub mod output;
pub mod storage;

use thiserror::Error;

/// Main error type for acx-harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        source: serde_json::Error,
    },

    #[error("Failed to build request URL: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Invalid request URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),
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

/// Result type alias for acx-harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Coordinator, Pipeline};
pub use models::{flatten_comments, Article, Comment};
