//! Kumo-Crawl: a bounded concurrent crawl engine
//!
//! This crate implements a frontier-driven crawl scheduler: a fixed pool of
//! concurrent workers discovers a graph of URLs from seed nodes, processing
//! each URL at most once and never admitting more work than a configured
//! budget allows.

pub mod config;
pub mod crawler;
pub mod store;
pub mod url;

use thiserror::Error;

/// Main error type for Kumo-Crawl operations
#[derive(Debug, Error)]
pub enum KumoError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Result store error: {0}")]
    Store(#[from] store::StoreError),

    #[error("Invalid session transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: crawler::Phase,
        to: crawler::Phase,
    },

    #[error("Shutdown grace period elapsed with {in_flight} task(s) still in flight")]
    ShutdownTimeout { in_flight: usize },

    #[error("In-flight counter underflow (task completed that was never started)")]
    InFlightUnderflow,

    #[error("Worker task panicked or was cancelled: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
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

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Result type alias for Kumo-Crawl operations
pub type Result<T> = std::result::Result<T, KumoError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{
    AdmissionGate, CrawlSession, Fetcher, Frontier, HtmlLinkParser, HttpFetcher, LinkParser,
    Phase, SessionStats,
};
pub use store::ResultStore;
pub use url::normalize_url;
