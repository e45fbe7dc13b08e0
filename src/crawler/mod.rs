//! Crawler module: the bounded concurrent crawl engine
//!
//! This module contains the core crawling machinery:
//! - Atomic admission (deduplication + budget)
//! - The frontier queue with exact termination detection
//! - The fetch and link-extraction collaborator seams
//! - Session orchestration and the worker pool

mod admission;
mod fetcher;
mod frontier;
mod parser;
mod session;

pub use admission::AdmissionGate;
pub use fetcher::{FetchError, Fetcher, HttpFetcher};
pub use frontier::Frontier;
pub use parser::{HtmlLinkParser, LinkParser};
pub use session::{CrawlSession, Phase, SessionStats};

use crate::config::Config;
use crate::Result;
use std::collections::HashMap;

/// Runs a complete crawl with the production HTTP fetcher and HTML parser
///
/// Convenience entry point for callers that do not need shutdown control or
/// progress snapshots: builds a session from the configuration and runs it
/// to completion.
///
/// # Example
///
/// ```no_run
/// use kumo_crawl::config::load_config;
/// use kumo_crawl::crawler::crawl;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("config.toml"))?;
/// let pages = crawl(&config).await?;
/// println!("stored {} pages", pages.len());
/// # Ok(())
/// # }
/// ```
pub async fn crawl(config: &Config) -> Result<HashMap<String, String>> {
    let fetcher = HttpFetcher::new(&config.user_agent)?;
    let session = CrawlSession::new(config.crawler.clone(), fetcher, HtmlLinkParser::new());
    session.run(&config.seeds).await
}
