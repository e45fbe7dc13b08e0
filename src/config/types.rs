use serde::Deserialize;

/// Main configuration structure for Kumo-Crawl
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    /// Seed URLs the crawl starts from
    #[serde(default)]
    pub seeds: Vec<String>,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum number of URLs ever admitted into one crawl session
    #[serde(rename = "max-items")]
    pub max_items: usize,

    /// Number of concurrent worker tasks
    #[serde(rename = "worker-count")]
    pub worker_count: usize,

    /// How long a shutdown request waits for in-flight tasks (milliseconds)
    #[serde(rename = "shutdown-grace-ms", default = "default_shutdown_grace_ms")]
    pub shutdown_grace_ms: u64,

    /// Whether tasks that outlive the shutdown grace period may still write
    /// their result into the store
    #[serde(rename = "accept-late-writes", default = "default_accept_late_writes")]
    pub accept_late_writes: bool,
}

fn default_shutdown_grace_ms() -> u64 {
    5000
}

fn default_accept_late_writes() -> bool {
    true
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Formats the full user-agent string sent with every request
    ///
    /// Format: CrawlerName/Version (+ContactURL; ContactEmail)
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}
