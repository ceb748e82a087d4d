use crate::catalog::DedupScope;
use crate::sites::SiteKind;
use serde::Deserialize;

/// Main configuration structure for Catalog-Ripple
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
    #[serde(default, rename = "site")]
    pub sites: Vec<SiteEntry>,
}

impl Config {
    /// Sites that are switched on
    pub fn enabled_sites(&self) -> impl Iterator<Item = &SiteEntry> {
        self.sites.iter().filter(|site| site.enabled)
    }
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum number of fetches in flight at once
    #[serde(rename = "max-concurrent-requests")]
    pub max_concurrent_requests: u32,

    /// Per-request timeout in seconds
    #[serde(rename = "request-timeout-secs", default = "default_timeout")]
    pub request_timeout_secs: u64,

    /// Retries for server errors and timeouts
    #[serde(rename = "max-retries", default = "default_retries")]
    pub max_retries: u32,

    /// Delay between retries (milliseconds)
    #[serde(rename = "retry-delay-ms", default = "default_retry_delay")]
    pub retry_delay_ms: u64,
}

fn default_timeout() -> u64 {
    30
}

fn default_retries() -> u32 {
    2
}

fn default_retry_delay() -> u64 {
    500
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
    /// Formats the user agent header: `Name/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path of the JSON Lines record file
    #[serde(rename = "records-path")]
    pub records_path: String,

    /// Path to the markdown run summary
    #[serde(rename = "summary-path")]
    pub summary_path: String,
}

/// One site to crawl
#[derive(Debug, Clone, Deserialize)]
pub struct SiteEntry {
    /// Which crawler handles the site
    pub kind: SiteKind,

    /// Overrides the site's public base URL (mirrors, staging, tests)
    #[serde(rename = "base-url", default)]
    pub base_url: Option<String>,

    /// Markets to crawl by country code; empty means all
    #[serde(default)]
    pub countries: Vec<String>,

    /// Key used to fetch each product detail only once
    #[serde(rename = "dedup-scope", default)]
    pub dedup_scope: DedupScope,

    /// Fetch one known product instead of the whole catalog
    #[serde(rename = "single-item-test", default)]
    pub single_item_test: bool,

    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl SiteEntry {
    /// An enabled entry with default settings
    pub fn new(kind: SiteKind) -> Self {
        Self {
            kind,
            base_url: None,
            countries: Vec::new(),
            dedup_scope: DedupScope::default(),
            single_item_test: false,
            enabled: true,
        }
    }

    /// Whether the entry's country filter admits `country_code`
    pub fn wants_country(&self, country_code: &str) -> bool {
        self.countries.is_empty()
            || self
                .countries
                .iter()
                .any(|wanted| wanted.eq_ignore_ascii_case(country_code))
    }
}

fn default_enabled() -> bool {
    true
}
