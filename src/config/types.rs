use chrono::NaiveDate;
use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Post-Harvest
///
/// Every section is optional; omitted values fall back to the limits of the
/// provider's free tier.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub pacing: PacingConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub collection: CollectionConfig,
}

/// Search API endpoint configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Full URL of the advanced search endpoint
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Header carrying the API key
    #[serde(rename = "key-header", default = "default_key_header")]
    pub key_header: String,

    /// Value of the `queryType` parameter
    #[serde(rename = "query-type", default = "default_query_type")]
    pub query_type: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            key_header: default_key_header(),
            query_type: default_query_type(),
        }
    }
}

/// Request pacing and retry configuration (all durations in milliseconds)
#[derive(Debug, Clone, Deserialize)]
pub struct PacingConfig {
    /// Per-request timeout
    #[serde(rename = "request-timeout", default = "default_request_timeout")]
    pub request_timeout: u64,

    /// Wait before retrying a page after a transient failure
    #[serde(rename = "retry-backoff", default = "default_retry_backoff")]
    pub retry_backoff: u64,

    /// Attempts per page before the rest of the window is abandoned
    #[serde(rename = "max-attempts", default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Wait between two successful page requests
    #[serde(rename = "inter-request-delay", default = "default_inter_request_delay")]
    pub inter_request_delay: u64,

    /// Wait between two walked windows
    #[serde(rename = "inter-window-delay", default = "default_inter_request_delay")]
    pub inter_window_delay: u64,

    /// Hard cap on pages fetched for a single window
    #[serde(rename = "max-pages-per-window", default = "default_max_pages")]
    pub max_pages_per_window: u32,
}

impl PacingConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff)
    }

    pub fn inter_request_delay(&self) -> Duration {
        Duration::from_millis(self.inter_request_delay)
    }

    pub fn inter_window_delay(&self) -> Duration {
        Duration::from_millis(self.inter_window_delay)
    }
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            request_timeout: default_request_timeout(),
            retry_backoff: default_retry_backoff(),
            max_attempts: default_max_attempts(),
            inter_request_delay: default_inter_request_delay(),
            inter_window_delay: default_inter_request_delay(),
            max_pages_per_window: default_max_pages(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Directory holding one sub-directory per account
    #[serde(rename = "data-dir", default = "default_data_dir")]
    pub data_dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Default collection range
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CollectionConfig {
    /// Oldest date to collect (inclusive)
    #[serde(rename = "start-date", default)]
    pub start_date: Option<NaiveDate>,

    /// Newest date to collect (exclusive); defaults to tomorrow
    #[serde(rename = "end-date", default)]
    pub end_date: Option<NaiveDate>,
}

fn default_endpoint() -> String {
    "https://api.twitterapi.io/twitter/tweet/advanced_search".to_string()
}

fn default_key_header() -> String {
    "X-API-Key".to_string()
}

fn default_query_type() -> String {
    "Latest".to_string()
}

fn default_request_timeout() -> u64 {
    30_000
}

fn default_retry_backoff() -> u64 {
    6_000
}

fn default_max_attempts() -> u32 {
    5
}

fn default_inter_request_delay() -> u64 {
    5_200
}

fn default_max_pages() -> u32 {
    200
}

fn default_data_dir() -> String {
    "./data".to_string()
}
