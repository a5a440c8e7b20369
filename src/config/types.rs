use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Spread-Mapper
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub followers: FollowersConfig,
    #[serde(default)]
    pub posts: PostsConfig,
}

/// Where the target URLs come from
#[derive(Debug, Clone, Deserialize)]
pub struct InputConfig {
    /// Path to the CSV file holding the target URLs
    #[serde(default)]
    pub file: Option<String>,

    /// Name of the column containing the URLs
    #[serde(rename = "url-col", default = "default_url_col")]
    pub url_col: String,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            file: None,
            url_col: default_url_col(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Base directory for all stage files
    #[serde(default = "default_output_directory")]
    pub directory: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_directory(),
        }
    }
}

/// Remote service connection settings
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Base URL the endpoint paths are joined onto
    #[serde(rename = "base-url", default = "default_base_url")]
    pub base_url: String,

    /// User-Agent header sent with every request
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    /// Whole-request timeout in seconds
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: default_user_agent(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Crawl pacing and failure policy
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Floor delay before each search call (milliseconds)
    #[serde(rename = "pacing-delay-ms", default = "default_pacing_delay")]
    pub pacing_delay_ms: u64,

    /// Log and skip remote failures at the follower and follower-post level
    /// instead of halting the run
    #[serde(rename = "skip-failed-items", default)]
    pub skip_failed_items: bool,
}

impl CrawlerConfig {
    pub fn pacing_delay(&self) -> Duration {
        Duration::from_millis(self.pacing_delay_ms)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            pacing_delay_ms: default_pacing_delay(),
            skip_failed_items: false,
        }
    }
}

/// Search stage parameters
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    /// Query template; `{url}` is replaced by the target URL
    #[serde(rename = "query-template", default = "default_query_template")]
    pub query_template: String,

    /// Page size for the search call
    #[serde(rename = "max-results", default = "default_search_max_results")]
    pub max_results: u32,

    #[serde(rename = "tweet-fields", default = "default_tweet_fields")]
    pub tweet_fields: String,
}

impl SearchConfig {
    /// Builds the search query for one target URL
    pub fn query_for(&self, url: &str) -> String {
        self.query_template.replace("{url}", url)
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            query_template: default_query_template(),
            max_results: default_search_max_results(),
            tweet_fields: default_tweet_fields(),
        }
    }
}

/// Follower stage parameters
#[derive(Debug, Clone, Deserialize)]
pub struct FollowersConfig {
    #[serde(rename = "max-results", default = "default_page_size")]
    pub max_results: u32,

    #[serde(rename = "user-fields", default = "default_user_fields")]
    pub user_fields: String,
}

impl Default for FollowersConfig {
    fn default() -> Self {
        Self {
            max_results: default_page_size(),
            user_fields: default_user_fields(),
        }
    }
}

/// Follower-post stage parameters
#[derive(Debug, Clone, Deserialize)]
pub struct PostsConfig {
    #[serde(rename = "max-results", default = "default_page_size")]
    pub max_results: u32,

    #[serde(rename = "tweet-fields", default = "default_tweet_fields")]
    pub tweet_fields: String,
}

impl Default for PostsConfig {
    fn default() -> Self {
        Self {
            max_results: default_page_size(),
            tweet_fields: default_tweet_fields(),
        }
    }
}

fn default_url_col() -> String {
    "url".to_string()
}

fn default_output_directory() -> String {
    "./output".to_string()
}

fn default_base_url() -> String {
    "https://api.twitter.com".to_string()
}

fn default_user_agent() -> String {
    "v2RecentSearchPython".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_pacing_delay() -> u64 {
    1100
}

fn default_query_template() -> String {
    "(url:{url})".to_string()
}

fn default_search_max_results() -> u32 {
    10
}

fn default_page_size() -> u32 {
    100
}

fn default_tweet_fields() -> String {
    "referenced_tweets,created_at".to_string()
}

fn default_user_fields() -> String {
    "id,name,username".to_string()
}
