use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub language: LanguageConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Crawl budgets and worker pool size
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum number of link steps from the seed (0 = seed only)
    #[serde(rename = "max-depth", default = "default_max_depth")]
    pub max_depth: u32,

    /// Maximum number of site-boundary crossings from the seed
    #[serde(rename = "max-hops", default)]
    pub max_hops: u32,

    /// Number of URLs processed concurrently
    #[serde(default = "default_workers")]
    pub workers: u32,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            max_hops: 0,
            workers: default_workers(),
        }
    }
}

/// HTTP timeouts
#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    /// Connect timeout in seconds
    #[serde(rename = "connect-timeout", default = "default_connect_timeout")]
    pub connect_timeout: u64,

    /// Whole-request timeout in seconds
    #[serde(rename = "read-timeout", default = "default_read_timeout")]
    pub read_timeout: u64,
}

impl FetchConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout)
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            connect_timeout: default_connect_timeout(),
            read_timeout: default_read_timeout(),
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name", default = "default_crawler_name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version", default = "default_crawler_version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url", default)]
    pub contact_url: Option<String>,
}

impl UserAgentConfig {
    /// Formats the User-Agent header value
    ///
    /// Format: `Name/Version` or `Name/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        match self.contact_url.as_deref().filter(|c| !c.is_empty()) {
            Some(contact) => format!(
                "{}/{} (+{})",
                self.crawler_name, self.crawler_version, contact
            ),
            None => format!("{}/{}", self.crawler_name, self.crawler_version),
        }
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: default_crawler_name(),
            crawler_version: default_crawler_version(),
            contact_url: None,
        }
    }
}

/// Language filter configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LanguageConfig {
    /// ISO 639-3 code pages must be written in
    #[serde(default = "default_target_language")]
    pub target: String,
}

impl Default for LanguageConfig {
    fn default() -> Self {
        Self {
            target: default_target_language(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Directory holding original/, parsed/, links/ and ids.txt
    #[serde(rename = "data-dir", default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

fn default_max_depth() -> u32 {
    1
}

fn default_workers() -> u32 {
    4
}

fn default_connect_timeout() -> u64 {
    30
}

fn default_read_timeout() -> u64 {
    120
}

fn default_crawler_name() -> String {
    "majka-crawl".to_string()
}

fn default_crawler_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_target_language() -> String {
    "ces".to_string()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}
