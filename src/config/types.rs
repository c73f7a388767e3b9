use serde::Deserialize;

/// Main configuration structure for the crash scraper
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub proxy: ProxyConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// HTTP client configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the statistics website
    #[serde(rename = "host-url")]
    pub host_url: String,

    /// Connection-level retries before a call is reported unreachable
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Total request timeout (seconds)
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    /// Connect timeout (seconds)
    #[serde(rename = "connect-timeout-secs")]
    pub connect_timeout_secs: u64,

    /// Base delay between retries, doubled on each attempt (milliseconds)
    #[serde(rename = "retry-backoff-ms")]
    pub retry_backoff_ms: u64,

    #[serde(rename = "user-agent")]
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host_url: "http://stat.gibdd.ru".to_string(),
            max_retries: 5,
            timeout_secs: 60,
            connect_timeout_secs: 10,
            retry_backoff_ms: 500,
            user_agent: format!("gibdd-crashes/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Crash retrieval configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Worker pool size for one region fan-out
    pub concurrency: usize,

    /// Card window size used by the deprecated paged fetch
    #[serde(rename = "legacy-page-size")]
    pub legacy_page_size: u32,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            concurrency: 5,
            legacy_page_size: 50,
        }
    }
}

/// Rotating proxy configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    pub enabled: bool,

    /// Proxy URLs (http://, https://, socks5:// or socks5h://)
    pub proxies: Vec<String>,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path to the JSON region directory cache
    #[serde(rename = "directory-cache")]
    pub directory_cache: String,

    /// Directory that receives exported CSV files
    #[serde(rename = "export-dir")]
    pub export_dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory_cache: "./regions.json".to_string(),
            export_dir: "./export".to_string(),
        }
    }
}
