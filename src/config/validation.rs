use crate::config::types::{ClientConfig, Config, FetchConfig, OutputConfig, ProxyConfig};
use crate::ConfigError;
use url::Url;

/// Schemes accepted in the proxy list
const PROXY_SCHEMES: &[&str] = &["http", "https", "socks5", "socks5h"];

/// Upper bound on the base retry delay (one minute)
const MAX_RETRY_BACKOFF_MS: u64 = 60_000;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_client_config(&config.client)?;
    validate_fetch_config(&config.fetch)?;
    validate_proxy_config(&config.proxy)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates HTTP client configuration
fn validate_client_config(config: &ClientConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.host_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid host_url: {}", e)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidUrl(format!(
            "host_url must use http or https, got '{}'",
            config.host_url
        )));
    }

    if config.max_retries > 10 {
        return Err(ConfigError::Validation(format!(
            "max_retries must be <= 10, got {}",
            config.max_retries
        )));
    }

    if config.retry_backoff_ms > MAX_RETRY_BACKOFF_MS {
        return Err(ConfigError::Validation(format!(
            "retry_backoff_ms must be <= {}, got {}",
            MAX_RETRY_BACKOFF_MS, config.retry_backoff_ms
        )));
    }

    if config.timeout_secs < 1 || config.connect_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "timeout_secs and connect_timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.user_agent.is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates crash retrieval configuration
fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.concurrency < 1 || config.concurrency > 32 {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and 32, got {}",
            config.concurrency
        )));
    }

    if config.legacy_page_size < 1 {
        return Err(ConfigError::Validation(format!(
            "legacy_page_size must be >= 1, got {}",
            config.legacy_page_size
        )));
    }

    Ok(())
}

/// Validates the proxy list
fn validate_proxy_config(config: &ProxyConfig) -> Result<(), ConfigError> {
    if config.enabled && config.proxies.is_empty() {
        return Err(ConfigError::Validation(
            "proxy mode is enabled but the proxy list is empty".to_string(),
        ));
    }

    for proxy in &config.proxies {
        let url = Url::parse(proxy)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid proxy '{}': {}", proxy, e)))?;

        if !PROXY_SCHEMES.contains(&url.scheme()) {
            return Err(ConfigError::InvalidUrl(format!(
                "Proxy '{}' has unsupported scheme '{}'",
                proxy,
                url.scheme()
            )));
        }
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.directory_cache.is_empty() {
        return Err(ConfigError::Validation(
            "directory_cache cannot be empty".to_string(),
        ));
    }

    if config.export_dir.is_empty() {
        return Err(ConfigError::Validation(
            "export_dir cannot be empty".to_string(),
        ));
    }

    Ok(())
}
