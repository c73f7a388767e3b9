//! HTTP transport implementation
//!
//! This module wraps every request made to the statistics website:
//! - Building HTTP clients with the configured user agent and timeouts
//! - Bounded retries with exponential backoff on connection failures
//! - Optional proxy rotation with fallback to a direct connection
//! - Classification of failures into unreachable vs. non-2xx responses

use crate::config::{ClientConfig, Config};
use crate::transport::proxy::{ActiveProxy, ProxyRotation};
use crate::{GibddError, Result};
use reqwest::{Client, Method, Proxy, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The client configuration
/// * `proxy` - Proxy URL to route every request through, or `None` for a
///   direct client that also ignores proxy environment variables
pub fn build_http_client(
    config: &ClientConfig,
    proxy: Option<&str>,
) -> std::result::Result<Client, reqwest::Error> {
    let builder = Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .gzip(true)
        .brotli(true);

    let builder = match proxy {
        Some(url) => builder.proxy(Proxy::all(url)?),
        None => builder.no_proxy(),
    };

    builder.build()
}

/// A successful (2xx) response with its body read to the end
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    /// Decodes the body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_str(&self.body)
    }
}

/// Errors worth another attempt at the connection layer
fn is_transient(error: &reqwest::Error) -> bool {
    error.is_connect() || error.is_timeout() || error.is_request() || error.is_body()
}

/// HTTP transport shared by all fetchers of one run
#[derive(Debug)]
pub struct Transport {
    base_url: Url,
    direct: Client,
    proxies: Option<ProxyRotation>,
    max_retries: u32,
    retry_backoff: Duration,
}

impl Transport {
    /// Creates a transport from the run configuration
    pub fn new(config: &Config) -> Result<Self> {
        let base_url = Url::parse(&config.client.host_url)?;
        let direct = build_http_client(&config.client, None)?;

        let proxies = if config.proxy.enabled {
            tracing::info!(
                "Proxy rotation enabled with {} proxies",
                config.proxy.proxies.len()
            );
            Some(ProxyRotation::new(&config.proxy.proxies, &config.client)?)
        } else {
            None
        };

        Ok(Self {
            base_url,
            direct,
            proxies,
            max_retries: config.client.max_retries,
            retry_backoff: Duration::from_millis(config.client.retry_backoff_ms),
        })
    }

    /// Base URL every request path is joined onto
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Proxy rotation state, when proxy mode is enabled
    pub fn proxies(&self) -> Option<&ProxyRotation> {
        self.proxies.as_ref()
    }

    /// POSTs a JSON body to a path relative to the base URL
    pub async fn post_json(&self, path: &str, body: &serde_json::Value) -> Result<RawResponse> {
        self.send(Method::POST, path, Some(body)).await
    }

    /// Sends a request with retry and proxy handling
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | 2xx | Return the body |
    /// | Non-2xx | Immediate → RequestFailed |
    /// | Proxy connection failure | Mark proxy unavailable, rotate, retry once |
    /// | Connect/timeout/body error | Retry up to `max_retries` with backoff |
    /// | Retries exhausted | Unreachable |
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<RawResponse> {
        let url = self.base_url.join(path)?;
        let mut attempt = 0u32;
        let mut rotated = false;

        loop {
            let proxy = self
                .proxies
                .as_ref()
                .and_then(|rotation| rotation.current(url.scheme()));
            let client = proxy.as_ref().map_or(&self.direct, |p| &p.client);

            match dispatch(client, method.clone(), &url, body).await {
                Ok((status, text)) => {
                    if let (Some(rotation), Some(active)) = (&self.proxies, &proxy) {
                        rotation.mark_available(&active.url);
                    }

                    if !status.is_success() {
                        tracing::error!("{} {} failed with status {}", method, url, status);
                        return Err(GibddError::RequestFailed {
                            url: url.to_string(),
                            status: status.as_u16(),
                            body: text,
                        });
                    }

                    tracing::debug!("{} {} succeeded ({} bytes)", method, url, text.len());
                    return Ok(RawResponse {
                        status: status.as_u16(),
                        body: text,
                    });
                }
                Err(e) if !rotated && is_proxy_failure(&proxy, &e) => {
                    rotated = true;
                    if let (Some(rotation), Some(active)) = (&self.proxies, &proxy) {
                        tracing::warn!("Proxy {} failed, rotating: {}", active.url, e);
                        rotation.mark_unavailable(&active.url, url.scheme());
                    }
                }
                Err(e) if is_transient(&e) && attempt < self.max_retries => {
                    attempt += 1;
                    let delay = backoff_delay(self.retry_backoff, attempt);
                    tracing::warn!(
                        "{} {} failed (attempt {}/{}), retrying in {:?}: {}",
                        method,
                        url,
                        attempt,
                        self.max_retries,
                        delay,
                        e
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) if is_transient(&e) => {
                    tracing::error!("Unable to reach {} after {} retries: {}", url, attempt, e);
                    return Err(GibddError::Unreachable {
                        url: url.to_string(),
                        source: e,
                    });
                }
                Err(e) => {
                    tracing::error!("{} {} failed: {}", method, url, e);
                    return Err(GibddError::Reqwest(e));
                }
            }
        }
    }
}

/// Delay before retry number `attempt` (1-based), doubling each time
///
/// Saturates at `Duration::MAX` instead of overflowing.
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    2u32.checked_pow(attempt.saturating_sub(1))
        .and_then(|factor| base.checked_mul(factor))
        .unwrap_or(Duration::MAX)
}

fn is_proxy_failure(proxy: &Option<ActiveProxy>, error: &reqwest::Error) -> bool {
    proxy.is_some() && (error.is_connect() || error.is_timeout())
}

/// Sends one request and reads the whole body
async fn dispatch(
    client: &Client,
    method: Method,
    url: &Url,
    body: Option<&serde_json::Value>,
) -> std::result::Result<(StatusCode, String), reqwest::Error> {
    let mut request = client.request(method, url.clone());
    if let Some(body) = body {
        request = request.json(body);
    }

    let response = request.send().await?;
    let status = response.status();
    let text = response.text().await?;
    Ok((status, text))
}
