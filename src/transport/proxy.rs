//! Rotating proxy list
//!
//! The rotation state is shared by every worker that uses one [`Transport`],
//! so all reads and mutations go through a single mutex. The lock is never
//! held across an await point.
//!
//! [`Transport`]: crate::transport::Transport

use crate::config::ClientConfig;
use crate::transport::client::build_http_client;
use reqwest::Client;
use std::sync::{Mutex, PoisonError};

/// Proxy pool a URL belongs to, decided by its scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyKind {
    /// `http://` proxy, usable for plain-http targets
    Http,
    /// `https://` proxy, usable for https targets
    Https,
    /// `socks5://` or `socks5h://`, usable for any target
    Socks,
}

impl ProxyKind {
    /// Classifies a proxy URL by its scheme prefix
    pub fn from_url(url: &str) -> Self {
        if url.starts_with("socks5") {
            ProxyKind::Socks
        } else if url.starts_with("https://") {
            ProxyKind::Https
        } else {
            ProxyKind::Http
        }
    }

    /// Whether this proxy can carry requests to a target with the given scheme
    pub fn serves(&self, target_scheme: &str) -> bool {
        match self {
            ProxyKind::Socks => true,
            ProxyKind::Http => target_scheme == "http",
            ProxyKind::Https => target_scheme == "https",
        }
    }

    fn is_socks(&self) -> bool {
        matches!(self, ProxyKind::Socks)
    }
}

/// Health of a single proxy as observed by the transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyStatus {
    Unknown,
    Available,
    Unavailable,
}

#[derive(Debug)]
struct ProxyEntry {
    url: String,
    kind: ProxyKind,
    status: ProxyStatus,
    client: Client,
}

impl ProxyEntry {
    fn usable_for(&self, target_scheme: &str) -> bool {
        self.status != ProxyStatus::Unavailable && self.kind.serves(target_scheme)
    }
}

#[derive(Debug, Default)]
struct RotationState {
    entries: Vec<ProxyEntry>,
    active: Option<usize>,
}

impl RotationState {
    /// Picks the first usable proxy, plain proxies before SOCKS ones
    fn resolve(&mut self, target_scheme: &str) -> Option<usize> {
        let plain = self
            .entries
            .iter()
            .position(|e| !e.kind.is_socks() && e.usable_for(target_scheme));
        let next = plain.or_else(|| {
            self.entries
                .iter()
                .position(|e| e.kind.is_socks() && e.usable_for(target_scheme))
        });
        self.active = next;
        next
    }
}

/// The proxy chosen for one request
#[derive(Debug, Clone)]
pub struct ActiveProxy {
    pub url: String,
    pub client: Client,
}

/// Mutex-guarded rotation over a fixed proxy list
#[derive(Debug)]
pub struct ProxyRotation {
    state: Mutex<RotationState>,
}

impl ProxyRotation {
    /// Builds one HTTP client per proxy URL
    pub fn new(proxies: &[String], config: &ClientConfig) -> Result<Self, reqwest::Error> {
        let entries = proxies
            .iter()
            .map(|url| {
                Ok(ProxyEntry {
                    url: url.clone(),
                    kind: ProxyKind::from_url(url),
                    status: ProxyStatus::Unknown,
                    client: build_http_client(config, Some(url))?,
                })
            })
            .collect::<Result<Vec<_>, reqwest::Error>>()?;

        Ok(Self {
            state: Mutex::new(RotationState {
                entries,
                active: None,
            }),
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, RotationState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the active proxy for a target scheme, resolving a new one if needed
    ///
    /// `None` means no proxy is usable and the caller should connect directly.
    pub fn current(&self, target_scheme: &str) -> Option<ActiveProxy> {
        let mut state = self.lock();

        let index = match state.active {
            Some(i) if state.entries[i].usable_for(target_scheme) => Some(i),
            _ => state.resolve(target_scheme),
        };

        index.map(|i| ActiveProxy {
            url: state.entries[i].url.clone(),
            client: state.entries[i].client.clone(),
        })
    }

    /// Marks a proxy unavailable and advances the rotation
    ///
    /// Returns the next usable proxy, if any.
    pub fn mark_unavailable(&self, url: &str, target_scheme: &str) -> Option<ActiveProxy> {
        let mut state = self.lock();

        if let Some(entry) = state.entries.iter_mut().find(|e| e.url == url) {
            entry.status = ProxyStatus::Unavailable;
        }

        match state.resolve(target_scheme) {
            Some(i) => {
                tracing::info!("Rotated to proxy {}", state.entries[i].url);
                Some(ActiveProxy {
                    url: state.entries[i].url.clone(),
                    client: state.entries[i].client.clone(),
                })
            }
            None => {
                tracing::warn!("No available proxies, falling back to direct connection");
                None
            }
        }
    }

    /// Records a successful request through a proxy
    pub fn mark_available(&self, url: &str) {
        let mut state = self.lock();
        if let Some(entry) = state.entries.iter_mut().find(|e| e.url == url) {
            entry.status = ProxyStatus::Available;
        }
    }

    /// Status of a proxy by URL
    pub fn status(&self, url: &str) -> Option<ProxyStatus> {
        self.lock()
            .entries
            .iter()
            .find(|e| e.url == url)
            .map(|e| e.status)
    }

    /// Number of proxies not yet marked unavailable
    pub fn available_count(&self) -> usize {
        self.lock()
            .entries
            .iter()
            .filter(|e| e.status != ProxyStatus::Unavailable)
            .count()
    }
}
