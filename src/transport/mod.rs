//! Transport layer for the statistics website
//!
//! This module contains everything that touches the network directly:
//! - HTTP client construction
//! - Retry with backoff on connection failures
//! - Rotating proxy support shared across workers

mod client;
mod proxy;

pub use client::{build_http_client, RawResponse, Transport};
pub use proxy::{ActiveProxy, ProxyKind, ProxyRotation, ProxyStatus};
