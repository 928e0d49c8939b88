//! Shared utilities used by upstream client implementations.

use lazy_static::lazy_static;
use std::error::Error;
use std::fmt;
use std::time::Duration;

lazy_static! {
    /// Shared HTTP client with persistent connection pooling.
    ///
    /// A single pooled client keeps TLS sessions and DNS lookups warm, which matters
    /// here because every agent in a round opens its own upstream request concurrently.
    static ref SHARED_HTTP_CLIENT: reqwest::Client = {
        reqwest::ClientBuilder::new()
            .pool_idle_timeout(Some(Duration::from_secs(90)))
            .pool_max_idle_per_host(16)
            .tcp_keepalive(Some(Duration::from_secs(60)))
            .timeout(Duration::from_secs(300))
            .connect_timeout(Duration::from_secs(30))
            .build()
            .expect("failed to build shared HTTP client")
    };
}

/// Borrow the lazily initialised shared [`reqwest::Client`].
pub fn get_shared_http_client() -> &'static reqwest::Client {
    &SHARED_HTTP_CLIENT
}

/// Thin error wrapper used when a streaming response fails mid-flight.
#[derive(Debug, Clone)]
pub struct StreamError(pub String);

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Error for StreamError {}
