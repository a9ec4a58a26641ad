#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Shared HTTP retry policy and error taxonomy for every component that
//! calls an external service (the LLM gateway, search provider, geocoder,
//! POI provider, and telephony provider).
//!
//! Every outbound call in the pipeline should go through [`send_json`] or
//! [`send_text`] instead of calling [`reqwest::RequestBuilder::send`]
//! directly, so that transient failures get uniform exponential backoff
//! and 4xx/401/403 responses fail fast without retrying.

pub mod retry;

use std::time::Duration;

pub use retry::{send_json, send_text, RetryPolicy};

/// Per-attempt timeout for every outbound call (§4.1): 30s. Applies to a
/// single attempt, not the whole retry sequence — `retry::send_json`/
/// `send_text` layer backoff on top of this per try.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Builds a `reqwest::Client` with the shared per-attempt timeout applied.
/// Every provider crate should construct its client through this instead
/// of `reqwest::Client::new()`, so a hung upstream can't stall a request
/// past its deadline without ever producing a retryable `Timeout`.
///
/// # Panics
///
/// Panics if the underlying TLS backend fails to initialize, matching
/// `reqwest::Client::new()`'s own panicking behavior.
#[must_use]
pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .expect("reqwest client with a fixed timeout should always build")
}

/// The shared error categories for any outbound call. Agent crates wrap
/// this via `#[from]` in their own `thiserror` enums alongside their own
/// `LogicError`/`Timeout` variants.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    /// 401/403 — invalid or missing credentials. Never retried.
    #[error("upstream authentication failed: {0}")]
    Auth(String),

    /// 5xx, 429, or a network-level error, after retries were exhausted.
    #[error("upstream transient failure: {0}")]
    Transient(String),

    /// 4xx other than 401/403/429. Not retried.
    #[error("upstream rejected the request: {0}")]
    Fatal(String),

    /// The response body could not be parsed as JSON.
    #[error("failed to parse upstream response: {0}")]
    Parse(String),

    /// The call did not complete within its deadline.
    #[error("upstream call timed out")]
    Timeout,
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return Self::Timeout;
        }
        if let Some(status) = err.status() {
            if status.as_u16() == 401 || status.as_u16() == 403 {
                return Self::Auth(err.to_string());
            }
            if status.is_client_error() {
                return Self::Fatal(err.to_string());
            }
        }
        Self::Transient(err.to_string())
    }
}
