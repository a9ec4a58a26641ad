//! Exponential-backoff retry for transient HTTP failures.
//!
//! ```ignore
//! use concierge_net::retry;
//!
//! let body = retry::send_json(|| client.get(&url), &RetryPolicy::default()).await?;
//! ```

use std::time::Duration;

use rand::Rng;

use crate::UpstreamError;

/// Backoff schedule shared by every outbound caller: base 500ms, factor 2,
/// capped at 8s, with ±25% jitter to avoid thundering-herd retries against
/// a recovering upstream.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base: Duration,
    pub cap: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base: Duration::from_millis(500),
            cap: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub const fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    fn delay_for(self, attempt: u32) -> Duration {
        let exp = self.base.saturating_mul(1u32 << attempt.min(16));
        let capped = exp.min(self.cap);
        let jitter_frac = rand::thread_rng().gen_range(-0.25..=0.25_f64);
        let millis = (capped.as_millis() as f64 * (1.0 + jitter_frac)).max(0.0);
        Duration::from_millis(millis as u64)
    }
}

/// Sends a request built by `build_request`, parsing the response as JSON.
/// Retries on 5xx, 429, and network-level errors per `policy`; fails fast
/// on 401/403/4xx.
///
/// # Errors
///
/// Returns [`UpstreamError`] if every attempt fails, the response is a
/// non-retryable status, or the body does not parse as JSON.
pub async fn send_json<F>(
    build_request: F,
    policy: &RetryPolicy,
) -> Result<serde_json::Value, UpstreamError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let response = send_inner(&build_request, policy).await?;
    let text = response.text().await.map_err(UpstreamError::from)?;
    serde_json::from_str(&text).map_err(|e| {
        log::warn!("upstream returned non-JSON body: {e}");
        UpstreamError::Parse(e.to_string())
    })
}

/// Like [`send_json`] but returns the raw response body as text. Used for
/// scraping HTML pages.
///
/// # Errors
///
/// Returns [`UpstreamError`] if every attempt fails or a non-retryable
/// status is returned.
pub async fn send_text<F>(build_request: F, policy: &RetryPolicy) -> Result<String, UpstreamError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let response = send_inner(&build_request, policy).await?;
    response.text().await.map_err(UpstreamError::from)
}

async fn send_inner<F>(
    build_request: &F,
    policy: &RetryPolicy,
) -> Result<reqwest::Response, UpstreamError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let mut last_error: Option<UpstreamError> = None;

    for attempt in 0..=policy.max_retries {
        if attempt > 0 {
            let delay = policy.delay_for(attempt - 1);
            log::warn!("retry {attempt}/{} in {delay:?}", policy.max_retries);
            tokio::time::sleep(delay).await;
        }

        match build_request().send().await {
            Err(e) => {
                let classified = UpstreamError::from(e);
                if matches!(classified, UpstreamError::Transient(_) | UpstreamError::Timeout)
                    && attempt < policy.max_retries
                {
                    log::warn!("transient error on attempt {attempt}: {classified}");
                    last_error = Some(classified);
                    continue;
                }
                return Err(classified);
            }
            Ok(response) => {
                let status = response.status();

                if status.as_u16() == 401 || status.as_u16() == 403 {
                    return Err(UpstreamError::Auth(format!("HTTP {status}")));
                }

                if status.as_u16() == 429 || status.is_server_error() {
                    if attempt < policy.max_retries {
                        log::warn!("retryable status {status} on attempt {attempt}");
                        last_error = Some(UpstreamError::Transient(format!("HTTP {status}")));
                        continue;
                    }
                    return Err(UpstreamError::Transient(format!(
                        "HTTP {status} after {} retries",
                        policy.max_retries
                    )));
                }

                if status.is_client_error() {
                    return Err(UpstreamError::Fatal(format!("HTTP {status}")));
                }

                return Ok(response);
            }
        }
    }

    Err(last_error.unwrap_or(UpstreamError::Timeout))
}
