#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Forward-geocodes a free-text address to a coordinate with a confidence
//! score. Callers should treat a confidence below 0.3 as [`GeocodeResult::NotFound`].

use std::sync::Arc;

use async_trait::async_trait;
use concierge_net::{http_client, retry, UpstreamError};
use serde::Deserialize;

/// Confidence below this threshold is treated as [`GeocodeResult::NotFound`]
/// by callers (the mapping agent).
pub const MIN_CONFIDENCE: f32 = 0.3;

#[derive(Debug, thiserror::Error)]
pub enum GeocodeError {
    #[error("geocoder rejected credentials: {0}")]
    Auth(String),

    #[error("geocoder had a transient failure: {0}")]
    Transient(String),

    #[error("geocoder rejected the request: {0}")]
    Fatal(String),

    #[error("geocoder response could not be parsed: {0}")]
    Parse(String),
}

impl From<UpstreamError> for GeocodeError {
    fn from(err: UpstreamError) -> Self {
        match err {
            UpstreamError::Auth(m) => Self::Auth(m),
            UpstreamError::Transient(m) => Self::Transient(m),
            UpstreamError::Fatal(m) => Self::Fatal(m),
            UpstreamError::Parse(m) => Self::Parse(m),
            UpstreamError::Timeout => Self::Transient("timed out".to_owned()),
        }
    }
}

/// A resolved coordinate, or a clear signal that nothing matched closely
/// enough to trust.
#[derive(Debug, Clone, PartialEq)]
pub enum GeocodeResult {
    Found {
        latitude: f64,
        longitude: f64,
        confidence: f32,
        normalized_address: String,
    },
    NotFound,
}

#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Resolves `query` to a coordinate. `country_hint` narrows ambiguous
    /// matches (e.g. `"PT"`).
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError`] on auth/transient/fatal failures from the
    /// provider; a low-confidence or absent match is
    /// [`GeocodeResult::NotFound`], not an error.
    async fn geocode(
        &self,
        query: &str,
        country_hint: Option<&str>,
    ) -> Result<GeocodeResult, GeocodeError>;
}

/// Lets a shared `Arc<dyn Geocoder>` be used wherever a `Geocoder` is
/// expected.
#[async_trait]
impl<T: Geocoder + ?Sized> Geocoder for Arc<T> {
    async fn geocode(
        &self,
        query: &str,
        country_hint: Option<&str>,
    ) -> Result<GeocodeResult, GeocodeError> {
        (**self).geocode(query, country_hint).await
    }
}

/// Calls an external geocoding HTTP API. One transient retry beyond the
/// initial attempt, per the spec's note that geocoding should fail fast
/// relative to the LLM/search retry budgets.
pub struct HttpGeocoder {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl HttpGeocoder {
    #[must_use]
    pub fn new(api_key: String, base_url: Option<String>) -> Self {
        Self {
            client: http_client(),
            api_key,
            base_url: base_url
                .unwrap_or_else(|| "https://api.geocoder.concierge.dev/v1".to_owned()),
        }
    }

    /// Builds a geocoder from `GEOCODER_API_KEY`/`GEOCODER_BASE_URL`.
    ///
    /// # Errors
    ///
    /// Returns a configuration message when `GEOCODER_API_KEY` is absent.
    pub fn from_env() -> Result<Self, String> {
        let api_key = std::env::var("GEOCODER_API_KEY")
            .map_err(|_| "GEOCODER_API_KEY is not set".to_owned())?;
        let base_url = std::env::var("GEOCODER_BASE_URL").ok();
        Ok(Self::new(api_key, base_url))
    }
}

#[derive(Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    results: Vec<GeocodeHit>,
}

#[derive(Deserialize)]
struct GeocodeHit {
    latitude: f64,
    longitude: f64,
    confidence: f32,
    #[serde(default)]
    formatted_address: String,
}

#[async_trait]
impl Geocoder for HttpGeocoder {
    async fn geocode(
        &self,
        query: &str,
        country_hint: Option<&str>,
    ) -> Result<GeocodeResult, GeocodeError> {
        let url = format!("{}/geocode", self.base_url);
        let policy = retry::RetryPolicy::default().with_max_retries(1);
        let mut request = vec![("q", query.to_owned())];
        if let Some(hint) = country_hint {
            request.push(("country", hint.to_owned()));
        }

        let value = retry::send_json(
            || self.client.get(&url).bearer_auth(&self.api_key).query(&request),
            &policy,
        )
        .await?;

        let parsed: GeocodeResponse = serde_json::from_value(value)
            .map_err(|e| GeocodeError::Parse(format!("unexpected geocoder response: {e}")))?;

        let Some(best) = parsed.results.into_iter().next() else {
            return Ok(GeocodeResult::NotFound);
        };

        if best.confidence < MIN_CONFIDENCE {
            return Ok(GeocodeResult::NotFound);
        }

        Ok(GeocodeResult::Found {
            latitude: best.latitude,
            longitude: best.longitude,
            confidence: best.confidence,
            normalized_address: best.formatted_address,
        })
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::{GeocodeResult, Geocoder, HttpGeocoder};

    #[tokio::test]
    async fn low_confidence_match_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/geocode"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": [{"latitude": 37.0, "longitude": -7.9, "confidence": 0.1, "formatted_address": "?"}]
            })))
            .mount(&server)
            .await;

        let geocoder = HttpGeocoder::new("key".to_owned(), Some(server.uri()));
        let result = geocoder.geocode("somewhere vague", None).await.unwrap();
        assert_eq!(result, GeocodeResult::NotFound);
    }

    #[tokio::test]
    async fn confident_match_resolves() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/geocode"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": [{"latitude": 37.0194, "longitude": -7.9304, "confidence": 0.92, "formatted_address": "Faro, Portugal"}]
            })))
            .mount(&server)
            .await;

        let geocoder = HttpGeocoder::new("key".to_owned(), Some(server.uri()));
        let result = geocoder.geocode("Faro", Some("PT")).await.unwrap();
        assert!(matches!(result, GeocodeResult::Found { confidence, .. } if confidence > 0.9));
    }
}
