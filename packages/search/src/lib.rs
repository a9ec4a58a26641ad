#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Web search and page-scrape provider used by the research and community
//! agents.

mod markdown;

use std::sync::Arc;

use async_trait::async_trait;
use concierge_net::{http_client, retry, UpstreamError};
use serde::{Deserialize, Serialize};

pub use markdown::render_markdown;

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("search provider rejected credentials: {0}")]
    ProviderAuth(String),

    #[error("search provider rate limited the request: {0}")]
    ProviderRateLimit(String),

    #[error("search provider had a transient failure: {0}")]
    ProviderTransient(String),

    #[error("search provider rejected the request: {0}")]
    ProviderFatal(String),

    #[error("search provider response could not be parsed: {0}")]
    Parse(String),
}

impl From<UpstreamError> for SearchError {
    fn from(err: UpstreamError) -> Self {
        match err {
            UpstreamError::Auth(m) => Self::ProviderAuth(m),
            UpstreamError::Transient(m) => Self::ProviderTransient(m),
            UpstreamError::Fatal(m) => Self::ProviderFatal(m),
            UpstreamError::Parse(m) => Self::Parse(m),
            UpstreamError::Timeout => Self::ProviderTransient("timed out".to_owned()),
        }
    }
}

/// One organic web search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
    pub display_url: String,
}

/// Web search and page-scrape operations. Both are idempotent.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Issues a web search and returns organic hits.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError`] per the provider's response status.
    async fn search(&self, query: &str, engine: &str) -> Result<Vec<SearchHit>, SearchError>;

    /// Fetches `url` and renders a markdown-ish plain-text approximation
    /// of its body.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError`] if the page cannot be fetched.
    async fn scrape_markdown(&self, url: &str) -> Result<String, SearchError>;
}

/// Lets a shared `Arc<dyn SearchProvider>` be passed anywhere a
/// `SearchProvider` is expected, so the coordinator can hand the same
/// provider instance to the research, community, and negotiation agents
/// without each one owning a copy.
#[async_trait]
impl<T: SearchProvider + ?Sized> SearchProvider for Arc<T> {
    async fn search(&self, query: &str, engine: &str) -> Result<Vec<SearchHit>, SearchError> {
        (**self).search(query, engine).await
    }

    async fn scrape_markdown(&self, url: &str) -> Result<String, SearchError> {
        (**self).scrape_markdown(url).await
    }
}

/// Calls an external search API over HTTP; fetches and renders pages
/// directly (no headless browser).
pub struct HttpSearchProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl HttpSearchProvider {
    #[must_use]
    pub fn new(api_key: String, base_url: Option<String>) -> Self {
        Self {
            client: http_client(),
            api_key,
            base_url: base_url.unwrap_or_else(|| "https://api.search.concierge.dev/v1".to_owned()),
        }
    }

    /// Builds a provider from `SEARCH_PROVIDER_API_KEY`/
    /// `SEARCH_PROVIDER_BASE_URL`.
    ///
    /// # Errors
    ///
    /// Returns a configuration message when `SEARCH_PROVIDER_API_KEY` is
    /// absent.
    pub fn from_env() -> Result<Self, String> {
        let api_key = std::env::var("SEARCH_PROVIDER_API_KEY")
            .map_err(|_| "SEARCH_PROVIDER_API_KEY is not set".to_owned())?;
        let base_url = std::env::var("SEARCH_PROVIDER_BASE_URL").ok();
        Ok(Self::new(api_key, base_url))
    }
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchHit>,
}

#[async_trait]
impl SearchProvider for HttpSearchProvider {
    async fn search(&self, query: &str, engine: &str) -> Result<Vec<SearchHit>, SearchError> {
        let url = format!("{}/search", self.base_url);
        let policy = retry::RetryPolicy::default().with_max_retries(3);
        let value = retry::send_json(
            || {
                self.client
                    .get(&url)
                    .bearer_auth(&self.api_key)
                    .query(&[("q", query), ("engine", engine)])
            },
            &policy,
        )
        .await?;

        let parsed: SearchResponse = serde_json::from_value(value)
            .map_err(|e| SearchError::Parse(format!("unexpected search response: {e}")))?;
        Ok(parsed.results)
    }

    async fn scrape_markdown(&self, url: &str) -> Result<String, SearchError> {
        let html = retry::send_text(|| self.client.get(url), &retry::RetryPolicy::default())
            .await?;
        Ok(render_markdown(&html))
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::{HttpSearchProvider, SearchProvider};

    #[tokio::test]
    async fn search_parses_hits() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": [
                    {"title":"T2 Faro","url":"https://idealista.pt/1","snippet":"...","displayUrl":"idealista.pt"}
                ]
            })))
            .mount(&server)
            .await;

        let provider = HttpSearchProvider::new("key".to_owned(), Some(server.uri()));
        let hits = provider.search("T2 Faro", "google").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].url, "https://idealista.pt/1");
    }

    #[tokio::test]
    async fn search_surfaces_auth_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let provider = HttpSearchProvider::new("bad-key".to_owned(), Some(server.uri()));
        let err = provider.search("q", "google").await.unwrap_err();
        assert!(matches!(err, super::SearchError::ProviderAuth(_)));
    }
}
