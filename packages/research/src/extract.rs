use std::sync::Arc;

use concierge_llm::LlmGateway;
use concierge_models::Candidate;
use concierge_search::{SearchHit, SearchProvider};
use futures::stream::{self, StreamExt};
use serde::Deserialize;
use tokio::sync::Semaphore;

const EXTRACTION_SYSTEM_PROMPT: &str = "Extract a single real-estate listing from the markdown \
below into JSON with exactly these fields: title (string), address (string), description \
(string), price (number or null), currency (3-letter code, default \"EUR\"), is_rent (boolean), \
bedrooms (integer or null), bathrooms (number or null), area_sqm (number or null), \
property_type (string or null). Reply with only the JSON object. If the page is clearly not a \
property listing, reply with {}.";

#[derive(Deserialize, Default)]
struct ExtractedListing {
    title: Option<String>,
    address: Option<String>,
    description: Option<String>,
    price: Option<f64>,
    currency: Option<String>,
    #[serde(default)]
    is_rent: bool,
    bedrooms: Option<u32>,
    bathrooms: Option<f32>,
    area_sqm: Option<f64>,
    property_type: Option<String>,
}

/// Scrapes and extracts each hit concurrently (bounded by `concurrency`).
/// A hit that fails to scrape, fails to extract, or extracts without a
/// title/address is dropped silently — it does not fail the batch.
pub async fn extract_all(
    search: &(impl SearchProvider + ?Sized),
    gateway: &LlmGateway,
    hits: &[SearchHit],
    concurrency: usize,
) -> Vec<Candidate> {
    let semaphore = Arc::new(Semaphore::new(concurrency));

    stream::iter(hits.iter().cloned())
        .map(|hit| {
            let semaphore = Arc::clone(&semaphore);
            async move {
                let _permit = semaphore.acquire().await.ok()?;
                extract_one(search, gateway, &hit).await
            }
        })
        .buffer_unordered(concurrency)
        .filter_map(|result| async move { result })
        .collect()
        .await
}

async fn extract_one(
    search: &(impl SearchProvider + ?Sized),
    gateway: &LlmGateway,
    hit: &SearchHit,
) -> Option<Candidate> {
    let markdown = match search.scrape_markdown(&hit.url).await {
        Ok(md) => md,
        Err(err) => {
            log::warn!("scrape failed for {}: {err}", hit.url);
            return None;
        }
    };

    let reply = match gateway
        .complete(EXTRACTION_SYSTEM_PROMPT, &markdown, true, 600, 0.0)
        .await
    {
        Ok(reply) => reply,
        Err(err) => {
            log::warn!("extraction llm call failed for {}: {err}", hit.url);
            return None;
        }
    };

    let parsed: ExtractedListing = match serde_json::from_str(&reply) {
        Ok(parsed) => parsed,
        Err(err) => {
            log::warn!("extraction returned unparseable json for {}: {err}", hit.url);
            return None;
        }
    };

    let title = parsed.title?;
    let address = parsed.address?;

    Some(Candidate {
        title,
        address,
        description: parsed.description.unwrap_or_default(),
        url: hit.url.clone(),
        image_url: None,
        price: parsed.price,
        currency: parsed.currency.unwrap_or_else(|| "EUR".to_owned()),
        is_rent: parsed.is_rent,
        bedrooms: parsed.bedrooms,
        bathrooms: parsed.bathrooms,
        area_sqm: parsed.area_sqm,
        property_type: parsed.property_type,
        raw_markdown: markdown,
    })
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use concierge_llm::LlmGateway;
    use concierge_search::{SearchError, SearchHit, SearchProvider};
    use std::sync::{Arc, Mutex};

    use super::extract_all;

    struct StubSearch {
        markdown: Mutex<Vec<Result<&'static str, ()>>>,
    }

    #[async_trait]
    impl SearchProvider for StubSearch {
        async fn search(&self, _query: &str, _engine: &str) -> Result<Vec<SearchHit>, SearchError> {
            unimplemented!("not used in this test")
        }

        async fn scrape_markdown(&self, _url: &str) -> Result<String, SearchError> {
            match self.markdown.lock().unwrap().remove(0) {
                Ok(md) => Ok(md.to_owned()),
                Err(()) => Err(SearchError::ProviderFatal("dead link".to_owned())),
            }
        }
    }

    struct StubProvider {
        replies: Mutex<Vec<&'static str>>,
    }

    #[async_trait]
    impl concierge_llm::LlmProvider for StubProvider {
        async fn complete(
            &self,
            _system_prompt: &str,
            _user_prompt: &str,
            _max_tokens: u32,
            _temperature: f32,
        ) -> Result<String, concierge_net::UpstreamError> {
            Ok(self.replies.lock().unwrap().remove(0).to_owned())
        }
    }

    #[tokio::test]
    async fn drops_hit_whose_scrape_fails_without_failing_batch() {
        let search = StubSearch {
            markdown: Mutex::new(vec![Err(()), Ok("# T2 Faro\nAddress: Rua X")]),
        };
        let provider = StubProvider {
            replies: Mutex::new(vec![
                r#"{"title":"T2 Faro","address":"Rua X","price":800}"#,
            ]),
        };
        let gateway = LlmGateway::new(Arc::new(provider));
        let hits = vec![
            SearchHit {
                title: "dead".to_owned(),
                url: "https://idealista.pt/dead".to_owned(),
                snippet: String::new(),
                display_url: String::new(),
            },
            SearchHit {
                title: "alive".to_owned(),
                url: "https://idealista.pt/alive".to_owned(),
                snippet: String::new(),
                display_url: String::new(),
            },
        ];
        let candidates = extract_all(&search, &gateway, &hits, 2).await;
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].title, "T2 Faro");
    }
}
