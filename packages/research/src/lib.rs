#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Turns [`Requirements`] into a ranked set of property [`Candidate`]s: a
//! deterministic search query, a bounded-concurrency extraction pass over
//! the hits, and a location/budget/room filter before ranking.

mod allowlist;
mod extract;
mod filter;
mod query;
mod rank;

use concierge_llm::LlmGateway;
use concierge_models::{Candidate, Requirements};
use concierge_search::SearchProvider;

pub use allowlist::DEFAULT_ALLOWED_DOMAINS;
pub use filter::location_matches;

/// Maximum search hits considered for extraction.
const MAX_HITS: usize = 20;
/// Maximum candidates returned.
const MAX_CANDIDATES: usize = 10;
/// Bounded concurrency for per-hit scrape+extract.
const EXTRACTION_CONCURRENCY: usize = 5;
/// Minimum surviving candidates before attempting a broadened retry.
const MIN_CANDIDATES_BEFORE_BROADEN: usize = 3;

#[derive(Debug, Clone)]
pub struct ResearchOutcome {
    pub candidates: Vec<Candidate>,
    pub summary: String,
}

pub struct ResearchAgent<S: SearchProvider> {
    search: S,
    gateway: LlmGateway,
}

impl<S: SearchProvider> ResearchAgent<S> {
    pub const fn new(search: S, gateway: LlmGateway) -> Self {
        Self { search, gateway }
    }

    /// Runs the full research pipeline. Never fails on partial extraction
    /// failures — individual hits that fail to scrape or extract are
    /// dropped silently. A fatal `search()` failure degrades to an empty
    /// candidate set with an explanatory `summary` rather than
    /// propagating an error — per the requirements this crate implements,
    /// a missing listing source is a "no results" outcome, not a request
    /// failure.
    pub async fn run(&self, requirements: &Requirements) -> ResearchOutcome {
        let candidates = match self.search_and_extract(requirements).await {
            Ok(candidates) => candidates,
            Err(err) => {
                log::error!("research agent search failed for '{}': {err}", requirements.location);
                return ResearchOutcome {
                    candidates: Vec::new(),
                    summary: "We couldn't search for listings right now. Please try again \
                        shortly."
                        .to_owned(),
                };
            }
        };

        let filtered = filter::apply(candidates, requirements);

        let filtered = if filtered.len() < MIN_CANDIDATES_BEFORE_BROADEN {
            log::info!(
                "only {} candidates survived filtering, retrying without the rooms filter",
                filtered.len()
            );
            let broadened = self.search_and_extract(requirements).await.unwrap_or_default();
            let mut broadened = filter::apply_without_rooms(broadened, requirements);
            if broadened.len() > filtered.len() {
                broadened.truncate(MAX_CANDIDATES);
                broadened
            } else {
                filtered
            }
        } else {
            filtered
        };

        let ranked = rank::rank(filtered);
        let ranked: Vec<Candidate> = ranked.into_iter().take(MAX_CANDIDATES).collect();

        let summary = self.summarize(&ranked).await;

        ResearchOutcome {
            candidates: ranked,
            summary,
        }
    }

    async fn search_and_extract(
        &self,
        requirements: &Requirements,
    ) -> Result<Vec<Candidate>, concierge_search::SearchError> {
        let search_query = query::synthesize(requirements);
        let hits = self.search.search(&search_query, "google").await?;

        let allowed: Vec<_> = hits
            .into_iter()
            .filter(|hit| allowlist::is_allowed(&hit.url))
            .take(MAX_HITS)
            .collect();

        let candidates = extract::extract_all(
            &self.search,
            &self.gateway,
            &allowed,
            EXTRACTION_CONCURRENCY,
        )
        .await;

        Ok(candidates)
    }

    async fn summarize(&self, candidates: &[Candidate]) -> String {
        if candidates.is_empty() {
            return "No listings matched your requirements.".to_owned();
        }
        let listing = candidates
            .iter()
            .map(|c| format!("- {} ({:?})", c.title, c.price))
            .collect::<Vec<_>>()
            .join("\n");
        let prompt = format!(
            "Write one short, friendly sentence summarizing these {} property listings for the \
             user:\n{listing}",
            candidates.len()
        );
        self.gateway
            .complete(
                "You summarize real-estate search results in one sentence, in the user's \
                 language.",
                &prompt,
                false,
                200,
                0.4,
            )
            .await
            .unwrap_or_else(|_| format!("Found {} matching properties.", candidates.len()))
    }
}
