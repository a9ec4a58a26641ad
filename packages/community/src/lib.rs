#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Produces one [`CommunityReport`] for the top-ranked candidate in a
//! result set: a short web search for neighborhood/crime/school signal,
//! then an LLM pass that turns the snippets into scored narrative.
//!
//! `community_analysis` is recomputed per completed search rather than
//! cached per city within a session — see the open question in the
//! requirements this crate implements. Every failure path returns `None`
//! rather than a default/placeholder report; the coordinator simply omits
//! the field.

use concierge_llm::LlmGateway;
use concierge_models::{CommunityReport, CommunityStory};
use concierge_search::SearchProvider;
use serde::Deserialize;

const SEARCH_QUERIES: &[&str] = &["neighborhood guide", "crime safety", "schools rating"];

const SYSTEM_PROMPT: &str = "You are a local neighborhood analyst. Given search snippets about \
a city, reply with a single JSON object with exactly these fields: overall_score (0-10), \
school_rating (0-10), safety_score (0-10), overall_explanation (string), school_explanation \
(string), safety_explanation (string), positive_stories (array of {title, summary}), \
negative_stories (array of {title, summary}). Reply with only the JSON object.";

#[derive(Deserialize)]
struct LlmCommunityReply {
    overall_score: f32,
    school_rating: f32,
    safety_score: f32,
    overall_explanation: String,
    school_explanation: String,
    safety_explanation: String,
    #[serde(default)]
    positive_stories: Vec<CommunityStory>,
    #[serde(default)]
    negative_stories: Vec<CommunityStory>,
}

pub struct CommunityAgent<S: SearchProvider> {
    search: S,
    gateway: LlmGateway,
}

impl<S: SearchProvider> CommunityAgent<S> {
    pub const fn new(search: S, gateway: LlmGateway) -> Self {
        Self { search, gateway }
    }

    /// Builds a [`CommunityReport`] for `city`. Returns `None` on any
    /// failure along the way (search, LLM call, or unparseable JSON) —
    /// there is no default/placeholder report.
    pub async fn run(&self, city: &str) -> Option<CommunityReport> {
        let snippets = self.collect_snippets(city).await;
        if snippets.is_empty() {
            log::warn!("community agent found no search snippets for '{city}'");
            return None;
        }

        let user_prompt = format!(
            "City: {city}\n\nSearch snippets:\n{}",
            snippets.join("\n---\n")
        );

        let reply = match self
            .gateway
            .complete(SYSTEM_PROMPT, &user_prompt, true, 900, 0.3)
            .await
        {
            Ok(reply) => reply,
            Err(err) => {
                log::warn!("community agent llm call failed for '{city}': {err}");
                return None;
            }
        };

        let parsed: LlmCommunityReply = match serde_json::from_str(&reply) {
            Ok(parsed) => parsed,
            Err(err) => {
                log::warn!("community agent got unparseable llm json for '{city}': {err}");
                return None;
            }
        };

        let mut report = CommunityReport {
            overall_score: parsed.overall_score,
            school_rating: parsed.school_rating,
            safety_score: parsed.safety_score,
            overall_explanation: parsed.overall_explanation,
            school_explanation: parsed.school_explanation,
            safety_explanation: parsed.safety_explanation,
            positive_stories: parsed.positive_stories,
            negative_stories: parsed.negative_stories,
        };
        report.clamp_scores();
        Some(report)
    }

    async fn collect_snippets(&self, city: &str) -> Vec<String> {
        let mut snippets = Vec::new();
        for query in SEARCH_QUERIES {
            let full_query = format!("{city} {query}");
            match self.search.search(&full_query, "google").await {
                Ok(hits) => snippets.extend(hits.into_iter().map(|h| h.snippet)),
                Err(err) => log::warn!("community search failed for '{full_query}': {err}"),
            }
        }
        snippets.retain(|s| !s.is_empty());
        snippets
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use concierge_llm::LlmGateway;
    use concierge_search::{SearchError, SearchHit, SearchProvider};

    use super::CommunityAgent;

    struct StubSearch {
        hits: Vec<SearchHit>,
    }

    #[async_trait]
    impl SearchProvider for StubSearch {
        async fn search(&self, _query: &str, _engine: &str) -> Result<Vec<SearchHit>, SearchError> {
            Ok(self.hits.clone())
        }

        async fn scrape_markdown(&self, _url: &str) -> Result<String, SearchError> {
            unimplemented!("not used by the community agent")
        }
    }

    struct ScriptedProvider {
        replies: Mutex<Vec<&'static str>>,
    }

    #[async_trait]
    impl concierge_llm::LlmProvider for ScriptedProvider {
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

    fn hit(snippet: &str) -> SearchHit {
        SearchHit {
            title: "t".to_owned(),
            url: "https://example.com".to_owned(),
            snippet: snippet.to_owned(),
            display_url: "example.com".to_owned(),
        }
    }

    #[tokio::test]
    async fn builds_report_and_clamps_out_of_range_scores() {
        let search = StubSearch {
            hits: vec![hit("Faro is calm and family-friendly.")],
        };
        let provider = ScriptedProvider {
            replies: Mutex::new(vec![
                r#"{"overall_score":12.0,"school_rating":8.0,"safety_score":9.0,"overall_explanation":"great","school_explanation":"good schools","safety_explanation":"low crime","positive_stories":[{"title":"Good","summary":"nice area"}],"negative_stories":[]}"#,
            ]),
        };
        let gateway = LlmGateway::new(Arc::new(provider));
        let agent = CommunityAgent::new(search, gateway);
        let report = agent.run("Faro").await.unwrap();
        assert!((report.overall_score - 10.0).abs() < f32::EPSILON);
        assert_eq!(report.positive_stories.len(), 1);
    }

    #[tokio::test]
    async fn no_snippets_yields_none() {
        let search = StubSearch { hits: Vec::new() };
        let provider = ScriptedProvider {
            replies: Mutex::new(Vec::new()),
        };
        let gateway = LlmGateway::new(Arc::new(provider));
        let agent = CommunityAgent::new(search, gateway);
        assert!(agent.run("Nowhere").await.is_none());
    }
}
