#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! The request-scoped orchestrator: owns the session store, dispatches
//! across the scoping/research/mapping/discovery/community/negotiation
//! agents, enforces per-stage deadlines and the partial-failure
//! degradation policy, and assembles the final chat/negotiate response.
//!
//! [`Coordinator::chat_pipeline`] and [`Coordinator::negotiate_pipeline`]
//! are the only two entry points; the HTTP layer (`concierge_server`)
//! translates their outcomes directly into wire responses.

pub mod config;
pub mod session;

use std::sync::Arc;
use std::time::Duration;

use concierge_community::CommunityAgent;
use concierge_discovery::LocalDiscoveryAgent;
use concierge_geocoder::Geocoder;
use concierge_llm::LlmGateway;
use concierge_mapping::MappingAgent;
use concierge_models::{CommunityReport, EnrichedCandidate, Requirements};
use concierge_negotiation::{NegotiationAgent, NegotiationInput, TelephonyProvider};
use concierge_poi::PoiProvider;
use concierge_research::ResearchAgent;
use concierge_scoping::{DialogState, Role, ScopingAgent, Turn};
use concierge_search::SearchProvider;

pub use config::Config;
pub use session::{LastResult, Session, SessionStore};

/// Overall deadline for one `/api/chat` request, from session acquire to
/// response assembly.
const REQUEST_DEADLINE: Duration = Duration::from_secs(90);
/// Budget for the research stage (C6). A miss degrades to an empty
/// result set rather than failing the request; only an actual search
/// failure is fatal.
const RESEARCH_DEADLINE: Duration = Duration::from_secs(60);
/// Budget for the local-discovery stage (C8), layered on top of the
/// mapping agent's own internal deadline.
const DISCOVERY_DEADLINE: Duration = Duration::from_secs(15);
/// Budget for the community stage (C9).
const COMMUNITY_DEADLINE: Duration = Duration::from_secs(30);

/// The coordinates and address of the top-ranked result, surfaced
/// separately so the frontend can center a map without walking the full
/// `properties` array.
#[derive(Debug, Clone, PartialEq)]
pub struct TopResultCoordinates {
    pub latitude: f64,
    pub longitude: f64,
    pub address: String,
    pub image_url: Option<String>,
}

/// The result of one `/api/chat` turn.
#[derive(Debug, Clone)]
pub enum ChatOutcome {
    /// The scoping dialog needs more information before a search can run.
    /// Also carries Configuration-category remediation messages (§7):
    /// missing required credentials are a success-shaped "ask again"
    /// outcome, not a wire-level error.
    Gathering { message: String },
    /// Requirements were complete but research returned nothing to show.
    NoResults {
        message: String,
        requirements: Requirements,
    },
    /// A full pipeline run. `properties` doubles as the wire response's
    /// `raw_search_results` field — both name the same enriched result
    /// set.
    Completed {
        requirements: Requirements,
        properties: Vec<EnrichedCandidate>,
        search_summary: String,
        total_found: usize,
        top_result_coordinates: Option<TopResultCoordinates>,
        community_analysis: Option<CommunityReport>,
    },
    /// A fatal failure: the scoping agent (C5) itself errored. Missing
    /// configuration is handled separately (see `Gathering`) since §7
    /// scopes it to its own Configuration category, distinct from a wire
    /// error. The research agent (C6) never produces this variant — a
    /// fatal search failure there degrades to `NoResults` instead, per
    /// the propagation policy this crate implements.
    Error { message: String },
}

/// The result of one `/api/negotiate` call.
#[derive(Debug, Clone, PartialEq)]
pub struct NegotiateOutcome {
    pub success: bool,
    pub message: String,
    pub leverage_score: f32,
    pub findings: Vec<String>,
    pub call_summary: String,
}

/// Owns every agent and the session store for one running process. Built
/// once at startup from concrete `Http*Provider`s wrapped in `Arc`s (see
/// `concierge_server`'s `main`), then shared across all requests.
pub struct Coordinator {
    config: Config,
    sessions: SessionStore,
    scoping: ScopingAgent,
    research: ResearchAgent<Arc<dyn SearchProvider>>,
    mapping: MappingAgent<Arc<dyn Geocoder>>,
    discovery: LocalDiscoveryAgent<Arc<dyn PoiProvider>>,
    community: CommunityAgent<Arc<dyn SearchProvider>>,
    negotiation: NegotiationAgent<Arc<dyn SearchProvider>, Arc<dyn TelephonyProvider>>,
}

impl Coordinator {
    #[must_use]
    pub fn new(
        config: Config,
        gateway: LlmGateway,
        search: Arc<dyn SearchProvider>,
        geocoder: Arc<dyn Geocoder>,
        poi: Arc<dyn PoiProvider>,
        telephony: Arc<dyn TelephonyProvider>,
    ) -> Self {
        let sessions = SessionStore::new(config.session_capacity);
        Self {
            scoping: ScopingAgent::new(gateway.clone()),
            research: ResearchAgent::new(Arc::clone(&search), gateway.clone()),
            mapping: MappingAgent::new(geocoder),
            discovery: LocalDiscoveryAgent::new(poi),
            community: CommunityAgent::new(Arc::clone(&search), gateway.clone()),
            negotiation: NegotiationAgent::new(search, gateway, telephony),
            config,
            sessions,
        }
    }

    /// Runs one `/api/chat` turn to completion, per §4.11 of the
    /// requirements this crate implements.
    pub async fn chat_pipeline(&self, session_id: &str, message: &str) -> ChatOutcome {
        if !self.config.is_configured() {
            // Configuration is its own error-taxonomy category (§7), surfaced as a
            // success-shaped response with a remediation message rather than a
            // wire-level error — the client always gets well-formed, renderable
            // JSON back, never a crash.
            return ChatOutcome::Gathering {
                message: self.config.missing_required.join(" "),
            };
        }

        match tokio::time::timeout(REQUEST_DEADLINE, self.run_chat(session_id, message)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                log::warn!("chat pipeline missed its overall deadline for session {session_id}");
                ChatOutcome::NoResults {
                    message: "That took longer than expected. Please try again.".to_owned(),
                    requirements: Requirements::default(),
                }
            }
        }
    }

    async fn run_chat(&self, session_id: &str, message: &str) -> ChatOutcome {
        let session = self.sessions.get_or_create(session_id);

        // Held for the entire pipeline, including every outbound call below, so
        // that two requests racing on the same session_id are fully serialized
        // (§5/§8: "concurrent requests for the same session id are serialized").
        // This only blocks other requests for *this* session_id — the session
        // store's shard lock (guarding the LRU map itself) is already released
        // by the time we get here, and every other session has its own guard, so
        // concurrent requests for different sessions still run in parallel.
        let mut guard = session.lock().await;

        guard.transcript.push(Turn {
            role: Role::User,
            text: message.to_owned(),
        });
        let transcript_snapshot = guard.transcript.clone();
        let partial = guard.requirements.clone();

        let scoping_outcome = match self.scoping.continue_dialog(&transcript_snapshot, &partial).await {
            Ok(outcome) => outcome,
            Err(err) => {
                log::error!("scoping stage failed for session {session_id}: {err}");
                return ChatOutcome::Error {
                    message: "Sorry, something went wrong understanding your message. Please \
                        try again."
                        .to_owned(),
                };
            }
        };

        guard.requirements = scoping_outcome.requirements.clone();
        guard.transcript.push(Turn {
            role: Role::Assistant,
            text: scoping_outcome.message_to_user.clone(),
        });

        if scoping_outcome.state == DialogState::Gathering {
            return ChatOutcome::Gathering {
                message: scoping_outcome.message_to_user,
            };
        }

        let requirements = scoping_outcome.requirements;

        let research_outcome = match tokio::time::timeout(
            RESEARCH_DEADLINE,
            self.research.run(&requirements),
        )
        .await
        {
            Ok(outcome) => outcome,
            Err(_) => {
                log::warn!("research stage missed its deadline for session {session_id}");
                concierge_research::ResearchOutcome {
                    candidates: Vec::new(),
                    summary: "Search is taking longer than expected; no listings were found \
                        this time."
                        .to_owned(),
                }
            }
        };

        if research_outcome.candidates.is_empty() {
            guard.transcript.push(Turn {
                role: Role::Assistant,
                text: research_outcome.summary.clone(),
            });
            return ChatOutcome::NoResults {
                message: research_outcome.summary,
                requirements,
            };
        }

        let top_city = city_of(&research_outcome.candidates[0].address);
        let candidates = research_outcome.candidates.clone();
        let location = requirements.location.clone();

        let (enriched, community_analysis) = tokio::join!(
            async {
                let geocoded = self.mapping.run(candidates, &location).await;
                tokio::time::timeout(DISCOVERY_DEADLINE, self.discovery.run(geocoded))
                    .await
                    .unwrap_or_else(|_| {
                        log::warn!(
                            "discovery stage missed its deadline for session {session_id}"
                        );
                        Vec::new()
                    })
            },
            async {
                tokio::time::timeout(COMMUNITY_DEADLINE, self.community.run(&top_city))
                    .await
                    .unwrap_or_else(|_| {
                        log::warn!(
                            "community stage missed its deadline for session {session_id}"
                        );
                        None
                    })
            }
        );

        let total_found = enriched.len();
        let top_result_coordinates = enriched.first().map(|candidate| TopResultCoordinates {
            latitude: candidate.geo.latitude,
            longitude: candidate.geo.longitude,
            address: candidate.geo.candidate.address.clone(),
            image_url: candidate.geo.candidate.image_url.clone(),
        });

        guard.last_result = Some(LastResult {
            requirements: requirements.clone(),
            properties: enriched.clone(),
            search_summary: research_outcome.summary.clone(),
            community_analysis: community_analysis.clone(),
        });
        guard.transcript.push(Turn {
            role: Role::Assistant,
            text: research_outcome.summary.clone(),
        });

        ChatOutcome::Completed {
            requirements,
            properties: enriched,
            search_summary: research_outcome.summary,
            total_found,
            top_result_coordinates,
            community_analysis,
        }
    }

    /// Runs a negotiate call end to end. Unlike chat, this is a single
    /// pass-through to C10 (§4.11) — there is no session involved and no
    /// additional deadline layered on top of the negotiation agent's own
    /// 10-minute call deadline.
    pub async fn negotiate_pipeline(&self, input: NegotiationInput) -> NegotiateOutcome {
        if !self.config.is_configured() {
            return NegotiateOutcome {
                success: false,
                message: self.config.missing_required.join(" "),
                leverage_score: 0.0,
                findings: Vec::new(),
                call_summary: String::new(),
            };
        }

        match self.negotiation.run(input).await {
            Ok(record) => NegotiateOutcome {
                success: record.success,
                message: if record.success {
                    "The call completed successfully.".to_owned()
                } else {
                    "The call did not complete successfully.".to_owned()
                },
                leverage_score: record.leverage_score,
                findings: record.findings,
                call_summary: record.call_summary,
            },
            Err(err) => {
                log::error!("negotiation pipeline failed: {err}");
                NegotiateOutcome {
                    success: false,
                    message: "We could not place the call. Please try again shortly.".to_owned(),
                    leverage_score: 0.0,
                    findings: Vec::new(),
                    call_summary: String::new(),
                }
            }
        }
    }
}

/// Extracts a city from a free-text address by taking its last
/// comma-separated segment, the same heuristic the mapping agent uses for
/// its city-only geocode fallback.
fn city_of(address: &str) -> String {
    address
        .split(',')
        .next_back()
        .map_or_else(|| address.to_owned(), |segment| segment.trim().to_owned())
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use concierge_geocoder::{GeocodeError, GeocodeResult, Geocoder};
    use concierge_llm::{LlmGateway, LlmProvider};
    use concierge_models::{Poi, PoiCategory};
    use concierge_negotiation::{CallStatus, TelephonyError, TelephonyProvider};
    use concierge_poi::{PoiError, PoiProvider};
    use concierge_scoping::Role;
    use concierge_search::{SearchError, SearchHit, SearchProvider};

    use super::{ChatOutcome, Config, Coordinator};

    struct ScriptedLlm {
        replies: Mutex<Vec<&'static str>>,
    }

    #[async_trait]
    impl LlmProvider for ScriptedLlm {
        async fn complete(
            &self,
            _system_prompt: &str,
            _user_prompt: &str,
            _max_tokens: u32,
            _temperature: f32,
        ) -> Result<String, concierge_net::UpstreamError> {
            let mut replies = self.replies.lock().unwrap();
            if replies.is_empty() {
                return Ok("{}".to_owned());
            }
            Ok(replies.remove(0).to_owned())
        }
    }

    struct ScriptedSearch {
        hits: Vec<SearchHit>,
        pages: Mutex<Vec<&'static str>>,
    }

    #[async_trait]
    impl SearchProvider for ScriptedSearch {
        async fn search(&self, _query: &str, _engine: &str) -> Result<Vec<SearchHit>, SearchError> {
            Ok(self.hits.clone())
        }

        async fn scrape_markdown(&self, _url: &str) -> Result<String, SearchError> {
            let mut pages = self.pages.lock().unwrap();
            if pages.is_empty() {
                return Ok(String::new());
            }
            Ok(pages.remove(0).to_owned())
        }
    }

    struct EmptySearch;

    #[async_trait]
    impl SearchProvider for EmptySearch {
        async fn search(&self, _query: &str, _engine: &str) -> Result<Vec<SearchHit>, SearchError> {
            Ok(Vec::new())
        }

        async fn scrape_markdown(&self, _url: &str) -> Result<String, SearchError> {
            Ok(String::new())
        }
    }

    struct FatalSearch;

    #[async_trait]
    impl SearchProvider for FatalSearch {
        async fn search(&self, _query: &str, _engine: &str) -> Result<Vec<SearchHit>, SearchError> {
            Err(SearchError::ProviderFatal("listing source unavailable".to_owned()))
        }

        async fn scrape_markdown(&self, _url: &str) -> Result<String, SearchError> {
            Ok(String::new())
        }
    }

    struct StubGeocoder;

    #[async_trait]
    impl Geocoder for StubGeocoder {
        async fn geocode(
            &self,
            _query: &str,
            _country_hint: Option<&str>,
        ) -> Result<GeocodeResult, GeocodeError> {
            Ok(GeocodeResult::Found {
                latitude: 37.0194,
                longitude: -7.9304,
                confidence: 0.9,
                normalized_address: "Faro, Portugal".to_owned(),
            })
        }
    }

    struct StubPoi;

    #[async_trait]
    impl PoiProvider for StubPoi {
        async fn pois_near(
            &self,
            _lat: f64,
            _lon: f64,
            _radius_m: f64,
            _categories: Option<&[PoiCategory]>,
        ) -> Result<Vec<Poi>, PoiError> {
            Ok(vec![Poi {
                name: "Escola Primária".to_owned(),
                category: PoiCategory::School,
                latitude: 37.02,
                longitude: -7.93,
                distance_meters: 250.0,
            }])
        }
    }

    struct StubTelephony;

    #[async_trait]
    impl TelephonyProvider for StubTelephony {
        async fn create_call(&self, _brief: &str) -> Result<String, TelephonyError> {
            Ok("call-1".to_owned())
        }

        async fn call_status(&self, _call_id: &str) -> Result<CallStatus, TelephonyError> {
            Ok(CallStatus::Ended)
        }

        async fn call_transcript(&self, _call_id: &str) -> Result<String, TelephonyError> {
            Ok(String::new())
        }
    }

    fn configured() -> Config {
        Config {
            session_capacity: 64,
            bind_addr: "127.0.0.1".to_owned(),
            port: 8080,
            missing_required: Vec::new(),
        }
    }

    fn coordinator(
        llm_replies: Vec<&'static str>,
        search: Arc<dyn SearchProvider>,
        config: Config,
    ) -> Coordinator {
        let gateway = LlmGateway::new(Arc::new(ScriptedLlm {
            replies: Mutex::new(llm_replies),
        }));
        Coordinator::new(
            config,
            gateway,
            search,
            Arc::new(StubGeocoder),
            Arc::new(StubPoi),
            Arc::new(StubTelephony),
        )
    }

    fn hit(url: &str, snippet: &str) -> SearchHit {
        SearchHit {
            title: "Apartamento T2".to_owned(),
            url: url.to_owned(),
            snippet: snippet.to_owned(),
            display_url: url.to_owned(),
        }
    }

    #[tokio::test]
    async fn incomplete_request_stays_in_gathering() {
        let coordinator = coordinator(
            vec![r#"{"location":"","is_complete":false,"message_to_user":"Onde procura?"}"#],
            Arc::new(EmptySearch),
            configured(),
        );
        let outcome = coordinator.chat_pipeline("s1", "Olá").await;
        assert!(matches!(outcome, ChatOutcome::Gathering { .. }));
    }

    #[tokio::test]
    async fn missing_configuration_short_circuits_before_any_stage() {
        let config = Config {
            missing_required: vec!["LLM_API_KEY is not set".to_owned()],
            ..configured()
        };
        let coordinator = coordinator(Vec::new(), Arc::new(EmptySearch), config);
        let outcome = coordinator.chat_pipeline("s1", "T2 em Faro até 900€").await;
        match outcome {
            ChatOutcome::Gathering { message } => {
                assert!(message.contains("LLM_API_KEY"));
            }
            other => panic!("expected Gathering with a remediation message, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn search_outage_yields_no_results_not_an_error() {
        let coordinator = coordinator(
            vec![
                r#"{"location":"Faro","budget_max":900,"is_rent":true,"is_complete":true,"message_to_user":"A procurar."}"#,
            ],
            Arc::new(FatalSearch),
            configured(),
        );
        let outcome = coordinator.chat_pipeline("s1", "T2 em Faro até 900€").await;
        match outcome {
            ChatOutcome::NoResults { .. } => {}
            other => panic!("expected NoResults, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn complete_search_assembles_enriched_response() {
        let search = Arc::new(ScriptedSearch {
            hits: vec![hit("https://www.idealista.pt/imovel/1", "T2 em Faro, 850€")],
            pages: Mutex::new(vec![
                "# T2 em Faro\n\nApartamento com 2 quartos, 850€ por mês, Faro, Portugal.",
            ]),
        });
        let coordinator = coordinator(
            vec![
                r#"{"location":"Faro","budget_max":900,"is_rent":true,"is_complete":true,"message_to_user":"A procurar."}"#,
                r#"{"title":"T2 em Faro","address":"Faro, Portugal","description":"Apartamento com 2 quartos","price":850,"currency":"EUR","is_rent":true,"bedrooms":2}"#,
                "Found 1 matching property.",
                r#"{"overall_score":8,"school_rating":7,"safety_score":8,"overall_explanation":"calm","school_explanation":"good","safety_explanation":"low crime","positive_stories":[],"negative_stories":[]}"#,
            ],
            search,
            configured(),
        );

        let outcome = coordinator.chat_pipeline("s1", "T2 em Faro até 900€").await;
        match outcome {
            ChatOutcome::Completed {
                total_found,
                top_result_coordinates,
                ..
            } => {
                assert_eq!(total_found, 1);
                assert!(top_result_coordinates.is_some());
            }
            other => panic!("expected Completed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn negotiate_pass_through_returns_success() {
        let coordinator = coordinator(
            vec![r#"{"findings":["Price dropped recently."],"leverage_score":5.0}"#],
            Arc::new(EmptySearch),
            configured(),
        );
        let outcome = coordinator
            .negotiate_pipeline(concierge_negotiation::NegotiationInput {
                address: "Rua X, Faro".to_owned(),
                caller_name: "Ana".to_owned(),
                caller_email: "ana@example.com".to_owned(),
                additional_info: String::new(),
            })
            .await;
        assert!(outcome.success);
        assert!((0.0..=10.0).contains(&outcome.leverage_score));
    }

    #[tokio::test]
    async fn concurrent_requests_for_the_same_session_do_not_interleave_turns() {
        let coordinator = coordinator(
            vec![
                r#"{"location":"","is_complete":false,"message_to_user":"Primeira resposta."}"#,
                r#"{"location":"","is_complete":false,"message_to_user":"Segunda resposta."}"#,
            ],
            Arc::new(EmptySearch),
            configured(),
        );

        let (first, second) = tokio::join!(
            coordinator.chat_pipeline("shared", "Mensagem A"),
            coordinator.chat_pipeline("shared", "Mensagem B"),
        );
        assert!(matches!(first, ChatOutcome::Gathering { .. }));
        assert!(matches!(second, ChatOutcome::Gathering { .. }));

        let session = coordinator.sessions.get_or_create("shared");
        let guard = session.lock().await;
        assert_eq!(guard.transcript.len(), 4);
        // Each request's lock is held for its whole pipeline, so a user turn is
        // always immediately followed by its own assistant turn — never two
        // user turns from racing requests landing back to back.
        assert_eq!(guard.transcript[0].role, Role::User);
        assert_eq!(guard.transcript[1].role, Role::Assistant);
        assert_eq!(guard.transcript[2].role, Role::User);
        assert_eq!(guard.transcript[3].role, Role::Assistant);
    }
}
