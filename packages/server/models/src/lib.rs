#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Request and response types for the concierge HTTP API.
//!
//! These types own the exact wire shape; they convert to/from the
//! coordinator's outcome types ([`concierge_coordinator::ChatOutcome`],
//! [`concierge_coordinator::NegotiateOutcome`]) rather than being used
//! inside the pipeline itself, so the wire contract can evolve
//! independently of the coordinator's internal representation.

use concierge_coordinator::{ChatOutcome, NegotiateOutcome, TopResultCoordinates};
use concierge_models::{CommunityReport, EnrichedCandidate, Requirements};
use concierge_negotiation::NegotiationInput;
use serde::{Deserialize, Serialize};

/// `GET /health` response. Always `{"status":"ok"}` — the handler never
/// constructs any other value.
#[derive(Debug, Serialize)]
pub struct ApiHealth {
    pub status: &'static str,
}

impl Default for ApiHealth {
    fn default() -> Self {
        Self { status: "ok" }
    }
}

/// `POST /api/chat` request body.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiChatRequest {
    pub message: String,
    pub session_id: String,
}

/// A resolved coordinate for the top-ranked result, with enough context
/// for the frontend to center a map without re-deriving it from
/// `properties[0]`.
#[derive(Debug, Clone, Serialize)]
pub struct ApiTopResultCoordinates {
    pub latitude: f64,
    pub longitude: f64,
    pub address: String,
    pub image_url: Option<String>,
}

impl From<TopResultCoordinates> for ApiTopResultCoordinates {
    fn from(coords: TopResultCoordinates) -> Self {
        Self {
            latitude: coords.latitude,
            longitude: coords.longitude,
            address: coords.address,
            image_url: coords.image_url,
        }
    }
}

/// The `data` payload of a successful `/api/chat` response. The two
/// shapes are distinguished by which fields are present, per §6 of the
/// requirements this crate implements — `is_complete` only appears while
/// gathering, everything else only once a search has run.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ApiChatData {
    Gathering {
        message: String,
        is_complete: bool,
    },
    Completed {
        requirements: Requirements,
        properties: Vec<EnrichedCandidate>,
        search_summary: String,
        total_found: usize,
        raw_search_results: Vec<EnrichedCandidate>,
        top_result_coordinates: Option<ApiTopResultCoordinates>,
        community_analysis: Option<CommunityReport>,
    },
}

/// The `data` payload of an `/api/chat` error response.
#[derive(Debug, Clone, Serialize)]
pub struct ApiChatErrorData {
    pub message: String,
}

/// `POST /api/chat` response envelope: `status` is `"success"` or
/// `"error"`, `data` carries the matching payload.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", content = "data", rename_all = "snake_case")]
pub enum ApiChatResponse {
    Success(ApiChatData),
    Error(ApiChatErrorData),
}

impl From<ChatOutcome> for ApiChatResponse {
    fn from(outcome: ChatOutcome) -> Self {
        match outcome {
            ChatOutcome::Gathering { message } => Self::Success(ApiChatData::Gathering {
                message,
                is_complete: false,
            }),
            ChatOutcome::NoResults {
                message,
                requirements,
            } => Self::Success(ApiChatData::Completed {
                requirements,
                properties: Vec::new(),
                search_summary: message,
                total_found: 0,
                raw_search_results: Vec::new(),
                top_result_coordinates: None,
                community_analysis: None,
            }),
            ChatOutcome::Completed {
                requirements,
                properties,
                search_summary,
                total_found,
                top_result_coordinates,
                community_analysis,
            } => Self::Success(ApiChatData::Completed {
                requirements,
                raw_search_results: properties.clone(),
                properties,
                search_summary,
                total_found,
                top_result_coordinates: top_result_coordinates.map(Into::into),
                community_analysis,
            }),
            ChatOutcome::Error { message } => Self::Error(ApiChatErrorData { message }),
        }
    }
}

/// `POST /api/negotiate` request body.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiNegotiateRequest {
    pub address: String,
    pub name: String,
    pub email: String,
    pub additional_info: String,
}

impl From<ApiNegotiateRequest> for NegotiationInput {
    fn from(request: ApiNegotiateRequest) -> Self {
        Self {
            address: request.address,
            caller_name: request.name,
            caller_email: request.email,
            additional_info: request.additional_info,
        }
    }
}

/// `POST /api/negotiate` response body. Unlike `/api/chat` this has no
/// `status`/`data` envelope — it is always well-formed JSON with these
/// exact fields regardless of `success`.
#[derive(Debug, Clone, Serialize)]
pub struct ApiNegotiateResponse {
    pub success: bool,
    pub message: String,
    pub leverage_score: f32,
    pub findings: Vec<String>,
    pub call_summary: String,
}

impl From<NegotiateOutcome> for ApiNegotiateResponse {
    fn from(outcome: NegotiateOutcome) -> Self {
        Self {
            success: outcome.success,
            message: outcome.message,
            leverage_score: outcome.leverage_score,
            findings: outcome.findings,
            call_summary: outcome.call_summary,
        }
    }
}

#[cfg(test)]
mod tests {
    use concierge_coordinator::ChatOutcome;
    use concierge_models::Requirements;

    use super::{ApiChatResponse, ApiHealth};

    #[test]
    fn health_response_is_status_ok() {
        let value = serde_json::to_value(ApiHealth::default()).unwrap();
        assert_eq!(value, serde_json::json!({"status": "ok"}));
    }

    #[test]
    fn gathering_outcome_has_success_status_and_is_complete_false() {
        let response = ApiChatResponse::from(ChatOutcome::Gathering {
            message: "Onde procura?".to_owned(),
        });
        let value = serde_json::to_value(response).unwrap();
        assert_eq!(value["status"], "success");
        assert_eq!(value["data"]["message"], "Onde procura?");
        assert_eq!(value["data"]["is_complete"], false);
    }

    #[test]
    fn error_outcome_has_error_status_and_message() {
        let response = ApiChatResponse::from(ChatOutcome::Error {
            message: "Sorry, something went wrong.".to_owned(),
        });
        let value = serde_json::to_value(response).unwrap();
        assert_eq!(value["status"], "error");
        assert_eq!(value["data"]["message"], "Sorry, something went wrong.");
    }

    #[test]
    fn no_results_outcome_reports_zero_total_found_with_snake_case_keys() {
        let response = ApiChatResponse::from(ChatOutcome::NoResults {
            message: "No listings found.".to_owned(),
            requirements: Requirements {
                location: "Faro".to_owned(),
                ..Requirements::default()
            },
        });
        let value = serde_json::to_value(response).unwrap();
        assert_eq!(value["status"], "success");
        assert_eq!(value["data"]["total_found"], 0);
        assert_eq!(value["data"]["search_summary"], "No listings found.");
        assert_eq!(value["data"]["requirements"]["location"], "Faro");
        assert!(value["data"]["properties"].as_array().unwrap().is_empty());
    }
}
