//! HTTP handler functions for the concierge API.

use actix_web::{web, HttpResponse};
use concierge_server_models::{ApiChatRequest, ApiChatResponse, ApiHealth, ApiNegotiateRequest, ApiNegotiateResponse};

use crate::AppState;

/// `GET /health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth::default())
}

/// `POST /api/chat`
///
/// Advances the dialog for a session one turn: the coordinator decides
/// whether more information is needed, runs the full research pipeline,
/// or reports that the request could not be completed.
pub async fn chat(state: web::Data<AppState>, body: web::Json<ApiChatRequest>) -> HttpResponse {
    let outcome = state
        .coordinator
        .chat_pipeline(&body.session_id, &body.message)
        .await;
    HttpResponse::Ok().json(ApiChatResponse::from(outcome))
}

/// `POST /api/negotiate`
///
/// Places an outbound call to negotiate on a specific property and
/// returns once the call reaches a terminal state (or times out).
pub async fn negotiate(
    state: web::Data<AppState>,
    body: web::Json<ApiNegotiateRequest>,
) -> HttpResponse {
    let outcome = state
        .coordinator
        .negotiate_pipeline(body.into_inner().into())
        .await;
    HttpResponse::Ok().json(ApiNegotiateResponse::from(outcome))
}
