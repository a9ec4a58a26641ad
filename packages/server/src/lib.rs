#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the concierge assistant.
//!
//! Exposes `/api/chat` (natural-language dialog over the search pipeline)
//! and `/api/negotiate` (voice-call negotiation) on top of
//! [`concierge_coordinator::Coordinator`]. The server itself holds no
//! business logic — it parses requests, calls the coordinator, and
//! serializes whatever outcome comes back.
//!
//! ## Graceful Startup
//!
//! The server always binds and serves `/health`, even when required
//! provider credentials are absent. Each upstream provider
//! (LLM/search/geocoder/poi/telephony) is constructed independently from
//! its own `from_env()`; a missing key degrades only the stage that
//! needs it, surfaced to callers as a Configuration-category chat
//! response rather than a refusal to start.

mod handlers;
pub mod interactive;

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use async_trait::async_trait;
use concierge_coordinator::{Config, Coordinator};
use concierge_geocoder::{Geocoder, GeocodeError, GeocodeResult, HttpGeocoder};
use concierge_llm::{LlmGateway, LlmProvider};
use concierge_models::{Poi, PoiCategory};
use concierge_negotiation::{CallStatus, HttpTelephonyProvider, TelephonyError, TelephonyProvider};
use concierge_poi::{HttpPoiProvider, PoiError, PoiProvider};
use concierge_search::{HttpSearchProvider, SearchError, SearchHit, SearchProvider};

/// Shared application state.
pub struct AppState {
    pub coordinator: Coordinator,
}

/// Stand-in used for any provider whose required environment variable is
/// absent at startup. Every operation fails with an auth-category error,
/// which the calling agent already treats as a non-fatal per-call
/// degradation — see [`concierge_coordinator::Config::is_configured`] for
/// the one provider (the LLM gateway) whose absence is process-wide.
struct UnconfiguredProvider {
    reason: String,
}

#[async_trait]
impl LlmProvider for UnconfiguredProvider {
    async fn complete(
        &self,
        _system_prompt: &str,
        _user_prompt: &str,
        _max_tokens: u32,
        _temperature: f32,
    ) -> Result<String, concierge_net::UpstreamError> {
        Err(concierge_net::UpstreamError::Auth(self.reason.clone()))
    }
}

#[async_trait]
impl SearchProvider for UnconfiguredProvider {
    async fn search(&self, _query: &str, _engine: &str) -> Result<Vec<SearchHit>, SearchError> {
        Err(SearchError::ProviderAuth(self.reason.clone()))
    }

    async fn scrape_markdown(&self, _url: &str) -> Result<String, SearchError> {
        Err(SearchError::ProviderAuth(self.reason.clone()))
    }
}

#[async_trait]
impl Geocoder for UnconfiguredProvider {
    async fn geocode(
        &self,
        _query: &str,
        _country_hint: Option<&str>,
    ) -> Result<GeocodeResult, GeocodeError> {
        Err(GeocodeError::Auth(self.reason.clone()))
    }
}

#[async_trait]
impl PoiProvider for UnconfiguredProvider {
    async fn pois_near(
        &self,
        _lat: f64,
        _lon: f64,
        _radius_m: f64,
        _categories: Option<&[PoiCategory]>,
    ) -> Result<Vec<Poi>, PoiError> {
        Err(PoiError::Auth(self.reason.clone()))
    }
}

#[async_trait]
impl TelephonyProvider for UnconfiguredProvider {
    async fn create_call(&self, _brief: &str) -> Result<String, TelephonyError> {
        Err(TelephonyError::Auth(self.reason.clone()))
    }

    async fn call_status(&self, _call_id: &str) -> Result<CallStatus, TelephonyError> {
        Err(TelephonyError::Auth(self.reason.clone()))
    }

    async fn call_transcript(&self, _call_id: &str) -> Result<String, TelephonyError> {
        Err(TelephonyError::Auth(self.reason.clone()))
    }
}

fn build_llm_gateway() -> LlmGateway {
    match LlmGateway::from_env() {
        Ok(gateway) => gateway,
        Err(err) => {
            log::warn!("LLM gateway unavailable, dialog will degrade: {err}");
            LlmGateway::new(Arc::new(UnconfiguredProvider {
                reason: err.to_string(),
            }))
        }
    }
}

fn build_search_provider() -> Arc<dyn SearchProvider> {
    match HttpSearchProvider::from_env() {
        Ok(provider) => Arc::new(provider),
        Err(reason) => {
            log::warn!("search provider unavailable, research will degrade: {reason}");
            Arc::new(UnconfiguredProvider { reason })
        }
    }
}

fn build_geocoder() -> Arc<dyn Geocoder> {
    match HttpGeocoder::from_env() {
        Ok(provider) => Arc::new(provider),
        Err(reason) => {
            log::warn!("geocoder unavailable, mapping will degrade: {reason}");
            Arc::new(UnconfiguredProvider { reason })
        }
    }
}

fn build_poi_provider() -> Arc<dyn PoiProvider> {
    match HttpPoiProvider::from_env() {
        Ok(provider) => Arc::new(provider),
        Err(reason) => {
            log::warn!("poi provider unavailable, local discovery will degrade: {reason}");
            Arc::new(UnconfiguredProvider { reason })
        }
    }
}

fn build_telephony_provider() -> Arc<dyn TelephonyProvider> {
    match HttpTelephonyProvider::from_env() {
        Ok(provider) => Arc::new(provider),
        Err(reason) => {
            log::warn!("telephony provider unavailable, negotiation will degrade: {reason}");
            Arc::new(UnconfiguredProvider { reason })
        }
    }
}

/// Starts the concierge API server.
///
/// # Errors
///
/// Returns an `std::io::Result` error if the HTTP server fails to bind or
/// encounters a runtime error.
pub async fn run_server() -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let config = Config::from_env();
    if !config.is_configured() {
        for message in &config.missing_required {
            log::warn!("{message}");
        }
    }

    let coordinator = Coordinator::new(
        config.clone(),
        build_llm_gateway(),
        build_search_provider(),
        build_geocoder(),
        build_poi_provider(),
        build_telephony_provider(),
    );

    let state = web::Data::new(AppState { coordinator });
    let bind_addr = config.bind_addr.clone();
    let port = config.port;

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .route("/health", web::get().to(handlers::health))
            .service(
                web::scope("/api")
                    .route("/chat", web::post().to(handlers::chat))
                    .route("/negotiate", web::post().to(handlers::negotiate)),
            )
    })
    .bind((bind_addr, port))?
    .run()
    .await
}
