#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Given a property address and caller identity, researches the listing,
//! builds a call brief, and drives an outbound voice-call negotiation
//! against an external telephony provider through to a terminal status.
//!
//! Unlike the research agent (`concierge_research`), the research pass
//! here is a single compressed search-then-summarize step whose failure
//! degrades to an empty findings list rather than failing the whole
//! operation — only a non-2xx from the telephony provider's call-creation
//! endpoint is fatal (§4.10 of the requirements this crate implements).

pub mod telephony;

use std::time::Duration;

use concierge_llm::LlmGateway;
use concierge_models::NegotiationRecord;
use concierge_search::SearchProvider;
use serde::Deserialize;

pub use telephony::{CallStatus, HttpTelephonyProvider, TelephonyError, TelephonyProvider};

/// Interval between call-status polls.
const POLL_INTERVAL: Duration = Duration::from_secs(3);
/// Overall deadline for the call to reach a terminal status.
const CALL_DEADLINE: Duration = Duration::from_secs(10 * 60);

#[derive(Debug, thiserror::Error)]
pub enum NegotiationError {
    #[error(transparent)]
    Telephony(#[from] TelephonyError),

    #[error("call did not reach a terminal status within the deadline")]
    Timeout,
}

const RESEARCH_SYSTEM_PROMPT: &str = "You are a real-estate negotiation researcher. Given web \
search snippets about a property address, reply with a single JSON object with exactly these \
fields: findings (array of short strings, each one concrete fact that could be used as \
negotiating leverage), leverage_score (0-10, how much room the buyer/renter likely has to \
negotiate). Reply with only the JSON object.";

#[derive(Deserialize, Default)]
struct ResearchReply {
    #[serde(default)]
    findings: Vec<String>,
    #[serde(default)]
    leverage_score: f32,
}

pub struct NegotiationAgent<S: SearchProvider, T: TelephonyProvider> {
    search: S,
    gateway: LlmGateway,
    telephony: T,
}

pub struct NegotiationInput {
    pub address: String,
    pub caller_name: String,
    pub caller_email: String,
    pub additional_info: String,
}

impl<S: SearchProvider, T: TelephonyProvider> NegotiationAgent<S, T> {
    pub const fn new(search: S, gateway: LlmGateway, telephony: T) -> Self {
        Self {
            search,
            gateway,
            telephony,
        }
    }

    /// Runs the full negotiation pipeline end to end, blocking until the
    /// call reaches a terminal status or the deadline elapses.
    ///
    /// # Errors
    ///
    /// Returns [`NegotiationError::Telephony`] if call creation returns a
    /// non-2xx, or [`NegotiationError::Timeout`] if the call never
    /// reaches a terminal status within [`CALL_DEADLINE`]. A failed
    /// research pass does NOT fail the operation — it proceeds with an
    /// empty findings list.
    pub async fn run(&self, input: NegotiationInput) -> Result<NegotiationRecord, NegotiationError> {
        let (findings, leverage_score) = self.research(&input.address).await;

        let brief = build_brief(&input, &findings);

        let call_id = self.telephony.create_call(&brief).await?;

        let status = self.poll_until_terminal(&call_id).await?;

        let call_summary = match self.telephony.call_transcript(&call_id).await {
            Ok(transcript) => transcript,
            Err(err) => {
                log::warn!("failed to fetch call transcript for {call_id}: {err}");
                String::new()
            }
        };

        Ok(NegotiationRecord {
            address: input.address,
            caller_name: input.caller_name,
            caller_email: input.caller_email,
            brief,
            findings,
            leverage_score,
            call_summary,
            success: status == CallStatus::Ended,
        })
    }

    async fn research(&self, address: &str) -> (Vec<String>, f32) {
        let query = format!("{address} property listing price history negotiation");
        let hits = match self.search.search(&query, "google").await {
            Ok(hits) => hits,
            Err(err) => {
                log::warn!("negotiation research search failed for '{address}': {err}");
                return (Vec::new(), 0.0);
            }
        };

        if hits.is_empty() {
            return (Vec::new(), 0.0);
        }

        let snippets = hits
            .iter()
            .map(|h| h.snippet.clone())
            .collect::<Vec<_>>()
            .join("\n---\n");
        let prompt = format!("Address: {address}\n\nSearch snippets:\n{snippets}");

        match self
            .gateway
            .complete(RESEARCH_SYSTEM_PROMPT, &prompt, true, 600, 0.3)
            .await
        {
            Ok(reply) => match serde_json::from_str::<ResearchReply>(&reply) {
                Ok(parsed) => (parsed.findings, parsed.leverage_score.clamp(0.0, 10.0)),
                Err(err) => {
                    log::warn!("negotiation research returned unparseable json: {err}");
                    (Vec::new(), 0.0)
                }
            },
            Err(err) => {
                log::warn!("negotiation research llm call failed: {err}");
                (Vec::new(), 0.0)
            }
        }
    }

    async fn poll_until_terminal(&self, call_id: &str) -> Result<CallStatus, NegotiationError> {
        tokio::time::timeout(CALL_DEADLINE, async {
            loop {
                match self.telephony.call_status(call_id).await {
                    Ok(status) if status.is_terminal() => return status,
                    Ok(_) => {}
                    Err(err) => log::warn!("call status poll failed for {call_id}: {err}"),
                }
                tokio::time::sleep(POLL_INTERVAL).await;
            }
        })
        .await
        .map_err(|_| NegotiationError::Timeout)
    }
}

fn build_brief(input: &NegotiationInput, findings: &[String]) -> String {
    let findings_block = if findings.is_empty() {
        "No specific leverage points were found.".to_owned()
    } else {
        findings
            .iter()
            .map(|f| format!("- {f}"))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        "You are calling on behalf of {} ({}) about the property at {}.\n\nResearch findings:\n{findings_block}\n\nCaller's instructions: {}",
        input.caller_name, input.caller_email, input.address, input.additional_info,
    )
}
