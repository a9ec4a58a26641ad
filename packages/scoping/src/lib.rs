#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Multi-turn dialog agent that turns a conversation transcript into a
//! validated [`Requirements`] record.
//!
//! The dialog is an explicit two-state machine (`Gathering`/`Complete`)
//! rather than exception-driven control flow: every turn returns a
//! [`ScopingOutcome`] naming its state, and the coordinator decides what to
//! do next based on that state alone.

use concierge_llm::LlmGateway;
use concierge_models::Requirements;
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ScopingError {
    #[error(transparent)]
    Llm(#[from] concierge_llm::LlmError),
}

/// The scoping dialog's two states. `Complete` only means "a search could
/// be attempted with what we have" — a later user turn always re-enters
/// `Gathering` with the prior requirements as seed (see
/// [`ScopingAgent::continue_dialog`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogState {
    Gathering,
    Complete,
}

/// One turn's worth of conversation, in transcript order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone)]
pub struct Turn {
    pub role: Role,
    pub text: String,
}

/// The result of processing one user turn.
#[derive(Debug, Clone)]
pub struct ScopingOutcome {
    pub requirements: Requirements,
    pub state: DialogState,
    pub message_to_user: String,
}

#[derive(Deserialize)]
struct LlmScopingReply {
    #[serde(default)]
    location: String,
    bedrooms: Option<u32>,
    bathrooms: Option<f32>,
    budget_min: Option<f64>,
    budget_max: Option<f64>,
    #[serde(default)]
    is_rent: bool,
    additional_info: Option<String>,
    #[serde(default)]
    is_complete: bool,
    #[serde(default)]
    #[allow(dead_code)]
    needs_more_info: bool,
    #[serde(default)]
    message_to_user: String,
}

const SYSTEM_PROMPT: &str = "You are a real-estate search assistant collecting housing \
requirements from a user. Reply in the user's language. Always reply with a single JSON \
object with exactly these fields: location (string), bedrooms (integer or null), bathrooms \
(number or null), budget_min (number or null), budget_max (number or null), is_rent (boolean), \
additional_info (string or null), is_complete (boolean, true once location and at least one of \
bedrooms/budget_max are known and the user has not indicated they want to add more), \
needs_more_info (boolean, true if you still need to ask the user a clarifying question), \
message_to_user (a short reply to show the user, in their language). Do not include any text \
outside the JSON object.";

pub struct ScopingAgent {
    gateway: LlmGateway,
}

impl ScopingAgent {
    #[must_use]
    pub const fn new(gateway: LlmGateway) -> Self {
        Self { gateway }
    }

    /// Processes one user turn against the session's current partial
    /// requirements and transcript.
    ///
    /// On an LLM failure, returns a user-visible explanatory message with
    /// `state: Gathering` and `requirements` unchanged — the partial
    /// record is never mutated by a failed turn.
    ///
    /// # Errors
    ///
    /// This function does not currently propagate LLM errors to the
    /// caller; it folds them into a user-facing message instead, matching
    /// the "no silent failure defaults, but also no exceptions for normal
    /// dialog continuation" design. The `Result` wrapper is kept for
    /// forward compatibility with callers that want to distinguish
    /// degraded replies from hard failures.
    pub async fn continue_dialog(
        &self,
        transcript: &[Turn],
        partial: &Requirements,
    ) -> Result<ScopingOutcome, ScopingError> {
        let user_prompt = render_prompt(transcript, partial);

        let reply = match self
            .gateway
            .complete(SYSTEM_PROMPT, &user_prompt, true, 800, 0.2)
            .await
        {
            Ok(text) => text,
            Err(err) => {
                log::warn!("scoping agent llm call failed: {err}");
                return Ok(ScopingOutcome {
                    requirements: partial.clone(),
                    state: DialogState::Gathering,
                    message_to_user: "Sorry, I had trouble understanding that — could you \
                        rephrase your request?"
                        .to_owned(),
                });
            }
        };

        let parsed: LlmScopingReply = match serde_json::from_str(&reply) {
            Ok(parsed) => parsed,
            Err(err) => {
                log::warn!("scoping agent got unparseable llm json: {err}");
                return Ok(ScopingOutcome {
                    requirements: partial.clone(),
                    state: DialogState::Gathering,
                    message_to_user: "Sorry, I had trouble understanding that — could you \
                        rephrase your request?"
                        .to_owned(),
                });
            }
        };

        let mut merged = partial.clone();
        merged.merge(Requirements {
            location: parsed.location,
            bedrooms: parsed.bedrooms,
            bathrooms: parsed.bathrooms,
            budget_min: parsed.budget_min,
            budget_max: parsed.budget_max,
            is_rent: parsed.is_rent,
            additional_info: parsed.additional_info,
        });

        if let Err(msg) = merged.validate() {
            return Ok(ScopingOutcome {
                requirements: partial.clone(),
                state: DialogState::Gathering,
                message_to_user: msg,
            });
        }

        let state = if merged.is_searchable() && parsed.is_complete {
            DialogState::Complete
        } else {
            DialogState::Gathering
        };

        Ok(ScopingOutcome {
            requirements: merged,
            state,
            message_to_user: parsed.message_to_user,
        })
    }
}

fn render_prompt(transcript: &[Turn], partial: &Requirements) -> String {
    let known = serde_json::to_string(partial).unwrap_or_default();
    let history = transcript
        .iter()
        .map(|t| {
            let role = match t.role {
                Role::User => "user",
                Role::Assistant => "assistant",
            };
            format!("{role}: {}", t.text)
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!("Known requirements so far: {known}\n\nConversation so far:\n{history}")
}
