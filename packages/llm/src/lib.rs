#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Single-point adapter to an external chat-completion service.
//!
//! [`LlmGateway::complete`] is the only operation every other agent calls.
//! When `want_json` is set it guarantees the returned string parses as
//! JSON, by running the response through the [`json_repair`] pipeline
//! before giving up. Providers are selected at process start from
//! `LLM_PROVIDER`/`LLM_BASE_URL`/`LLM_MODEL`/`LLM_API_KEY`; any
//! `OpenAI`-compatible self-hosted server works via `LLM_BASE_URL`, and a
//! `bedrock`-feature-gated AWS backend is available for parity with the
//! rest of the provider story.

pub mod json_repair;
pub mod providers;

use std::sync::Arc;

pub use providers::{create_provider_from_env, LlmProvider};

/// Number of times the gateway will re-issue a `want_json` request with a
/// stricter instruction after the repair pipeline fails to extract valid
/// JSON from the first response.
const JSON_REPAIR_RETRIES: u32 = 2;

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("llm configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    Upstream(#[from] concierge_net::UpstreamError),

    #[error("llm response was not valid JSON after {0} repair attempts")]
    ParseError(u32),
}

/// Thin wrapper around a [`LlmProvider`] that adds the JSON-repair
/// contract. Cheap to clone; safe to share across concurrent callers.
#[derive(Clone)]
pub struct LlmGateway {
    provider: Arc<dyn LlmProvider>,
}

impl LlmGateway {
    #[must_use]
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self { provider }
    }

    /// Builds a gateway from `LLM_API_KEY`/`LLM_BASE_URL`/`LLM_MODEL`/
    /// `LLM_PROVIDER`.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::Configuration`] when `LLM_API_KEY` is absent.
    pub fn from_env() -> Result<Self, LlmError> {
        Ok(Self::new(create_provider_from_env()?))
    }

    /// Requests a completion. When `want_json` is set, the returned string
    /// is guaranteed to parse as JSON or this returns
    /// [`LlmError::ParseError`].
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::Upstream`] on auth/transient/fatal failures from
    /// the provider, or [`LlmError::ParseError`] if `want_json` was set and
    /// the repair pipeline could not extract valid JSON within
    /// [`JSON_REPAIR_RETRIES`] attempts.
    pub async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        want_json: bool,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, LlmError> {
        let mut prompt = user_prompt.to_owned();

        for attempt in 0..=JSON_REPAIR_RETRIES {
            let raw = self
                .provider
                .complete(system_prompt, &prompt, max_tokens, temperature)
                .await?;

            if !want_json {
                return Ok(raw);
            }

            match json_repair::repair(&raw) {
                Some(repaired) => return Ok(repaired),
                None if attempt < JSON_REPAIR_RETRIES => {
                    log::warn!(
                        "llm response was not valid JSON (repair attempt {attempt}), retrying with stricter instruction"
                    );
                    prompt = format!(
                        "{user_prompt}\n\nYour previous reply could not be parsed as JSON. \
                         Reply with ONLY a single JSON object or array, no prose, no markdown \
                         fences."
                    );
                }
                None => {
                    log::error!("llm response unparseable after {JSON_REPAIR_RETRIES} repair attempts");
                    return Err(LlmError::ParseError(JSON_REPAIR_RETRIES));
                }
            }
        }

        unreachable!("complete loop always returns within JSON_REPAIR_RETRIES + 1 iterations")
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::{LlmError, LlmGateway, LlmProvider};

    struct ScriptedProvider {
        replies: std::sync::Mutex<Vec<&'static str>>,
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        async fn complete(
            &self,
            _system_prompt: &str,
            _user_prompt: &str,
            _max_tokens: u32,
            _temperature: f32,
        ) -> Result<String, concierge_net::UpstreamError> {
            let mut replies = self.replies.lock().unwrap();
            Ok(replies.remove(0).to_owned())
        }
    }

    #[tokio::test]
    async fn repairs_fenced_json_on_first_try() {
        let provider = ScriptedProvider {
            replies: std::sync::Mutex::new(vec!["```json\n{\"a\":1}\n```"]),
        };
        let gateway = LlmGateway::new(Arc::new(provider));
        let out = gateway.complete("sys", "user", true, 100, 0.1).await.unwrap();
        assert_eq!(out, "{\"a\":1}");
    }

    #[tokio::test]
    async fn retries_once_then_succeeds() {
        let provider = ScriptedProvider {
            replies: std::sync::Mutex::new(vec!["not json at all", "{\"a\":2}"]),
        };
        let gateway = LlmGateway::new(Arc::new(provider));
        let out = gateway.complete("sys", "user", true, 100, 0.1).await.unwrap();
        assert_eq!(out, "{\"a\":2}");
    }

    #[tokio::test]
    async fn gives_up_after_exhausting_repairs() {
        let provider = ScriptedProvider {
            replies: std::sync::Mutex::new(vec!["nope", "still nope", "never"]),
        };
        let gateway = LlmGateway::new(Arc::new(provider));
        let err = gateway.complete("sys", "user", true, 100, 0.1).await.unwrap_err();
        assert!(matches!(err, LlmError::ParseError(2)));
    }
}
