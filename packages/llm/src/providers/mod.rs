//! Concrete chat-completion backends behind a common trait.

mod anthropic;
#[cfg(feature = "bedrock")]
mod bedrock;
mod openai;

use std::sync::Arc;

use async_trait::async_trait;

use crate::LlmError;

pub use anthropic::AnthropicProvider;
#[cfg(feature = "bedrock")]
pub use bedrock::BedrockProvider;
pub use openai::OpenAiProvider;

/// A chat-completion backend. `complete` takes a system prompt and a user
/// prompt and returns the model's raw text reply; the gateway layers the
/// JSON-repair contract on top.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, concierge_net::UpstreamError>;
}

/// Selects and constructs a provider from `LLM_PROVIDER`/`LLM_BASE_URL`/
/// `LLM_MODEL`/`LLM_API_KEY`. `LLM_PROVIDER` defaults to `"anthropic"`
/// unless `LLM_BASE_URL` is set, in which case it defaults to
/// `"openai"` (any OpenAI-compatible self-hosted server).
///
/// # Errors
///
/// Returns [`LlmError::Configuration`] if `LLM_API_KEY` is absent, or if
/// `LLM_PROVIDER` names the `bedrock` backend while this crate was built
/// without the `bedrock` feature.
pub fn create_provider_from_env() -> Result<Arc<dyn LlmProvider>, LlmError> {
    let api_key = std::env::var("LLM_API_KEY")
        .map_err(|_| LlmError::Configuration("LLM_API_KEY is not set".to_owned()))?;
    let base_url = std::env::var("LLM_BASE_URL").ok();
    let model = std::env::var("LLM_MODEL").ok();

    let provider_name = std::env::var("LLM_PROVIDER").unwrap_or_else(|_| {
        if base_url.is_some() {
            "openai".to_owned()
        } else {
            "anthropic".to_owned()
        }
    });

    match provider_name.as_str() {
        "anthropic" => Ok(Arc::new(AnthropicProvider::new(
            api_key,
            base_url,
            model.unwrap_or_else(|| "claude-3-5-sonnet-20241022".to_owned()),
        ))),
        "openai" => Ok(Arc::new(OpenAiProvider::new(
            api_key,
            base_url,
            model.unwrap_or_else(|| "gpt-4o-mini".to_owned()),
        ))),
        #[cfg(feature = "bedrock")]
        "bedrock" => Ok(Arc::new(BedrockProvider::new(
            model.unwrap_or_else(|| "anthropic.claude-3-5-sonnet-20241022-v2:0".to_owned()),
        ))),
        other => Err(LlmError::Configuration(format!(
            "unknown LLM_PROVIDER '{other}'"
        ))),
    }
}
