use async_trait::async_trait;
use concierge_net::{http_client, retry, UpstreamError};
use serde::{Deserialize, Serialize};

use super::LlmProvider;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Calls an OpenAI-compatible `/chat/completions` endpoint. Works against
/// any self-hosted server that speaks the same wire format by pointing
/// `LLM_BASE_URL` at it.
pub struct OpenAiProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiProvider {
    #[must_use]
    pub fn new(api_key: String, base_url: Option<String>, model: String) -> Self {
        Self {
            client: http_client(),
            api_key,
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_owned()),
            model,
        }
    }
}

#[derive(Serialize)]
struct Request<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct Response {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: String,
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, UpstreamError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = Request {
            model: &self.model,
            max_tokens,
            temperature,
            messages: vec![
                Message {
                    role: "system",
                    content: system_prompt,
                },
                Message {
                    role: "user",
                    content: user_prompt,
                },
            ],
        };

        let value = retry::send_json(
            || {
                self.client
                    .post(&url)
                    .bearer_auth(&self.api_key)
                    .json(&body)
            },
            &retry::RetryPolicy::default(),
        )
        .await?;

        let mut parsed: Response = serde_json::from_value(value)
            .map_err(|e| UpstreamError::Parse(format!("unexpected openai response: {e}")))?;

        Ok(parsed
            .choices
            .drain(..)
            .next()
            .map(|c| c.message.content)
            .unwrap_or_default())
    }
}
