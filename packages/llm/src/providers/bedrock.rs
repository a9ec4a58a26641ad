use async_trait::async_trait;
use aws_sdk_bedrockruntime::primitives::Blob;
use concierge_net::UpstreamError;
use serde::Serialize;
use tokio::sync::OnceCell;

use super::LlmProvider;

/// Calls Claude models through AWS Bedrock. Kept behind the `bedrock`
/// feature for parity with the rest of the provider story; none of the
/// concierge scenarios require it, so the AWS config is loaded lazily on
/// first use rather than at gateway construction.
pub struct BedrockProvider {
    model_id: String,
    client: OnceCell<aws_sdk_bedrockruntime::Client>,
}

impl BedrockProvider {
    #[must_use]
    pub fn new(model_id: String) -> Self {
        Self {
            model_id,
            client: OnceCell::new(),
        }
    }

    async fn client(&self) -> &aws_sdk_bedrockruntime::Client {
        self.client
            .get_or_init(|| async {
                let config = aws_config::load_from_env().await;
                aws_sdk_bedrockruntime::Client::new(&config)
            })
            .await
    }
}

#[derive(Serialize)]
struct InvokeBody<'a> {
    anthropic_version: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: Vec<InvokeMessage<'a>>,
}

#[derive(Serialize)]
struct InvokeMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[async_trait]
impl LlmProvider for BedrockProvider {
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, UpstreamError> {
        let body = InvokeBody {
            anthropic_version: "bedrock-2023-05-31",
            max_tokens,
            temperature,
            system: system_prompt,
            messages: vec![InvokeMessage {
                role: "user",
                content: user_prompt,
            }],
        };
        let payload = serde_json::to_vec(&body)
            .map_err(|e| UpstreamError::Parse(format!("failed to encode bedrock body: {e}")))?;

        let response = self
            .client()
            .await
            .invoke_model()
            .model_id(&self.model_id)
            .content_type("application/json")
            .body(Blob::new(payload))
            .send()
            .await
            .map_err(|e| UpstreamError::Transient(e.to_string()))?;

        let value: serde_json::Value = serde_json::from_slice(response.body().as_ref())
            .map_err(|e| UpstreamError::Parse(format!("unexpected bedrock response: {e}")))?;

        Ok(value["content"][0]["text"].as_str().unwrap_or_default().to_owned())
    }
}
