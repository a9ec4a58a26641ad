//! Client for the external voice-call telephony provider: create a call,
//! poll its status, and fetch its transcript once terminal.

use std::sync::Arc;

use async_trait::async_trait;
use concierge_net::{http_client, retry, UpstreamError};
use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum TelephonyError {
    #[error("telephony provider rejected credentials: {0}")]
    Auth(String),

    #[error("telephony provider had a transient failure: {0}")]
    Transient(String),

    #[error("telephony provider rejected the request: {0}")]
    Fatal(String),

    #[error("telephony provider response could not be parsed: {0}")]
    Parse(String),
}

impl From<UpstreamError> for TelephonyError {
    fn from(err: UpstreamError) -> Self {
        match err {
            UpstreamError::Auth(m) => Self::Auth(m),
            UpstreamError::Transient(m) => Self::Transient(m),
            UpstreamError::Fatal(m) => Self::Fatal(m),
            UpstreamError::Parse(m) => Self::Parse(m),
            UpstreamError::Timeout => Self::Transient("timed out".to_owned()),
        }
    }
}

/// The lifecycle of an outbound call. `Ended`, `Failed`, and `TimedOut`
/// are terminal; `Pending`/`InProgress` are not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallStatus {
    Pending,
    InProgress,
    Ended,
    Failed,
    TimedOut,
}

impl CallStatus {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Ended | Self::Failed | Self::TimedOut)
    }
}

impl std::str::FromStr for CallStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" | "queued" => Ok(Self::Pending),
            "in-progress" | "in_progress" | "ringing" => Ok(Self::InProgress),
            "ended" | "completed" => Ok(Self::Ended),
            "failed" => Ok(Self::Failed),
            "timed_out" | "timeout" => Ok(Self::TimedOut),
            _ => Err(()),
        }
    }
}

#[async_trait]
pub trait TelephonyProvider: Send + Sync {
    /// Submits `brief` as the call's context and returns the provider's
    /// call id.
    ///
    /// # Errors
    ///
    /// Returns [`TelephonyError`] on any non-2xx response; callers treat
    /// this as fatal to the whole negotiation (§4.10).
    async fn create_call(&self, brief: &str) -> Result<String, TelephonyError>;

    /// Fetches the current status of a call.
    ///
    /// # Errors
    ///
    /// Returns [`TelephonyError`] on auth/transient/fatal failures.
    async fn call_status(&self, call_id: &str) -> Result<CallStatus, TelephonyError>;

    /// Fetches the call's transcript, once the call is in a terminal
    /// status.
    ///
    /// # Errors
    ///
    /// Returns [`TelephonyError`] on auth/transient/fatal failures.
    async fn call_transcript(&self, call_id: &str) -> Result<String, TelephonyError>;
}

/// Lets a shared `Arc<dyn TelephonyProvider>` be used wherever a
/// `TelephonyProvider` is expected.
#[async_trait]
impl<T: TelephonyProvider + ?Sized> TelephonyProvider for Arc<T> {
    async fn create_call(&self, brief: &str) -> Result<String, TelephonyError> {
        (**self).create_call(brief).await
    }

    async fn call_status(&self, call_id: &str) -> Result<CallStatus, TelephonyError> {
        (**self).call_status(call_id).await
    }

    async fn call_transcript(&self, call_id: &str) -> Result<String, TelephonyError> {
        (**self).call_transcript(call_id).await
    }
}

pub struct HttpTelephonyProvider {
    client: reqwest::Client,
    api_key: String,
    assistant_id: String,
    base_url: String,
}

impl HttpTelephonyProvider {
    #[must_use]
    pub fn new(api_key: String, assistant_id: String, base_url: Option<String>) -> Self {
        Self {
            client: http_client(),
            api_key,
            assistant_id,
            base_url: base_url
                .unwrap_or_else(|| "https://api.telephony.concierge.dev/v1".to_owned()),
        }
    }

    /// Builds a provider from `TELEPHONY_API_KEY`/`TELEPHONY_ASSISTANT_ID`/
    /// `TELEPHONY_BASE_URL`.
    ///
    /// # Errors
    ///
    /// Returns a configuration message when either required key is
    /// absent.
    pub fn from_env() -> Result<Self, String> {
        let api_key = std::env::var("TELEPHONY_API_KEY")
            .map_err(|_| "TELEPHONY_API_KEY is not set".to_owned())?;
        let assistant_id = std::env::var("TELEPHONY_ASSISTANT_ID")
            .map_err(|_| "TELEPHONY_ASSISTANT_ID is not set".to_owned())?;
        let base_url = std::env::var("TELEPHONY_BASE_URL").ok();
        Ok(Self::new(api_key, assistant_id, base_url))
    }
}

#[derive(Deserialize)]
struct CreateCallResponse {
    id: String,
}

#[derive(Deserialize)]
struct CallStatusResponse {
    status: String,
}

#[derive(Deserialize)]
struct CallTranscriptResponse {
    #[serde(default)]
    transcript: String,
}

#[async_trait]
impl TelephonyProvider for HttpTelephonyProvider {
    async fn create_call(&self, brief: &str) -> Result<String, TelephonyError> {
        let url = format!("{}/calls", self.base_url);
        let body = serde_json::json!({
            "assistantId": self.assistant_id,
            "context": brief,
        });
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

        let parsed: CreateCallResponse = serde_json::from_value(value)
            .map_err(|e| TelephonyError::Parse(format!("unexpected create-call response: {e}")))?;
        Ok(parsed.id)
    }

    async fn call_status(&self, call_id: &str) -> Result<CallStatus, TelephonyError> {
        let url = format!("{}/calls/{call_id}", self.base_url);
        let value = retry::send_json(
            || self.client.get(&url).bearer_auth(&self.api_key),
            &retry::RetryPolicy::default(),
        )
        .await?;

        let parsed: CallStatusResponse = serde_json::from_value(value)
            .map_err(|e| TelephonyError::Parse(format!("unexpected call-status response: {e}")))?;
        parsed
            .status
            .parse()
            .map_err(|()| TelephonyError::Parse(format!("unknown call status '{}'", parsed.status)))
    }

    async fn call_transcript(&self, call_id: &str) -> Result<String, TelephonyError> {
        let url = format!("{}/calls/{call_id}/transcript", self.base_url);
        let value = retry::send_json(
            || self.client.get(&url).bearer_auth(&self.api_key),
            &retry::RetryPolicy::default(),
        )
        .await?;

        let parsed: CallTranscriptResponse = serde_json::from_value(value).map_err(|e| {
            TelephonyError::Parse(format!("unexpected call-transcript response: {e}"))
        })?;
        Ok(parsed.transcript)
    }
}
