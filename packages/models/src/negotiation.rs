use serde::{Deserialize, Serialize};

/// The outcome of an outbound negotiation call, returned directly to the
/// `/api/negotiate` caller. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NegotiationRecord {
    pub address: String,
    pub caller_name: String,
    pub caller_email: String,
    pub brief: String,
    pub findings: Vec<String>,
    pub leverage_score: f32,
    pub call_summary: String,
    pub success: bool,
}
