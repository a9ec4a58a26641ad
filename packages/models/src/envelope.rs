/// The kind of message an [`Envelope`] carries between the coordinator and
/// an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeKind {
    Request,
    Response,
}

/// In-process message passed between the coordinator and an agent.
///
/// Envelopes are never serialized or sent over a wire between agents; the
/// type exists purely to give every coordinator/agent boundary a uniform
/// shape (session id, kind, payload, optional error) regardless of which
/// concrete payload type `T` an agent uses.
#[derive(Debug, Clone)]
pub struct Envelope<T> {
    pub session_id: String,
    pub kind: EnvelopeKind,
    pub payload: T,
    pub error: Option<String>,
}

impl<T> Envelope<T> {
    #[must_use]
    pub const fn request(session_id: String, payload: T) -> Self {
        Self {
            session_id,
            kind: EnvelopeKind::Request,
            payload,
            error: None,
        }
    }

    #[must_use]
    pub const fn response(session_id: String, payload: T) -> Self {
        Self {
            session_id,
            kind: EnvelopeKind::Response,
            payload,
            error: None,
        }
    }

    #[must_use]
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}
