use thiserror::Error;

/// Top-level gateway error. Every variant is classified so the routes layer
/// can pick a status code without inspecting message text, and no raw
/// upstream exception text ever reaches the browser.
#[derive(Debug, Error)]
pub enum GatewayError {
    // ── Request rejection ────────────────────────────────────────────────────
    #[error("Origin '{origin}' is not allowed")]
    OriginRejected { origin: String },

    #[error("Bad request: {message}")]
    InvalidBody { message: String },

    #[error("Bad request: messages cannot be empty")]
    EmptyMessages,

    // ── Upstream provider errors ─────────────────────────────────────────────
    #[error("missing OPENAI_API_KEY")]
    MissingApiKey,

    #[error("upstream rejected the request with status {status}")]
    UpstreamRejected { status: u16, detail: String },

    #[error("upstream network failure: {message}")]
    UpstreamNetwork { message: String },

    // ── Collaborator errors ──────────────────────────────────────────────────
    #[error("recommendation engine unavailable: {message}")]
    EngineUnavailable { message: String },
}

impl GatewayError {
    pub fn invalid_body(message: impl Into<String>) -> Self {
        GatewayError::InvalidBody { message: message.into() }
    }

    pub fn is_origin_rejected(&self) -> bool {
        matches!(self, GatewayError::OriginRejected { .. })
    }

    pub fn is_bad_request(&self) -> bool {
        matches!(
            self,
            GatewayError::InvalidBody { .. } | GatewayError::EmptyMessages
        )
    }
}
