use axum::http::StatusCode;

/// Errors raised while authenticating and classifying an inbound GitHub hook.
///
/// Every variant is terminal for the request that produced it: nothing
/// downstream of the failing stage runs.
#[derive(Debug, thiserror::Error)]
pub enum HookError {
    #[error("no_signature")]
    MissingSignature,

    #[error("no_event")]
    MissingEvent,

    #[error("no_event_id")]
    MissingDeliveryId,

    #[error("invalid_signature")]
    InvalidSignature,

    #[error("empty_payload")]
    EmptyPayload,

    #[error("unhandled_event: {0}")]
    UnhandledEvent(String),

    /// The platform emits many more actions than the relay cares about, so
    /// this is the common "nothing to do" outcome rather than a failure.
    #[error("unhandled_action: {event} {action}")]
    UnhandledAction { event: String, action: String },

    #[error("malformed {event} payload: {source}")]
    MalformedPayload {
        event: String,
        #[source]
        source: serde_json::Error,
    },
}

impl HookError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            HookError::MissingSignature | HookError::MissingEvent | HookError::MissingDeliveryId => StatusCode::BAD_REQUEST,
            HookError::InvalidSignature => StatusCode::UNAUTHORIZED,
            HookError::EmptyPayload | HookError::MalformedPayload { .. } => StatusCode::BAD_REQUEST,
            HookError::UnhandledEvent(_) | HookError::UnhandledAction { .. } => StatusCode::ACCEPTED,
        }
    }

    /// Whether the hook was authentic but deliberately ignored.
    pub fn is_ignored(&self) -> bool {
        matches!(self, HookError::UnhandledEvent(_) | HookError::UnhandledAction { .. })
    }
}
