//! Error types for the session broker
//!
//! Domain failures are expressed with `MatchmakingError` and carried through
//! the application as `anyhow` errors, so callers can downcast when they need
//! to make a control decision (e.g. choosing an HTTP status).

/// Result type alias for convenience
pub type Result<T> = anyhow::Result<T>;

/// Custom error types for specific matchmaking scenarios
#[derive(Debug, thiserror::Error)]
pub enum MatchmakingError {
    #[error("Session backend unavailable during {operation}: {message}")]
    BackendUnavailable { operation: String, message: String },

    #[error("Routing queue not found: {queue_name}")]
    QueueNotFound { queue_name: String },

    #[error("Routing queue has no destinations: {queue_name}")]
    QueueHasNoDestinations { queue_name: String },

    #[error("Invalid match request: {reason}")]
    InvalidMatchRequest { reason: String },

    #[error("Could not admit player {player_id} into game session {game_session_id}")]
    AdmissionFailed {
        player_id: String,
        game_session_id: String,
    },

    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    #[error("Internal service error: {message}")]
    InternalError { message: String },
}

impl MatchmakingError {
    /// Build a `BackendUnavailable` error for the named backend operation
    pub fn backend(operation: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::BackendUnavailable {
            operation: operation.into(),
            message: message.to_string(),
        }
    }

    /// Stable machine-readable kind used in error payloads
    pub fn kind(&self) -> &'static str {
        match self {
            MatchmakingError::BackendUnavailable { .. } => "backend_unavailable",
            MatchmakingError::QueueNotFound { .. } => "queue_not_found",
            MatchmakingError::QueueHasNoDestinations { .. } => "queue_not_found",
            MatchmakingError::InvalidMatchRequest { .. } => "invalid_request",
            MatchmakingError::AdmissionFailed { .. } => "admission_failed",
            MatchmakingError::ConfigurationError { .. } => "internal_error",
            MatchmakingError::InternalError { .. } => "internal_error",
        }
    }

    /// HTTP-style status code reported to the caller for this failure
    pub fn status_code(&self) -> u16 {
        match self {
            MatchmakingError::InvalidMatchRequest { .. } => 400,
            MatchmakingError::QueueNotFound { .. }
            | MatchmakingError::QueueHasNoDestinations { .. } => 404,
            MatchmakingError::AdmissionFailed { .. } => 409,
            MatchmakingError::BackendUnavailable { .. } => 502,
            MatchmakingError::ConfigurationError { .. }
            | MatchmakingError::InternalError { .. } => 500,
        }
    }
}
