//! Error types for the session controller.

use thiserror::Error;

/// Failures reported by a [`VoiceTransport`](crate::VoiceTransport) adapter.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The user refused microphone access during the preparatory step.
    #[error("microphone access denied: {0}")]
    PermissionDenied(String),

    #[error("transport failed to start: {0}")]
    Start(String),

    #[error("transport failed to stop: {0}")]
    Stop(String),
}

/// Why a session attempt ended. Every variant is terminal for the attempt;
/// nothing is retried automatically.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Agent identity not loaded, voice client missing, or the backend is
    /// not configured.
    #[error("not configured: {0}")]
    Configuration(String),

    /// The token proxy or the vendor behind it refused the request.
    #[error("{message}")]
    Upstream { status: Option<u16>, message: String },

    #[error("{0}")]
    Transport(TransportError),

    /// Microphone access was denied before any network call was made.
    #[error("microphone access denied: {0}")]
    Permission(String),
}

impl SessionError {
    /// Short, user-facing description. Never includes internal detail beyond
    /// the upstream message.
    pub fn status_text(&self) -> String {
        match self {
            SessionError::Configuration(msg) => format!("Configuration error: {}", msg),
            SessionError::Upstream { message, .. } => format!("Could not start the call: {}", message),
            SessionError::Transport(e) => format!("Voice connection failed: {}", e),
            SessionError::Permission(_) => "Microphone access was denied".to_string(),
        }
    }
}

impl From<TransportError> for SessionError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::PermissionDenied(msg) => SessionError::Permission(msg),
            other => SessionError::Transport(other),
        }
    }
}

impl From<reqwest::Error> for SessionError {
    fn from(err: reqwest::Error) -> Self {
        SessionError::Upstream {
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}
