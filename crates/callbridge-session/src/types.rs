//! Session identifiers, credentials, and the observable controller model.

use callbridge_types::{ConversationRole, TokenResponse};
use chrono::{DateTime, Utc};
use std::fmt;

/// Opaque identifier of one call session, generated at start.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    /// Generates `session_<unix-millis>_<9 random chars>`.
    pub fn generate() -> Self {
        let random = uuid::Uuid::new_v4().simple().to_string();
        Self(format!(
            "session_{}_{}",
            Utc::now().timestamp_millis(),
            &random[..9]
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Public identifier of the vendor agent configuration. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentIdentity(String);

impl AgentIdentity {
    /// Returns `None` for an empty or blank identifier.
    pub fn new(id: impl Into<String>) -> Option<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            None
        } else {
            Some(Self(id))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Short-lived credential for one call.
///
/// Not `Clone`: a credential is fetched once per start attempt and moved
/// straight into the transport.
pub struct AccessCredential {
    pub access_token: String,
    pub call_id: String,
}

impl fmt::Debug for AccessCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessCredential")
            .field("access_token", &"[REDACTED]")
            .field("call_id", &self.call_id)
            .finish()
    }
}

impl From<TokenResponse> for AccessCredential {
    fn from(resp: TokenResponse) -> Self {
        Self {
            access_token: resp.access_token,
            call_id: resp.call_id,
        }
    }
}

/// Observable lifecycle state of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Connecting,
    Active,
    /// Reported when an attempt or a live call fails; the controller is back
    /// in `Idle` by the time the next update is published.
    Error,
}

/// One entry of the in-memory conversation history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationMessage {
    pub role: ConversationRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ConversationMessage {
    pub fn new(role: ConversationRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(ConversationRole::System, content)
    }
}

/// UI-facing update published by the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerEvent {
    /// Lifecycle transition with a short status line.
    StateChanged {
        state: SessionState,
        status: String,
    },
    /// Status line that does not change the lifecycle state.
    Status(String),
    /// New live transcript text, plus the finished utterance if the update
    /// carried one.
    Transcript {
        text: String,
        message: Option<ConversationMessage>,
    },
    ConversationCleared,
}
