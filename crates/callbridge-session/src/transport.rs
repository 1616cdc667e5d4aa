//! The pinned capability interface over the vendor's voice transport, and
//! the closed set of events it reports back.

use crate::error::TransportError;
use crate::types::AccessCredential;
use async_trait::async_trait;
use callbridge_types::TranscriptUpdate;
use tracing::{debug, warn};

/// Adapter over one pinned version of the vendor's client SDK.
///
/// The controller owns the adapter and the [`Handle`](Self::Handle) of the
/// live call. The handle is only ever created by `start_session` and only
/// ever given back through `stop_session`, so a live handle exists exactly
/// while a session is active.
#[async_trait]
pub trait VoiceTransport: Send {
    /// Live call owned by the controller while a session is active.
    type Handle: Send;

    /// Optional step run before the access token is requested, for example
    /// asking for microphone permission. Never runs after the token fetch.
    async fn prepare(&mut self) -> Result<(), TransportError> {
        Ok(())
    }

    /// Joins the call authorised by `credential`. Called immediately after
    /// the credential is fetched.
    async fn start_session(
        &mut self,
        credential: AccessCredential,
    ) -> Result<Self::Handle, TransportError>;

    /// Asks the transport to hang up. Does not wait for the vendor to confirm.
    fn stop_session(&mut self, handle: Self::Handle) -> Result<(), TransportError>;
}

/// Lifecycle events emitted by the vendor transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VendorEvent {
    CallStarted,
    CallEnded,
    AgentStartTalking,
    AgentStopTalking,
    UserStartTalking,
    UserStopTalking,
    /// Live transcript update.
    Update(TranscriptUpdate),
    /// Unrecoverable transport error, already formatted for display.
    Error(String),
}

impl VendorEvent {
    /// Maps a vendor SDK event name and payload onto the closed event set.
    ///
    /// Returns `None` for names outside the pinned contract (the SDK's raw
    /// `audio` stream included).
    pub fn from_wire(name: &str, payload: Option<&serde_json::Value>) -> Option<Self> {
        let event = match name {
            "call_started" => VendorEvent::CallStarted,
            "call_ended" => VendorEvent::CallEnded,
            "agent_start_talking" => VendorEvent::AgentStartTalking,
            "agent_stop_talking" => VendorEvent::AgentStopTalking,
            "user_start_talking" => VendorEvent::UserStartTalking,
            "user_stop_talking" => VendorEvent::UserStopTalking,
            "update" => {
                let Some(payload) = payload else {
                    debug!("update event without payload dropped");
                    return None;
                };
                match serde_json::from_value(payload.clone()) {
                    Ok(update) => VendorEvent::Update(update),
                    Err(e) => {
                        warn!("malformed update payload dropped: {}", e);
                        return None;
                    }
                }
            }
            "error" => VendorEvent::Error(error_text(payload)),
            _ => return None,
        };
        Some(event)
    }

    /// Terminal events end the session regardless of who initiated them.
    pub fn is_terminal(&self) -> bool {
        matches!(self, VendorEvent::CallEnded | VendorEvent::Error(_))
    }
}

fn error_text(payload: Option<&serde_json::Value>) -> String {
    match payload {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(value) => value
            .get("message")
            .and_then(|m| m.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| value.to_string()),
        None => "unknown error".to_string(),
    }
}
