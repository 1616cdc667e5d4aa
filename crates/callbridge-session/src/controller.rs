//! The session lifecycle state machine.

use crate::error::SessionError;
use crate::provider::TokenProvider;
use crate::transport::{VendorEvent, VoiceTransport};
use crate::types::{
    AgentIdentity, ControllerEvent, ConversationMessage, SessionId, SessionState,
};
use callbridge_types::TranscriptUpdate;
use std::mem;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Default capacity for the UI update broadcast channel.
const DEFAULT_EVENT_BROADCAST_CAPACITY: usize = 256;

const AGENT_SPEAKING: &str = "Agent speaking...";
const USER_SPEAKING: &str = "Listening...";
const IDLE_STATUS: &str = "Ready";

struct LiveSession<H> {
    id: SessionId,
    call_id: String,
    handle: H,
}

enum Phase<H> {
    Idle,
    Connecting(SessionId),
    Active(LiveSession<H>),
}

/// Owns at most one call session and its transport handle.
///
/// All mutation goes through `&mut self`, so user actions and vendor events
/// must be funnelled onto one task (see [`SessionRuntime`](crate::SessionRuntime)).
/// The transport handle lives inside the `Active` phase, which makes
/// "active iff a handle is held" hold by construction.
pub struct SessionController<P, T: VoiceTransport> {
    provider: P,
    transport: Option<T>,
    agent: Option<AgentIdentity>,
    phase: Phase<T::Handle>,
    transcript: String,
    conversation: Vec<ConversationMessage>,
    events_tx: broadcast::Sender<ControllerEvent>,
}

impl<P: TokenProvider, T: VoiceTransport> SessionController<P, T> {
    pub fn new(provider: P) -> Self {
        let (events_tx, _) = broadcast::channel(DEFAULT_EVENT_BROADCAST_CAPACITY);
        Self {
            provider,
            transport: None,
            agent: None,
            phase: Phase::Idle,
            transcript: String::new(),
            conversation: Vec::new(),
            events_tx,
        }
    }

    /// Subscribes to UI updates.
    pub fn subscribe(&self) -> broadcast::Receiver<ControllerEvent> {
        self.events_tx.subscribe()
    }

    pub fn state(&self) -> SessionState {
        match self.phase {
            Phase::Idle => SessionState::Idle,
            Phase::Connecting(_) => SessionState::Connecting,
            Phase::Active(_) => SessionState::Active,
        }
    }

    pub fn session_id(&self) -> Option<&SessionId> {
        match &self.phase {
            Phase::Idle => None,
            Phase::Connecting(id) => Some(id),
            Phase::Active(session) => Some(&session.id),
        }
    }

    pub fn call_id(&self) -> Option<&str> {
        match &self.phase {
            Phase::Active(session) => Some(&session.call_id),
            _ => None,
        }
    }

    /// Whether the controller currently holds a transport handle.
    pub fn has_live_transport(&self) -> bool {
        matches!(self.phase, Phase::Active(_))
    }

    pub fn agent(&self) -> Option<&AgentIdentity> {
        self.agent.as_ref()
    }

    pub fn transcript(&self) -> &str {
        &self.transcript
    }

    pub fn conversation(&self) -> &[ConversationMessage] {
        &self.conversation
    }

    /// Loads the agent identity once; later calls reuse the cached value.
    pub async fn load_config(&mut self) -> Result<(), SessionError> {
        if self.agent.is_some() {
            return Ok(());
        }
        match self.provider.fetch_config().await {
            Ok(agent) => {
                self.agent = Some(agent);
                Ok(())
            }
            Err(e) => Err(self.reject(e)),
        }
    }

    /// Loads the agent identity and, once that succeeds, attaches the vendor
    /// transport.
    pub async fn initialize(&mut self, transport: T) -> Result<(), SessionError> {
        self.load_config().await?;
        self.attach_transport(transport);
        Ok(())
    }

    /// Installs the vendor transport. Ignored while a session is live.
    pub fn attach_transport(&mut self, transport: T) {
        if !matches!(self.phase, Phase::Idle) {
            warn!("cannot replace the voice transport while a session is live");
            return;
        }
        self.transport = Some(transport);
        debug!("voice transport attached");
    }

    /// Starts a session: `Idle -> Connecting -> Active`, or back to `Idle`
    /// on any failure.
    ///
    /// A no-op while a session is connecting or active.
    pub async fn start(&mut self) -> Result<(), SessionError> {
        if !matches!(self.phase, Phase::Idle) {
            debug!(state = ?self.state(), "start ignored, session already in progress");
            return Ok(());
        }
        let Some(agent) = self.agent.clone() else {
            return Err(self.reject(SessionError::Configuration(
                "agent configuration is not loaded; check that the backend is running and configured"
                    .to_string(),
            )));
        };
        if self.transport.is_none() {
            return Err(self.reject(SessionError::Configuration(
                "voice client is not initialized".to_string(),
            )));
        }

        let id = SessionId::generate();
        info!(session_id = %id, agent_id = agent.as_str(), "starting session");
        self.phase = Phase::Connecting(id.clone());
        self.transition(SessionState::Connecting, "Requesting access token...");

        let result = match self.transport.as_mut() {
            Some(transport) => connect(&self.provider, transport, &id, &agent).await,
            None => Err(SessionError::Configuration(
                "voice client is not initialized".to_string(),
            )),
        };

        match result {
            Ok((call_id, handle)) => {
                info!(session_id = %id, call_id = %call_id, "session active");
                self.phase = Phase::Active(LiveSession {
                    id,
                    call_id,
                    handle,
                });
                self.transition(SessionState::Active, "Call started");
                Ok(())
            }
            Err(e) => {
                warn!(session_id = %id, "session start failed: {}", e);
                self.phase = Phase::Idle;
                self.fail(e.status_text());
                Err(e)
            }
        }
    }

    /// Ends the active session without waiting for the vendor to confirm.
    ///
    /// Returns `false` (and does nothing) when no session is active.
    pub fn stop(&mut self) -> bool {
        match mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Active(session) => {
                info!(session_id = %session.id, "stopping session");
                self.release(session);
                self.transcript.clear();
                self.transition(SessionState::Idle, "Session stopped");
                true
            }
            other => {
                self.phase = other;
                false
            }
        }
    }

    /// Applies one vendor event. Events arriving with no live session are
    /// stale and dropped without a UI update.
    pub fn handle_event(&mut self, event: VendorEvent) {
        if !matches!(self.phase, Phase::Active(_)) {
            debug!(?event, "ignoring vendor event with no live session");
            return;
        }

        match event {
            VendorEvent::CallStarted => {
                self.conversation.push(ConversationMessage::system("Call connected"));
                self.emit(ControllerEvent::Status("Call connected".to_string()));
            }
            VendorEvent::AgentStartTalking => self.set_transcript(AGENT_SPEAKING),
            VendorEvent::UserStartTalking => self.set_transcript(USER_SPEAKING),
            VendorEvent::AgentStopTalking | VendorEvent::UserStopTalking => self.set_transcript(""),
            VendorEvent::Update(update) => self.apply_update(update),
            VendorEvent::CallEnded => self.end_session(None),
            VendorEvent::Error(message) => self.end_session(Some(message)),
        }
    }

    pub fn clear_conversation(&mut self) {
        self.conversation.clear();
        self.emit(ControllerEvent::ConversationCleared);
    }

    fn apply_update(&mut self, update: TranscriptUpdate) {
        if !update.transcript.is_empty() {
            self.transcript = update.transcript.clone();
        }
        let message = update
            .utterance()
            .map(|(role, content)| ConversationMessage::new(role, content));
        if let Some(message) = &message {
            self.conversation.push(message.clone());
        }
        self.emit(ControllerEvent::Transcript {
            text: self.transcript.clone(),
            message,
        });
    }

    fn end_session(&mut self, error: Option<String>) {
        if let Phase::Active(session) = mem::replace(&mut self.phase, Phase::Idle) {
            info!(session_id = %session.id, "session ended by vendor");
            self.release(session);
        }
        self.transcript.clear();

        match error {
            None => self.transition(SessionState::Idle, "Call ended"),
            Some(message) => {
                warn!("vendor reported an error: {}", message);
                self.fail(format!("Voice agent error: {}", message));
            }
        }
    }

    fn release(&mut self, session: LiveSession<T::Handle>) {
        if let Some(transport) = self.transport.as_mut() {
            if let Err(e) = transport.stop_session(session.handle) {
                warn!(session_id = %session.id, "transport stop failed: {}", e);
            }
        }
    }

    fn set_transcript(&mut self, text: &str) {
        self.transcript = text.to_string();
        self.emit(ControllerEvent::Transcript {
            text: self.transcript.clone(),
            message: None,
        });
    }

    /// Reports a failure that leaves the state untouched.
    fn reject(&mut self, err: SessionError) -> SessionError {
        warn!("{}", err);
        let status = err.status_text();
        self.conversation.push(ConversationMessage::system(status.clone()));
        self.emit(ControllerEvent::Status(status));
        err
    }

    /// Reports `Error`, then settles back in `Idle`.
    fn fail(&mut self, status: String) {
        self.transition(SessionState::Error, status);
        self.emit(ControllerEvent::StateChanged {
            state: SessionState::Idle,
            status: IDLE_STATUS.to_string(),
        });
    }

    fn transition(&mut self, state: SessionState, status: impl Into<String>) {
        let status = status.into();
        self.conversation.push(ConversationMessage::system(status.clone()));
        self.emit(ControllerEvent::StateChanged { state, status });
    }

    fn emit(&self, event: ControllerEvent) {
        // No subscribers is fine; the UI may not be attached yet.
        let _ = self.events_tx.send(event);
    }
}

/// Runs the fallible part of a start attempt.
///
/// The access token expires within seconds if unused, so the preparatory
/// step runs first and nothing suspends between the token fetch and
/// `start_session`.
async fn connect<P: TokenProvider, T: VoiceTransport>(
    provider: &P,
    transport: &mut T,
    id: &SessionId,
    agent: &AgentIdentity,
) -> Result<(String, T::Handle), SessionError> {
    transport.prepare().await?;
    let credential = provider.create_token(id, agent).await?;
    let call_id = credential.call_id.clone();
    let handle = transport.start_session(credential).await?;
    Ok((call_id, handle))
}
