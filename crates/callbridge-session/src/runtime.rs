//! Serialises user commands and vendor events onto one task.

use crate::controller::SessionController;
use crate::provider::TokenProvider;
use crate::transport::{VendorEvent, VoiceTransport};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Default capacity of the command queue.
const DEFAULT_COMMAND_QUEUE_CAPACITY: usize = 64;

/// A local user action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Stop,
    ClearConversation,
}

/// Sending half used by the UI to drive the controller.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<Command>,
}

impl SessionHandle {
    /// Queues a command. Returns `false` once the runtime has shut down.
    pub async fn send(&self, command: Command) -> bool {
        self.commands.send(command).await.is_ok()
    }

    pub async fn start(&self) -> bool {
        self.send(Command::Start).await
    }

    pub async fn stop(&self) -> bool {
        self.send(Command::Stop).await
    }

    pub async fn clear_conversation(&self) -> bool {
        self.send(Command::ClearConversation).await
    }
}

/// Sending half handed to the transport adapter for vendor callbacks.
#[derive(Debug, Clone)]
pub struct VendorEventSink {
    events: mpsc::UnboundedSender<VendorEvent>,
}

impl VendorEventSink {
    /// Fire-and-forget onto an unbounded queue. Events are dropped only once
    /// the runtime has stopped.
    pub fn emit(&self, event: VendorEvent) {
        if let Err(mpsc::error::SendError(event)) = self.events.send(event) {
            if event.is_terminal() {
                warn!(?event, "terminal vendor event dropped, session runtime stopped");
            } else {
                debug!(?event, "vendor event dropped, session runtime stopped");
            }
        }
    }
}

/// Owns a [`SessionController`] and applies commands and vendor events to it
/// one at a time.
pub struct SessionRuntime<P, T: VoiceTransport> {
    controller: SessionController<P, T>,
    commands: mpsc::Receiver<Command>,
    events: mpsc::UnboundedReceiver<VendorEvent>,
}

impl<P: TokenProvider, T: VoiceTransport> SessionRuntime<P, T> {
    pub fn new(controller: SessionController<P, T>) -> (Self, SessionHandle, VendorEventSink) {
        let (commands_tx, commands) = mpsc::channel(DEFAULT_COMMAND_QUEUE_CAPACITY);
        let (events_tx, events) = mpsc::unbounded_channel();
        (
            Self {
                controller,
                commands,
                events,
            },
            SessionHandle {
                commands: commands_tx,
            },
            VendorEventSink { events: events_tx },
        )
    }

    pub fn controller(&self) -> &SessionController<P, T> {
        &self.controller
    }

    /// Runs until every [`SessionHandle`] is dropped, then stops any live
    /// session and hands the controller back.
    pub async fn run(mut self) -> SessionController<P, T> {
        loop {
            tokio::select! {
                biased;
                command = self.commands.recv() => match command {
                    Some(Command::Start) => self.start().await,
                    Some(other) => self.apply(other),
                    None => break,
                },
                Some(event) = self.events.recv() => self.controller.handle_event(event),
            }
        }

        self.controller.stop();
        info!("session runtime stopped");
        self.controller
    }

    /// Drives a start attempt while still draining commands: repeated starts
    /// are dropped and anything else waits until the attempt settles. Vendor
    /// events stay queued until then.
    async fn start(&mut self) {
        let mut deferred = Vec::new();
        let mut closed = false;

        {
            let attempt = self.controller.start();
            tokio::pin!(attempt);

            loop {
                tokio::select! {
                    biased;
                    result = &mut attempt => {
                        if let Err(e) = result {
                            debug!("start attempt ended: {}", e);
                        }
                        break;
                    }
                    command = self.commands.recv(), if !closed => match command {
                        Some(Command::Start) => debug!("start ignored, session is connecting"),
                        Some(other) => deferred.push(other),
                        None => closed = true,
                    },
                }
            }
        }

        for command in deferred {
            self.apply(command);
        }
    }

    fn apply(&mut self, command: Command) {
        match command {
            Command::Start => {}
            Command::Stop => {
                self.controller.stop();
            }
            Command::ClearConversation => self.controller.clear_conversation(),
        }
    }
}
