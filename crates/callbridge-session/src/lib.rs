//! Client-side session controller for callbridge.
//!
//! Owns one voice call at a time and drives its lifecycle:
//!
//! ```text
//!            start (config + transport present)
//!   Idle ─────────────────────────────────────▶ Connecting
//!    ▲                                              │
//!    │  token / transport / permission failure      │ token fetched,
//!    ├───────────────── (Error) ◀───────────────────┤ transport started
//!    │                                              ▼
//!    └──────── stop, CallEnded, Error event ───── Active
//! ```
//!
//! The access token comes from a [`TokenProvider`] (normally [`ProxyClient`]
//! talking to the callbridge server) and is handed straight to a
//! [`VoiceTransport`] adapter over the vendor SDK. Vendor callbacks come back
//! as [`VendorEvent`]s and are turned into [`ControllerEvent`]s for the UI.

pub mod controller;
pub mod error;
pub mod provider;
pub mod runtime;
pub mod transport;
pub mod types;


pub use controller::SessionController;
pub use error::{SessionError, TransportError};
pub use provider::{ProxyClient, TokenProvider};
pub use runtime::{Command, SessionHandle, SessionRuntime, VendorEventSink};
pub use transport::{VendorEvent, VoiceTransport};
pub use types::{
    AccessCredential, AgentIdentity, ControllerEvent, ConversationMessage, SessionId,
    SessionState,
};
