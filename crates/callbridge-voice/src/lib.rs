//! Voice vendor integration for callbridge.
//!
//! Wraps the vendor's call-creation API: the server-held secret is exchanged
//! for a short-lived access token that a browser or native transport uses to
//! join a web call. Audio capture, streaming transport, speech recognition
//! and synthesis all stay on the vendor side.

pub mod config;
pub mod error;
pub mod service;

pub use config::{RetellConfig, DEFAULT_RETELL_BASE_URL};
pub use error::VoiceError;
pub use service::RetellClient;
