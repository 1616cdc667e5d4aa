//! Shared wire types for the callbridge workspace.
//!
//! This crate holds the JSON bodies exchanged between the session controller
//! and the token proxy, and between the token proxy and the voice vendor.
//! Field names follow the wire format exactly (`retellConfig.agentId` on the
//! config endpoint, snake_case on the token endpoint) so both sides of every
//! hop deserialize the same structs.
//!
//! No crate in the workspace depends on anything *except* `callbridge-types`
//! for cross-cutting type definitions.

pub mod voice;

use serde::{Deserialize, Serialize};

pub use voice::{ConversationRole, TranscriptUpdate};

/// Path of the public configuration endpoint.
pub const CONFIG_PATH: &str = "/api/config";

/// Path of the token exchange endpoint.
pub const TOKEN_PATH: &str = "/api/retell/token";

/// Path of the health probe.
pub const HEALTH_PATH: &str = "/api/health";

/// Body of `GET /api/config`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigResponse {
    pub retell_config: PublicAgentConfig,
}

/// The public, non-secret part of the vendor configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicAgentConfig {
    /// Vendor agent identifier. Empty when the server has none configured.
    #[serde(default)]
    pub agent_id: String,
}

/// Body of `POST /api/retell/token`. Both fields are optional; an empty body
/// is accepted and falls back to the server's default agent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

/// Body of a successful `POST /api/retell/token`.
///
/// This is also the subset of the vendor's create-web-call response that the
/// proxy forwards; everything else the vendor returns is dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub call_id: String,
}

/// Body of `GET /api/health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    /// RFC 3339 UTC timestamp with millisecond precision.
    pub timestamp: String,
    pub retell_configured: bool,
}

/// Error body returned by every failing proxy endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Request body for the vendor's `POST /v2/create-web-call`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateWebCallRequest {
    pub agent_id: String,
}
