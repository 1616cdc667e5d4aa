use crate::config::RetellConfig;
use crate::error::VoiceError;
use callbridge_types::{CreateWebCallRequest, TokenResponse};
use reqwest::StatusCode;
use std::time::Duration;
use tracing::{info, warn};

/// Vendor path that registers a web call and issues its access token.
const CREATE_WEB_CALL_PATH: &str = "/v2/create-web-call";

/// Client for the vendor's call-creation API.
///
/// Stateless apart from the pooled HTTP connection: every call to
/// [`RetellClient::create_web_call`] is an independent request and nothing
/// the vendor returns is cached.
#[derive(Debug, Clone)]
pub struct RetellClient {
    config: RetellConfig,
    http: reqwest::Client,
}

impl RetellClient {
    pub fn new(config: RetellConfig) -> Result<Self, VoiceError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self { config, http })
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    pub fn has_api_key(&self) -> bool {
        !self.config.api_key.trim().is_empty()
    }

    /// Returns the public agent identifier. Empty if none is configured.
    pub fn default_agent_id(&self) -> &str {
        &self.config.agent_id
    }

    /// Picks the agent for a token request: the caller's choice when it is
    /// non-empty, otherwise the configured default.
    pub fn resolve_agent_id<'a>(&'a self, requested: Option<&'a str>) -> Option<&'a str> {
        requested
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .or_else(|| Some(self.config.agent_id.trim()).filter(|id| !id.is_empty()))
    }

    /// Registers a web call for `agent_id` and returns its access credential.
    ///
    /// Vendor failures are surfaced as [`VoiceError::Upstream`] carrying the
    /// vendor's status; nothing is retried.
    pub async fn create_web_call(&self, agent_id: &str) -> Result<TokenResponse, VoiceError> {
        if !self.has_api_key() {
            return Err(VoiceError::Config("Retell API key is not set".to_string()));
        }
        if agent_id.trim().is_empty() {
            return Err(VoiceError::Config("Retell agent id is not set".to_string()));
        }

        let url = format!(
            "{}{}",
            self.config.base_url.trim_end_matches('/'),
            CREATE_WEB_CALL_PATH
        );
        info!(agent_id, "requesting vendor web call");

        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&CreateWebCallRequest {
                agent_id: agent_id.to_string(),
            })
            .send()
            .await?;

        let status = resp.status();
        let body = resp.bytes().await?;

        if !status.is_success() {
            let message = format!("Error {}: {}", status.as_u16(), upstream_message(status, &body));
            warn!(status = status.as_u16(), agent_id, "vendor rejected web call: {}", message);
            return Err(VoiceError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        let call: TokenResponse = serde_json::from_slice(&body)
            .map_err(|e| VoiceError::Decode(format!("create-web-call response: {}", e)))?;
        if call.access_token.is_empty() {
            return Err(VoiceError::Decode(
                "create-web-call response has an empty access_token".to_string(),
            ));
        }

        info!(call_id = %call.call_id, "vendor web call registered");
        Ok(call)
    }
}

/// Extracts the human-readable message from a vendor error body.
///
/// Prefers the JSON `message` field, then `error`, then the status reason
/// phrase. A body that is not JSON at all yields "unknown error".
fn upstream_message(status: StatusCode, body: &[u8]) -> String {
    let Ok(value) = serde_json::from_slice::<serde_json::Value>(body) else {
        return "unknown error".to_string();
    };
    value
        .get("message")
        .and_then(|v| v.as_str())
        .or_else(|| value.get("error").and_then(|v| v.as_str()))
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error").to_string())
}
