//! Access to the token proxy.

use crate::error::SessionError;
use crate::types::{AccessCredential, AgentIdentity, SessionId};
use async_trait::async_trait;
use callbridge_types::{
    ConfigResponse, ErrorBody, TokenRequest, TokenResponse, CONFIG_PATH, TOKEN_PATH,
};
use reqwest::StatusCode;
use tracing::{debug, info};

/// Source of agent configuration and per-call access credentials.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Loads the public agent identity. An unset agent is a configuration
    /// error, not an empty identity.
    async fn fetch_config(&self) -> Result<AgentIdentity, SessionError>;

    /// Requests a fresh credential for one start attempt.
    async fn create_token(
        &self,
        session_id: &SessionId,
        agent: &AgentIdentity,
    ) -> Result<AccessCredential, SessionError>;
}

/// [`TokenProvider`] backed by the callbridge token proxy over HTTP.
#[derive(Debug, Clone)]
pub struct ProxyClient {
    base_url: String,
    http: reqwest::Client,
}

impl ProxyClient {
    /// `base_url` is the proxy origin, e.g. `http://localhost:3000`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, reqwest::Client::new())
    }

    pub fn with_client(base_url: impl Into<String>, http: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Builds an upstream error from a failed proxy response, preferring the
/// proxy's `{ error }` text.
async fn upstream_error(resp: reqwest::Response, fallback: &str) -> SessionError {
    let status = resp.status();
    let message = match resp.json::<ErrorBody>().await {
        Ok(body) if !body.error.is_empty() => body.error,
        _ => format!("{} ({})", fallback, status.as_u16()),
    };
    SessionError::Upstream {
        status: Some(status.as_u16()),
        message,
    }
}

#[async_trait]
impl TokenProvider for ProxyClient {
    async fn fetch_config(&self) -> Result<AgentIdentity, SessionError> {
        let resp = self.http.get(self.url(CONFIG_PATH)).send().await?;
        if resp.status() != StatusCode::OK {
            return Err(upstream_error(resp, "failed to load configuration").await);
        }

        let config: ConfigResponse = resp.json().await?;
        let agent = AgentIdentity::new(config.retell_config.agent_id).ok_or_else(|| {
            SessionError::Configuration("the backend has no agent id configured".to_string())
        })?;
        info!(agent_id = agent.as_str(), "loaded agent configuration");
        Ok(agent)
    }

    async fn create_token(
        &self,
        session_id: &SessionId,
        agent: &AgentIdentity,
    ) -> Result<AccessCredential, SessionError> {
        debug!(session_id = %session_id, "requesting access token");
        let resp = self
            .http
            .post(self.url(TOKEN_PATH))
            .json(&TokenRequest {
                agent_id: Some(agent.as_str().to_string()),
                session_id: Some(session_id.to_string()),
            })
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(upstream_error(resp, "failed to obtain access token").await);
        }

        let token: TokenResponse = resp.json().await?;
        if token.access_token.is_empty() {
            return Err(SessionError::Upstream {
                status: None,
                message: "no access token received".to_string(),
            });
        }
        Ok(token.into())
    }
}
