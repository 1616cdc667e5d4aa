use serde::{Deserialize, Serialize};
use std::fmt;

/// Production endpoint of the Retell API.
pub const DEFAULT_RETELL_BASE_URL: &str = "https://api.retellai.com";

fn default_base_url() -> String {
    DEFAULT_RETELL_BASE_URL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

#[derive(Clone, Serialize, Deserialize)]
pub struct RetellConfig {
    /// Server-held API secret, sent as a bearer credential.
    #[serde(default, skip_serializing)]
    pub api_key: String,
    /// Default agent used when a token request names none.
    #[serde(default)]
    pub agent_id: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Timeout for a single create-web-call request. Default: 10 seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for RetellConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            agent_id: String::new(),
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl fmt::Debug for RetellConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetellConfig")
            .field("api_key", &"[REDACTED]")
            .field("agent_id", &self.agent_id)
            .field("base_url", &self.base_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl RetellConfig {
    pub fn new(api_key: impl Into<String>, agent_id: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            agent_id: agent_id.into(),
            ..Self::default()
        }
    }

    /// Points the client at a different API host (used for tests and proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Both the secret and a default agent are present.
    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty() && !self.agent_id.trim().is_empty()
    }
}
