//! Server configuration loading from file and environment variables.

use callbridge_voice::RetellConfig;
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use thiserror::Error;

/// Top-level server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server network settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Voice vendor credentials and endpoint.
    #[serde(default)]
    pub retell: RetellConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Network configuration for the HTTP server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory holding the browser front-end. Served at `/` when it
    /// contains an `index.html`.
    #[serde(default)]
    pub static_dir: Option<String>,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "callbridge_server=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `CALLBRIDGE_HOST` overrides `server.host`
/// - `CALLBRIDGE_PORT` (or plain `PORT`) overrides `server.port`
/// - `CALLBRIDGE_STATIC_DIR` overrides `server.static_dir`
/// - `RETELL_API_KEY` overrides `retell.api_key`
/// - `RETELL_AGENT_ID` overrides `retell.agent_id`
/// - `RETELL_API_BASE_URL` overrides `retell.base_url`
/// - `CALLBRIDGE_LOG_LEVEL` overrides `logging.level`
/// - `CALLBRIDGE_LOG_JSON` overrides `logging.json` (set to "true" to enable)
///
/// A missing vendor secret is not an error here: the server still starts and
/// the token endpoint reports itself as unconfigured.
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    load_config_with(path, |key| std::env::var(key).ok())
}

fn load_config_with(
    path: Option<&str>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<Config, ConfigError> {
    let config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    Ok(apply_env_overrides(config, lookup))
}

/// Applies environment overrides using `lookup` to read variables.
fn apply_env_overrides(mut config: Config, lookup: impl Fn(&str) -> Option<String>) -> Config {
    if let Some(host) = lookup("CALLBRIDGE_HOST") {
        if let Ok(parsed) = host.parse() {
            config.server.host = parsed;
        }
    }
    if let Some(port) = lookup("CALLBRIDGE_PORT").or_else(|| lookup("PORT")) {
        if let Ok(parsed) = port.parse() {
            config.server.port = parsed;
        }
    }
    if let Some(dir) = lookup("CALLBRIDGE_STATIC_DIR") {
        config.server.static_dir = Some(dir).filter(|d| !d.trim().is_empty());
    }
    if let Some(key) = lookup("RETELL_API_KEY") {
        config.retell.api_key = key;
    }
    if let Some(agent_id) = lookup("RETELL_AGENT_ID") {
        config.retell.agent_id = agent_id;
    }
    if let Some(base_url) = lookup("RETELL_API_BASE_URL") {
        config.retell.base_url = base_url;
    }
    if let Some(level) = lookup("CALLBRIDGE_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(json) = lookup("CALLBRIDGE_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }
    config
}
