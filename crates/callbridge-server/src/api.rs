//! API handlers for the token proxy.

use crate::AppState;
use axum::{
    body::Bytes,
    extract::{Extension, Json},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use callbridge_types::{
    ConfigResponse, ErrorBody, HealthResponse, PublicAgentConfig, TokenRequest, TokenResponse,
};
use callbridge_voice::VoiceError;
use chrono::{SecondsFormat, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Message returned when the vendor secret or agent id is missing.
pub const NOT_CONFIGURED_MESSAGE: &str =
    "Retell is not configured. Check the RETELL_API_KEY and RETELL_AGENT_ID environment variables.";

/// API error type mapping to HTTP status codes.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("method not allowed")]
    MethodNotAllowed,
    #[error("invalid input: {0}")]
    BadRequest(String),
    /// The server is missing its vendor secret or agent id. Not retryable
    /// without operator action.
    #[error("{0}")]
    NotConfigured(String),
    /// The vendor answered with an error; its status is passed through.
    #[error("{message}")]
    Upstream { status: StatusCode, message: String },
    #[error("{error}: {message}")]
    Internal { error: String, message: String },
}

impl From<VoiceError> for ApiError {
    fn from(err: VoiceError) -> Self {
        match err {
            VoiceError::Config(_) => ApiError::NotConfigured(NOT_CONFIGURED_MESSAGE.to_string()),
            VoiceError::Upstream { status, message } => ApiError::Upstream {
                status: StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
                message,
            },
            VoiceError::Decode(msg) => ApiError::Upstream {
                status: StatusCode::BAD_GATEWAY,
                message: msg,
            },
            VoiceError::Network(e) => ApiError::Internal {
                error: "failed to obtain access token".to_string(),
                message: e.to_string(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                ErrorBody {
                    error: "method not allowed".to_string(),
                    message: None,
                },
            ),
            ApiError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: msg,
                    message: None,
                },
            ),
            ApiError::NotConfigured(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody {
                    error: msg,
                    message: None,
                },
            ),
            ApiError::Upstream { status, message } => (
                status,
                ErrorBody {
                    error: message,
                    message: None,
                },
            ),
            ApiError::Internal { error, message } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody {
                    error,
                    message: Some(message),
                },
            ),
        };

        (status, Json(body)).into_response()
    }
}

/// Fallback for any method a route does not serve.
pub async fn method_not_allowed_handler() -> ApiError {
    ApiError::MethodNotAllowed
}

/// Handler for `GET /api/config`.
///
/// Only the public agent identifier leaves the server; an unset agent comes
/// back as an empty string and the caller decides what that means.
pub async fn get_config_handler(Extension(state): Extension<Arc<AppState>>) -> Json<ConfigResponse> {
    Json(ConfigResponse {
        retell_config: PublicAgentConfig {
            agent_id: state.retell.default_agent_id().to_string(),
        },
    })
}

/// Handler for `POST /api/retell/token`.
///
/// Exchanges the server-held secret for a vendor access token. The body is
/// optional; an empty body uses the default agent.
pub async fn create_token_handler(
    Extension(state): Extension<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<TokenResponse>, ApiError> {
    let request: TokenRequest = if body.iter().all(u8::is_ascii_whitespace) {
        TokenRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::BadRequest(format!("invalid token request body: {}", e)))?
    };

    let Some(agent_id) = state.retell.resolve_agent_id(request.agent_id.as_deref()) else {
        tracing::warn!("token requested but no agent id is configured");
        return Err(ApiError::NotConfigured(NOT_CONFIGURED_MESSAGE.to_string()));
    };
    if !state.retell.has_api_key() {
        tracing::warn!("token requested but the vendor API key is not configured");
        return Err(ApiError::NotConfigured(NOT_CONFIGURED_MESSAGE.to_string()));
    }

    let session_id = request.session_id.as_deref().unwrap_or("-");
    tracing::info!(agent_id, session_id, "issuing access token");

    let call = state.retell.create_web_call(agent_id).await.map_err(|e| {
        tracing::warn!(agent_id, session_id, "token exchange failed: {}", e);
        ApiError::from(e)
    })?;

    Ok(Json(TokenResponse {
        access_token: call.access_token,
        call_id: call.call_id,
    }))
}

/// Handler for `GET /api/health`.
pub async fn health_handler(Extension(state): Extension<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        retell_configured: state.retell.is_configured(),
    })
}
