//! callbridge token proxy library logic.
//!
//! Exposes the public agent configuration, exchanges session requests for
//! vendor access tokens, and reports health. Holds no state between requests.

pub mod api;
pub mod config;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Extension, Router,
};
use callbridge_types::{CONFIG_PATH, HEALTH_PATH, TOKEN_PATH};
use callbridge_voice::RetellClient;
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Vendor API client holding the server-side secret.
    pub retell: Arc<RetellClient>,
    /// Directory of the browser front-end, if one is served.
    pub static_dir: Option<String>,
}

impl AppState {
    pub fn new(retell: RetellClient) -> Self {
        Self {
            retell: Arc::new(retell),
            static_dir: None,
        }
    }
}

/// Maximum request body size (64 KiB). Token requests are a few dozen bytes.
const MAX_REQUEST_BODY_BYTES: usize = 64 * 1024;

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    let router = Router::new()
        .route(
            CONFIG_PATH,
            get(api::get_config_handler).fallback(api::method_not_allowed_handler),
        )
        .route(
            TOKEN_PATH,
            post(api::create_token_handler).fallback(api::method_not_allowed_handler),
        )
        .route(
            HEALTH_PATH,
            get(api::health_handler).fallback(api::method_not_allowed_handler),
        );

    let router = match state.static_dir.as_deref() {
        Some(dir) if Path::new(dir).join("index.html").exists() => {
            tracing::info!(path = %dir, "serving front-end static files");
            let index = Path::new(dir).join("index.html");
            router.fallback_service(ServeDir::new(dir).fallback(ServeFile::new(index)))
        }
        Some(dir) => {
            tracing::warn!(path = %dir, "static directory has no index.html, skipping static file serving");
            router
        }
        None => router,
    };

    router
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(Extension(Arc::new(state)))
}
