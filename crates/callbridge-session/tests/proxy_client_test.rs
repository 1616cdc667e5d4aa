use axum::{
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use callbridge_session::{AgentIdentity, ProxyClient, SessionError, SessionId, TokenProvider};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

async fn serve(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Fake proxy whose config and token endpoints answer with fixed responses.
/// Token request bodies are recorded.
async fn spawn_proxy(
    config: Value,
    token_status: StatusCode,
    token_body: String,
) -> (String, Arc<Mutex<Vec<Value>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_handler = seen.clone();

    let app = Router::new()
        .route(
            "/api/config",
            get(move || {
                let config = config.clone();
                async move { Json(config) }
            }),
        )
        .route(
            "/api/retell/token",
            post(move |Json(req): Json<Value>| {
                let seen = seen_handler.clone();
                let body = token_body.clone();
                async move {
                    seen.lock().unwrap().push(req);
                    (
                        token_status,
                        [("content-type", "application/json")],
                        body,
                    )
                }
            }),
        );

    (serve(app).await, seen)
}

fn agent() -> AgentIdentity {
    AgentIdentity::new("agent_123").unwrap()
}

#[tokio::test]
async fn test_fetch_config_returns_agent() {
    let (url, _) = spawn_proxy(
        json!({ "retellConfig": { "agentId": "agent_123" } }),
        StatusCode::OK,
        String::new(),
    )
    .await;

    let agent = ProxyClient::new(url)
        .fetch_config()
        .await
        .expect("config should load");
    assert_eq!(agent.as_str(), "agent_123");
}

#[tokio::test]
async fn test_fetch_config_with_empty_agent_is_configuration_error() {
    let (url, _) = spawn_proxy(
        json!({ "retellConfig": { "agentId": "" } }),
        StatusCode::OK,
        String::new(),
    )
    .await;

    let err = ProxyClient::new(url).fetch_config().await.unwrap_err();
    assert!(matches!(err, SessionError::Configuration(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_create_token_sends_agent_and_session() {
    let (url, seen) = spawn_proxy(
        json!({ "retellConfig": { "agentId": "agent_123" } }),
        StatusCode::OK,
        json!({ "access_token": "tok_abc", "call_id": "call_1" }).to_string(),
    )
    .await;

    let session = SessionId::generate();
    let credential = ProxyClient::new(format!("{}/", url))
        .create_token(&session, &agent())
        .await
        .expect("token should be issued");

    assert_eq!(credential.access_token, "tok_abc");
    assert_eq!(credential.call_id, "call_1");

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0]["agent_id"], "agent_123");
    assert_eq!(seen[0]["session_id"], session.as_str());
}

#[tokio::test]
async fn test_create_token_surfaces_proxy_error_text() {
    let (url, _) = spawn_proxy(
        json!({ "retellConfig": { "agentId": "agent_123" } }),
        StatusCode::FORBIDDEN,
        json!({ "error": "Error 403: API key is invalid" }).to_string(),
    )
    .await;

    let err = ProxyClient::new(url)
        .create_token(&SessionId::generate(), &agent())
        .await
        .unwrap_err();

    match err {
        SessionError::Upstream { status, message } => {
            assert_eq!(status, Some(403));
            assert_eq!(message, "Error 403: API key is invalid");
        }
        other => panic!("expected upstream error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_create_token_without_error_body_uses_fallback() {
    let (url, _) = spawn_proxy(
        json!({ "retellConfig": { "agentId": "agent_123" } }),
        StatusCode::BAD_GATEWAY,
        "upstream exploded".to_string(),
    )
    .await;

    let err = ProxyClient::new(url)
        .create_token(&SessionId::generate(), &agent())
        .await
        .unwrap_err();

    match err {
        SessionError::Upstream { status, message } => {
            assert_eq!(status, Some(502));
            assert!(message.contains("502"), "message was {}", message);
        }
        other => panic!("expected upstream error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_create_token_rejects_empty_access_token() {
    let (url, _) = spawn_proxy(
        json!({ "retellConfig": { "agentId": "agent_123" } }),
        StatusCode::OK,
        json!({ "access_token": "", "call_id": "call_1" }).to_string(),
    )
    .await;

    let err = ProxyClient::new(url)
        .create_token(&SessionId::generate(), &agent())
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::Upstream { status: None, .. }));
}

#[tokio::test]
async fn test_unreachable_proxy_is_upstream_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = ProxyClient::new(format!("http://{}", addr))
        .fetch_config()
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::Upstream { status: None, .. }));
}
