//! Full path: session controller -> token proxy -> vendor API, with the
//! vendor SDK replaced by a recording transport.

use async_trait::async_trait;
use axum::{http::StatusCode, routing::post, Json, Router};
use callbridge_server::{app, AppState};
use callbridge_session::{
    AccessCredential, ControllerEvent, ProxyClient, SessionController, SessionRuntime,
    SessionState, TransportError, VendorEvent, VoiceTransport,
};
use callbridge_voice::{RetellClient, RetellConfig};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio::sync::broadcast;

async fn serve(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn spawn_vendor(status: StatusCode) -> String {
    serve(Router::new().route(
        "/v2/create-web-call",
        post(move |Json(req): Json<Value>| async move {
            if status.is_success() {
                (
                    status,
                    Json(json!({
                        "access_token": "tok_abc",
                        "call_id": "call_1",
                        "agent_id": req["agent_id"],
                    })),
                )
            } else {
                (status, Json(json!({ "message": "API key is invalid" })))
            }
        }),
    ))
    .await
}

async fn spawn_proxy(vendor_url: &str) -> String {
    let retell = RetellClient::new(
        RetellConfig::new("sk_live", "agent_123").with_base_url(vendor_url),
    )
    .unwrap();
    serve(app(AppState::new(retell))).await
}

/// Records the credential it is started with instead of opening a call.
#[derive(Default)]
struct RecordingTransport {
    started: Arc<Mutex<Vec<String>>>,
    stopped: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl VoiceTransport for RecordingTransport {
    type Handle = String;

    async fn start_session(
        &mut self,
        credential: AccessCredential,
    ) -> Result<String, TransportError> {
        self.started
            .lock()
            .unwrap()
            .push(credential.access_token.clone());
        Ok(credential.call_id)
    }

    fn stop_session(&mut self, call_id: String) -> Result<(), TransportError> {
        self.stopped.lock().unwrap().push(call_id);
        Ok(())
    }
}

async fn wait_for(rx: &mut broadcast::Receiver<ControllerEvent>, wanted: SessionState) {
    loop {
        if let ControllerEvent::StateChanged { state, .. } = rx.recv().await.unwrap() {
            if state == wanted {
                return;
            }
        }
    }
}

#[tokio::test]
async fn test_call_connects_and_ends() {
    let vendor = spawn_vendor(StatusCode::CREATED).await;
    let proxy = spawn_proxy(&vendor).await;

    let transport = RecordingTransport::default();
    let started = transport.started.clone();
    let stopped = transport.stopped.clone();

    let mut controller = SessionController::new(ProxyClient::new(proxy));
    controller
        .initialize(transport)
        .await
        .expect("config should load through the proxy");
    assert_eq!(controller.agent().unwrap().as_str(), "agent_123");

    let mut rx = controller.subscribe();
    controller.start().await.expect("call should start");

    assert_eq!(controller.state(), SessionState::Active);
    assert_eq!(controller.call_id(), Some("call_1"));
    assert_eq!(*started.lock().unwrap(), vec!["tok_abc".to_string()]);

    let mut seen = Vec::new();
    while let Ok(ControllerEvent::StateChanged { state, .. }) = rx.try_recv() {
        seen.push(state);
    }
    assert_eq!(seen, vec![SessionState::Connecting, SessionState::Active]);

    controller.handle_event(VendorEvent::CallEnded);

    assert_eq!(controller.state(), SessionState::Idle);
    assert!(controller.session_id().is_none());
    assert_eq!(*stopped.lock().unwrap(), vec!["call_1".to_string()]);
}

#[tokio::test]
async fn test_vendor_rejection_returns_controller_to_idle() {
    let vendor = spawn_vendor(StatusCode::FORBIDDEN).await;
    let proxy = spawn_proxy(&vendor).await;

    let transport = RecordingTransport::default();
    let started = transport.started.clone();

    let mut controller = SessionController::new(ProxyClient::new(proxy));
    controller.initialize(transport).await.unwrap();
    let mut rx = controller.subscribe();

    let err = controller.start().await.unwrap_err();

    assert!(err.to_string().contains("API key is invalid"), "got {}", err);
    assert_eq!(controller.state(), SessionState::Idle);
    assert!(started.lock().unwrap().is_empty());

    let mut seen = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let ControllerEvent::StateChanged { state, status } = event {
            seen.push((state, status));
        }
    }
    assert_eq!(seen.len(), 3);
    assert_eq!(seen[1].0, SessionState::Error);
    assert!(seen[1].1.contains("403"));
    assert_eq!(seen[2].0, SessionState::Idle);
}

#[tokio::test]
async fn test_runtime_drives_full_call() {
    let vendor = spawn_vendor(StatusCode::CREATED).await;
    let proxy = spawn_proxy(&vendor).await;

    let transport = RecordingTransport::default();
    let stopped = transport.stopped.clone();

    let mut controller = SessionController::new(ProxyClient::new(proxy));
    controller.initialize(transport).await.unwrap();
    let mut rx = controller.subscribe();

    let (runtime, handle, sink) = SessionRuntime::new(controller);
    let task = tokio::spawn(runtime.run());

    assert!(handle.start().await);
    wait_for(&mut rx, SessionState::Active).await;

    sink.emit(VendorEvent::from_wire(
        "update",
        Some(&json!({ "transcript": "hi there", "role": "agent", "content": "hi there" })),
    )
    .unwrap());
    sink.emit(VendorEvent::CallEnded);
    wait_for(&mut rx, SessionState::Idle).await;

    drop(handle);
    let controller = task.await.unwrap();

    assert_eq!(controller.state(), SessionState::Idle);
    assert!(controller
        .conversation()
        .iter()
        .any(|m| m.content == "hi there"));
    assert_eq!(*stopped.lock().unwrap(), vec!["call_1".to_string()]);
}
