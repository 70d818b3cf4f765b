//! Shared helpers for driving routers in tests

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use keygate::api::{AuthState, ItemState, StandaloneState};
use keygate::domain::{Credential, Item, KeyValidator};
use keygate::infrastructure::api_key::AuthService;
use keygate::infrastructure::services::ItemService;
use keygate::infrastructure::storage::InMemoryStorage;
use serde_json::Value;
use tokio::{net::TcpListener, sync::oneshot, task::JoinHandle};
use tower::ServiceExt;

pub fn auth_service() -> AuthService {
    AuthService::new(Arc::new(InMemoryStorage::<Credential>::new()))
}

pub fn item_service() -> ItemService {
    ItemService::new(Arc::new(InMemoryStorage::<Item>::new()))
}

pub fn auth_state() -> AuthState {
    AuthState::new(auth_service())
}

pub fn item_state(validator: Arc<dyn KeyValidator>) -> ItemState {
    ItemState::new(item_service(), validator)
}

pub fn standalone_state() -> StandaloneState {
    StandaloneState::new(auth_service(), item_service())
}

/// Sends one request and returns the status with the parsed JSON body
///
/// An empty body comes back as `Value::Null`.
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    api_key: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(key) = api_key {
        builder = builder.header("x-api-key", key);
    }

    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, json)
}

/// Signs `username` up and returns the issued key
pub async fn signup(app: &Router, username: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/signup",
        None,
        Some(serde_json::json!({ "username": username })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED, "signup failed: {body}");
    body["api_key"].as_str().unwrap().to_string()
}

/// A router bound to a real local port
pub struct TestServer {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<std::io::Result<()>>,
}

impl TestServer {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        let _ = self.handle.await;
    }
}

pub async fn spawn_router(router: Router) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel();
    let handle = tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async {
                let _ = rx.await;
            })
            .await
    });

    TestServer {
        addr,
        shutdown: Some(tx),
        handle,
    }
}
