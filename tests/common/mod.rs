//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, Response};
use axum::Router;
use base64::Engine;
use tower::ServiceExt;

use policy_gateway::config::{GatewayConfig, UserConfig};
use policy_gateway::events::{EventKind, EventPublisher, ListenerError, SecurityEvent, SecurityEventListener};
use policy_gateway::lifecycle::startup;
use policy_gateway::HttpServer;

/// Listener that records every event it sees.
#[derive(Default)]
pub struct RecordingListener {
    calls: AtomicUsize,
    kinds: Mutex<Vec<EventKind>>,
}

impl RecordingListener {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn kinds(&self) -> Vec<EventKind> {
        self.kinds.lock().unwrap().clone()
    }
}

impl SecurityEventListener for RecordingListener {
    fn name(&self) -> &str {
        "recording"
    }

    fn on_event(&self, event: &SecurityEvent) -> Result<(), ListenerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.kinds.lock().unwrap().push(event.kind);
        Ok(())
    }
}

/// Default config with one user, `alice` / `s3cret`.
pub fn test_config() -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.observability.metrics_enabled = false;
    config.users = vec![UserConfig {
        username: "alice".into(),
        password: "s3cret".into(),
        roles: vec!["USER".into()],
    }];
    config
}

/// Server built from `config` whose publisher feeds the returned listener.
pub fn server_with_listener(config: &GatewayConfig) -> (HttpServer, Arc<RecordingListener>) {
    let listener = Arc::new(RecordingListener::default());
    let publisher = EventPublisher::new(Duration::from_millis(200)).with_listener(listener.clone());
    let gateway = startup::assemble_with_publisher(config, Arc::new(publisher)).unwrap();
    (HttpServer::with_gateway(config, gateway), listener)
}

pub fn app(config: &GatewayConfig) -> (Router, Arc<RecordingListener>) {
    let (server, listener) = server_with_listener(config);
    (server.router(), listener)
}

pub fn basic(username: &str, password: &str) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(format!("{username}:{password}"));
    format!("Basic {encoded}")
}

pub fn get(path: &str) -> axum::http::request::Builder {
    Request::builder().method("GET").uri(path)
}

pub fn post(path: &str) -> axum::http::request::Builder {
    Request::builder().method("POST").uri(path)
}

pub fn xhr(builder: axum::http::request::Builder) -> axum::http::request::Builder {
    builder
        .header("X-Requested-With", "XMLHttpRequest")
        .header(header::ACCEPT, "application/json")
}

pub fn browser(builder: axum::http::request::Builder) -> axum::http::request::Builder {
    builder.header(
        header::ACCEPT,
        "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
    )
}

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
