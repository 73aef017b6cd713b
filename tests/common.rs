//! Common test utilities for building recordings, data sources and transports.
use async_trait::async_trait;
use reqgraph::prelude::*;
use serde_json::{Value, json};
use indexmap::IndexMap;
use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::Duration;

/// A recorded GET request with no headers.
#[allow(dead_code)]
pub fn get_entry(id: &str, url: &str, started_at: f64, response: Option<Value>) -> RecordedEntry {
    RecordedEntry {
        id: id.to_string(),
        url: url.to_string(),
        method: "GET".to_string(),
        credentials: Credentials::Include,
        request_headers: IndexMap::new(),
        request_body: None,
        response_body: response,
        started_at,
    }
}

/// Adds a request header to a recorded entry.
#[allow(dead_code)]
pub fn with_header(mut entry: RecordedEntry, name: &str, value: &str) -> RecordedEntry {
    entry
        .request_headers
        .insert(name.to_string(), value.to_string());
    entry
}

/// Turns a recorded entry into a POST with a JSON body.
#[allow(dead_code)]
pub fn with_body(mut entry: RecordedEntry, body: Value) -> RecordedEntry {
    entry.method = "POST".to_string();
    entry.request_body = Some(body);
    entry
}

/// Looks a user up by email, then fetches their orders by id.
///
/// `GET /api/users?email=foo@bar.com -> {id: "42", name: "Foo"}`, then
/// `GET /api/orders?user_id=42 -> {orders: []}`, final URL `/users/42`.
#[allow(dead_code)]
pub fn user_then_orders_recording() -> Recording {
    Recording::new(
        vec![
            get_entry(
                "e1",
                "/api/users?email=foo@bar.com",
                1.0,
                Some(json!({"id": "42", "name": "Foo"})),
            ),
            get_entry(
                "e2",
                "/api/orders?user_id=42",
                2.0,
                Some(json!({"orders": []})),
            ),
        ],
        "/users/42",
    )
}

/// A session that logs in, looks a user up with a bearer token and then loads the
/// user's tickets with the same token.
#[allow(dead_code)]
pub fn authorized_recording() -> Recording {
    Recording::new(
        vec![
            get_entry(
                "session",
                "https://app.example.com/api/session",
                1.0,
                Some(json!({"auth": {"token": "abc123"}, "agent": "support"})),
            ),
            with_header(
                get_entry(
                    "lookup",
                    "https://app.example.com/api/users/search?email=foo%40bar.com",
                    2.0,
                    Some(json!({"user": {"id": 42, "name": "Foo"}})),
                ),
                "Authorization",
                "Bearer abc123",
            ),
            with_header(
                get_entry(
                    "tickets",
                    "https://app.example.com/api/users/42/tickets",
                    3.0,
                    Some(json!({"tickets": [{"subject": "Refund"}]})),
                ),
                "Authorization",
                "Bearer abc123",
            ),
        ],
        "https://app.example.com/agent/users/42",
    )
}

/// Builds a GET data source request with no query params, headers or body.
#[allow(dead_code)]
pub fn get_request(id: &str, url: ComputedValue) -> DataSourceRequest {
    DataSourceRequest {
        id: id.to_string(),
        name: id.to_string(),
        method: "GET".to_string(),
        credentials: Credentials::Include,
        url,
        query_params: Template::empty_object(),
        headers: IndexMap::new(),
        body: None,
    }
}

#[allow(dead_code)]
pub fn output(id: &str, request_id: &str, path: ResponseBodyPath) -> DataSourceOutput {
    DataSourceOutput {
        id: id.to_string(),
        name: id.to_string(),
        value: ResponsePointer::new(request_id, path),
    }
}

#[allow(dead_code)]
pub fn email_inputs(email: &str) -> Inputs {
    let mut inputs = Inputs::new();
    inputs.insert("email".to_string(), email.to_string());
    inputs
}

/// Serves canned responses by exact URL and remembers every request it receives.
#[allow(dead_code)]
#[derive(Default)]
pub struct ScriptedTransport {
    responses: BTreeMap<String, std::result::Result<TransportResponse, TransportError>>,
    calls: Mutex<Vec<TransportRequest>>,
}

#[allow(dead_code)]
impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, url: &str, body: Value) -> Self {
        self.responses
            .insert(url.to_string(), Ok(TransportResponse::ok(body.to_string())));
        self
    }

    pub fn respond_with(mut self, url: &str, status: u16, body_text: &str) -> Self {
        self.responses.insert(
            url.to_string(),
            Ok(TransportResponse {
                status,
                body_text: body_text.to_string(),
            }),
        );
        self
    }

    pub fn fail(mut self, url: &str, message: &str) -> Self {
        self.responses
            .insert(url.to_string(), Err(TransportError(message.to_string())));
        self
    }

    pub fn calls(&self) -> Vec<TransportRequest> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn called_urls(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.url).collect()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn execute(&self, request: TransportRequest) -> std::result::Result<TransportResponse, TransportError> {
        let url = request.url.clone();
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(request);
        }
        self.responses
            .get(&url)
            .cloned()
            .unwrap_or_else(|| Err(TransportError(format!("no scripted response for {}", url))))
    }
}

/// Never answers within any reasonable timeout.
#[allow(dead_code)]
pub struct StalledTransport;

#[async_trait]
impl Transport for StalledTransport {
    async fn execute(&self, _request: TransportRequest) -> std::result::Result<TransportResponse, TransportError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(TransportResponse::ok("{}"))
    }
}

/// Scratch directory for tests that touch the filesystem.
#[allow(dead_code)]
pub fn setup_test_dir() -> std::path::PathBuf {
    std::env::temp_dir().join("reqgraph-tests")
}
