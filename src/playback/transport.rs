use crate::model::{Credentials, Recording};
use crate::url::{ParsedUrl, decode_path_segment};
use ahash::AHashMap;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

/// A fully rendered request, ready to be sent.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    pub url: String,
    pub method: String,
    pub credentials: Credentials,
    pub headers: BTreeMap<String, String>,
    pub body: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body_text: String,
}

impl TransportResponse {
    pub fn ok(body_text: impl Into<String>) -> Self {
        Self {
            status: 200,
            body_text: body_text.into(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct TransportError(pub String);

/// Performs the actual network fetch on behalf of the playback engine.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: TransportRequest) -> Result<TransportResponse, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn execute(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        (**self).execute(request).await
    }
}

/// Serves the responses captured in a recording, matched by method and URL.
///
/// Query parameters are compared after decoding and sorting, so the order and encoding
/// produced at playback do not have to match the recorded request byte for byte.
/// Unknown requests get a 404.
#[derive(Debug, Clone, Default)]
pub struct RecordedTransport {
    responses: AHashMap<(String, String), String>,
}

impl RecordedTransport {
    pub fn from_recording(recording: &Recording) -> Self {
        let mut responses = AHashMap::new();
        let mut entries: Vec<_> = recording.network_requests.iter().collect();
        entries.sort_by(|a, b| a.started_at.total_cmp(&b.started_at));
        // Later captures of the same request win.
        for entry in entries {
            if let Some(body) = &entry.response_body {
                let body_text = match body {
                    Value::String(text) => text.clone(),
                    other => other.to_string(),
                };
                responses.insert(request_key(&entry.method, &entry.url), body_text);
            }
        }
        Self { responses }
    }

    pub fn len(&self) -> usize {
        self.responses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }
}

#[async_trait]
impl Transport for RecordedTransport {
    async fn execute(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        let response = match self.responses.get(&request_key(&request.method, &request.url)) {
            Some(body_text) => TransportResponse::ok(body_text.clone()),
            None => TransportResponse {
                status: 404,
                body_text: String::new(),
            },
        };
        Ok(response)
    }
}

fn request_key(method: &str, url: &str) -> (String, String) {
    let parsed = ParsedUrl::parse(url);
    let mut pairs = parsed.query_pairs();
    pairs.sort();
    let query = pairs
        .into_iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");
    let path = parsed
        .path
        .split('/')
        .map(decode_path_segment)
        .collect::<Vec<_>>()
        .join("/");
    (method.to_uppercase(), format!("{}{}?{}", parsed.origin(), path, query))
}
