use super::datasource::Credentials;
use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use indexmap::IndexMap;
use serde_json::Value;
use std::fs;

/// One captured request/response pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordedEntry {
    pub id: String,
    pub url: String,
    #[serde(default = "default_method")]
    pub method: String,
    #[serde(default)]
    pub credentials: Credentials,
    #[serde(default)]
    pub request_headers: IndexMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_body: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_body: Option<Value>,
    pub started_at: f64,
}

fn default_method() -> String {
    "GET".to_string()
}

impl RecordedEntry {
    /// The response body as structured JSON.
    ///
    /// Bodies captured as text are parsed; only objects and arrays count as structured.
    pub fn structured_response(&self) -> Option<Value> {
        match self.response_body.as_ref()? {
            Value::String(text) => match serde_json::from_str::<Value>(text) {
                Ok(parsed @ (Value::Object(_) | Value::Array(_))) => Some(parsed),
                _ => None,
            },
            body @ (Value::Object(_) | Value::Array(_)) => Some(body.clone()),
            _ => None,
        }
    }
}

/// A passively captured browsing session.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recording {
    pub network_requests: Vec<RecordedEntry>,
    #[serde(default)]
    pub last_url: String,
}

impl Recording {
    pub fn new(network_requests: Vec<RecordedEntry>, last_url: impl Into<String>) -> Self {
        Self {
            network_requests,
            last_url: last_url.into(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        serde_json::from_str(json).map_err(|e| ModelError::JsonParseError(e.to_string()))
    }

    /// Load a recording from a JSON file.
    pub fn from_file(path: &str) -> Result<Self, ModelError> {
        let content = fs::read_to_string(path).map_err(|e| ModelError::Io {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        Self::from_json(&content)
    }
}
