use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::time::Duration;

/// Tuning knobs for the recording analyzer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnalyzerConfig {
    /// Input id substituted for the end-user's email address.
    pub email_input_id: String,
    /// Maximum nesting of authorization/CSRF producer tracing.
    pub max_trace_depth: usize,
    pub trace_authorization: bool,
    pub trace_csrf: bool,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            email_input_id: "email".to_string(),
            max_trace_depth: 8,
            trace_authorization: true,
            trace_csrf: true,
        }
    }
}

/// Tuning knobs for playback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlaybackConfig {
    /// Per-request timeout in milliseconds. `None` waits indefinitely.
    pub request_timeout_ms: Option<u64>,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: Some(30_000),
        }
    }
}

impl PlaybackConfig {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub analyzer: AnalyzerConfig,
    pub playback: PlaybackConfig,
}

impl Config {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// Load configuration from a JSON file. Missing fields take their defaults.
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        Self::from_json(&content)
    }
}
