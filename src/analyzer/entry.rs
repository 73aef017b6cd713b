use super::search::leaves;
use crate::model::RecordedEntry;
use crate::url::{ParsedUrl, decode_path_segment};
use crate::value::{PathKey, ResponseBodyPath};
use serde_json::Value;

/// Where a request parameter lives inside a recorded request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParamLocation {
    /// Index into `ParsedUrl::raw_segments`.
    PathSegment(usize),
    Header(String),
    Query(ResponseBodyPath),
    Body(ResponseBodyPath),
}

/// A single request parameter value and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub location: ParamLocation,
    /// Header name, or the last object key of a query/body path.
    pub key: Option<String>,
    pub value: String,
}

/// A recorded entry with its URL pre-parsed. Lives only for one analyzer run.
#[derive(Debug, Clone)]
pub struct EnhancedEntry<'a> {
    pub entry: &'a RecordedEntry,
    pub url: ParsedUrl,
    pub segments: Vec<String>,
    pub query: Value,
    pub response: Option<Value>,
}

impl<'a> EnhancedEntry<'a> {
    pub fn new(entry: &'a RecordedEntry) -> Self {
        let url = ParsedUrl::parse(&entry.url);
        let segments = url.raw_segments();
        let query = url.query_object();
        Self {
            entry,
            url,
            segments,
            query,
            response: entry.structured_response(),
        }
    }

    pub fn id(&self) -> &str {
        &self.entry.id
    }

    /// Every request-side parameter: path segments, header values, query values and
    /// request-body leaves, in that order. Response bodies are never included.
    pub fn params(&self) -> Vec<Param> {
        let mut params = Vec::new();

        for (i, segment) in self.segments.iter().enumerate() {
            if segment.is_empty() {
                continue;
            }
            params.push(Param {
                location: ParamLocation::PathSegment(i),
                key: None,
                value: decode_path_segment(segment),
            });
        }

        for (name, value) in &self.entry.request_headers {
            params.push(Param {
                location: ParamLocation::Header(name.clone()),
                key: Some(name.clone()),
                value: value.clone(),
            });
        }

        for (path, value) in leaves(&self.query) {
            params.push(Param {
                key: last_key(&path),
                location: ParamLocation::Query(path),
                value,
            });
        }

        if let Some(body) = &self.entry.request_body {
            for (path, value) in leaves(body) {
                params.push(Param {
                    key: last_key(&path),
                    location: ParamLocation::Body(path),
                    value,
                });
            }
        }

        params
    }

    /// Parameters whose whole value equals `literal`.
    pub fn params_equal_to(&self, literal: &str) -> Vec<Param> {
        self.params()
            .into_iter()
            .filter(|p| p.value == literal)
            .collect()
    }
}

fn last_key(path: &[PathKey]) -> Option<String> {
    path.iter().rev().find_map(|key| match key {
        PathKey::Key(k) => Some(k.clone()),
        PathKey::Index(_) => None,
    })
}
