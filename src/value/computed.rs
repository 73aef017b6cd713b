use super::formatter::TemplateFormatter;
use super::path::ResponseBodyPath;
use crate::error::EvaluationError;
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;

/// Runtime inputs supplied to a playback, keyed by input id (e.g. `"email"`).
pub type Inputs = AHashMap<String, String>;

/// Points at a location inside the response body of another request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponsePointer {
    pub request_id: String,
    pub path: ResponseBodyPath,
}

impl ResponsePointer {
    pub fn new(request_id: impl Into<String>, path: ResponseBodyPath) -> Self {
        Self {
            request_id: request_id.into(),
            path,
        }
    }
}

/// A value that is not known until playback time.
///
/// Evaluation is lazy: `Input` reads from the runtime inputs, `Request` reads from the
/// response of an already-executed request, and `Concat` joins its children.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ComputedValue {
    Text { value: String },
    Input { id: String },
    Request(ResponsePointer),
    Concat { children: Vec<ComputedValue> },
}

impl ComputedValue {
    pub fn text(value: impl Into<String>) -> Self {
        ComputedValue::Text {
            value: value.into(),
        }
    }

    pub fn input(id: impl Into<String>) -> Self {
        ComputedValue::Input { id: id.into() }
    }

    pub fn request(request_id: impl Into<String>, path: ResponseBodyPath) -> Self {
        ComputedValue::Request(ResponsePointer::new(request_id, path))
    }

    /// Builds a `Concat`, merging adjacent text children and dropping empty text.
    /// A concat that collapses to a single child is returned as that child.
    pub fn concat(children: Vec<ComputedValue>) -> Self {
        let mut merged: Vec<ComputedValue> = Vec::with_capacity(children.len());
        for child in children {
            match (merged.last_mut(), child) {
                (_, ComputedValue::Text { value }) if value.is_empty() => {}
                (Some(ComputedValue::Text { value: prev }), ComputedValue::Text { value }) => {
                    prev.push_str(&value)
                }
                (_, child) => merged.push(child),
            }
        }
        match merged.len() {
            0 => ComputedValue::text(""),
            1 => merged.remove(0),
            _ => ComputedValue::Concat { children: merged },
        }
    }

    /// Evaluates the expression.
    ///
    /// `Ok(None)` means "undefined": a missing input, a path that does not resolve, or a
    /// concat with at least one undefined child. `lookup` is responsible for failing loudly
    /// when asked for a request that has not run yet.
    pub fn evaluate<L>(&self, inputs: &Inputs, lookup: &L) -> Result<Option<Value>, EvaluationError>
    where
        L: Fn(&ResponsePointer) -> Result<Option<Value>, EvaluationError>,
    {
        match self {
            ComputedValue::Text { value } => Ok(Some(Value::String(value.clone()))),
            ComputedValue::Input { id } => Ok(inputs.get(id).map(|v| Value::String(v.clone()))),
            ComputedValue::Request(pointer) => lookup(pointer),
            ComputedValue::Concat { children } => {
                let mut joined = String::new();
                for child in children {
                    match child.evaluate(inputs, lookup)? {
                        Some(value) => joined.push_str(&stringify(&value)),
                        None => return Ok(None),
                    }
                }
                Ok(Some(Value::String(joined)))
            }
        }
    }

    /// Collects the ids of every request referenced by this expression.
    pub fn collect_references(&self, refs: &mut BTreeSet<String>) {
        match self {
            ComputedValue::Request(pointer) => {
                refs.insert(pointer.request_id.clone());
            }
            ComputedValue::Concat { children } => {
                for child in children {
                    child.collect_references(refs);
                }
            }
            ComputedValue::Text { .. } | ComputedValue::Input { .. } => {}
        }
    }

    pub fn references(&self) -> BTreeSet<String> {
        let mut refs = BTreeSet::new();
        self.collect_references(&mut refs);
        refs
    }

    /// Returns the literal text if this expression is plain text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ComputedValue::Text { value } => Some(value),
            _ => None,
        }
    }
}

impl fmt::Display for ComputedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&TemplateFormatter::format_value(self))
    }
}

/// String form used when a JSON value is spliced into text.
/// Strings are inserted verbatim, numbers in decimal form, anything else as JSON.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
