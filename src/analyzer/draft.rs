use super::entry::{EnhancedEntry, ParamLocation};
use super::naming::request_name;
use crate::model::{Credentials, DataSourceRequest};
use crate::value::{ComputedValue, Template};
use indexmap::IndexMap;

/// A request being materialized from a recorded entry.
///
/// The URL path is kept split into segments so that individual segments can be
/// templated before the final URL expression is assembled.
#[derive(Debug, Clone)]
pub(super) struct RequestDraft {
    pub id: String,
    /// Position of the source entry in the time-sorted entry list.
    pub entry_index: usize,
    method: String,
    credentials: Credentials,
    origin: String,
    segments: Vec<ComputedValue>,
    headers: IndexMap<String, ComputedValue>,
    query: Template,
    body: Option<Template>,
}

impl RequestDraft {
    /// Copies an entry as literal text: method, headers, cleaned URL and query.
    pub(super) fn from_entry(id: String, entry_index: usize, entry: &EnhancedEntry<'_>) -> Self {
        Self {
            id,
            entry_index,
            method: entry.entry.method.to_uppercase(),
            credentials: entry.entry.credentials,
            origin: entry.url.origin(),
            segments: entry.segments.iter().map(ComputedValue::text).collect(),
            headers: entry
                .entry
                .request_headers
                .iter()
                .map(|(name, value)| (name.clone(), ComputedValue::text(value)))
                .collect(),
            query: Template::from(entry.query.clone()),
            body: entry.entry.request_body.clone().map(Template::from),
        }
    }

    /// Replaces the parameter at `location` with `value`.
    /// Returns `false` when the location does not exist on this draft.
    pub(super) fn apply(&mut self, location: &ParamLocation, value: ComputedValue) -> bool {
        match location {
            ParamLocation::PathSegment(i) => match self.segments.get_mut(*i) {
                Some(segment) => {
                    *segment = value;
                    true
                }
                None => false,
            },
            ParamLocation::Header(name) => {
                self.headers.insert(name.clone(), value);
                true
            }
            ParamLocation::Query(path) => self.query.set_at(path, Template::Computed(value)),
            ParamLocation::Body(path) => match &mut self.body {
                Some(body) => body.set_at(path, Template::Computed(value)),
                None => false,
            },
        }
    }

    /// `origin` followed by the segments joined with `/`, with adjacent text merged.
    pub(super) fn url(&self) -> ComputedValue {
        let mut pieces = Vec::with_capacity(self.segments.len() * 2 + 1);
        pieces.push(ComputedValue::text(self.origin.clone()));
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                pieces.push(ComputedValue::text("/"));
            }
            pieces.push(segment.clone());
        }
        ComputedValue::concat(pieces)
    }

    pub(super) fn finish(self) -> DataSourceRequest {
        let url = self.url();
        DataSourceRequest {
            name: request_name(&self.method, &url),
            id: self.id,
            method: self.method,
            credentials: self.credentials,
            url,
            query_params: self.query,
            headers: self.headers,
            body: self.body,
        }
    }
}
