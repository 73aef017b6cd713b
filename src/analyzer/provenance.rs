//! Tracing where authorization tokens and CSRF values came from.
//!
//! A value sent by a request is "produced" by an earlier request if it appears in that
//! earlier request's response body. The producer is materialized and the consuming
//! field is rewritten to read from the producer's response at playback time.

use super::Analysis;
use super::entry::{Param, ParamLocation};
use super::search::{Needle, object_contains, object_contains_key};
use crate::value::{ComputedValue, ResponseBodyPath};
use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, warn};

static CSRF_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)csrf").expect("regex for csrf keys"));

impl Analysis<'_, '_> {
    /// Traces the producers of the draft's authorization header and CSRF parameters,
    /// then recurses into each producer. Every entry is traced at most once.
    pub(super) fn trace_producers(&mut self, draft: usize, depth: usize) {
        let entry_index = self.drafts[draft].entry_index;
        let entry_id = self.entries[entry_index].id().to_string();
        if depth > self.config.max_trace_depth {
            warn!(
                entry = %entry_id,
                max_depth = self.config.max_trace_depth,
                "producer tracing depth limit reached"
            );
            return;
        }
        if !self.traced.insert(entry_id) {
            return;
        }
        if self.config.trace_authorization {
            self.trace_authorization(draft, depth);
        }
        if self.config.trace_csrf {
            self.trace_csrf(draft, depth);
        }
    }

    fn trace_authorization(&mut self, draft: usize, depth: usize) {
        let entry_index = self.drafts[draft].entry_index;
        let entry = &self.entries[entry_index];
        let Some((header, scheme, token)) = entry
            .entry
            .request_headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case("authorization"))
            .and_then(|(name, value)| {
                let (scheme, token) = value.trim().split_once(' ')?;
                Some((name.clone(), scheme.to_string(), token.trim().to_string()))
            })
        else {
            return;
        };
        if token.is_empty() {
            return;
        }

        let Some((producer_index, path)) = self.find_producer(entry_index, Needle::Exact(&token))
        else {
            warn!(
                entry = %self.entries[entry_index].id(),
                "authorization token not found in any earlier response"
            );
            return;
        };

        let producer = self.materialize(producer_index);
        let producer_id = self.drafts[producer].id.clone();
        debug!(
            entry = %self.entries[entry_index].id(),
            producer = %producer_id,
            "authorization token traced"
        );
        self.drafts[draft].apply(
            &ParamLocation::Header(header),
            ComputedValue::concat(vec![
                ComputedValue::text(format!("{} ", scheme)),
                ComputedValue::request(producer_id, path),
            ]),
        );
        self.trace_producers(producer, depth + 1);
    }

    fn trace_csrf(&mut self, draft: usize, depth: usize) {
        let entry_index = self.drafts[draft].entry_index;
        let csrf_params: Vec<Param> = self.entries[entry_index]
            .params()
            .into_iter()
            .filter(|p| !p.value.is_empty())
            .filter(|p| p.key.as_deref().is_some_and(|key| CSRF_KEY.is_match(key)))
            .collect();

        for param in csrf_params {
            let found = self
                .find_producer(entry_index, Needle::Exact(&param.value))
                .or_else(|| self.find_producer_by_key(entry_index, &CSRF_KEY));
            let Some((producer_index, path)) = found else {
                debug!(
                    entry = %self.entries[entry_index].id(),
                    key = ?param.key,
                    "csrf value not found in any earlier response"
                );
                continue;
            };

            let producer = self.materialize(producer_index);
            let producer_id = self.drafts[producer].id.clone();
            debug!(
                entry = %self.entries[entry_index].id(),
                producer = %producer_id,
                key = ?param.key,
                "csrf value traced"
            );
            self.drafts[draft].apply(&param.location, ComputedValue::request(producer_id, path));
            self.trace_producers(producer, depth + 1);
        }
    }

    /// Newest strictly-earlier entry whose response contains a leaf matching `needle`.
    fn find_producer(
        &self,
        before: usize,
        needle: Needle<'_>,
    ) -> Option<(usize, ResponseBodyPath)> {
        (0..before).rev().find_map(|i| {
            let response = self.entries[i].response.as_ref()?;
            object_contains(response, needle).map(|path| (i, path))
        })
    }

    /// Newest strictly-earlier entry whose response has a leaf under a key matching `key`.
    fn find_producer_by_key(&self, before: usize, key: &Regex) -> Option<(usize, ResponseBodyPath)> {
        (0..before).rev().find_map(|i| {
            let response = self.entries[i].response.as_ref()?;
            object_contains_key(response, key).map(|(path, _)| (i, path))
        })
    }
}
