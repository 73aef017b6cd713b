//! Search primitives over arbitrary JSON documents.

use crate::value::{PathKey, ResponseBodyPath};
use ahash::AHashMap;
use regex::Regex;
use serde_json::Value;

/// What a leaf value is compared against.
#[derive(Debug, Clone, Copy)]
pub enum Needle<'a> {
    Exact(&'a str),
    Pattern(&'a Regex),
}

impl Needle<'_> {
    pub fn matches(&self, candidate: &str) -> bool {
        match self {
            Needle::Exact(expected) => candidate == *expected,
            Needle::Pattern(pattern) => pattern.is_match(candidate),
        }
    }
}

/// String form of a string or number leaf. Other values are not leaves.
pub fn leaf_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Every string and number leaf with its path, in document order.
pub fn leaves(json: &Value) -> Vec<(ResponseBodyPath, String)> {
    let mut found = Vec::new();
    collect_leaves(json, &mut Vec::new(), &mut found);
    found
}

fn collect_leaves(
    json: &Value,
    path: &mut ResponseBodyPath,
    found: &mut Vec<(ResponseBodyPath, String)>,
) {
    match json {
        Value::Object(fields) => {
            for (key, field) in fields {
                path.push(PathKey::Key(key.clone()));
                collect_leaves(field, path, found);
                path.pop();
            }
        }
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                path.push(PathKey::Index(i));
                collect_leaves(item, path, found);
                path.pop();
            }
        }
        other => {
            if let Some(text) = leaf_text(other) {
                found.push((path.clone(), text));
            }
        }
    }
}

/// Path of the first leaf whose value matches `needle`, at any depth.
pub fn object_contains(json: &Value, needle: Needle<'_>) -> Option<ResponseBodyPath> {
    leaves(json)
        .into_iter()
        .find(|(_, text)| needle.matches(text))
        .map(|(path, _)| path)
}

/// Paths of every leaf whose value equals `literal`.
pub fn find_value_paths(json: &Value, literal: &str) -> Vec<ResponseBodyPath> {
    leaves(json)
        .into_iter()
        .filter(|(_, text)| text == literal)
        .map(|(path, _)| path)
        .collect()
}

/// First leaf stored under a key matching `key_pattern`, with its path and value.
pub fn object_contains_key(
    json: &Value,
    key_pattern: &Regex,
) -> Option<(ResponseBodyPath, String)> {
    leaves(json).into_iter().find(|(path, _)| {
        matches!(path.last(), Some(PathKey::Key(key)) if key_pattern.is_match(key))
    })
}

/// Counts how often each of `candidates` appears as a leaf value.
pub fn search_obj_for_matches(json: &Value, candidates: &[String]) -> FrequencyCounter {
    let mut counter = FrequencyCounter::default();
    for (_, text) in leaves(json) {
        if candidates.iter().any(|c| *c == text) {
            counter.add(&text);
        }
    }
    counter
}

/// Occurrence counter that remembers the order in which values were first seen.
///
/// Ties in `most_frequent` go to the value registered first.
#[derive(Debug, Clone, Default)]
pub struct FrequencyCounter {
    counts: Vec<(String, usize)>,
    positions: AHashMap<String, usize>,
}

impl FrequencyCounter {
    pub fn add(&mut self, value: &str) {
        match self.positions.get(value) {
            Some(&pos) => self.counts[pos].1 += 1,
            None => {
                self.positions.insert(value.to_string(), self.counts.len());
                self.counts.push((value.to_string(), 1));
            }
        }
    }

    pub fn count(&self, value: &str) -> usize {
        self.positions
            .get(value)
            .map(|&pos| self.counts[pos].1)
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn most_frequent(&self) -> Option<(&str, usize)> {
        let mut best: Option<(&str, usize)> = None;
        for (value, count) in &self.counts {
            if best.is_none_or(|(_, best_count)| *count > best_count) {
                best = Some((value.as_str(), *count));
            }
        }
        best
    }
}
