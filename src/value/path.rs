use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// A single step into a JSON document: an object key or an array index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathKey {
    Index(usize),
    Key(String),
}

/// Ordered keys addressing a location inside a JSON value.
pub type ResponseBodyPath = Vec<PathKey>;

impl From<&str> for PathKey {
    fn from(key: &str) -> Self {
        PathKey::Key(key.to_string())
    }
}

impl From<String> for PathKey {
    fn from(key: String) -> Self {
        PathKey::Key(key)
    }
}

impl From<usize> for PathKey {
    fn from(index: usize) -> Self {
        PathKey::Index(index)
    }
}

impl fmt::Display for PathKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathKey::Index(i) => write!(f, "{}", i),
            PathKey::Key(k) => write!(f, "{}", k),
        }
    }
}

/// Builds a `ResponseBodyPath` from a mix of string keys and numeric indices.
///
/// ```
/// use reqgraph::response_path;
/// use reqgraph::value::PathKey;
///
/// let path = response_path!["orders", 0, "id"];
/// assert_eq!(path[1], PathKey::Index(0));
/// ```
#[macro_export]
macro_rules! response_path {
    ($($key:expr),* $(,)?) => {
        vec![$($crate::value::PathKey::from($key)),*]
    };
}

/// Walks `path` into `value`.
///
/// Returns `None` as soon as a step cannot be taken, including when a scalar is
/// reached before the path is exhausted. An empty path yields `value` itself.
pub fn resolve_path<'a>(value: &'a Value, path: &[PathKey]) -> Option<&'a Value> {
    path.iter().try_fold(value, |current, key| match (current, key) {
        (Value::Object(map), PathKey::Key(k)) => map.get(k),
        (Value::Object(map), PathKey::Index(i)) => map.get(&i.to_string()),
        (Value::Array(items), PathKey::Index(i)) => items.get(*i),
        (Value::Array(items), PathKey::Key(k)) => {
            k.parse::<usize>().ok().and_then(|i| items.get(i))
        }
        _ => None,
    })
}

/// Joins a path with dots for log and display output.
pub fn format_path(path: &[PathKey]) -> String {
    itertools::join(path.iter(), ".")
}
