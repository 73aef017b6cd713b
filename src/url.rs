//! Lightweight URL splitting for recorded and templated request URLs.
//!
//! Recorded URLs may be absolute (`https://host/path?q`) or relative (`/path?q`), so
//! parsing never fails: anything without a `scheme://` prefix is treated as a path.

use indexmap::IndexMap;
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedUrl {
    pub scheme: Option<String>,
    pub authority: Option<String>,
    pub path: String,
    pub query: Option<String>,
    pub fragment: Option<String>,
}

impl ParsedUrl {
    pub fn parse(raw: &str) -> Self {
        let (rest, fragment) = match raw.split_once('#') {
            Some((rest, fragment)) => (rest, Some(fragment.to_string())),
            None => (raw, None),
        };
        let (rest, query) = match rest.split_once('?') {
            Some((rest, query)) => (rest, Some(query.to_string())),
            None => (rest, None),
        };
        let (scheme, authority, path) = match rest.split_once("://") {
            Some((scheme, after)) if is_scheme(scheme) => {
                let (authority, path) = match after.find('/') {
                    Some(slash) => after.split_at(slash),
                    None => (after, ""),
                };
                (
                    Some(scheme.to_string()),
                    Some(authority.to_string()),
                    path.to_string(),
                )
            }
            _ => (None, None, rest.to_string()),
        };
        Self {
            scheme,
            authority,
            path,
            query,
            fragment,
        }
    }

    pub fn is_absolute(&self) -> bool {
        self.scheme.is_some()
    }

    /// `scheme://authority`, or an empty string for relative URLs.
    pub fn origin(&self) -> String {
        match (&self.scheme, &self.authority) {
            (Some(scheme), Some(authority)) => format!("{}://{}", scheme, authority),
            _ => String::new(),
        }
    }

    /// The URL without its query string and fragment.
    pub fn base(&self) -> String {
        format!("{}{}", self.origin(), self.path)
    }

    /// Raw path pieces split on `/`, empty pieces included, so that
    /// `origin + pieces.join("/")` reproduces the path exactly.
    pub fn raw_segments(&self) -> Vec<String> {
        self.path.split('/').map(str::to_string).collect()
    }

    /// Decoded, non-empty path segments.
    pub fn path_segments(&self) -> Vec<String> {
        self.path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(decode_path_segment)
            .collect()
    }

    /// Decoded query pairs in their original order.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        self.query.as_deref().map(parse_query_pairs).unwrap_or_default()
    }

    /// The query string as a JSON object in first-appearance key order.
    /// Repeated keys collect into arrays.
    pub fn query_object(&self) -> Value {
        let mut grouped: IndexMap<String, Vec<String>> = IndexMap::new();
        for (key, value) in self.query_pairs() {
            grouped.entry(key).or_default().push(value);
        }
        let object: Map<String, Value> = grouped
            .into_iter()
            .map(|(key, mut values)| {
                let value = if values.len() == 1 {
                    Value::String(values.remove(0))
                } else {
                    Value::Array(values.into_iter().map(Value::String).collect())
                };
                (key, value)
            })
            .collect();
        Value::Object(object)
    }
}

fn is_scheme(candidate: &str) -> bool {
    !candidate.is_empty()
        && candidate
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

pub fn parse_query_pairs(query: &str) -> Vec<(String, String)> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) => (percent_decode(key), percent_decode(value)),
            None => (percent_decode(pair), String::new()),
        })
        .collect()
}

/// Encodes a rendered query object. Arrays repeat their key; nested objects are
/// written as JSON text. Non-object values produce an empty string.
pub fn encode_query(params: &Value) -> String {
    let Value::Object(fields) = params else {
        return String::new();
    };
    let mut pairs = Vec::new();
    for (key, value) in fields {
        match value {
            Value::Array(items) => {
                for item in items {
                    pairs.push(format!("{}={}", percent_encode(key), percent_encode(&scalar(item))));
                }
            }
            other => pairs.push(format!("{}={}", percent_encode(key), percent_encode(&scalar(other)))),
        }
    }
    pairs.join("&")
}

/// Appends an encoded query string to `base`, respecting an existing `?`.
pub fn append_query(base: &str, query: &str) -> String {
    if query.is_empty() {
        base.to_string()
    } else if base.contains('?') {
        format!("{}&{}", base, query)
    } else {
        format!("{}?{}", base, query)
    }
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

pub fn percent_encode(input: &str) -> String {
    encode(input, |byte| byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'.' | b'_' | b'~'))
}

/// Encodes a value for use as a single path segment. Besides unreserved characters,
/// sub-delimiters, `:` and `@` stay literal; `/`, `?`, `#`, `%` and spaces are escaped.
pub fn encode_path_segment(input: &str) -> String {
    encode(input, |byte| {
        byte.is_ascii_alphanumeric()
            || matches!(
                byte,
                b'-' | b'.' | b'_' | b'~' | b'!' | b'$' | b'&' | b'\'' | b'(' | b')' | b'*' | b'+'
                    | b',' | b';' | b'=' | b':' | b'@'
            )
    })
}

fn encode(input: &str, literal: impl Fn(u8) -> bool) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        if literal(byte) {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{:02X}", byte));
        }
    }
    out
}

/// Decodes `%XX` escapes and `+` as space. Malformed escapes are kept verbatim.
pub fn percent_decode(input: &str) -> String {
    decode(input, true)
}

/// Decodes `%XX` escapes in a path segment; `+` stays literal.
pub fn decode_path_segment(input: &str) -> String {
    decode(input, false)
}

fn decode(input: &str, plus_as_space: bool) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' if i + 2 < bytes.len() => match (hex_digit(bytes[i + 1]), hex_digit(bytes[i + 2])) {
                (Some(hi), Some(lo)) => {
                    out.push(hi << 4 | lo);
                    i += 3;
                    continue;
                }
                _ => out.push(b'%'),
            },
            b'+' if plus_as_space => out.push(b' '),
            other => out.push(other),
        }
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_digit(byte: u8) -> Option<u8> {
    (byte as char).to_digit(16).map(|d| d as u8)
}
