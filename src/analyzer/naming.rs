use crate::url::ParsedUrl;
use crate::value::{ComputedValue, PathKey};

/// A readable name such as `GET api.example.com/users/:email`.
///
/// Computed parts of the URL become `:name` placeholders. When the skeleton is not an
/// absolute URL the raw skeleton text is used as is.
pub fn request_name(method: &str, url: &ComputedValue) -> String {
    let skeleton = skeleton(url);
    let parsed = ParsedUrl::parse(&skeleton);
    match (&parsed.authority, parsed.is_absolute()) {
        (Some(authority), true) => format!("{} {}{}", method, authority, parsed.path),
        _ => format!("{} {}", method, skeleton),
    }
}

fn skeleton(url: &ComputedValue) -> String {
    match url {
        ComputedValue::Text { value } => value.clone(),
        ComputedValue::Input { id } => format!(":{}", id),
        ComputedValue::Request(pointer) => match pointer.path.last() {
            Some(PathKey::Key(key)) => format!(":{}", key),
            _ => ":ref".to_string(),
        },
        ComputedValue::Concat { children } => children.iter().map(skeleton).collect(),
    }
}
