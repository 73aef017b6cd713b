use super::computed::ComputedValue;
use super::path::format_path;
use super::template::Template;

/// Formats templates into human-readable text with `{{...}}` placeholders.
pub struct TemplateFormatter;

impl TemplateFormatter {
    /// `https://api.example.com/users/{{input.email}}` style rendering of an expression.
    pub fn format_value(value: &ComputedValue) -> String {
        match value {
            ComputedValue::Text { value } => value.clone(),
            ComputedValue::Input { id } => format!("{{{{input.{}}}}}", id),
            ComputedValue::Request(pointer) if pointer.path.is_empty() => {
                format!("{{{{{}}}}}", pointer.request_id)
            }
            ComputedValue::Request(pointer) => {
                format!("{{{{{}.{}}}}}", pointer.request_id, format_path(&pointer.path))
            }
            ComputedValue::Concat { children } => {
                children.iter().map(Self::format_value).collect()
            }
        }
    }

    /// Renders a template as compact JSON, with computed leaves shown as placeholder strings.
    pub fn format_template(template: &Template) -> String {
        Self::placeholder_json(template).to_string()
    }

    fn placeholder_json(template: &Template) -> serde_json::Value {
        use serde_json::Value;
        match template {
            Template::Null => Value::Null,
            Template::Bool(b) => Value::Bool(*b),
            Template::Number(n) => Value::Number(n.clone()),
            Template::String(s) => Value::String(s.clone()),
            Template::Array(items) => Value::Array(items.iter().map(Self::placeholder_json).collect()),
            Template::Object(fields) => Value::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), Self::placeholder_json(v)))
                    .collect(),
            ),
            Template::Computed(computed) => Value::String(Self::format_value(computed)),
        }
    }
}
