use super::computed::{ComputedValue, Inputs, ResponsePointer};
use super::path::PathKey;
use crate::error::EvaluationError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Number, Value};
use indexmap::IndexMap;
use std::collections::BTreeSet;

/// Object key that marks an embedded `ComputedValue` in persisted JSON.
pub const COMPUTED_MARKER: &str = "$reqgraph:computed";

/// A JSON tree in which any node may be replaced by a `ComputedValue`.
///
/// Persisted as plain JSON, with computed leaves written as
/// `{"$reqgraph:computed": <ComputedValue>}`. Object fields keep their document order.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Template {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<Template>),
    Object(IndexMap<String, Template>),
    Computed(ComputedValue),
}

impl Template {
    pub fn empty_object() -> Self {
        Template::Object(IndexMap::new())
    }

    /// Replaces every computed leaf with its evaluated value.
    ///
    /// Undefined leaves are dropped from objects and become `null` inside arrays.
    /// A computed root that is undefined yields `Ok(None)`.
    pub fn render<L>(&self, inputs: &Inputs, lookup: &L) -> Result<Option<Value>, EvaluationError>
    where
        L: Fn(&ResponsePointer) -> Result<Option<Value>, EvaluationError>,
    {
        Ok(Some(match self {
            Template::Null => Value::Null,
            Template::Bool(b) => Value::Bool(*b),
            Template::Number(n) => Value::Number(n.clone()),
            Template::String(s) => Value::String(s.clone()),
            Template::Array(items) => {
                let mut rendered = Vec::with_capacity(items.len());
                for item in items {
                    rendered.push(item.render(inputs, lookup)?.unwrap_or(Value::Null));
                }
                Value::Array(rendered)
            }
            Template::Object(fields) => {
                let mut rendered = Map::new();
                for (key, field) in fields {
                    if let Some(value) = field.render(inputs, lookup)? {
                        rendered.insert(key.clone(), value);
                    }
                }
                Value::Object(rendered)
            }
            Template::Computed(computed) => return computed.evaluate(inputs, lookup),
        }))
    }

    /// Collects the ids of every request referenced anywhere in the tree.
    pub fn collect_references(&self, refs: &mut BTreeSet<String>) {
        match self {
            Template::Array(items) => items.iter().for_each(|i| i.collect_references(refs)),
            Template::Object(fields) => fields.values().for_each(|f| f.collect_references(refs)),
            Template::Computed(computed) => computed.collect_references(refs),
            Template::Null | Template::Bool(_) | Template::Number(_) | Template::String(_) => {}
        }
    }

    /// Number of computed leaves in the tree.
    pub fn computed_count(&self) -> usize {
        match self {
            Template::Array(items) => items.iter().map(Template::computed_count).sum(),
            Template::Object(fields) => fields.values().map(Template::computed_count).sum(),
            Template::Computed(_) => 1,
            _ => 0,
        }
    }

    pub fn get(&self, path: &[PathKey]) -> Option<&Template> {
        path.iter().try_fold(self, |current, key| match (current, key) {
            (Template::Object(fields), PathKey::Key(k)) => fields.get(k),
            (Template::Object(fields), PathKey::Index(i)) => fields.get(&i.to_string()),
            (Template::Array(items), PathKey::Index(i)) => items.get(*i),
            _ => None,
        })
    }

    /// Overwrites the node at `path`. Returns `false` when the path does not exist.
    pub fn set_at(&mut self, path: &[PathKey], replacement: Template) -> bool {
        let Some((first, rest)) = path.split_first() else {
            *self = replacement;
            return true;
        };
        let child = match (self, first) {
            (Template::Object(fields), PathKey::Key(k)) => fields.get_mut(k),
            (Template::Object(fields), PathKey::Index(i)) => fields.get_mut(&i.to_string()),
            (Template::Array(items), PathKey::Index(i)) => items.get_mut(*i),
            _ => None,
        };
        match child {
            Some(child) => child.set_at(rest, replacement),
            None => false,
        }
    }

    /// Converts to persisted JSON, writing computed leaves with the marker key.
    pub fn to_marked_json(&self) -> Result<Value, serde_json::Error> {
        Ok(match self {
            Template::Null => Value::Null,
            Template::Bool(b) => Value::Bool(*b),
            Template::Number(n) => Value::Number(n.clone()),
            Template::String(s) => Value::String(s.clone()),
            Template::Array(items) => Value::Array(
                items
                    .iter()
                    .map(Self::to_marked_json)
                    .collect::<Result<_, _>>()?,
            ),
            Template::Object(fields) => {
                let mut object = Map::with_capacity(fields.len());
                for (key, field) in fields {
                    object.insert(key.clone(), field.to_marked_json()?);
                }
                Value::Object(object)
            }
            Template::Computed(computed) => {
                let mut marker = Map::new();
                marker.insert(COMPUTED_MARKER.to_string(), serde_json::to_value(computed)?);
                Value::Object(marker)
            }
        })
    }
}

impl From<Value> for Template {
    /// Reads plain or persisted JSON. A single-key object under the marker key whose
    /// payload is a valid `ComputedValue` becomes `Template::Computed`.
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Template::Null,
            Value::Bool(b) => Template::Bool(b),
            Value::Number(n) => Template::Number(n),
            Value::String(s) => Template::String(s),
            Value::Array(items) => Template::Array(items.into_iter().map(Template::from).collect()),
            Value::Object(fields) => {
                if fields.len() == 1 {
                    if let Some(payload) = fields.get(COMPUTED_MARKER) {
                        if let Ok(computed) = ComputedValue::deserialize(payload) {
                            return Template::Computed(computed);
                        }
                    }
                }
                Template::Object(
                    fields
                        .into_iter()
                        .map(|(key, field)| (key, Template::from(field)))
                        .collect(),
                )
            }
        }
    }
}

impl From<ComputedValue> for Template {
    fn from(computed: ComputedValue) -> Self {
        Template::Computed(computed)
    }
}

impl From<&str> for Template {
    fn from(s: &str) -> Self {
        Template::String(s.to_string())
    }
}

impl Serialize for Template {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_marked_json()
            .map_err(serde::ser::Error::custom)?
            .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Template {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Template::from)
    }
}
