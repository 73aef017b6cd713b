use crate::value::{ComputedValue, ResponsePointer, Template};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Fetch credentials mode of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Credentials {
    Omit,
    #[default]
    SameOrigin,
    Include,
}

/// A single templated HTTP request inside a data source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSourceRequest {
    pub id: String,
    pub name: String,
    pub method: String,
    #[serde(default)]
    pub credentials: Credentials,
    pub url: ComputedValue,
    #[serde(default = "Template::empty_object")]
    pub query_params: Template,
    #[serde(default)]
    pub headers: IndexMap<String, ComputedValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Template>,
}

impl DataSourceRequest {
    /// Ids of every request this one reads from, across url, headers, query params and body.
    pub fn references(&self) -> BTreeSet<String> {
        let mut refs = BTreeSet::new();
        self.url.collect_references(&mut refs);
        for value in self.headers.values() {
            value.collect_references(&mut refs);
        }
        self.query_params.collect_references(&mut refs);
        if let Some(body) = &self.body {
            body.collect_references(&mut refs);
        }
        refs
    }
}

/// A named, externally consumable value read from a request's response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSourceOutput {
    pub id: String,
    pub name: String,
    pub value: ResponsePointer,
}

/// A graph of templated requests plus named outputs.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSource {
    pub id: String,
    pub name: String,
    pub requests: Vec<DataSourceRequest>,
    #[serde(default)]
    pub outputs: Vec<DataSourceOutput>,
}

impl DataSource {
    pub fn request(&self, id: &str) -> Option<&DataSourceRequest> {
        self.requests.iter().find(|r| r.id == id)
    }
}
