use super::datasource::DataSource;
use crate::error::{GraphError, ModelError};
use crate::graph::RequestGraph;
use std::fs;

impl DataSource {
    /// Checks that every reference names a request in this data source and that the
    /// reference graph is acyclic.
    pub fn validate(&self) -> Result<(), ModelError> {
        let graph = RequestGraph::build(&self.requests)?;
        for output in &self.outputs {
            if graph.position(&output.value.request_id).is_none() {
                return Err(GraphError::UnknownRequest {
                    referrer: output.id.clone(),
                    referenced: output.value.request_id.clone(),
                }
                .into());
            }
        }
        graph.full_order()?;
        Ok(())
    }

    /// Serializes to the persisted JSON form.
    pub fn to_json(&self) -> Result<String, ModelError> {
        serde_json::to_string_pretty(self).map_err(|e| ModelError::JsonParseError(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        serde_json::from_str(json).map_err(|e| ModelError::JsonParseError(e.to_string()))
    }

    /// Saves the data source to a JSON file.
    pub fn save(&self, path: &str) -> Result<(), ModelError> {
        let json = self.to_json()?;
        fs::write(path, json).map_err(|e| ModelError::Io {
            path: path.to_string(),
            message: format!("Could not write file: {}", e),
        })
    }

    /// Loads a data source from a JSON file.
    pub fn from_file(path: &str) -> Result<Self, ModelError> {
        let content = fs::read_to_string(path).map_err(|e| ModelError::Io {
            path: path.to_string(),
            message: format!("Could not read file: {}", e),
        })?;
        Self::from_json(&content)
    }
}
