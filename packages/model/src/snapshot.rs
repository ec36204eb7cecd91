use crate::error::DocumentResult;
use crate::node::DocumentNode;
use serde::{Deserialize, Serialize};

/// Persisted form of a single node
pub type NodeSnapshot = DocumentNode;

/// Every node of a document in enumeration order, tagged with the schema
/// name it was written against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSnapshot {
    pub schema: String,
    #[serde(default)]
    pub nodes: Vec<NodeSnapshot>,
}

impl DocumentSnapshot {
    pub fn new(schema: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            nodes: Vec::new(),
        }
    }

    pub fn from_json(json: &str) -> DocumentResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> DocumentResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn get(&self, id: &str) -> Option<&NodeSnapshot> {
        self.nodes.iter().find(|n| n.id == id)
    }
}
