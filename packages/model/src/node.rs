use crate::path::{Coordinate, Path};
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A node as stored by the document. Also its snapshot form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentNode {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(flatten)]
    pub properties: BTreeMap<String, Value>,
}

impl DocumentNode {
    pub fn get(&self, property: &str) -> Option<&Value> {
        self.properties.get(property)
    }

    pub fn get_str(&self, property: &str) -> Option<&str> {
        self.get(property).and_then(Value::as_str)
    }

    pub fn get_strings(&self, property: &str) -> Option<&[String]> {
        self.get(property).and_then(Value::as_strings)
    }

    pub fn get_int(&self, property: &str) -> Option<i64> {
        self.get(property).and_then(Value::as_int)
    }

    pub fn path(&self, property: &str) -> Path {
        Path::new(self.id.clone(), property)
    }

    pub fn start(&self) -> Option<&Coordinate> {
        self.get("start").and_then(Value::as_coordinate)
    }

    pub fn end(&self) -> Option<&Coordinate> {
        self.get("end").and_then(Value::as_coordinate)
    }

    pub fn container_path(&self) -> Option<Path> {
        self.get("container_path").and_then(Value::as_path)
    }

    /// `true` for nodes carrying annotation endpoints
    pub fn is_anchored(&self) -> bool {
        self.start().is_some() && self.end().is_some()
    }
}

/// Caller-supplied data for `create`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(flatten)]
    pub properties: BTreeMap<String, Value>,
}

impl NodeData {
    pub fn new(node_type: impl Into<String>) -> Self {
        Self {
            id: None,
            node_type: node_type.into(),
            properties: BTreeMap::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with(mut self, property: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(property.into(), value.into());
        self
    }
}

impl From<&DocumentNode> for NodeData {
    fn from(node: &DocumentNode) -> Self {
        Self {
            id: Some(node.id.clone()),
            node_type: node.node_type.clone(),
            properties: node.properties.clone(),
        }
    }
}

impl From<DocumentNode> for NodeData {
    fn from(node: DocumentNode) -> Self {
        Self {
            id: Some(node.id),
            node_type: node.node_type,
            properties: node.properties,
        }
    }
}
