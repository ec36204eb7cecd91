//! # Schema
//!
//! Static description of the node types a document may hold.
//!
//! Node types are plain data: a capability tag ([`NodeKind`]) plus a
//! property list. Behavior that differs per kind (which property holds text,
//! whether a node is an annotation, how it fragments) is dispatched by
//! matching on the tag rather than through a type hierarchy.

use crate::error::{DocumentError, DocumentResult};
use crate::node::{DocumentNode, NodeData};
use crate::value::Value;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Property names every node carries implicitly.
pub const RESERVED_PROPERTIES: [&str; 2] = ["id", "type"];

/// What a property holds
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyKind {
    /// Any plain value (string, number, bool)
    Value,
    /// Characters addressed by coordinates
    Text,
    /// A single node id
    Reference { targets: Vec<String>, owned: bool },
    /// An ordered list of node ids
    ReferenceArray { targets: Vec<String>, owned: bool },
    /// An annotation endpoint
    Coordinate,
    /// A property path (e.g. the container an annotation lives in)
    Path,
}

impl PropertyKind {
    pub fn is_owned(&self) -> bool {
        matches!(
            self,
            PropertyKind::Reference { owned: true, .. } | PropertyKind::ReferenceArray { owned: true, .. }
        )
    }

    pub fn is_reference(&self) -> bool {
        matches!(
            self,
            PropertyKind::Reference { .. } | PropertyKind::ReferenceArray { .. }
        )
    }

    pub fn targets(&self) -> &[String] {
        match self {
            PropertyKind::Reference { targets, .. } | PropertyKind::ReferenceArray { targets, .. } => targets,
            _ => &[],
        }
    }

    /// Whether `value` has the right shape for this kind
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (PropertyKind::Value, Value::Strings(_) | Value::Coordinate(_)) => false,
            (PropertyKind::Value, _) => true,
            (PropertyKind::Text, Value::String(_)) => true,
            (PropertyKind::Reference { .. }, Value::String(_) | Value::Null) => true,
            (PropertyKind::ReferenceArray { .. }, Value::Strings(_)) => true,
            (PropertyKind::Coordinate, Value::Coordinate(_)) => true,
            (PropertyKind::Path, Value::Strings(_)) => true,
            _ => false,
        }
    }

    fn empty_value(&self) -> Option<Value> {
        match self {
            PropertyKind::Text => Some(Value::String(String::new())),
            PropertyKind::Reference { .. } => Some(Value::Null),
            PropertyKind::ReferenceArray { .. } => Some(Value::Strings(Vec::new())),
            _ => None,
        }
    }
}

/// A declared property of a node type
#[derive(Debug, Clone, PartialEq)]
pub struct PropertySpec {
    pub name: String,
    pub kind: PropertyKind,
    pub optional: bool,
    pub default: Option<Value>,
}

impl PropertySpec {
    pub fn new(name: impl Into<String>, kind: PropertyKind) -> Self {
        Self {
            name: name.into(),
            kind,
            optional: false,
            default: None,
        }
    }

    pub fn value(name: impl Into<String>) -> Self {
        Self::new(name, PropertyKind::Value)
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, PropertyKind::Text)
    }

    /// Owned single child
    pub fn child(name: impl Into<String>, targets: &[&str]) -> Self {
        Self::new(
            name,
            PropertyKind::Reference {
                targets: to_strings(targets),
                owned: true,
            },
        )
    }

    /// Owned, ordered children
    pub fn children(name: impl Into<String>, targets: &[&str]) -> Self {
        Self::new(
            name,
            PropertyKind::ReferenceArray {
                targets: to_strings(targets),
                owned: true,
            },
        )
    }

    /// Plain (non-owning) reference
    pub fn reference(name: impl Into<String>, targets: &[&str]) -> Self {
        Self::new(
            name,
            PropertyKind::Reference {
                targets: to_strings(targets),
                owned: false,
            },
        )
    }

    pub fn coordinate(name: impl Into<String>) -> Self {
        Self::new(name, PropertyKind::Coordinate)
    }

    pub fn path(name: impl Into<String>) -> Self {
        Self::new(name, PropertyKind::Path)
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Capability tag of a node type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeKind {
    /// Text block (paragraph, heading, ...)
    Text,
    /// Ordered body of blocks
    Container,
    /// Block owning list items
    List,
    /// Text-bearing item inside a list
    ListItem,
    /// Isolated block without editable text (image, figure)
    Block,
    PropertyAnnotation,
    ContainerAnnotation,
    /// Atomic one-character annotation
    InlineNode,
    /// Anything else
    Plain,
}

impl NodeKind {
    pub fn is_annotation(self) -> bool {
        matches!(
            self,
            NodeKind::PropertyAnnotation | NodeKind::ContainerAnnotation | NodeKind::InlineNode
        )
    }

    pub fn is_property_annotation(self) -> bool {
        matches!(self, NodeKind::PropertyAnnotation | NodeKind::InlineNode)
    }

    pub fn has_text(self) -> bool {
        matches!(self, NodeKind::Text | NodeKind::ListItem)
    }
}

/// Fragmentation preference, strongest first.
///
/// A stronger annotation is kept in one piece when it crosses a weaker one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Weight {
    MustNotSplit,
    ShouldNotSplit,
    Normal,
    Any,
}

impl Default for Weight {
    fn default() -> Self {
        Weight::Normal
    }
}

/// Description of one node type
#[derive(Debug, Clone, PartialEq)]
pub struct NodeType {
    name: String,
    kind: NodeKind,
    properties: Vec<PropertySpec>,
    text_property: Option<String>,
    weight: Weight,
    auto_expand_right: bool,
}

impl NodeType {
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            properties: Vec::new(),
            text_property: None,
            weight: Weight::Normal,
            auto_expand_right: false,
        }
    }

    /// Text block with a `content` property
    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, NodeKind::Text)
            .property(PropertySpec::text("content"))
            .text_property("content")
    }

    /// Container with an owned `nodes` array
    pub fn container(name: impl Into<String>) -> Self {
        Self::new(name, NodeKind::Container).property(PropertySpec::children("nodes", &[]))
    }

    /// List owning `items` of `item_type`
    pub fn list(name: impl Into<String>, item_type: &str) -> Self {
        Self::new(name, NodeKind::List)
            .property(PropertySpec::children("items", &[item_type]))
            .property(PropertySpec::value("ordered").with_default(false))
    }

    pub fn list_item(name: impl Into<String>) -> Self {
        Self::new(name, NodeKind::ListItem)
            .property(PropertySpec::text("content"))
            .property(PropertySpec::value("level").with_default(1))
            .text_property("content")
    }

    pub fn property_annotation(name: impl Into<String>) -> Self {
        Self::new(name, NodeKind::PropertyAnnotation)
            .property(PropertySpec::coordinate("start"))
            .property(PropertySpec::coordinate("end"))
    }

    pub fn container_annotation(name: impl Into<String>) -> Self {
        Self::new(name, NodeKind::ContainerAnnotation)
            .property(PropertySpec::coordinate("start"))
            .property(PropertySpec::coordinate("end"))
            .property(PropertySpec::path("container_path"))
    }

    /// One-character atomic annotation; never splits
    pub fn inline_node(name: impl Into<String>) -> Self {
        Self::new(name, NodeKind::InlineNode)
            .property(PropertySpec::coordinate("start"))
            .property(PropertySpec::coordinate("end"))
            .weight(Weight::MustNotSplit)
    }

    pub fn property(mut self, spec: PropertySpec) -> Self {
        self.properties.retain(|p| p.name != spec.name);
        self.properties.push(spec);
        self
    }

    pub fn text_property(mut self, name: impl Into<String>) -> Self {
        self.text_property = Some(name.into());
        self
    }

    pub fn weight(mut self, weight: Weight) -> Self {
        self.weight = weight;
        self
    }

    pub fn auto_expand_right(mut self, expand: bool) -> Self {
        self.auto_expand_right = expand;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn properties(&self) -> &[PropertySpec] {
        &self.properties
    }

    pub fn get_property(&self, name: &str) -> Option<&PropertySpec> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn text_property_name(&self) -> Option<&str> {
        self.text_property.as_deref()
    }

    pub fn fragmentation(&self) -> Weight {
        self.weight
    }

    pub fn expands_right(&self) -> bool {
        self.auto_expand_right
    }

    pub fn is_annotation(&self) -> bool {
        self.kind.is_annotation()
    }

    pub fn is_inline_node(&self) -> bool {
        self.kind == NodeKind::InlineNode
    }

    /// Properties holding owned references
    pub fn owned_properties(&self) -> impl Iterator<Item = &PropertySpec> {
        self.properties.iter().filter(|p| p.kind.is_owned())
    }

    /// Build a node from caller data: fills defaults, rejects unknown or
    /// ill-typed properties.
    pub fn instantiate(&self, id: String, data: &NodeData) -> DocumentResult<DocumentNode> {
        for key in data.properties.keys() {
            if self.get_property(key).is_none() {
                return Err(DocumentError::schema(format!(
                    "unknown property '{}' on node type '{}'",
                    key, self.name
                )));
            }
        }

        let mut properties = BTreeMap::new();
        for spec in &self.properties {
            let value = match data.properties.get(&spec.name) {
                Some(value) => value.clone(),
                None => match spec.default.clone().or_else(|| spec.kind.empty_value()) {
                    Some(value) => value,
                    None if spec.optional => Value::Null,
                    None => {
                        return Err(DocumentError::schema(format!(
                            "missing required property '{}' on node type '{}'",
                            spec.name, self.name
                        )))
                    }
                },
            };

            if !(value.is_null() && spec.optional) && !spec.kind.accepts(&value) {
                return Err(DocumentError::schema(format!(
                    "property '{}.{}' does not accept a {} value",
                    self.name,
                    spec.name,
                    value.kind_name()
                )));
            }
            properties.insert(spec.name.clone(), value);
        }

        let node = DocumentNode {
            id,
            node_type: self.name.clone(),
            properties,
        };

        if self.kind.is_property_annotation() {
            let (start, end) = match (node.start(), node.end()) {
                (Some(start), Some(end)) => (start, end),
                _ => return Err(DocumentError::schema("annotation without start/end")),
            };
            if start.path != end.path {
                return Err(DocumentError::invalid_selection(format!(
                    "property annotation '{}' must start and end on the same property",
                    node.id
                )));
            }
            if start.offset > end.offset {
                return Err(DocumentError::invalid_selection(format!(
                    "annotation '{}' ends before it starts",
                    node.id
                )));
            }
        }

        Ok(node)
    }
}

/// A closed set of node types
#[derive(Debug, Clone)]
pub struct Schema {
    name: String,
    types: IndexMap<String, NodeType>,
    default_text_type: String,
}

impl Schema {
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder {
            name: name.into(),
            types: Vec::new(),
            default_text_type: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self, type_name: &str) -> Option<&NodeType> {
        self.types.get(type_name)
    }

    pub fn get_strict(&self, type_name: &str) -> DocumentResult<&NodeType> {
        self.get(type_name)
            .ok_or_else(|| DocumentError::schema(format!("unknown node type '{}'", type_name)))
    }

    /// Type used when the engine has to create a fresh text block
    pub fn default_text_type(&self) -> &str {
        &self.default_text_type
    }

    pub fn types(&self) -> impl Iterator<Item = &NodeType> {
        self.types.values()
    }
}

pub struct SchemaBuilder {
    name: String,
    types: Vec<NodeType>,
    default_text_type: Option<String>,
}

impl SchemaBuilder {
    pub fn node(mut self, node_type: NodeType) -> Self {
        self.types.push(node_type);
        self
    }

    pub fn default_text_type(mut self, name: impl Into<String>) -> Self {
        self.default_text_type = Some(name.into());
        self
    }

    /// Validate and freeze the schema
    pub fn build(self) -> DocumentResult<Schema> {
        let mut types = IndexMap::new();
        for node_type in self.types {
            if types.contains_key(&node_type.name) {
                return Err(DocumentError::schema(format!(
                    "duplicate node type '{}'",
                    node_type.name
                )));
            }
            types.insert(node_type.name.clone(), node_type);
        }

        for node_type in types.values() {
            for spec in &node_type.properties {
                if RESERVED_PROPERTIES.contains(&spec.name.as_str()) {
                    return Err(DocumentError::schema(format!(
                        "node type '{}' redeclares reserved property '{}'",
                        node_type.name, spec.name
                    )));
                }
                for target in spec.kind.targets() {
                    if !types.contains_key(target) {
                        return Err(DocumentError::schema(format!(
                            "property '{}.{}' references unknown type '{}'",
                            node_type.name, spec.name, target
                        )));
                    }
                }
            }

            if let Some(text_prop) = &node_type.text_property {
                match node_type.get_property(text_prop) {
                    Some(spec) if spec.kind == PropertyKind::Text => {}
                    _ => {
                        return Err(DocumentError::schema(format!(
                            "text property '{}' of '{}' is not a text property",
                            text_prop, node_type.name
                        )))
                    }
                }
            } else if node_type.kind.has_text() {
                return Err(DocumentError::schema(format!(
                    "node type '{}' needs a text property",
                    node_type.name
                )));
            }
        }

        let default_text_type = match self.default_text_type {
            Some(name) => name,
            None => types
                .values()
                .find(|t| t.kind == NodeKind::Text)
                .map(|t| t.name.clone())
                .ok_or_else(|| DocumentError::schema("schema has no text node type"))?,
        };
        match types.get(&default_text_type) {
            Some(t) if t.kind == NodeKind::Text => {}
            _ => {
                return Err(DocumentError::schema(format!(
                    "default text type '{}' is not a text node type",
                    default_text_type
                )))
            }
        }

        Ok(Schema {
            name: self.name,
            types,
            default_text_type,
        })
    }
}
