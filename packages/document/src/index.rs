//! # Document indices
//!
//! Derived state kept in step with every mutation.
//!
//! An index sees each node it selects exactly once per mutation, in the
//! order operations are applied. When attached it is reset and then warmed
//! up with every selected node in enumeration order.

use folio_model::{DocumentNode, NodeKind, NodeType, Path, Value};
use indexmap::{IndexMap, IndexSet};
use std::any::Any;
use std::collections::HashMap;

pub const TYPE_INDEX: &str = "type";
pub const ANNOTATION_INDEX: &str = "annotations";
pub const CONTAINER_ANNOTATION_INDEX: &str = "container-annotations";
pub const PARENT_INDEX: &str = "parents";

pub trait DocumentIndex: Any {
    /// Whether the index tracks this node
    fn select(&self, node: &DocumentNode, node_type: &NodeType) -> bool;

    fn reset(&mut self);

    fn create(&mut self, node: &DocumentNode, node_type: &NodeType);

    fn delete(&mut self, node: &DocumentNode, node_type: &NodeType);

    /// Called after `path` changed from `old` to `new`
    fn update(&mut self, node: &DocumentNode, node_type: &NodeType, path: &Path, old: &Value, new: &Value);

    fn as_any(&self) -> &dyn Any;
}

/// Node ids grouped by type name
#[derive(Debug, Default)]
pub struct TypeIndex {
    by_type: HashMap<String, IndexSet<String>>,
}

impl TypeIndex {
    pub fn ids(&self, type_name: &str) -> impl Iterator<Item = &str> {
        self.by_type
            .get(type_name)
            .into_iter()
            .flat_map(|ids| ids.iter().map(String::as_str))
    }

    pub fn count(&self, type_name: &str) -> usize {
        self.by_type.get(type_name).map_or(0, IndexSet::len)
    }
}

impl DocumentIndex for TypeIndex {
    fn select(&self, _node: &DocumentNode, _node_type: &NodeType) -> bool {
        true
    }

    fn reset(&mut self) {
        self.by_type.clear();
    }

    fn create(&mut self, node: &DocumentNode, _node_type: &NodeType) {
        self.by_type
            .entry(node.node_type.clone())
            .or_default()
            .insert(node.id.clone());
    }

    fn delete(&mut self, node: &DocumentNode, _node_type: &NodeType) {
        if let Some(ids) = self.by_type.get_mut(&node.node_type) {
            ids.shift_remove(&node.id);
        }
    }

    fn update(&mut self, _: &DocumentNode, _: &NodeType, _: &Path, _: &Value, _: &Value) {}

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Property annotations grouped by the text property they annotate
#[derive(Debug, Default)]
pub struct PropertyAnnotationIndex {
    by_path: HashMap<Path, IndexSet<String>>,
}

impl PropertyAnnotationIndex {
    pub fn ids(&self, path: &Path) -> Vec<String> {
        self.by_path
            .get(path)
            .map(|ids| ids.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn add(&mut self, path: &Path, id: &str) {
        self.by_path.entry(path.clone()).or_default().insert(id.to_string());
    }

    fn remove(&mut self, path: &Path, id: &str) {
        if let Some(ids) = self.by_path.get_mut(path) {
            ids.shift_remove(id);
            if ids.is_empty() {
                self.by_path.remove(path);
            }
        }
    }
}

impl DocumentIndex for PropertyAnnotationIndex {
    fn select(&self, _node: &DocumentNode, node_type: &NodeType) -> bool {
        node_type.kind().is_property_annotation()
    }

    fn reset(&mut self) {
        self.by_path.clear();
    }

    fn create(&mut self, node: &DocumentNode, _node_type: &NodeType) {
        if let Some(start) = node.start() {
            self.add(&start.path, &node.id);
        }
    }

    fn delete(&mut self, node: &DocumentNode, _node_type: &NodeType) {
        if let Some(start) = node.start() {
            self.remove(&start.path, &node.id);
        }
    }

    fn update(&mut self, node: &DocumentNode, _: &NodeType, path: &Path, old: &Value, new: &Value) {
        if path.property() != Some("start") {
            return;
        }
        if let (Some(old), Some(new)) = (old.as_coordinate(), new.as_coordinate()) {
            if old.path != new.path {
                self.remove(&old.path, &node.id);
                self.add(&new.path, &node.id);
            }
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Container annotations by container, and by the nodes their ends sit in
#[derive(Debug, Default)]
pub struct ContainerAnnotationIndex {
    by_container: HashMap<Path, IndexSet<String>>,
    by_anchor: HashMap<String, IndexSet<String>>,
}

impl ContainerAnnotationIndex {
    pub fn ids(&self, container_path: &Path) -> Vec<String> {
        self.by_container
            .get(container_path)
            .map(|ids| ids.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Container paths that currently hold annotations
    pub fn containers(&self) -> impl Iterator<Item = &Path> {
        self.by_container.keys()
    }

    /// Annotations with an endpoint inside `node_id`
    pub fn anchored_at(&self, node_id: &str) -> Vec<String> {
        self.by_anchor
            .get(node_id)
            .map(|ids| ids.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn anchors(node: &DocumentNode) -> Vec<String> {
        let mut anchors: Vec<String> = Vec::new();
        for coordinate in [node.start(), node.end()].into_iter().flatten() {
            let id = coordinate.node_id().to_string();
            if !anchors.contains(&id) {
                anchors.push(id);
            }
        }
        anchors
    }

    fn add_anchor(&mut self, anchor: &str, id: &str) {
        self.by_anchor.entry(anchor.to_string()).or_default().insert(id.to_string());
    }

    fn remove_from_container(&mut self, container: &Path, id: &str) {
        if let Some(ids) = self.by_container.get_mut(container) {
            ids.shift_remove(id);
            if ids.is_empty() {
                self.by_container.remove(container);
            }
        }
    }

    fn remove_anchor(&mut self, anchor: &str, id: &str) {
        if let Some(ids) = self.by_anchor.get_mut(anchor) {
            ids.shift_remove(id);
            if ids.is_empty() {
                self.by_anchor.remove(anchor);
            }
        }
    }
}

impl DocumentIndex for ContainerAnnotationIndex {
    fn select(&self, _node: &DocumentNode, node_type: &NodeType) -> bool {
        node_type.kind() == NodeKind::ContainerAnnotation
    }

    fn reset(&mut self) {
        self.by_container.clear();
        self.by_anchor.clear();
    }

    fn create(&mut self, node: &DocumentNode, _node_type: &NodeType) {
        if let Some(container) = node.container_path() {
            self.by_container.entry(container).or_default().insert(node.id.clone());
        }
        for anchor in Self::anchors(node) {
            self.add_anchor(&anchor, &node.id);
        }
    }

    fn delete(&mut self, node: &DocumentNode, _node_type: &NodeType) {
        if let Some(container) = node.container_path() {
            self.remove_from_container(&container, &node.id);
        }
        for anchor in Self::anchors(node) {
            self.remove_anchor(&anchor, &node.id);
        }
    }

    fn update(&mut self, node: &DocumentNode, _: &NodeType, path: &Path, old: &Value, new: &Value) {
        match path.property() {
            Some("start") | Some("end") => {
                // `node` already carries the new endpoint; rebuild its anchors
                let other = if path.property() == Some("start") { node.end() } else { node.start() };
                if let Some(old) = old.as_coordinate() {
                    if other.map(|c| c.node_id()) != Some(old.node_id()) {
                        self.remove_anchor(old.node_id(), &node.id);
                    }
                }
                if let Some(new) = new.as_coordinate() {
                    self.add_anchor(new.node_id(), &node.id);
                }
            }
            Some("container_path") => {
                if let Some(old) = old.as_path() {
                    self.remove_from_container(&old, &node.id);
                }
                if let Some(new) = new.as_path() {
                    self.by_container.entry(new).or_default().insert(node.id.clone());
                }
            }
            _ => {}
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Owner of every owned child: child id -> (owner id, property)
#[derive(Debug, Default)]
pub struct ParentIndex {
    owners: HashMap<String, (String, String)>,
}

impl ParentIndex {
    pub fn owner_of(&self, child_id: &str) -> Option<(&str, &str)> {
        self.owners
            .get(child_id)
            .map(|(owner, property)| (owner.as_str(), property.as_str()))
    }

    fn owned_ids(value: &Value) -> Vec<&str> {
        match value {
            Value::String(id) => vec![id.as_str()],
            Value::Strings(ids) => ids.iter().map(String::as_str).collect(),
            _ => Vec::new(),
        }
    }

    fn attach(&mut self, owner: &str, property: &str, value: &Value) {
        for child in Self::owned_ids(value) {
            self.owners
                .insert(child.to_string(), (owner.to_string(), property.to_string()));
        }
    }

    fn detach(&mut self, owner: &str, value: &Value) {
        for child in Self::owned_ids(value) {
            if matches!(self.owners.get(child), Some((o, _)) if o == owner) {
                self.owners.remove(child);
            }
        }
    }
}

impl DocumentIndex for ParentIndex {
    fn select(&self, _node: &DocumentNode, node_type: &NodeType) -> bool {
        node_type.owned_properties().next().is_some()
    }

    fn reset(&mut self) {
        self.owners.clear();
    }

    fn create(&mut self, node: &DocumentNode, node_type: &NodeType) {
        for spec in node_type.owned_properties() {
            if let Some(value) = node.get(&spec.name) {
                self.attach(&node.id, &spec.name, value);
            }
        }
    }

    fn delete(&mut self, node: &DocumentNode, node_type: &NodeType) {
        for spec in node_type.owned_properties() {
            if let Some(value) = node.get(&spec.name) {
                self.detach(&node.id, value);
            }
        }
    }

    fn update(&mut self, node: &DocumentNode, node_type: &NodeType, path: &Path, old: &Value, new: &Value) {
        let property = path.property().unwrap_or_default();
        let owned = node_type
            .get_property(property)
            .map_or(false, |spec| spec.kind.is_owned());
        if !owned {
            return;
        }
        self.detach(&node.id, old);
        self.attach(&node.id, property, new);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// The indices every document starts with, in attach order
pub(crate) fn builtin_indices() -> IndexMap<String, Box<dyn DocumentIndex>> {
    let mut indices: IndexMap<String, Box<dyn DocumentIndex>> = IndexMap::new();
    indices.insert(TYPE_INDEX.to_string(), Box::new(TypeIndex::default()));
    indices.insert(ANNOTATION_INDEX.to_string(), Box::new(PropertyAnnotationIndex::default()));
    indices.insert(
        CONTAINER_ANNOTATION_INDEX.to_string(),
        Box::new(ContainerAnnotationIndex::default()),
    );
    indices.insert(PARENT_INDEX.to_string(), Box::new(ParentIndex::default()));
    indices
}

