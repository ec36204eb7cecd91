//! # Document changes
//!
//! One `DocumentChange` records everything a transaction did. It is built up
//! while the transaction runs, frozen on commit and never mutated afterwards
//! (undo produces a new, inverted change).

use crate::document::Document;
use crate::operation::Operation;
use chrono::{DateTime, Utc};
use folio_model::{DocumentNode, Path, PropertyKind, Selection, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentChange {
    pub ops: Vec<Operation>,
    pub created: BTreeSet<String>,
    pub deleted: BTreeSet<String>,
    pub updated: BTreeSet<String>,
    /// Text properties whose characters or annotations changed
    pub affected_paths: BTreeSet<Path>,
    pub before: Selection,
    pub after: Selection,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub info: serde_json::Map<String, serde_json::Value>,
}

impl DocumentChange {
    pub fn new(before: Selection) -> Self {
        Self {
            ops: Vec::new(),
            created: BTreeSet::new(),
            deleted: BTreeSet::new(),
            updated: BTreeSet::new(),
            affected_paths: BTreeSet::new(),
            after: before.clone(),
            before,
            timestamp: Utc::now(),
            info: serde_json::Map::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Derive `created`, `deleted`, `updated` and `affected_paths` from the
    /// recorded ops. A node created and deleted in the same change appears
    /// in neither set.
    pub fn extract_information(&mut self, doc: &Document) {
        let mut created = BTreeSet::new();
        let mut deleted = BTreeSet::new();
        let mut updated = BTreeSet::new();
        let mut affected = BTreeSet::new();

        for op in &self.ops {
            match op {
                Operation::Create { node } => {
                    if !deleted.remove(&node.id) {
                        created.insert(node.id.clone());
                    }
                    affected.extend(anchor_paths(node));
                }
                Operation::Delete { node } => {
                    if !created.remove(&node.id) {
                        deleted.insert(node.id.clone());
                    }
                    affected.extend(anchor_paths(node));
                }
                Operation::Set { path, .. } | Operation::Update { path, .. } => {
                    updated.insert(path.node_id().to_string());
                    match path.property() {
                        Some("start") | Some("end") => {
                            for value in op_values(op) {
                                if let Some(c) = value.as_coordinate() {
                                    affected.insert(c.path.clone());
                                }
                            }
                            if let Some(node) = doc.get(path.node_id()) {
                                affected.extend(anchor_paths(node));
                            }
                        }
                        _ => {
                            if is_text_property(doc, path) {
                                affected.insert(path.clone());
                            }
                        }
                    }
                }
            }
        }

        updated.retain(|id| !created.contains(id) && !deleted.contains(id));
        affected.retain(|path| doc.get(path.node_id()).is_some());

        self.created = created;
        self.deleted = deleted;
        self.updated = updated;
        self.affected_paths = affected;
    }

    /// The change that undoes this one
    pub fn invert(&self) -> DocumentChange {
        DocumentChange {
            ops: self.ops.iter().rev().map(Operation::invert).collect(),
            created: self.deleted.clone(),
            deleted: self.created.clone(),
            updated: self.updated.clone(),
            affected_paths: self.affected_paths.clone(),
            before: self.after.clone(),
            after: self.before.clone(),
            timestamp: Utc::now(),
            info: self.info.clone(),
        }
    }

    /// Whether any recorded op touches `node_id`
    pub fn has_updated(&self, node_id: &str) -> bool {
        self.created.contains(node_id) || self.deleted.contains(node_id) || self.updated.contains(node_id)
    }
}

fn anchor_paths(node: &DocumentNode) -> Vec<Path> {
    let mut paths = Vec::new();
    for coordinate in [node.start(), node.end()].into_iter().flatten() {
        if !paths.contains(&coordinate.path) {
            paths.push(coordinate.path.clone());
        }
    }
    paths
}

fn op_values(op: &Operation) -> Vec<&Value> {
    match op {
        Operation::Set { original, value, .. } => vec![original, value],
        _ => Vec::new(),
    }
}

fn is_text_property(doc: &Document, path: &Path) -> bool {
    let node_type = doc
        .get(path.node_id())
        .and_then(|node| doc.schema().get(&node.node_type));
    match (node_type, path.property()) {
        (Some(node_type), Some(property)) => node_type
            .get_property(property)
            .map_or(false, |spec| spec.kind == PropertyKind::Text),
        _ => false,
    }
}
