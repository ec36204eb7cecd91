//! Read and write helpers for container properties (ordered, owned arrays
//! of block ids).

use crate::document::Document;
use crate::operation::DiffOp;
use folio_model::{DocumentError, DocumentNode, DocumentResult, NodeKind, Path, PropertyKind};

/// Read view of one container property
pub struct Container<'a> {
    doc: &'a Document,
    path: Path,
    ids: &'a [String],
}

impl<'a> Container<'a> {
    pub fn new(doc: &'a Document, path: &Path) -> DocumentResult<Self> {
        match doc.property_kind(path)? {
            PropertyKind::ReferenceArray { .. } => {}
            _ => {
                return Err(DocumentError::invalid_state(format!(
                    "{} is not a container property",
                    path
                )))
            }
        }
        let ids = doc
            .get_property(path)
            .and_then(|value| value.as_strings())
            .unwrap_or(&[]);
        Ok(Self {
            doc,
            path: path.clone(),
            ids,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn node_ids(&self) -> &'a [String] {
        self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn position_of(&self, id: &str) -> Option<usize> {
        self.ids.iter().position(|child| child == id)
    }

    pub fn get_at(&self, pos: usize) -> Option<&'a DocumentNode> {
        self.doc.get(self.ids.get(pos)?)
    }

    pub fn first(&self) -> Option<&'a DocumentNode> {
        self.get_at(0)
    }

    pub fn last(&self) -> Option<&'a DocumentNode> {
        self.get_at(self.ids.len().checked_sub(1)?)
    }

    /// Direct children with lists replaced by their items, in order
    pub fn leaves(&self) -> Vec<&'a DocumentNode> {
        let mut leaves = Vec::new();
        for node in self.ids.iter().filter_map(|id| self.doc.get(id)) {
            let is_list = self
                .doc
                .schema()
                .get(&node.node_type)
                .map_or(false, |t| t.kind() == NodeKind::List);
            if is_list {
                leaves.extend(
                    node.get_strings("items")
                        .unwrap_or(&[])
                        .iter()
                        .filter_map(|id| self.doc.get(id)),
                );
            } else {
                leaves.push(node);
            }
        }
        leaves
    }
}

impl Document {
    pub fn container(&self, path: &Path) -> DocumentResult<Container<'_>> {
        Container::new(self, path)
    }
}

pub fn insert_at(doc: &mut Document, path: &Path, pos: usize, id: &str) -> DocumentResult<()> {
    doc.update(path, DiffOp::insert(pos, id))
}

pub fn append(doc: &mut Document, path: &Path, id: &str) -> DocumentResult<()> {
    let len = doc.container(path)?.len();
    insert_at(doc, path, len, id)
}

pub fn remove_at(doc: &mut Document, path: &Path, pos: usize) -> DocumentResult<()> {
    doc.update(path, DiffOp::delete(pos, pos + 1))
}

/// Remove `id` from the container; fails if it is not there
pub fn remove(doc: &mut Document, path: &Path, id: &str) -> DocumentResult<usize> {
    let pos = doc
        .container(path)?
        .position_of(id)
        .ok_or_else(|| DocumentError::invalid_state(format!("'{}' is not in {}", id, path)))?;
    remove_at(doc, path, pos)?;
    Ok(pos)
}
