//! Multi-op helpers built from the document primitives. All of them must be
//! called inside a transaction.

use crate::container;
use crate::document::Document;
use crate::operation::DiffOp;
use crate::visitor::{descendants, owned_children};
use folio_model::{
    text, Coordinate, DocumentError, DocumentNode, DocumentResult, NodeData, NodeKind, Path, PropertyKind,
    Selection, Value,
};
use std::collections::HashMap;
use tracing::debug;

/// Remove `id` from the property that owns it. Returns the owner, property
/// and former position.
pub fn detach(doc: &mut Document, id: &str) -> DocumentResult<Option<(String, String, usize)>> {
    let Some((owner, property)) = doc.owner_of(id).map(|(o, p)| (o.to_string(), p.to_string())) else {
        return Ok(None);
    };
    if !doc.contains(&owner) {
        return Ok(None);
    }
    let path = Path::new(owner.clone(), property.clone());
    let pos = match doc.get_property(&path) {
        Some(Value::Strings(_)) => container::remove(doc, &path, id)?,
        _ => {
            doc.set(&path, Value::Null)?;
            0
        }
    };
    Ok(Some((owner, property, pos)))
}

/// Text properties of a node
pub fn text_paths(doc: &Document, id: &str) -> Vec<Path> {
    let Ok(node_type) = doc.node_type_of(id) else {
        return Vec::new();
    };
    node_type
        .properties()
        .iter()
        .filter(|spec| spec.kind == PropertyKind::Text)
        .map(|spec| Path::new(id, spec.name.clone()))
        .collect()
}

/// Property annotations on any text property of `id`, plus container
/// annotations with an endpoint in it
fn annotations_of(doc: &Document, id: &str) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    for path in text_paths(doc, id) {
        ids.extend(doc.get_annotations(&path).iter().map(|a| a.id.clone()));
    }
    for anno in doc.get_container_annotations_at(id) {
        if !ids.contains(&anno.id) {
            ids.push(anno.id.clone());
        }
    }
    ids
}

/// Delete a node with its owned descendants and the annotations on them,
/// after detaching it from its owner
pub fn deep_delete_node(doc: &mut Document, id: &str) -> DocumentResult<()> {
    doc.get_strict(id)?;
    let ids = descendants(doc, id);
    debug!(node = id, count = ids.len(), "deep delete");

    detach(doc, id)?;
    for node_id in &ids {
        for anno in annotations_of(doc, node_id) {
            if doc.contains(&anno) {
                doc.delete(&anno)?;
            }
        }
    }
    // pre-order: owners go before the nodes they own
    for node_id in &ids {
        doc.delete(node_id)?;
    }
    Ok(())
}

/// A node, its owned descendants and the property annotations on their
/// text, as detached copies
pub fn copy_node(doc: &Document, id: &str) -> DocumentResult<Vec<DocumentNode>> {
    doc.get_strict(id)?;
    let mut nodes = Vec::new();
    for node_id in descendants(doc, id) {
        if let Some(node) = doc.get(&node_id) {
            nodes.push(node.clone());
        }
        for path in text_paths(doc, &node_id) {
            nodes.extend(doc.get_annotations(&path).into_iter().cloned());
        }
    }
    Ok(nodes)
}

/// Move annotations at or after `offset` on `from` to `to`, re-based at
/// `to_offset`. Property annotations spanning `offset` are cut there and
/// their tail is recreated on `to`.
pub fn transfer_annotations(
    doc: &mut Document,
    from: &Path,
    offset: usize,
    to: &Path,
    to_offset: usize,
) -> DocumentResult<()> {
    let rebase = |o: usize| o - offset + to_offset;

    let annotations: Vec<DocumentNode> = doc.get_annotations(from).into_iter().cloned().collect();
    for anno in annotations {
        let (Some(start), Some(end)) = (anno.start(), anno.end()) else {
            continue;
        };
        let (a, b) = (start.offset, end.offset);
        if a >= offset {
            doc.set(&anno.path("start"), Coordinate::new(to.clone(), rebase(a)))?;
            doc.set(&anno.path("end"), Coordinate::new(to.clone(), rebase(b)))?;
        } else if b > offset {
            let tail = NodeData::from(&anno)
                .with("start", Coordinate::new(to.clone(), to_offset))
                .with("end", Coordinate::new(to.clone(), rebase(b)));
            let tail = NodeData { id: None, ..tail };
            doc.update(&anno.path("end"), DiffOp::shift(offset as isize - b as isize))?;
            doc.create(tail)?;
        }
    }

    let container_annotations: Vec<DocumentNode> = doc
        .get_container_annotations_at(from.node_id())
        .into_iter()
        .cloned()
        .collect();
    for anno in container_annotations {
        for (property, coordinate) in [("start", anno.start()), ("end", anno.end())] {
            if let Some(c) = coordinate {
                if &c.path == from && c.offset >= offset {
                    doc.set(&anno.path(property), Coordinate::new(to.clone(), rebase(c.offset)))?;
                }
            }
        }
    }
    Ok(())
}

/// Plain text covered by a selection; blocks are separated by newlines
pub fn get_text_for_selection(doc: &Document, selection: &Selection) -> DocumentResult<String> {
    match selection {
        Selection::Property(sel) => {
            let content = doc.get_text(&sel.path)?;
            Ok(text::slice(content, sel.start_offset, sel.end_offset).to_string())
        }
        Selection::Container(sel) => {
            let container = doc.container(&sel.container_path)?;
            let leaves = container.leaves();
            let start = leaves.iter().position(|n| n.id == sel.start_path.node_id());
            let end = leaves.iter().position(|n| n.id == sel.end_path.node_id());
            let (Some(start), Some(end)) = (start, end) else {
                return Err(DocumentError::invalid_selection("selection ends are not in the container"));
            };

            let mut parts = Vec::new();
            for (i, leaf) in leaves.iter().enumerate().take(end + 1).skip(start) {
                let Some(path) = text_paths(doc, &leaf.id).into_iter().next() else {
                    continue;
                };
                let content = doc.get_text(&path)?;
                let from = if i == start { sel.start_offset } else { 0 };
                let to = if i == end { sel.end_offset } else { text::char_len(content) };
                parts.push(text::slice(content, from, to).to_string());
            }
            Ok(parts.join("\n"))
        }
        _ => Ok(String::new()),
    }
}

/// Structural problems in a document, one message each
pub fn check_integrity(doc: &Document) -> Vec<String> {
    let mut problems = Vec::new();
    let mut owners: HashMap<String, String> = HashMap::new();

    for node in doc.nodes() {
        let Some(node_type) = doc.schema().get(&node.node_type) else {
            problems.push(format!("{}: unknown type '{}'", node.id, node.node_type));
            continue;
        };

        for child in owned_children(doc, node) {
            if !doc.contains(&child) {
                problems.push(format!("{}: owns missing node '{}'", node.id, child));
            }
            if let Some(previous) = owners.insert(child.clone(), node.id.clone()) {
                problems.push(format!("{}: owned by both '{}' and '{}'", child, previous, node.id));
            }
        }

        if node_type.is_annotation() {
            let (Some(start), Some(end)) = (node.start(), node.end()) else {
                problems.push(format!("{}: annotation without endpoints", node.id));
                continue;
            };
            for c in [start, end] {
                match doc.get_text(&c.path) {
                    Ok(content) if c.offset <= text::char_len(content) => {}
                    Ok(_) => problems.push(format!("{}: endpoint {} is past the end of the text", node.id, c)),
                    Err(_) => problems.push(format!("{}: endpoint {} is not on a text property", node.id, c)),
                }
            }
            if node_type.kind().is_property_annotation() {
                if start.path != end.path {
                    problems.push(format!("{}: property annotation spans two properties", node.id));
                } else if start.offset > end.offset {
                    problems.push(format!("{}: ends before it starts", node.id));
                }
            }
            if node_type.kind() == NodeKind::ContainerAnnotation {
                match node.container_path() {
                    Some(path) if doc.contains(path.node_id()) => {}
                    _ => problems.push(format!("{}: container does not exist", node.id)),
                }
            }
        }
    }

    debug!(nodes = doc.len(), problems = problems.len(), "integrity check");
    problems
}
