//! Pasting plain text or copied nodes at the selection.

use crate::block_verbs::block_target;
use crate::context::{caret, insert_into, no_selection, remove_leaf, text_len, text_path, unsupported, Slot};
use crate::property_edit::insert_text_at;
use crate::text_verbs::{break_node, delete_container_range, insert_text};
use folio_document::helpers::copy_node;
use folio_document::{Document, Transaction};
use folio_model::{
    text, Coordinate, DocumentError, DocumentNode, DocumentResult, NodeData, NodeKind, NodeSelectionMode,
    PropertyKind, Selection, Value,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, instrument};

/// Clipboard content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PasteContent {
    /// Plain text; every line becomes its own text node
    Text { text: String },
    /// Copied blocks (`roots`, in order) with their owned descendants and
    /// the annotations on their text
    Nodes { roots: Vec<String>, nodes: Vec<DocumentNode> },
}

impl PasteContent {
    pub fn text(text: impl Into<String>) -> Self {
        PasteContent::Text { text: text.into() }
    }

    /// Copy blocks out of a document
    pub fn copy(doc: &Document, ids: &[String]) -> DocumentResult<Self> {
        let mut nodes = Vec::new();
        for id in ids {
            nodes.extend(copy_node(doc, id)?);
        }
        Ok(PasteContent::Nodes {
            roots: ids.to_vec(),
            nodes,
        })
    }
}

#[instrument(skip(tx, content), fields(selection = tx.selection().kind_name()))]
pub fn paste(tx: &mut Transaction<'_>, content: &PasteContent) -> DocumentResult<()> {
    match tx.selection() {
        Selection::Null => return Err(no_selection("paste")),
        Selection::Custom(_) => return Err(unsupported("paste", tx.selection())),
        _ => {}
    }

    match content {
        PasteContent::Text { text } => paste_text(tx, text),
        PasteContent::Nodes { roots, nodes } => paste_nodes(tx, roots, nodes),
    }
}

fn paste_text(tx: &mut Transaction<'_>, text: &str) -> DocumentResult<()> {
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            break_node(tx)?;
        }
        let line = line.strip_suffix('\r').unwrap_or(line);
        if !line.is_empty() {
            insert_text(tx, line)?;
        }
    }
    Ok(())
}

fn paste_nodes(tx: &mut Transaction<'_>, roots: &[String], nodes: &[DocumentNode]) -> DocumentResult<()> {
    let by_id: HashMap<&str, &DocumentNode> = nodes.iter().map(|node| (node.id.as_str(), node)).collect();
    let root_nodes = roots
        .iter()
        .map(|id| {
            by_id
                .get(id.as_str())
                .copied()
                .ok_or_else(|| DocumentError::invalid_state(format!("pasted root '{}' is missing", id)))
        })
        .collect::<DocumentResult<Vec<_>>>()?;

    let selection = tx.selection().clone();
    if let [root] = root_nodes.as_slice() {
        let is_text = tx.schema().get_strict(&root.node_type)?.kind() == NodeKind::Text;
        if is_text && !selection.is_node_selection() {
            return paste_inline(tx, &selection, root, nodes);
        }
    }
    if root_nodes.is_empty() {
        return Ok(());
    }

    let types: Vec<String> = root_nodes.iter().map(|node| node.node_type.clone()).collect();
    let target = block_target(tx, &selection, &types, "paste")?;
    let ids = import_nodes(tx, nodes)?;
    debug!(roots = roots.len(), nodes = ids.len(), "pasting blocks");

    let mut last = None;
    for (i, root) in roots.iter().enumerate() {
        let id = ids
            .get(root)
            .ok_or_else(|| DocumentError::invalid_state(format!("pasted root '{}' was not created", root)))?;
        let slot = Slot {
            path: target.slot.path.clone(),
            pos: target.slot.pos + i,
        };
        insert_into(tx, &slot, id)?;
        last = Some(id.clone());
    }
    if let Some(replaced) = &target.replaced {
        remove_leaf(tx, replaced)?;
    }

    let Some(last) = last else {
        return Ok(());
    };
    let selection = match text_path(tx, &last) {
        Some(path) => {
            let len = text_len(tx, &path)?;
            caret(path, len, Some(target.container))
        }
        None => Selection::node(target.container, last, NodeSelectionMode::After),
    };
    tx.set_selection(selection)
}

/// Paste a single text block into the text at the caret
fn paste_inline(
    tx: &mut Transaction<'_>,
    selection: &Selection,
    root: &DocumentNode,
    nodes: &[DocumentNode],
) -> DocumentResult<()> {
    let (path, start, end, container) = match selection {
        Selection::Property(sel) => (sel.path.clone(), sel.start_offset, sel.end_offset, sel.container_path.clone()),
        Selection::Container(sel) => {
            let at = delete_container_range(tx, sel)?;
            (at.path, at.offset, at.offset, Some(sel.container_path.clone()))
        }
        _ => return Err(unsupported("paste", selection)),
    };

    let property = tx
        .schema()
        .get_strict(&root.node_type)?
        .text_property_name()
        .unwrap_or_default()
        .to_string();
    let content = root.get_str(&property).unwrap_or_default().to_string();
    insert_text_at(tx, &path, start, end, &content)?;

    let root_path = root.path(&property);
    for anno in nodes {
        let (Some(a), Some(b)) = (anno.start(), anno.end()) else {
            continue;
        };
        if a.path != root_path || !tx.schema().get_strict(&anno.node_type)?.kind().is_property_annotation() {
            continue;
        }
        let data = NodeData {
            id: None,
            ..NodeData::from(anno)
        }
        .with("start", Coordinate::new(path.clone(), start + a.offset))
        .with("end", Coordinate::new(path.clone(), start + b.offset));
        tx.create(data)?;
    }

    tx.set_selection(caret(path, start + text::char_len(&content), container))
}

/// Create copies of `nodes` under fresh ids. References, coordinates and
/// container paths between the copies are rewritten to the new ids.
pub(crate) fn import_nodes(doc: &mut Document, nodes: &[DocumentNode]) -> DocumentResult<HashMap<String, String>> {
    let mut blocks = Vec::new();
    let mut annotations = Vec::new();
    for node in nodes {
        if doc.schema().get_strict(&node.node_type)?.is_annotation() {
            annotations.push(node);
        } else {
            blocks.push(node);
        }
    }

    let mut ids = HashMap::new();
    // owned nodes follow their owners, so create them first
    for node in blocks.into_iter().rev().chain(annotations) {
        let data = remap_node(doc, node, &ids)?;
        let id = doc.create(data)?.id.clone();
        ids.insert(node.id.clone(), id);
    }
    Ok(ids)
}

fn remap_node(doc: &Document, node: &DocumentNode, ids: &HashMap<String, String>) -> DocumentResult<NodeData> {
    let node_type = doc.schema().get_strict(&node.node_type)?;
    let rename = |id: &str| ids.get(id).cloned().unwrap_or_else(|| id.to_string());

    let mut data = NodeData::new(node.node_type.clone());
    for (name, value) in &node.properties {
        let kind = node_type.get_property(name).map(|spec| &spec.kind);
        let value = match (kind, value) {
            (Some(PropertyKind::Reference { .. }), Value::String(id)) => Value::String(rename(id)),
            (Some(PropertyKind::ReferenceArray { .. }), Value::Strings(list)) => {
                Value::Strings(list.iter().map(|id| rename(id)).collect())
            }
            (Some(PropertyKind::Coordinate), Value::Coordinate(c)) => {
                Value::Coordinate(Coordinate::new(c.path.with_node(rename(c.node_id())), c.offset))
            }
            (Some(PropertyKind::Path), Value::Strings(segments)) if !segments.is_empty() => {
                let mut segments = segments.clone();
                segments[0] = rename(&segments[0]);
                Value::Strings(segments)
            }
            _ => value.clone(),
        };
        data = data.with(name.clone(), value);
    }
    Ok(data)
}
