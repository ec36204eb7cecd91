//! Lookups shared by the verbs: where a node sits, which container it
//! belongs to, and how a selection reads after nodes were replaced.

use folio_document::helpers::{deep_delete_node, transfer_annotations};
use folio_document::{container, DiffOp, Document};
use folio_model::{
    text, Coordinate, DocumentError, DocumentResult, NodeData, NodeKind, Path, PropertyKind, Selection, Value,
};
use std::collections::HashMap;

/// Position of a node inside the array property that owns it
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Slot {
    pub path: Path,
    pub pos: usize,
}

pub(crate) fn no_selection(verb: &str) -> DocumentError {
    DocumentError::invalid_state(format!("{} needs a selection", verb))
}

pub(crate) fn unsupported(verb: &str, selection: &Selection) -> DocumentError {
    DocumentError::invalid_state(format!("{} is not supported on a {} selection", verb, selection.kind_name()))
}

pub(crate) fn kind_of(doc: &Document, id: &str) -> DocumentResult<NodeKind> {
    Ok(doc.node_type_of(id)?.kind())
}

/// The editable text property of a node
pub(crate) fn text_path(doc: &Document, id: &str) -> Option<Path> {
    let node_type = doc.node_type_of(id).ok()?;
    node_type.text_property_name().map(|name| Path::new(id, name))
}

pub(crate) fn require_text_path(doc: &Document, id: &str) -> DocumentResult<Path> {
    text_path(doc, id).ok_or_else(|| DocumentError::invalid_state(format!("'{}' has no text", id)))
}

pub(crate) fn text_len(doc: &Document, path: &Path) -> DocumentResult<usize> {
    Ok(text::char_len(doc.get_text(path)?))
}

pub(crate) fn slot_of(doc: &Document, id: &str) -> DocumentResult<Slot> {
    let not_in_array = || DocumentError::invalid_state(format!("'{}' is not in a node list", id));
    let (owner, property) = doc.owner_of(id).ok_or_else(not_in_array)?;
    if !matches!(doc.get(owner).and_then(|n| n.get(property)), Some(Value::Strings(_))) {
        return Err(not_in_array());
    }
    let pos = doc.position_in(owner, property, id).ok_or_else(not_in_array)?;
    Ok(Slot {
        path: Path::new(owner, property),
        pos,
    })
}

/// Whether the array at `path` may hold nodes of `node_type`
pub(crate) fn accepts(doc: &Document, path: &Path, node_type: &str) -> DocumentResult<bool> {
    match doc.property_kind(path)? {
        PropertyKind::ReferenceArray { targets, .. } => Ok(targets.is_empty() || targets.iter().any(|t| t == node_type)),
        _ => Ok(false),
    }
}

/// The container a node lives in: `hint` when given, otherwise the
/// closest ancestor of kind `Container`
pub(crate) fn container_of(doc: &Document, id: &str, hint: Option<&Path>) -> DocumentResult<Path> {
    if let Some(path) = hint {
        return Ok(path.clone());
    }
    let mut current = id.to_string();
    for _ in 0..=doc.len() {
        let Some((owner, property)) = doc.owner_of(&current) else {
            break;
        };
        if kind_of(doc, owner)? == NodeKind::Container {
            return Ok(Path::new(owner, property));
        }
        current = owner.to_string();
    }
    Err(DocumentError::invalid_state(format!("'{}' is not inside a container", id)))
}

/// Leaf ids of a container in order (lists flattened to their items)
pub(crate) fn leaf_ids(doc: &Document, container_path: &Path) -> DocumentResult<Vec<String>> {
    Ok(doc
        .container(container_path)?
        .leaves()
        .into_iter()
        .map(|node| node.id.clone())
        .collect())
}

/// Leaves from `first` to `last`, inclusive
pub(crate) fn leaf_range(doc: &Document, container_path: &Path, first: &str, last: &str) -> DocumentResult<Vec<String>> {
    let leaves = leaf_ids(doc, container_path)?;
    let start = leaves.iter().position(|id| id == first);
    let end = leaves.iter().position(|id| id == last);
    match (start, end) {
        (Some(start), Some(end)) if start <= end => Ok(leaves[start..=end].to_vec()),
        _ => Err(DocumentError::invalid_selection(format!(
            "'{}' and '{}' are not ordered leaves of {}",
            first, last, container_path
        ))),
    }
}

/// Leaves a selection touches
pub(crate) fn selected_leaves(doc: &Document, selection: &Selection, verb: &str) -> DocumentResult<Vec<String>> {
    match selection {
        Selection::Null => Err(no_selection(verb)),
        Selection::Custom(_) => Err(unsupported(verb, selection)),
        Selection::Property(sel) => Ok(vec![sel.path.node_id().to_string()]),
        Selection::Node(sel) => Ok(vec![sel.node_id.clone()]),
        Selection::Container(sel) => leaf_range(
            doc,
            &sel.container_path,
            sel.start_path.node_id(),
            sel.end_path.node_id(),
        ),
    }
}

/// Text type to use for a new text node in the array at `path`
pub(crate) fn text_type_for(doc: &Document, path: &Path) -> DocumentResult<String> {
    let default = doc.schema().default_text_type().to_string();
    if accepts(doc, path, &default)? {
        return Ok(default);
    }
    let targets = doc.property_kind(path)?.targets().to_vec();
    targets
        .into_iter()
        .find(|t| doc.schema().get(t).map_or(false, |nt| nt.kind().has_text()))
        .ok_or_else(|| DocumentError::invalid_state(format!("{} cannot hold text nodes", path)))
}

/// Create a detached text node and return its text path
pub(crate) fn create_text_node(doc: &mut Document, data: NodeData, content: &str) -> DocumentResult<Path> {
    let node_type = doc.schema().get_strict(&data.node_type)?;
    let property = node_type
        .text_property_name()
        .ok_or_else(|| DocumentError::invalid_state(format!("'{}' is not a text type", data.node_type)))?
        .to_string();
    let id = doc.create(data.with(property.clone(), content))?.id.clone();
    Ok(Path::new(id, property))
}

/// Put a created node into `slot`
pub(crate) fn insert_into(doc: &mut Document, slot: &Slot, id: &str) -> DocumentResult<()> {
    container::insert_at(doc, &slot.path, slot.pos, id)
}

/// Delete a leaf, and its list when that was the last item
pub(crate) fn remove_leaf(doc: &mut Document, id: &str) -> DocumentResult<()> {
    let owner = doc.owner_of(id).map(|(owner, _)| owner.to_string());
    deep_delete_node(doc, id)?;

    if let Some(owner) = owner {
        let empty_list = kind_of(doc, &owner)? == NodeKind::List
            && doc.get(&owner).and_then(|n| n.get_strings("items")).map_or(true, |items| items.is_empty());
        if empty_list {
            deep_delete_node(doc, &owner)?;
        }
    }
    Ok(())
}

/// Append the text of `source` to `target`, move its annotations along
/// and delete it. Returns the join offset.
pub(crate) fn merge_into(doc: &mut Document, target: &Path, source: &str) -> DocumentResult<usize> {
    let source_path = require_text_path(doc, source)?;
    let offset = text_len(doc, target)?;
    let content = doc.get_text(&source_path)?.to_string();

    if !content.is_empty() {
        doc.update(target, DiffOp::insert(offset, content))?;
    }
    transfer_annotations(doc, &source_path, 0, target, offset)?;
    remove_leaf(doc, source)?;
    Ok(offset)
}

/// Replace a text node by a new one built from `data`, keeping its text
/// and annotations. Returns the new text path.
pub(crate) fn replace_text_node(doc: &mut Document, id: &str, data: NodeData) -> DocumentResult<Path> {
    let slot = slot_of(doc, id)?;
    let old_path = require_text_path(doc, id)?;
    let content = doc.get_text(&old_path)?.to_string();

    let new_path = create_text_node(doc, data, &content)?;
    insert_into(doc, &slot, new_path.node_id())?;
    transfer_annotations(doc, &old_path, 0, &new_path, 0)?;
    remove_leaf(doc, id)?;
    Ok(new_path)
}

/// Caret inside `path`, attached to `container` when known
pub(crate) fn caret(path: Path, offset: usize, container: Option<Path>) -> Selection {
    let selection = Selection::collapsed(Coordinate::new(path, offset));
    match container {
        Some(container) => selection.within(container),
        None => selection,
    }
}

/// Rewrite node ids in a selection after nodes were replaced
pub(crate) fn remap_selection(selection: &Selection, ids: &HashMap<String, String>) -> Selection {
    let remap = |path: &Path| match ids.get(path.node_id()) {
        Some(id) => path.with_node(id.clone()),
        None => path.clone(),
    };

    let mut selection = selection.clone();
    match &mut selection {
        Selection::Property(sel) => sel.path = remap(&sel.path),
        Selection::Container(sel) => {
            sel.start_path = remap(&sel.start_path);
            sel.end_path = remap(&sel.end_path);
        }
        Selection::Node(sel) => {
            if let Some(id) = ids.get(&sel.node_id) {
                sel.node_id = id.clone();
            }
        }
        Selection::Null | Selection::Custom(_) => {}
    }
    selection
}
