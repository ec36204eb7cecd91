//! Typing, deleting and breaking text.

use crate::context::{
    accepts, caret, container_of, create_text_node, insert_into, kind_of, leaf_ids, leaf_range, merge_into,
    no_selection, remove_leaf, slot_of, text_len, text_path, text_type_for, unsupported, Slot,
};
use crate::list_verbs::unlist_item;
use crate::property_edit::{delete_text_range, insert_text_at};
use folio_document::helpers::transfer_annotations;
use folio_document::{DiffOp, Document, Transaction};
use folio_model::{
    text, ContainerSelection, Coordinate, DocumentError, DocumentResult, NodeData, NodeKind, NodeSelection,
    NodeSelectionMode, Path, PropertyKind, Selection,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Which side of the caret a collapsed delete removes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Left,
    Right,
}

/// Type `text` over the selection
#[instrument(skip(tx, text), fields(selection = tx.selection().kind_name(), chars = text::char_len(text)))]
pub fn insert_text(tx: &mut Transaction<'_>, text: &str) -> DocumentResult<()> {
    let selection = tx.selection().clone();
    let inserted = text::char_len(text);

    match &selection {
        Selection::Null => Err(no_selection("insert_text")),
        Selection::Custom(_) => Err(unsupported("insert_text", &selection)),
        Selection::Node(sel) => {
            let slot = node_slot(tx, sel)?;
            let node_type = text_type_for(tx, &slot.path)?;
            let path = create_text_node(tx, NodeData::new(node_type), text)?;
            insert_into(tx, &slot, path.node_id())?;
            if sel.mode == NodeSelectionMode::Full {
                remove_leaf(tx, &sel.node_id)?;
            }
            tx.set_selection(caret(path, inserted, Some(sel.container_path.clone())))
        }
        Selection::Property(sel) => {
            insert_text_at(tx, &sel.path, sel.start_offset, sel.end_offset, text)?;
            tx.set_selection(caret(
                sel.path.clone(),
                sel.start_offset + inserted,
                sel.container_path.clone(),
            ))
        }
        Selection::Container(sel) => {
            let at = delete_container_range(tx, sel)?;
            insert_text_at(tx, &at.path, at.offset, at.offset, text)?;
            tx.set_selection(caret(at.path, at.offset + inserted, Some(sel.container_path.clone())))
        }
    }
}

/// Delete the selection, or one character (or a node boundary) next to a
/// caret
#[instrument(skip(tx), fields(selection = tx.selection().kind_name()))]
pub fn delete(tx: &mut Transaction<'_>, direction: Direction) -> DocumentResult<()> {
    let selection = tx.selection().clone();

    match &selection {
        Selection::Null => Err(no_selection("delete")),
        Selection::Custom(_) => Err(unsupported("delete", &selection)),
        Selection::Node(sel) => delete_node_selection(tx, sel, direction),
        Selection::Property(sel) if sel.start_offset < sel.end_offset => {
            delete_text_range(tx, &sel.path, sel.start_offset, sel.end_offset)?;
            tx.set_selection(caret(sel.path.clone(), sel.start_offset, sel.container_path.clone()))
        }
        Selection::Property(sel) => {
            delete_character(tx, &sel.path, sel.start_offset, direction, sel.container_path.clone())
        }
        Selection::Container(sel) if selection.is_collapsed() => {
            delete_character(tx, &sel.start_path, sel.start_offset, direction, Some(sel.container_path.clone()))
        }
        Selection::Container(sel) => {
            let at = delete_container_range(tx, sel)?;
            tx.set_selection(caret(at.path, at.offset, Some(sel.container_path.clone())))
        }
    }
}

/// Split the text node at the caret, or add an empty text node next to a
/// selected node
#[instrument(skip(tx), fields(selection = tx.selection().kind_name()))]
pub fn break_node(tx: &mut Transaction<'_>) -> DocumentResult<()> {
    let selection = tx.selection().clone();

    match &selection {
        Selection::Null => Err(no_selection("break")),
        Selection::Custom(_) => Err(unsupported("break", &selection)),
        Selection::Node(sel) => {
            let mut slot = slot_of(tx, &sel.node_id)?;
            if sel.mode != NodeSelectionMode::Before {
                slot.pos += 1;
            }
            let node_type = text_type_for(tx, &slot.path)?;
            let path = create_text_node(tx, NodeData::new(node_type), "")?;
            insert_into(tx, &slot, path.node_id())?;
            tx.set_selection(caret(path, 0, Some(sel.container_path.clone())))
        }
        Selection::Property(sel) => {
            ensure_breakable(tx, sel.path.node_id())?;
            delete_text_range(tx, &sel.path, sel.start_offset, sel.end_offset)?;
            break_text(tx, &sel.path, sel.start_offset, sel.container_path.clone())
        }
        Selection::Container(sel) => {
            ensure_breakable(tx, sel.start_path.node_id())?;
            let at = delete_container_range(tx, sel)?;
            break_text(tx, &at.path, at.offset, Some(sel.container_path.clone()))
        }
    }
}

/// Where a node selection puts a new sibling
pub(crate) fn node_slot(doc: &Document, sel: &NodeSelection) -> DocumentResult<Slot> {
    let mut slot = slot_of(doc, &sel.node_id)?;
    if sel.mode == NodeSelectionMode::After {
        slot.pos += 1;
    }
    Ok(slot)
}

/// Remove selected text and return the caret it leaves, or `None` for
/// selections without a text range
pub(crate) fn delete_selected(doc: &mut Document, selection: &Selection) -> DocumentResult<Option<Coordinate>> {
    match selection {
        Selection::Property(sel) => {
            delete_text_range(doc, &sel.path, sel.start_offset, sel.end_offset)?;
            Ok(Some(Coordinate::new(sel.path.clone(), sel.start_offset)))
        }
        Selection::Container(sel) => delete_container_range(doc, sel).map(Some),
        _ => Ok(None),
    }
}

/// Delete everything between the ends of a container selection and join
/// the two end nodes
pub(crate) fn delete_container_range(doc: &mut Document, sel: &ContainerSelection) -> DocumentResult<Coordinate> {
    let start = Coordinate::new(sel.start_path.clone(), sel.start_offset);
    if sel.start_path == sel.end_path {
        delete_text_range(doc, &sel.start_path, sel.start_offset, sel.end_offset)?;
        return Ok(start);
    }

    let leaves = leaf_range(doc, &sel.container_path, sel.start_path.node_id(), sel.end_path.node_id())?;
    if leaves.len() < 2 {
        return Err(DocumentError::invalid_selection("container selection spans two properties of one node"));
    }
    let start_len = text_len(doc, &sel.start_path)?;
    let end_len = text_len(doc, &sel.end_path)?;
    if sel.start_offset > start_len || sel.end_offset > end_len {
        return Err(DocumentError::invalid_selection("container selection is past the end of its text"));
    }
    debug!(leaves = leaves.len(), "deleting across nodes");

    delete_text_range(doc, &sel.start_path, sel.start_offset, start_len)?;
    delete_text_range(doc, &sel.end_path, 0, sel.end_offset)?;
    for id in &leaves[1..leaves.len() - 1] {
        remove_leaf(doc, id)?;
    }
    merge_into(doc, &sel.start_path, sel.end_path.node_id())?;
    Ok(start)
}

fn delete_node_selection(tx: &mut Transaction<'_>, sel: &NodeSelection, direction: Direction) -> DocumentResult<()> {
    let removes = matches!(
        (sel.mode, direction),
        (NodeSelectionMode::Full, _)
            | (NodeSelectionMode::Before, Direction::Right)
            | (NodeSelectionMode::After, Direction::Left)
    );
    if !removes {
        return Ok(());
    }

    let slot = slot_of(tx, &sel.node_id)?;
    let node_type = text_type_for(tx, &slot.path)?;
    let path = create_text_node(tx, NodeData::new(node_type), "")?;
    insert_into(tx, &slot, path.node_id())?;
    remove_leaf(tx, &sel.node_id)?;
    tx.set_selection(caret(path, 0, Some(sel.container_path.clone())))
}

fn delete_character(
    tx: &mut Transaction<'_>,
    path: &Path,
    offset: usize,
    direction: Direction,
    container: Option<Path>,
) -> DocumentResult<()> {
    let len = text_len(tx, path)?;
    match direction {
        Direction::Left if offset > 0 => {
            delete_text_range(tx, path, offset - 1, offset)?;
            tx.set_selection(caret(path.clone(), offset - 1, container))
        }
        Direction::Right if offset < len => {
            delete_text_range(tx, path, offset, offset + 1)?;
            tx.set_selection(caret(path.clone(), offset, container))
        }
        Direction::Left => merge_backward(tx, path, container),
        Direction::Right => merge_forward(tx, path, container),
    }
}

/// Backspace at the start of a text node
fn merge_backward(tx: &mut Transaction<'_>, path: &Path, container: Option<Path>) -> DocumentResult<()> {
    let id = path.node_id().to_string();

    // the first item of a list leaves the list instead of joining the
    // block above it
    if kind_of(tx, &id)? == NodeKind::ListItem && slot_of(tx, &id)?.pos == 0 {
        let new_path = unlist_item(tx, &id)?;
        return tx.set_selection(caret(new_path, 0, container));
    }

    let container_path = container_of(tx, &id, container.as_ref())?;
    let leaves = leaf_ids(tx, &container_path)?;
    let pos = leaves
        .iter()
        .position(|leaf| leaf == &id)
        .ok_or_else(|| DocumentError::invalid_state(format!("'{}' is not in {}", id, container_path)))?;
    let Some(previous) = pos.checked_sub(1).map(|p| leaves[p].clone()) else {
        return Ok(());
    };

    match text_path(tx, &previous) {
        Some(target) => {
            let offset = merge_into(tx, &target, &id)?;
            tx.set_selection(caret(target, offset, container))
        }
        None => tx.set_selection(Selection::node(container_path, previous, NodeSelectionMode::Full)),
    }
}

/// Delete at the end of a text node
fn merge_forward(tx: &mut Transaction<'_>, path: &Path, container: Option<Path>) -> DocumentResult<()> {
    let id = path.node_id().to_string();
    let container_path = container_of(tx, &id, container.as_ref())?;
    let leaves = leaf_ids(tx, &container_path)?;
    let pos = leaves
        .iter()
        .position(|leaf| leaf == &id)
        .ok_or_else(|| DocumentError::invalid_state(format!("'{}' is not in {}", id, container_path)))?;
    let Some(next) = leaves.get(pos + 1).cloned() else {
        return Ok(());
    };

    match text_path(tx, &next) {
        Some(_) => {
            let offset = merge_into(tx, path, &next)?;
            tx.set_selection(caret(path.clone(), offset, container))
        }
        None => tx.set_selection(Selection::node(container_path, next, NodeSelectionMode::Full)),
    }
}

fn ensure_breakable(doc: &Document, id: &str) -> DocumentResult<()> {
    let kind = kind_of(doc, id)?;
    if !kind.has_text() {
        return Err(DocumentError::invalid_state(format!("cannot break a {:?} node", kind)));
    }
    slot_of(doc, id).map(|_| ())
}

fn break_text(tx: &mut Transaction<'_>, path: &Path, offset: usize, container: Option<Path>) -> DocumentResult<()> {
    let id = path.node_id();
    let new_path = if kind_of(tx, id)? == NodeKind::ListItem && text_len(tx, path)? == 0 {
        unlist_item(tx, id)?
    } else {
        split_text_node(tx, path, offset)?
    };
    tx.set_selection(caret(new_path, 0, container))
}

/// Move the text after `offset` and its annotations into a new node right
/// after this one. Returns the new node's text path.
pub(crate) fn split_text_node(doc: &mut Document, path: &Path, offset: usize) -> DocumentResult<Path> {
    let id = path.node_id().to_string();
    let slot = slot_of(doc, &id)?;
    let len = text_len(doc, path)?;

    let data = {
        let node = doc.get_strict(&id)?;
        let node_type = doc.node_type_of(&id)?;
        let default = doc.schema().default_text_type();
        if offset == len && node_type.kind() == NodeKind::Text && accepts(doc, &slot.path, default)? {
            // breaking at the end of a heading continues with a paragraph
            NodeData::new(default)
        } else {
            node_type
                .properties()
                .iter()
                .filter(|spec| spec.kind == PropertyKind::Value)
                .filter_map(|spec| node.get(&spec.name).map(|value| (spec.name.clone(), value.clone())))
                .fold(NodeData::new(node.node_type.clone()), |data, (name, value)| data.with(name, value))
        }
    };

    let tail = text::slice(doc.get_text(path)?, offset, len).to_string();
    let new_path = create_text_node(doc, data, &tail)?;
    insert_into(
        doc,
        &Slot {
            path: slot.path,
            pos: slot.pos + 1,
        },
        new_path.node_id(),
    )?;
    transfer_annotations(doc, path, offset, &new_path, 0)?;
    if offset < len {
        doc.update(path, DiffOp::delete(offset, len))?;
    }
    Ok(new_path)
}
