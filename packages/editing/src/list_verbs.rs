//! Lists: wrapping text nodes into list items and back, and item levels.

use crate::context::{
    create_text_node, insert_into, kind_of, remap_selection, remove_leaf, require_text_path, selected_leaves,
    slot_of, text_type_for, Slot,
};
use folio_document::helpers::{deep_delete_node, transfer_annotations};
use folio_document::{container, DiffOp, Document, Transaction};
use folio_model::{DocumentError, DocumentResult, NodeData, NodeKind, Path, Value};
use std::collections::HashMap;
use tracing::{debug, instrument};

const ITEMS: &str = "items";
const ORDERED: &str = "ordered";
const LEVEL: &str = "level";

/// Turn the selected text nodes into list items, or back into text nodes
/// when they already are items of a list of the requested kind
#[instrument(skip(tx), fields(selection = tx.selection().kind_name()))]
pub fn toggle_list(tx: &mut Transaction<'_>, ordered: bool) -> DocumentResult<()> {
    let selection = tx.selection().clone();
    let view: &Document = tx;
    let leaves = selected_leaves(view, &selection, "toggle_list")?;
    let kinds = leaves
        .iter()
        .map(|id| kind_of(view, id))
        .collect::<DocumentResult<Vec<_>>>()?;
    if !kinds.iter().any(|kind| kind.has_text()) {
        return Err(DocumentError::invalid_state("toggle_list needs a text node"));
    }

    let unlist = leaves
        .iter()
        .zip(&kinds)
        .all(|(id, kind)| *kind == NodeKind::ListItem && list_is_ordered(view, id) == Some(ordered));

    let mut ids = HashMap::new();
    for (id, kind) in leaves.iter().zip(kinds) {
        match kind {
            NodeKind::ListItem if unlist => {
                let path = unlist_item(tx, id)?;
                ids.insert(id.clone(), path.node_id().to_string());
            }
            NodeKind::ListItem => {
                let list_id = slot_of(tx, id)?.path.node_id().to_string();
                if list_is_ordered(tx, id) != Some(ordered) {
                    tx.set(&Path::new(list_id, ORDERED), ordered)?;
                }
            }
            NodeKind::Text => {
                let path = listify(tx, id, ordered)?;
                ids.insert(id.clone(), path.node_id().to_string());
            }
            _ => {}
        }
    }
    tx.set_selection(remap_selection(&selection, &ids))
}

#[instrument(skip(tx), fields(selection = tx.selection().kind_name()))]
pub fn indent(tx: &mut Transaction<'_>) -> DocumentResult<()> {
    change_level(tx, 1, "indent")
}

/// Lower the level of the selected list items; items at level 1 leave
/// their list
#[instrument(skip(tx), fields(selection = tx.selection().kind_name()))]
pub fn dedent(tx: &mut Transaction<'_>) -> DocumentResult<()> {
    change_level(tx, -1, "dedent")
}

fn change_level(tx: &mut Transaction<'_>, delta: i64, verb: &str) -> DocumentResult<()> {
    let selection = tx.selection().clone();
    let mut items = Vec::new();
    for id in selected_leaves(tx, &selection, verb)? {
        if kind_of(tx, &id)? == NodeKind::ListItem {
            items.push(id);
        }
    }
    if items.is_empty() {
        return Err(DocumentError::invalid_state(format!("{} needs a list item", verb)));
    }

    let mut ids = HashMap::new();
    for id in items {
        let level = tx.get_strict(&id)?.get_int(LEVEL).unwrap_or(1) + delta;
        if level < 1 {
            let path = unlist_item(tx, &id)?;
            ids.insert(id, path.node_id().to_string());
        } else {
            tx.set(&Path::new(id, LEVEL), level)?;
        }
    }
    tx.set_selection(remap_selection(&selection, &ids))
}

fn list_is_ordered(doc: &Document, item_id: &str) -> Option<bool> {
    let (list_id, _) = doc.owner_of(item_id)?;
    doc.get(list_id)?.get(ORDERED)?.as_bool()
}

/// List type of the schema and the item type it holds
fn list_types(doc: &Document) -> DocumentResult<(String, String)> {
    let list = doc
        .schema()
        .types()
        .find(|t| t.kind() == NodeKind::List)
        .ok_or_else(|| DocumentError::schema(format!("schema '{}' has no list type", doc.schema().name())))?;
    let item = list
        .get_property(ITEMS)
        .and_then(|spec| spec.kind.targets().first())
        .cloned()
        .ok_or_else(|| DocumentError::schema(format!("list type '{}' has no item type", list.name())))?;
    Ok((list.name().to_string(), item))
}

/// Replace a text node by a list item. The item joins the list right
/// before the node when it has the same kind, otherwise a new list is
/// created in its place.
pub(crate) fn listify(doc: &mut Document, id: &str, ordered: bool) -> DocumentResult<Path> {
    let (list_type, item_type) = list_types(doc)?;
    let slot = slot_of(doc, id)?;
    let old_path = require_text_path(doc, id)?;
    let content = doc.get_text(&old_path)?.to_string();

    let previous = {
        let siblings = doc.container(&slot.path)?;
        slot.pos
            .checked_sub(1)
            .and_then(|pos| siblings.get_at(pos))
            .filter(|node| node.node_type == list_type && node.get(ORDERED).and_then(Value::as_bool) == Some(ordered))
            .map(|node| node.id.clone())
    };

    let item_path = create_text_node(doc, NodeData::new(item_type), &content)?;
    let item_id = item_path.node_id().to_string();
    transfer_annotations(doc, &old_path, 0, &item_path, 0)?;

    match previous {
        Some(list_id) => {
            debug!(list = %list_id, item = %item_id, "joining previous list");
            container::append(doc, &Path::new(list_id, ITEMS), &item_id)?;
        }
        None => {
            let list_id = doc
                .create(
                    NodeData::new(list_type)
                        .with(ITEMS, vec![item_id.clone()])
                        .with(ORDERED, ordered),
                )?
                .id
                .clone();
            insert_into(doc, &slot, &list_id)?;
        }
    }
    remove_leaf(doc, id)?;
    Ok(item_path)
}

/// Replace a list item by a text node next to its list. Items after it
/// move to a new list so the order of the text is kept.
pub(crate) fn unlist_item(doc: &mut Document, item_id: &str) -> DocumentResult<Path> {
    let item_slot = slot_of(doc, item_id)?;
    let list_id = item_slot.path.node_id().to_string();
    let list_slot = slot_of(doc, &list_id)?;
    let list = doc.get_strict(&list_id)?.clone();
    let items = list.get_strings(ITEMS).unwrap_or(&[]);
    let tail: Vec<String> = items.get(item_slot.pos + 1..).unwrap_or(&[]).to_vec();
    let ordered = list.get(ORDERED).cloned().unwrap_or(Value::Bool(false));

    let text_type = text_type_for(doc, &list_slot.path)?;
    let old_path = require_text_path(doc, item_id)?;
    let content = doc.get_text(&old_path)?.to_string();
    let new_path = create_text_node(doc, NodeData::new(text_type), &content)?;
    transfer_annotations(doc, &old_path, 0, &new_path, 0)?;
    deep_delete_node(doc, item_id)?;

    let has_head = item_slot.pos > 0;
    if has_head && !tail.is_empty() {
        doc.update(&item_slot.path, DiffOp::delete(item_slot.pos, item_slot.pos + tail.len()))?;
        let rest = doc
            .create(NodeData::new(list.node_type.clone()).with(ITEMS, tail).with(ORDERED, ordered))?
            .id
            .clone();
        insert_into(
            doc,
            &Slot {
                path: list_slot.path.clone(),
                pos: list_slot.pos + 1,
            },
            &rest,
        )?;
    }

    let pos = if has_head { list_slot.pos + 1 } else { list_slot.pos };
    insert_into(
        doc,
        &Slot {
            path: list_slot.path,
            pos,
        },
        new_path.node_id(),
    )?;

    let emptied = doc
        .get(&list_id)
        .and_then(|node| node.get_strings(ITEMS))
        .map_or(false, |items| items.is_empty());
    if emptied {
        deep_delete_node(doc, &list_id)?;
    }
    Ok(new_path)
}
