//! Inserting block and inline nodes, and re-typing text blocks.

use crate::context::{
    accepts, caret, container_of, insert_into, kind_of, no_selection, remap_selection, remove_leaf,
    replace_text_node, selected_leaves, slot_of, text_len, unsupported, Slot,
};
use crate::property_edit::insert_text_at;
use crate::text_verbs::{delete_container_range, delete_selected, node_slot, split_text_node};
use folio_document::{Document, Transaction};
use folio_model::{
    Coordinate, DocumentError, DocumentResult, NodeData, NodeKind, NodeSelectionMode, Path, Selection,
};
use std::collections::HashMap;
use tracing::{debug, instrument};

/// Text of an inline node
pub const INLINE_PLACEHOLDER: &str = "\u{FEFF}";

/// Where new blocks go for a selection
pub(crate) struct BlockTarget {
    pub slot: Slot,
    /// Node the new blocks replace
    pub replaced: Option<String>,
    pub container: Path,
}

/// Resolve the insertion point for blocks of `types`. Selected text is
/// deleted and the text node at the caret is split when the caret is in
/// its middle. An empty text node is replaced.
pub(crate) fn block_target(
    doc: &mut Document,
    selection: &Selection,
    types: &[String],
    verb: &str,
) -> DocumentResult<BlockTarget> {
    match selection {
        Selection::Null => Err(no_selection(verb)),
        Selection::Custom(_) => Err(unsupported(verb, selection)),
        Selection::Node(sel) => {
            let slot = node_slot(doc, sel)?;
            ensure_accepted(doc, &slot.path, types)?;
            Ok(BlockTarget {
                slot,
                replaced: (sel.mode == NodeSelectionMode::Full).then(|| sel.node_id.clone()),
                container: sel.container_path.clone(),
            })
        }
        Selection::Property(_) | Selection::Container(_) => {
            let anchor = selection
                .start()
                .ok_or_else(|| DocumentError::invalid_selection("selection has no start"))?;
            let id = anchor.node_id().to_string();
            let container = container_of(doc, &id, selection.container_path())?;
            let slot = slot_of(doc, &id)?;
            ensure_accepted(doc, &slot.path, types)?;

            let at = delete_selected(doc, selection)?.unwrap_or(anchor);
            let len = text_len(doc, &at.path)?;
            let (pos, replaced) = if len == 0 {
                (slot.pos, Some(id))
            } else if at.offset == 0 {
                (slot.pos, None)
            } else if at.offset == len {
                (slot.pos + 1, None)
            } else {
                split_text_node(doc, &at.path, at.offset)?;
                (slot.pos + 1, None)
            };
            Ok(BlockTarget {
                slot: Slot { path: slot.path, pos },
                replaced,
                container,
            })
        }
    }
}

fn ensure_accepted(doc: &Document, path: &Path, types: &[String]) -> DocumentResult<()> {
    for node_type in types {
        if !accepts(doc, path, node_type)? {
            return Err(DocumentError::invalid_state(format!("{} cannot hold '{}'", path, node_type)));
        }
    }
    Ok(())
}

/// Insert a block node at the selection and select it
#[instrument(skip(tx, data), fields(selection = tx.selection().kind_name(), node_type = %data.node_type))]
pub fn insert_block_node(tx: &mut Transaction<'_>, data: NodeData) -> DocumentResult<String> {
    let kind = tx.schema().get_strict(&data.node_type)?.kind();
    if kind.is_annotation() || kind == NodeKind::Container {
        return Err(DocumentError::invalid_state(format!("'{}' is not a block type", data.node_type)));
    }

    let selection = tx.selection().clone();
    let target = block_target(tx, &selection, &[data.node_type.clone()], "insert_block_node")?;
    let id = tx.create(data)?.id.clone();
    insert_into(tx, &target.slot, &id)?;
    if let Some(replaced) = &target.replaced {
        remove_leaf(tx, replaced)?;
    }

    tx.set_selection(Selection::node(target.container, id.clone(), NodeSelectionMode::Full))?;
    Ok(id)
}

/// Replace the selected text by an inline node
#[instrument(skip(tx, data), fields(selection = tx.selection().kind_name(), node_type = %data.node_type))]
pub fn insert_inline_node(tx: &mut Transaction<'_>, data: NodeData) -> DocumentResult<String> {
    if !tx.schema().get_strict(&data.node_type)?.is_inline_node() {
        return Err(DocumentError::invalid_state(format!("'{}' is not an inline node type", data.node_type)));
    }

    let selection = tx.selection().clone();
    let (path, start, end, container) = match &selection {
        Selection::Null => return Err(no_selection("insert_inline_node")),
        Selection::Property(sel) => (sel.path.clone(), sel.start_offset, sel.end_offset, sel.container_path.clone()),
        Selection::Container(sel) => {
            let at = delete_container_range(tx, sel)?;
            (at.path, at.offset, at.offset, Some(sel.container_path.clone()))
        }
        Selection::Node(_) | Selection::Custom(_) => return Err(unsupported("insert_inline_node", &selection)),
    };

    insert_text_at(tx, &path, start, end, INLINE_PLACEHOLDER)?;
    let id = tx
        .create(
            data.with("start", Coordinate::new(path.clone(), start))
                .with("end", Coordinate::new(path.clone(), start + 1)),
        )?
        .id
        .clone();

    tx.set_selection(caret(path, start + 1, container))?;
    Ok(id)
}

/// Re-type the selected text blocks. Blocks already of the target type
/// only take over the properties in `data`.
#[instrument(skip(tx, data), fields(selection = tx.selection().kind_name(), node_type = %data.node_type))]
pub fn switch_text_type(tx: &mut Transaction<'_>, data: NodeData) -> DocumentResult<()> {
    let target = tx.schema().get_strict(&data.node_type)?;
    if target.kind() != NodeKind::Text {
        return Err(DocumentError::invalid_state(format!("'{}' is not a text type", data.node_type)));
    }
    let text_property = target.text_property_name().map(str::to_string);

    let selection = tx.selection().clone();
    let mut blocks = Vec::new();
    for id in selected_leaves(tx, &selection, "switch_text_type")? {
        if kind_of(tx, &id)? == NodeKind::Text {
            blocks.push(id);
        }
    }
    if blocks.is_empty() {
        return Err(DocumentError::invalid_state("switch_text_type needs a text block"));
    }

    let single = blocks.len() == 1;
    let mut ids = HashMap::new();
    for id in blocks {
        if tx.get_strict(&id)?.node_type == data.node_type {
            for (name, value) in data.properties.iter().filter(|(name, _)| Some(*name) != text_property.as_ref()) {
                tx.set(&Path::new(id.clone(), name.clone()), value.clone())?;
            }
            continue;
        }

        let replacement = NodeData {
            id: if single { data.id.clone() } else { None },
            ..data.clone()
        };
        let path = replace_text_node(tx, &id, replacement)?;
        debug!(from = %id, to = %path.node_id(), "switched text type");
        ids.insert(id, path.node_id().to_string());
    }
    tx.set_selection(remap_selection(&selection, &ids))
}
