//! Serializable editing commands, dispatched to the verbs.

use crate::block_verbs::{insert_block_node, insert_inline_node, switch_text_type};
use crate::context::{leaf_ids, text_len, text_path};
use crate::list_verbs::{dedent, indent, toggle_list};
use crate::paste::{paste, PasteContent};
use crate::text_verbs::{break_node, delete, insert_text, Direction};
use folio_document::{annotations, Document, Transaction};
use folio_model::{Coordinate, DocumentResult, NodeData, Path, Selection};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// One editing command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "verb", content = "args", rename_all = "camelCase")]
pub enum Edit {
    InsertText {
        text: String,
    },
    Delete {
        #[serde(default)]
        direction: Direction,
    },
    Break,
    InsertBlockNode {
        node: NodeData,
    },
    InsertInlineNode {
        node: NodeData,
    },
    SwitchTextType {
        node: NodeData,
    },
    ToggleList {
        #[serde(default)]
        ordered: bool,
    },
    Indent,
    Dedent,
    Paste {
        content: PasteContent,
    },
    Annotate {
        node: NodeData,
    },
    SelectAll {
        #[serde(rename = "containerPath")]
        container_path: Path,
    },
}

impl Edit {
    pub fn name(&self) -> &'static str {
        match self {
            Edit::InsertText { .. } => "insertText",
            Edit::Delete { .. } => "delete",
            Edit::Break => "break",
            Edit::InsertBlockNode { .. } => "insertBlockNode",
            Edit::InsertInlineNode { .. } => "insertInlineNode",
            Edit::SwitchTextType { .. } => "switchTextType",
            Edit::ToggleList { .. } => "toggleList",
            Edit::Indent => "indent",
            Edit::Dedent => "dedent",
            Edit::Paste { .. } => "paste",
            Edit::Annotate { .. } => "annotate",
            Edit::SelectAll { .. } => "selectAll",
        }
    }

    /// Run the command against the transaction's selection
    pub fn apply(&self, tx: &mut Transaction<'_>) -> DocumentResult<()> {
        debug!(verb = self.name(), "applying edit");
        match self {
            Edit::InsertText { text } => insert_text(tx, text),
            Edit::Delete { direction } => delete(tx, *direction),
            Edit::Break => break_node(tx),
            Edit::InsertBlockNode { node } => insert_block_node(tx, node.clone()).map(|_| ()),
            Edit::InsertInlineNode { node } => insert_inline_node(tx, node.clone()).map(|_| ()),
            Edit::SwitchTextType { node } => switch_text_type(tx, node.clone()),
            Edit::ToggleList { ordered } => toggle_list(tx, *ordered),
            Edit::Indent => indent(tx),
            Edit::Dedent => dedent(tx),
            Edit::Paste { content } => paste(tx, content),
            Edit::Annotate { node } => annotate(tx, node.clone()).map(|_| ()),
            Edit::SelectAll { container_path } => {
                let selection = select_all(tx, container_path)?;
                tx.set_selection(selection)
            }
        }
    }
}

/// Annotate the selected range; the selection is left as it is
#[instrument(skip(tx, data), fields(selection = tx.selection().kind_name(), node_type = %data.node_type))]
pub fn annotate(tx: &mut Transaction<'_>, data: NodeData) -> DocumentResult<String> {
    let selection = tx.selection().clone();
    annotations::annotate(tx, &selection, data)
}

/// Selection from the start of the first text in a container to the end
/// of the last one. Null when the container holds no text.
pub fn select_all(doc: &Document, container_path: &Path) -> DocumentResult<Selection> {
    let texts: Vec<Path> = leaf_ids(doc, container_path)?
        .iter()
        .filter_map(|id| text_path(doc, id))
        .collect();

    let (Some(first), Some(last)) = (texts.first(), texts.last()) else {
        return Ok(Selection::Null);
    };
    let end = text_len(doc, last)?;
    if first == last {
        return Ok(Selection::property(first.clone(), 0, end).within(container_path.clone()));
    }
    Ok(Selection::container(
        container_path.clone(),
        Coordinate::new(first.clone(), 0),
        Coordinate::new(last.clone(), end),
    ))
}
