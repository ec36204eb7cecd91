use folio_document::helpers::check_integrity;
use folio_document::{container, Document, DocumentSession, SessionConfig, Transaction};
use folio_editing::{
    break_node, delete, delete_text_range, dedent, indent, insert_block_node, insert_inline_node, insert_text, paste,
    select_all, switch_text_type, toggle_list, Direction, Edit, PasteContent, INLINE_PLACEHOLDER,
};
use folio_model::{
    prose, Coordinate, CustomSelection, DocumentError, DocumentResult, DocumentSnapshot, NodeData,
    NodeSelectionMode, Path, Selection, Value,
};
use serde_json::json;

const FIXTURE: &str = r#"{
    "schema": "prose",
    "nodes": [
        {"id": "body", "type": "container", "nodes": ["p1", "l1", "f1"]},
        {"id": "p1", "type": "paragraph", "content": "Hello world"},
        {"id": "l1", "type": "list", "items": ["li1", "li2"]},
        {"id": "li1", "type": "list-item", "content": "one"},
        {"id": "li2", "type": "list-item", "content": "two"},
        {"id": "f1", "type": "figure", "caption": "c1"},
        {"id": "c1", "type": "paragraph", "content": "A caption"},
        {"id": "s1", "type": "strong",
            "start": {"path": ["p1", "content"], "offset": 0},
            "end": {"path": ["p1", "content"], "offset": 5}},
        {"id": "cm1", "type": "comment", "container_path": ["body", "nodes"],
            "start": {"path": ["p1", "content"], "offset": 6},
            "end": {"path": ["li2", "content"], "offset": 2}}
    ]
}"#;

fn fixture() -> Document {
    let snapshot = DocumentSnapshot::from_json(FIXTURE).unwrap();
    Document::load(prose::schema().unwrap(), &snapshot).unwrap()
}

fn content(id: &str) -> Path {
    Path::new(id, "content")
}

fn body() -> Path {
    Path::new("body", "nodes")
}

fn caret(id: &str, offset: usize) -> Selection {
    Selection::collapsed(Coordinate::new(content(id), offset)).within(body())
}

fn range(id: &str, start: usize, end: usize) -> Selection {
    Selection::property(content(id), start, end).within(body())
}

/// Run `f` in a transaction and return the selection it leaves
fn edit<F>(doc: &mut Document, selection: Selection, f: F) -> DocumentResult<Selection>
where
    F: FnOnce(&mut Transaction<'_>) -> DocumentResult<()>,
{
    let ((), change) = doc.transaction(selection, f)?;
    Ok(change.after)
}

/// Top-level blocks of the body: `type: text` for text blocks, items for
/// lists, the type name for anything else
fn outline(doc: &Document) -> Vec<String> {
    let text = |id: &str| doc.get(id).and_then(|n| n.get_str("content")).unwrap_or_default().to_string();
    doc.get("body")
        .unwrap()
        .get_strings("nodes")
        .unwrap()
        .iter()
        .map(|id| {
            let node = doc.get(id).unwrap();
            match node.node_type.as_str() {
                "list" => {
                    let items: Vec<String> =
                        node.get_strings("items").unwrap().iter().map(|i| text(i.as_str())).collect();
                    format!("list[{}]", items.join(", "))
                }
                "figure" | "image" => node.node_type.clone(),
                other => format!("{}: {}", other, text(id.as_str())),
            }
        })
        .collect()
}

fn body_id(doc: &Document, pos: usize) -> String {
    doc.get("body").unwrap().get_strings("nodes").unwrap()[pos].clone()
}

fn offsets(doc: &Document, id: &str) -> (usize, usize) {
    let node = doc.get(id).unwrap();
    (node.start().unwrap().offset, node.end().unwrap().offset)
}

fn endpoint(doc: &Document, id: &str, property: &str) -> (String, usize) {
    let coordinate = doc.get(id).unwrap().get(property).unwrap().as_coordinate().unwrap().clone();
    (coordinate.node_id().to_string(), coordinate.offset)
}

fn add_list_item(doc: &mut Document, list: &str, id: &str, text: &str) {
    doc.transaction(Selection::Null, |tx| {
        tx.create(NodeData::new("list-item").with_id(id).with("content", text))?;
        container::append(tx, &Path::new(list, "items"), id)
    })
    .unwrap();
}

fn add_paragraph(doc: &mut Document, pos: usize, id: &str, text: &str) {
    doc.transaction(Selection::Null, |tx| {
        tx.create(NodeData::new("paragraph").with_id(id).with("content", text))?;
        container::insert_at(tx, &body(), pos, id)
    })
    .unwrap();
}

fn add_code(doc: &mut Document, id: &str, text_node: &str, start: usize, end: usize) {
    doc.transaction(Selection::Null, |tx| {
        tx.create(
            NodeData::new("code")
                .with_id(id)
                .with("start", Coordinate::new(content(text_node), start))
                .with("end", Coordinate::new(content(text_node), end)),
        )
        .map(|_| ())
    })
    .unwrap();
}

// -- typing -----------------------------------------------------------------

#[test]
fn test_insert_text_moves_annotations() -> anyhow::Result<()> {
    let mut doc = fixture();
    let after = edit(&mut doc, caret("p1", 5), |tx| insert_text(tx, ", dear"))?;

    assert_eq!(doc.get_text(&content("p1"))?, "Hello, dear world");
    assert_eq!(offsets(&doc, "s1"), (0, 11));
    assert_eq!(endpoint(&doc, "cm1", "start"), ("p1".to_string(), 12));
    assert_eq!(after, caret("p1", 11));
    Ok(())
}

#[test]
fn test_typeover_keeps_annotation_start() -> anyhow::Result<()> {
    let mut doc = fixture();
    edit(&mut doc, range("p1", 0, 5), |tx| insert_text(tx, "Bye"))?;

    assert_eq!(doc.get_text(&content("p1"))?, "Bye world");
    assert_eq!(offsets(&doc, "s1"), (0, 3));
    assert_eq!(endpoint(&doc, "cm1", "start"), ("p1".to_string(), 4));
    Ok(())
}

#[test]
fn test_code_annotation_does_not_grow_at_its_end() -> anyhow::Result<()> {
    let mut doc = fixture();
    add_code(&mut doc, "k1", "c1", 2, 9);

    edit(&mut doc, caret("c1", 9), |tx| insert_text(tx, "!"))?;

    assert_eq!(doc.get_text(&content("c1"))?, "A caption!");
    assert_eq!(offsets(&doc, "k1"), (2, 9));
    Ok(())
}

#[test]
fn test_typeover_extends_code_annotation_ending_at_selection() -> anyhow::Result<()> {
    let mut doc = fixture();
    add_code(&mut doc, "k1", "c1", 0, 2);

    edit(&mut doc, range("c1", 2, 4), |tx| insert_text(tx, "x"))?;

    assert_eq!(doc.get_text(&content("c1"))?, "A xption");
    assert_eq!(offsets(&doc, "k1"), (0, 3));
    Ok(())
}

#[test]
fn test_collapsed_code_annotation_moves_with_typing() -> anyhow::Result<()> {
    let mut doc = fixture();
    add_code(&mut doc, "k1", "c1", 3, 3);

    edit(&mut doc, caret("c1", 3), |tx| insert_text(tx, "x"))?;

    assert_eq!(doc.get_text(&content("c1"))?, "A cxaption");
    assert_eq!(offsets(&doc, "k1"), (4, 4));
    Ok(())
}

#[test]
fn test_insert_text_after_a_block_creates_a_paragraph() -> anyhow::Result<()> {
    let mut doc = fixture();
    let selection = Selection::node(body(), "f1", NodeSelectionMode::After);
    let after = edit(&mut doc, selection, |tx| insert_text(tx, "Tail"))?;

    let id = body_id(&doc, 3);
    assert_eq!(outline(&doc)[3], "paragraph: Tail");
    assert_eq!(after, Selection::collapsed(Coordinate::new(content(&id), 4)).within(body()));
    Ok(())
}

#[test]
fn test_insert_text_over_container_selection() -> anyhow::Result<()> {
    let mut doc = fixture();
    let selection = Selection::container(
        body(),
        Coordinate::new(content("p1"), 6),
        Coordinate::new(content("li2"), 1),
    );
    let after = edit(&mut doc, selection, |tx| insert_text(tx, "X"))?;

    assert_eq!(outline(&doc), vec!["paragraph: Hello Xwo", "figure"]);
    assert_eq!(after, caret("p1", 7));
    assert!(check_integrity(&doc).is_empty());
    Ok(())
}

// -- deleting ---------------------------------------------------------------

#[test]
fn test_backspace_one_character() -> anyhow::Result<()> {
    let mut doc = fixture();
    let after = edit(&mut doc, caret("p1", 3), |tx| delete(tx, Direction::Left))?;

    assert_eq!(doc.get_text(&content("p1"))?, "Helo world");
    assert_eq!(offsets(&doc, "s1"), (0, 4));
    assert_eq!(after, caret("p1", 2));
    Ok(())
}

#[test]
fn test_delete_range() -> anyhow::Result<()> {
    let mut doc = fixture();
    let after = edit(&mut doc, range("p1", 2, 8), |tx| delete(tx, Direction::Left))?;

    assert_eq!(doc.get_text(&content("p1"))?, "Herld");
    assert_eq!(offsets(&doc, "s1"), (0, 2));
    assert_eq!(endpoint(&doc, "cm1", "start"), ("p1".to_string(), 2));
    assert_eq!(after, caret("p1", 2));
    Ok(())
}

#[test]
fn test_backspace_merges_list_items() -> anyhow::Result<()> {
    let mut doc = fixture();
    let after = edit(&mut doc, caret("li2", 0), |tx| delete(tx, Direction::Left))?;

    assert_eq!(outline(&doc), vec!["paragraph: Hello world", "list[onetwo]", "figure"]);
    assert!(doc.get("li2").is_none());
    assert_eq!(endpoint(&doc, "cm1", "end"), ("li1".to_string(), 5));
    assert_eq!(after, caret("li1", 3));
    assert!(check_integrity(&doc).is_empty());
    Ok(())
}

#[test]
fn test_backspace_in_first_list_item_leaves_the_list() -> anyhow::Result<()> {
    let mut doc = fixture();
    let after = edit(&mut doc, caret("li1", 0), |tx| delete(tx, Direction::Left))?;

    assert_eq!(outline(&doc), vec!["paragraph: Hello world", "paragraph: one", "list[two]", "figure"]);
    let id = body_id(&doc, 1);
    assert_eq!(after, Selection::collapsed(Coordinate::new(content(&id), 0)).within(body()));
    Ok(())
}

#[test]
fn test_backspace_at_document_start_does_nothing() -> anyhow::Result<()> {
    let mut doc = fixture();
    let before = doc.snapshot();
    let after = edit(&mut doc, caret("p1", 0), |tx| delete(tx, Direction::Left))?;

    assert_eq!(doc.snapshot(), before);
    assert_eq!(after, caret("p1", 0));
    Ok(())
}

#[test]
fn test_delete_at_end_merges_next_block() -> anyhow::Result<()> {
    let mut doc = fixture();
    let after = edit(&mut doc, caret("p1", 11), |tx| delete(tx, Direction::Right))?;

    assert_eq!(outline(&doc), vec!["paragraph: Hello worldone", "list[two]", "figure"]);
    assert_eq!(after, caret("p1", 11));
    Ok(())
}

#[test]
fn test_backspace_after_a_block_selects_it() -> anyhow::Result<()> {
    let mut doc = fixture();
    let after = edit(&mut doc, Selection::node(body(), "f1", NodeSelectionMode::After), break_node)?;
    let id = body_id(&doc, 3);
    assert_eq!(after, Selection::collapsed(Coordinate::new(content(&id), 0)).within(body()));

    let after = edit(&mut doc, after, |tx| delete(tx, Direction::Left))?;
    assert_eq!(after, Selection::node(body(), "f1", NodeSelectionMode::Full));
    assert!(doc.get("f1").is_some());
    Ok(())
}

#[test]
fn test_delete_selected_block() -> anyhow::Result<()> {
    let mut doc = fixture();
    let after = edit(&mut doc, Selection::node(body(), "f1", NodeSelectionMode::Full), |tx| {
        delete(tx, Direction::Left)
    })?;

    assert_eq!(outline(&doc), vec!["paragraph: Hello world", "list[one, two]", "paragraph: "]);
    assert!(doc.get("f1").is_none());
    assert!(doc.get("c1").is_none());
    let id = body_id(&doc, 2);
    assert_eq!(after, Selection::collapsed(Coordinate::new(content(&id), 0)).within(body()));
    Ok(())
}

#[test]
fn test_delete_before_block_in_other_direction_does_nothing() -> anyhow::Result<()> {
    let mut doc = fixture();
    let before = doc.snapshot();
    edit(&mut doc, Selection::node(body(), "f1", NodeSelectionMode::Before), |tx| {
        delete(tx, Direction::Left)
    })?;

    assert_eq!(doc.snapshot(), before);
    Ok(())
}

#[test]
fn test_delete_across_blocks() -> anyhow::Result<()> {
    let mut doc = fixture();
    let selection = Selection::container(
        body(),
        Coordinate::new(content("p1"), 6),
        Coordinate::new(content("li2"), 1),
    );
    let after = edit(&mut doc, selection, |tx| delete(tx, Direction::Left))?;

    assert_eq!(outline(&doc), vec!["paragraph: Hello wo", "figure"]);
    assert!(doc.get("l1").is_none());
    assert_eq!(endpoint(&doc, "cm1", "start"), ("p1".to_string(), 6));
    assert_eq!(endpoint(&doc, "cm1", "end"), ("p1".to_string(), 7));
    assert_eq!(after, caret("p1", 6));
    assert!(check_integrity(&doc).is_empty());
    Ok(())
}

// -- breaking ---------------------------------------------------------------

#[test]
fn test_break_paragraph() -> anyhow::Result<()> {
    let mut doc = fixture();
    let after = edit(&mut doc, caret("p1", 5), break_node)?;

    assert_eq!(outline(&doc), vec!["paragraph: Hello", "paragraph:  world", "list[one, two]", "figure"]);
    let id = body_id(&doc, 1);
    assert_eq!(offsets(&doc, "s1"), (0, 5));
    assert_eq!(endpoint(&doc, "cm1", "start"), (id.clone(), 1));
    assert_eq!(after, Selection::collapsed(Coordinate::new(content(&id), 0)).within(body()));
    assert!(check_integrity(&doc).is_empty());
    Ok(())
}

#[test]
fn test_break_list_item() -> anyhow::Result<()> {
    let mut doc = fixture();
    edit(&mut doc, caret("li1", 1), break_node)?;

    assert_eq!(outline(&doc), vec!["paragraph: Hello world", "list[o, ne, two]", "figure"]);
    assert_eq!(doc.get(&body_id(&doc, 1)).unwrap().get_strings("items").unwrap()[0], "li1");
    Ok(())
}

#[test]
fn test_break_in_empty_list_item_leaves_the_list() -> anyhow::Result<()> {
    let mut doc = fixture();
    edit(&mut doc, caret("li2", 0), |tx| delete_text_range(tx, &content("li2"), 0, 3))?;
    assert_eq!(endpoint(&doc, "cm1", "end"), ("li2".to_string(), 0));

    edit(&mut doc, caret("li2", 0), break_node)?;

    assert_eq!(outline(&doc), vec!["paragraph: Hello world", "list[one]", "paragraph: ", "figure"]);
    assert!(doc.get("li2").is_none());
    assert!(check_integrity(&doc).is_empty());
    Ok(())
}

#[test]
fn test_break_at_end_of_heading_continues_with_paragraph() -> anyhow::Result<()> {
    let mut doc = fixture();
    let heading = NodeData::new("heading").with("level", 2);
    let after = edit(&mut doc, caret("p1", 11), |tx| switch_text_type(tx, heading))?;
    let after = edit(&mut doc, after, break_node)?;

    assert_eq!(outline(&doc)[..2], ["heading: Hello world".to_string(), "paragraph: ".to_string()]);
    assert!(after.is_collapsed());
    Ok(())
}

// -- text types -------------------------------------------------------------

#[test]
fn test_switch_text_type() -> anyhow::Result<()> {
    let mut doc = fixture();
    let heading = NodeData::new("heading").with("level", 2);
    let after = edit(&mut doc, caret("p1", 3), |tx| switch_text_type(tx, heading))?;

    let id = body_id(&doc, 0);
    let node = doc.get(&id).unwrap();
    assert_eq!(node.node_type, "heading");
    assert_eq!(node.get("level"), Some(&Value::Int(2)));
    assert!(doc.get("p1").is_none());
    assert_eq!(endpoint(&doc, "s1", "end"), (id.clone(), 5));
    assert_eq!(endpoint(&doc, "cm1", "start"), (id.clone(), 6));
    assert_eq!(after, Selection::collapsed(Coordinate::new(content(&id), 3)).within(body()));

    let level = NodeData::new("heading").with("level", 3);
    edit(&mut doc, after, |tx| switch_text_type(tx, level))?;
    assert_eq!(doc.get(&id).unwrap().get("level"), Some(&Value::Int(3)));
    Ok(())
}

#[test]
fn test_switch_text_type_skips_list_items() {
    let mut doc = fixture();
    let result = edit(&mut doc, caret("li1", 0), |tx| switch_text_type(tx, NodeData::new("heading")));
    assert!(matches!(result, Err(DocumentError::InvalidState { .. })));
}

// -- blocks -----------------------------------------------------------------

#[test]
fn test_insert_block_splits_paragraph() -> anyhow::Result<()> {
    let mut doc = fixture();
    let mut id = String::new();
    let after = edit(&mut doc, caret("p1", 5), |tx| {
        id = insert_block_node(tx, NodeData::new("image").with("src", "cat.png"))?;
        Ok(())
    })?;

    assert_eq!(
        outline(&doc),
        vec!["paragraph: Hello", "image", "paragraph:  world", "list[one, two]", "figure"]
    );
    assert_eq!(body_id(&doc, 1), id);
    assert_eq!(after, Selection::node(body(), id, NodeSelectionMode::Full));
    Ok(())
}

#[test]
fn test_insert_block_at_paragraph_start() -> anyhow::Result<()> {
    let mut doc = fixture();
    edit(&mut doc, caret("p1", 0), |tx| insert_block_node(tx, NodeData::new("image")).map(|_| ()))?;

    assert_eq!(outline(&doc)[..2], ["image".to_string(), "paragraph: Hello world".to_string()]);
    Ok(())
}

#[test]
fn test_insert_block_replaces_emptied_paragraph() -> anyhow::Result<()> {
    let mut doc = fixture();
    edit(&mut doc, range("p1", 0, 11), |tx| insert_block_node(tx, NodeData::new("image")).map(|_| ()))?;

    assert_eq!(outline(&doc), vec!["image", "list[one, two]", "figure"]);
    assert!(doc.get("p1").is_none());
    assert!(doc.get("s1").is_none());
    assert!(check_integrity(&doc).is_empty());
    Ok(())
}

#[test]
fn test_insert_block_into_list_is_rejected() {
    let mut doc = fixture();
    let before = doc.snapshot();
    let result = edit(&mut doc, caret("li1", 1), |tx| insert_block_node(tx, NodeData::new("image")).map(|_| ()));

    assert!(matches!(result, Err(DocumentError::InvalidState { .. })));
    assert_eq!(doc.snapshot(), before);
}

#[test]
fn test_insert_block_rejects_annotation_types() {
    let mut doc = fixture();
    let result = edit(&mut doc, caret("p1", 1), |tx| insert_block_node(tx, NodeData::new("strong")).map(|_| ()));
    assert!(matches!(result, Err(DocumentError::InvalidState { .. })));
}

#[test]
fn test_inline_node_is_deleted_with_its_character() -> anyhow::Result<()> {
    let mut doc = fixture();
    let mut id = String::new();
    let after = edit(&mut doc, caret("p1", 6), |tx| {
        id = insert_inline_node(tx, NodeData::new("mention").with("target", "@ada"))?;
        Ok(())
    })?;

    assert_eq!(doc.get_text(&content("p1"))?, format!("Hello {}world", INLINE_PLACEHOLDER));
    assert_eq!(offsets(&doc, &id), (6, 7));
    assert_eq!(after, caret("p1", 7));

    edit(&mut doc, caret("p1", 6), |tx| delete(tx, Direction::Right))?;
    assert_eq!(doc.get_text(&content("p1"))?, "Hello world");
    assert!(doc.get(&id).is_none());
    Ok(())
}

#[test]
fn test_inline_node_needs_text_selection() {
    let mut doc = fixture();
    let selection = Selection::node(body(), "f1", NodeSelectionMode::Full);
    let result = edit(&mut doc, selection, |tx| insert_inline_node(tx, NodeData::new("mention")).map(|_| ()));
    assert!(matches!(result, Err(DocumentError::InvalidState { .. })));
}

// -- lists ------------------------------------------------------------------

#[test]
fn test_toggle_list_wraps_paragraph() -> anyhow::Result<()> {
    let mut doc = fixture();
    let after = edit(&mut doc, caret("p1", 2), |tx| toggle_list(tx, false))?;

    assert_eq!(outline(&doc), vec!["list[Hello world]", "list[one, two]", "figure"]);
    let list = body_id(&doc, 0);
    let item = doc.get(&list).unwrap().get_strings("items").unwrap()[0].clone();
    assert_eq!(endpoint(&doc, "s1", "start"), (item.clone(), 0));
    assert_eq!(after, Selection::collapsed(Coordinate::new(content(&item), 2)).within(body()));
    assert!(check_integrity(&doc).is_empty());
    Ok(())
}

#[test]
fn test_toggle_list_unwraps_item() -> anyhow::Result<()> {
    let mut doc = fixture();
    edit(&mut doc, caret("li1", 1), |tx| toggle_list(tx, false))?;

    assert_eq!(outline(&doc), vec!["paragraph: Hello world", "paragraph: one", "list[two]", "figure"]);
    Ok(())
}

#[test]
fn test_toggle_list_switches_list_kind() -> anyhow::Result<()> {
    let mut doc = fixture();
    let after = edit(&mut doc, caret("li1", 1), |tx| toggle_list(tx, true))?;

    assert_eq!(doc.get("l1").unwrap().get("ordered"), Some(&Value::Bool(true)));
    assert_eq!(after, caret("li1", 1));
    Ok(())
}

#[test]
fn test_toggle_list_joins_previous_list() -> anyhow::Result<()> {
    let mut doc = fixture();
    add_paragraph(&mut doc, 2, "p2", "three");
    edit(&mut doc, caret("p2", 0), |tx| toggle_list(tx, false))?;

    assert_eq!(outline(&doc), vec!["paragraph: Hello world", "list[one, two, three]", "figure"]);
    Ok(())
}

#[test]
fn test_unlisting_a_middle_item_splits_the_list() -> anyhow::Result<()> {
    let mut doc = fixture();
    add_list_item(&mut doc, "l1", "li3", "three");
    edit(&mut doc, caret("li2", 0), |tx| toggle_list(tx, false))?;

    assert_eq!(
        outline(&doc),
        vec!["paragraph: Hello world", "list[one]", "paragraph: two", "list[three]", "figure"]
    );
    assert_eq!(doc.get_parent("li3").unwrap().id, body_id(&doc, 3));
    assert!(check_integrity(&doc).is_empty());
    Ok(())
}

#[test]
fn test_indent_and_dedent() -> anyhow::Result<()> {
    let mut doc = fixture();
    let level = |doc: &Document| doc.get("li1").and_then(|n| n.get_int("level"));

    let after = edit(&mut doc, caret("li1", 0), indent)?;
    assert_eq!(level(&doc), Some(2));
    let after = edit(&mut doc, after, dedent)?;
    assert_eq!(level(&doc), Some(1));
    edit(&mut doc, after, dedent)?;

    assert!(doc.get("li1").is_none());
    assert_eq!(outline(&doc), vec!["paragraph: Hello world", "paragraph: one", "list[two]", "figure"]);
    Ok(())
}

#[test]
fn test_indent_needs_a_list_item() {
    let mut doc = fixture();
    let result = edit(&mut doc, caret("p1", 0), indent);
    assert!(matches!(result, Err(DocumentError::InvalidState { .. })));
}

// -- paste ------------------------------------------------------------------

#[test]
fn test_paste_lines() -> anyhow::Result<()> {
    let mut doc = fixture();
    let after = edit(&mut doc, caret("p1", 5), |tx| paste(tx, &PasteContent::text("A\r\nB")))?;

    assert_eq!(outline(&doc)[..2], ["paragraph: HelloA".to_string(), "paragraph: B world".to_string()]);
    let id = body_id(&doc, 1);
    assert_eq!(after, Selection::collapsed(Coordinate::new(content(&id), 1)).within(body()));
    Ok(())
}

#[test]
fn test_paste_text_block_inline() -> anyhow::Result<()> {
    let mut doc = fixture();
    let copied = PasteContent::copy(&doc, &["p1".to_string()])?;
    let after = edit(&mut doc, caret("li1", 3), |tx| paste(tx, &copied))?;

    assert_eq!(doc.get_text(&content("li1"))?, "oneHello world");
    let strong = doc.get_annotations(&content("li1"));
    assert_eq!(strong.len(), 1);
    assert_eq!(strong[0].start().unwrap().offset, 3);
    assert_eq!(strong[0].end().unwrap().offset, 8);
    assert_eq!(after, caret("li1", 14));
    Ok(())
}

#[test]
fn test_paste_list_after_paragraph() -> anyhow::Result<()> {
    let mut doc = fixture();
    let copied = PasteContent::copy(&doc, &["l1".to_string()])?;
    let after = edit(&mut doc, caret("p1", 11), |tx| paste(tx, &copied))?;

    assert_eq!(
        outline(&doc),
        vec!["paragraph: Hello world", "list[one, two]", "list[one, two]", "figure"]
    );
    let pasted = body_id(&doc, 1);
    assert_ne!(pasted, "l1");
    assert_eq!(after, Selection::node(body(), pasted, NodeSelectionMode::After));
    assert!(check_integrity(&doc).is_empty());
    Ok(())
}

#[test]
fn test_paste_figure_copies_caption() -> anyhow::Result<()> {
    let mut doc = fixture();
    let copied = PasteContent::copy(&doc, &["f1".to_string()])?;
    edit(&mut doc, Selection::node(body(), "f1", NodeSelectionMode::After), |tx| paste(tx, &copied))?;

    let pasted = body_id(&doc, 3);
    let caption = doc.get(&pasted).unwrap().get_str("caption").unwrap().to_string();
    assert_ne!(caption, "c1");
    assert_eq!(doc.get_text(&content(&caption))?, "A caption");
    assert_eq!(doc.get_parent(&caption).unwrap().id, pasted);
    assert!(check_integrity(&doc).is_empty());
    Ok(())
}

#[test]
fn test_verbs_need_a_usable_selection() {
    let mut doc = fixture();
    let custom = Selection::Custom(CustomSelection {
        custom_type: "table-cells".to_string(),
        data: json!({"rows": [0, 1]}),
    });

    let result = edit(&mut doc, custom, |tx| insert_text(tx, "x"));
    assert!(matches!(result, Err(DocumentError::InvalidState { .. })));

    let result = edit(&mut doc, Selection::Null, break_node);
    assert!(matches!(result, Err(DocumentError::InvalidState { .. })));

    let result = edit(&mut doc, Selection::Null, |tx| paste(tx, &PasteContent::text("x")));
    assert!(matches!(result, Err(DocumentError::InvalidState { .. })));
}

// -- commands ---------------------------------------------------------------

#[test]
fn test_select_all() -> anyhow::Result<()> {
    let doc = fixture();
    let selection = select_all(&doc, &body())?;

    assert_eq!(
        selection,
        Selection::container(body(), Coordinate::new(content("p1"), 0), Coordinate::new(content("li2"), 3))
    );
    assert_eq!(select_all(&doc, &Path::new("l1", "items"))?.container_path(), Some(&Path::new("l1", "items")));
    Ok(())
}

#[test]
fn test_annotate_command() -> anyhow::Result<()> {
    let mut doc = fixture();
    let command: Edit = serde_json::from_value(json!({
        "verb": "annotate",
        "args": {"node": {"type": "emphasis"}}
    }))?;

    let after = edit(&mut doc, range("c1", 2, 9), |tx| command.apply(tx))?;

    let emphasis = doc.get_annotations(&content("c1"));
    assert_eq!(emphasis.len(), 1);
    assert_eq!(emphasis[0].node_type, "emphasis");
    assert_eq!(after, range("c1", 2, 9));
    Ok(())
}

#[test]
fn test_command_sequence() -> anyhow::Result<()> {
    let mut doc = fixture();
    let commands: Vec<Edit> = serde_json::from_value(json!([
        {"verb": "insertText", "args": {"text": "!"}},
        {"verb": "break"},
        {"verb": "insertText", "args": {"text": "New"}},
        {"verb": "toggleList", "args": {"ordered": true}}
    ]))?;

    let mut selection = caret("p1", 11);
    for command in &commands {
        selection = edit(&mut doc, selection, |tx| command.apply(tx))?;
    }

    assert_eq!(
        outline(&doc),
        vec!["paragraph: Hello world!", "list[New]", "list[one, two]", "figure"]
    );
    assert_eq!(doc.get(&body_id(&doc, 1)).unwrap().get("ordered"), Some(&Value::Bool(true)));
    assert!(check_integrity(&doc).is_empty());
    Ok(())
}

#[test]
fn test_session_undo_restores_typing() -> anyhow::Result<()> {
    let snapshot = DocumentSnapshot::from_json(FIXTURE)?;
    let mut session = DocumentSession::load("typing", prose::schema()?, &snapshot, &SessionConfig::default())?;
    session.set_selection(caret("p1", 5))?;

    session.transaction(|tx| insert_text(tx, ","))?;
    session.transaction(break_node)?;
    assert_eq!(session.document().get_text(&content("p1"))?, "Hello,");

    assert!(session.undo()?);
    assert!(session.undo()?);
    assert_eq!(session.document().get_text(&content("p1"))?, "Hello world");
    assert_eq!(offsets(session.document(), "s1"), (0, 5));
    assert_eq!(session.selection(), &caret("p1", 5));
    Ok(())
}
