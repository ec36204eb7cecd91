use folio_document::annotations::{expand_annotation, fuse_annotations, truncate_annotation};
use folio_document::helpers::{check_integrity, copy_node, deep_delete_node, transfer_annotations};
use folio_document::index::{ContainerAnnotationIndex, TypeIndex, CONTAINER_ANNOTATION_INDEX, TYPE_INDEX};
use folio_document::{container, DiffOp, Document, DocumentIndex, DocumentSession, SessionConfig};
use folio_model::{
    prose, Coordinate, DocumentError, DocumentNode, DocumentSnapshot, NodeData, NodeType, Path, Selection, Value,
};
use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

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

fn offsets(doc: &Document, id: &str) -> (usize, usize) {
    let node = doc.get(id).unwrap();
    (node.start().unwrap().offset, node.end().unwrap().offset)
}

#[test]
fn test_load_and_snapshot_round_trip() {
    let doc = fixture();
    let snapshot = doc.snapshot();
    let again = Document::load(prose::schema().unwrap(), &snapshot).unwrap();

    assert_eq!(again.snapshot(), snapshot);
    assert_eq!(doc.get("l1").unwrap().get("ordered"), Some(&Value::Bool(false)));
    assert!(check_integrity(&doc).is_empty());
}

#[test]
fn test_load_rejects_other_schema() {
    let snapshot = DocumentSnapshot::new("slides");
    let result = Document::load(prose::schema().unwrap(), &snapshot);
    assert!(matches!(result, Err(DocumentError::Schema { .. })));
}

#[test]
fn test_parents_are_derived_from_owners() {
    let doc = fixture();

    assert_eq!(doc.get_parent("p1").unwrap().id, "body");
    assert_eq!(doc.get_parent("li2").unwrap().id, "l1");
    assert_eq!(doc.get_parent("c1").unwrap().id, "f1");
    assert_eq!(doc.get_parent("s1").unwrap().id, "p1");
    assert!(doc.get_parent("body").is_none());
}

#[test]
fn test_parents_do_not_depend_on_creation_order() {
    let mut doc = Document::new(prose::schema().unwrap());
    doc.transaction(Selection::Null, |tx| {
        tx.create(NodeData::new("container").with_id("body").with("nodes", vec!["p1"]))?;
        tx.create(NodeData::new("paragraph").with_id("p1").with("content", "late child"))?;
        Ok(())
    })
    .unwrap();

    assert_eq!(doc.get_parent("p1").unwrap().id, "body");
}

#[test]
fn test_parent_follows_array_updates() -> anyhow::Result<()> {
    let mut doc = fixture();
    doc.transaction(Selection::Null, |tx| {
        container::remove(tx, &Path::new("l1", "items"), "li2")?;
        container::insert_at(tx, &body(), 1, "li2")
    })?;

    assert_eq!(doc.get_parent("li2").unwrap().id, "body");
    assert_eq!(doc.container(&body())?.position_of("li2"), Some(1));
    Ok(())
}

#[test]
fn test_xpath() {
    let doc = fixture();

    let xpath = doc.get_xpath("li2").unwrap().to_array();
    assert_eq!(xpath.len(), 3);
    assert_eq!(xpath[0].id, "body");
    assert_eq!(xpath[1].id, "l1");
    assert_eq!((xpath[1].property.as_deref(), xpath[1].pos), (Some("nodes"), Some(1)));
    assert_eq!((xpath[2].property.as_deref(), xpath[2].pos), (Some("items"), Some(1)));

    let caption = doc.get_xpath("c1").unwrap().to_array();
    assert_eq!(caption[2].property.as_deref(), Some("caption"));
    assert_eq!(caption[2].pos, Some(0));

    let anno = doc.get_xpath("s1").unwrap();
    assert_eq!(anno.depth(), 3);
    assert_eq!(anno.entries()[2].property.as_deref(), Some("content"));
    assert_eq!(anno.entries()[2].pos, None);
    assert_eq!(anno.to_string(), "container#body/nodes[0]:paragraph#p1/content:strong#s1");
}

#[test]
fn test_mutations_need_a_transaction() {
    let mut doc = fixture();
    let result = doc.set(&content("p1"), "nope");
    assert!(matches!(result, Err(DocumentError::InvalidState { .. })));
}

#[test]
fn test_nested_transaction_fails() {
    let mut doc = fixture();
    let result = doc.transaction(Selection::Null, |tx| {
        tx.transaction(Selection::Null, |_| Ok(())).map(|_| ())
    });
    match result {
        Err(DocumentError::InvalidState { message }) => assert!(message.contains("already transacting")),
        other => panic!("unexpected {:?}", other),
    }
    assert!(!doc.is_transacting());
}

#[test]
fn test_failed_transaction_rolls_back_without_notifying() {
    let mut doc = fixture();
    let before = doc.snapshot();
    let notified = Rc::new(RefCell::new(0));
    let counter = notified.clone();
    doc.on_change(move |_| *counter.borrow_mut() += 1);

    let result = doc.transaction(Selection::Null, |tx| {
        tx.update(&content("p1"), DiffOp::insert(0, ">> "))?;
        tx.create(NodeData::new("paragraph").with_id("p9"))?;
        container::append(tx, &body(), "p9")?;
        tx.get_strict("missing").map(|_| ())
    });

    assert!(matches!(result, Err(DocumentError::NotFound { .. })));
    assert_eq!(*notified.borrow(), 0);
    assert!(doc.get("p9").is_none());
    assert_eq!(doc.get_text(&content("p1")).unwrap(), "Hello world");
    assert_eq!(doc.container(&body()).unwrap().len(), 3);
    assert_eq!(
        doc.snapshot().nodes.len(),
        before.nodes.len(),
    );
}

#[test]
fn test_listeners_get_one_change_in_registration_order() {
    let mut doc = fixture();
    let log = Rc::new(RefCell::new(Vec::new()));

    let first = log.clone();
    doc.on_change(move |change| first.borrow_mut().push(format!("first:{}", change.ops.len())));
    let second = log.clone();
    let id = doc.on_change(move |_| second.borrow_mut().push("second".to_string()));

    doc.transaction(Selection::Null, |tx| {
        tx.set(&Path::new("l1", "ordered"), true)?;
        tx.update(&content("li1"), DiffOp::insert(3, "!"))
    })
    .unwrap();

    assert_eq!(*log.borrow(), vec!["first:2".to_string(), "second".to_string()]);

    assert!(doc.remove_listener(id));
    doc.transaction(Selection::Null, |tx| tx.set(&Path::new("l1", "ordered"), false))
        .unwrap();
    assert_eq!(log.borrow().len(), 3);
}

#[test]
fn test_delete_checks() {
    let mut doc = fixture();

    let missing = doc.transaction(Selection::Null, |tx| tx.delete("nope").map(|_| ()));
    assert!(matches!(missing, Err(DocumentError::NotFound { .. })));

    let owned = doc.transaction(Selection::Null, |tx| tx.delete("p1").map(|_| ()));
    assert!(matches!(owned, Err(DocumentError::InvalidState { .. })));

    doc.transaction(Selection::Null, |tx| {
        container::remove(tx, &body(), "p1")?;
        tx.delete("p1").map(|_| ())
    })
    .unwrap();
    assert!(doc.get("p1").is_none());
}

#[test]
fn test_update_rejects_wrong_diff_kind() {
    let mut doc = fixture();
    let result = doc.transaction(Selection::Null, |tx| tx.update(&content("p1"), DiffOp::shift(1)));
    assert!(matches!(result, Err(DocumentError::InvalidState { .. })));

    let past_end = doc.transaction(Selection::Null, |tx| tx.update(&content("p1"), DiffOp::delete(3, 40)));
    assert!(past_end.is_err());
}

#[test]
fn test_change_information() {
    let mut doc = fixture();
    let (_, change) = doc
        .transaction(Selection::Null, |tx| {
            let temp = tx.create(NodeData::new("paragraph"))?.id.clone();
            tx.delete(&temp)?;
            tx.update(&content("p1"), DiffOp::insert(5, ","))?;
            tx.update(&Path::new("s1", "end"), DiffOp::shift(1))
        })
        .unwrap();

    assert!(change.created.is_empty());
    assert!(change.deleted.is_empty());
    assert!(change.updated.contains("p1"));
    assert!(change.updated.contains("s1"));
    assert!(change.affected_paths.contains(&content("p1")));
    assert_eq!(offsets(&doc, "s1"), (0, 6));
}

struct RecordingIndex {
    log: Rc<RefCell<Vec<String>>>,
}

impl DocumentIndex for RecordingIndex {
    fn select(&self, node: &DocumentNode, _node_type: &NodeType) -> bool {
        node.node_type == "paragraph"
    }

    fn reset(&mut self) {
        self.log.borrow_mut().push("reset".into());
    }

    fn create(&mut self, node: &DocumentNode, _node_type: &NodeType) {
        self.log.borrow_mut().push(format!("create {}", node.id));
    }

    fn delete(&mut self, node: &DocumentNode, _node_type: &NodeType) {
        self.log.borrow_mut().push(format!("delete {}", node.id));
    }

    fn update(&mut self, node: &DocumentNode, _: &NodeType, path: &Path, old: &Value, new: &Value) {
        self.log.borrow_mut().push(format!(
            "update {} {} {:?} -> {:?}",
            node.id,
            path,
            old.as_str(),
            new.as_str()
        ));
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[test]
fn test_custom_index_lifecycle() {
    let mut doc = fixture();
    let log = Rc::new(RefCell::new(Vec::new()));
    doc.add_index("recording", Box::new(RecordingIndex { log: log.clone() }))
        .unwrap();

    assert_eq!(*log.borrow(), vec!["reset", "create p1", "create c1"]);
    log.borrow_mut().clear();

    doc.transaction(Selection::Null, |tx| {
        tx.update(&content("c1"), DiffOp::delete(0, 2))?;
        tx.update(&content("li1"), DiffOp::insert(0, "x"))
    })
    .unwrap();

    assert_eq!(
        *log.borrow(),
        vec![r#"update c1 c1.content Some("A caption") -> Some("caption")"#]
    );
    assert!(doc.get_index("recording").is_some());
    assert!(doc.add_index("recording", Box::new(TypeIndex::default())).is_err());
}

#[test]
fn test_type_index() {
    let doc = fixture();
    let types = doc.index::<TypeIndex>(TYPE_INDEX).unwrap();
    assert_eq!(types.count("paragraph"), 2);
    assert_eq!(types.ids("list-item").collect::<Vec<_>>(), vec!["li1", "li2"]);
}

#[test]
fn test_annotation_queries() {
    let doc = fixture();
    assert_eq!(doc.get_annotations(&content("p1"))[0].id, "s1");
    assert_eq!(doc.get_container_annotations(&body())[0].id, "cm1");
    assert_eq!(doc.get_container_annotations_at("li2")[0].id, "cm1");
}

#[test]
fn test_container_annotation_index_drops_empty_containers() {
    let mut doc = fixture();
    doc.transaction(Selection::Null, |tx| tx.delete("cm1").map(|_| ())).unwrap();

    let index = doc.index::<ContainerAnnotationIndex>(CONTAINER_ANNOTATION_INDEX).unwrap();
    assert_eq!(index.containers().count(), 0);
    assert!(index.anchored_at("p1").is_empty());
    assert!(doc.get_container_annotations(&body()).is_empty());
}

#[test]
fn test_truncate_expand_fuse() {
    let mut doc = fixture();
    doc.transaction(Selection::Null, |tx| {
        tx.create(
            NodeData::new("emphasis")
                .with_id("e1")
                .with("start", Coordinate::new(content("p1"), 0))
                .with("end", Coordinate::new(content("p1"), 2)),
        )?;
        truncate_annotation(tx, "e1", &Selection::property(content("p1"), 1, 2))
    })
    .unwrap();
    assert_eq!(offsets(&doc, "e1"), (0, 1));

    doc.transaction(Selection::Null, |tx| {
        expand_annotation(tx, "e1", &Selection::property(content("p1"), 1, 6))
    })
    .unwrap();
    assert_eq!(offsets(&doc, "e1"), (0, 6));

    doc.transaction(Selection::Null, |tx| {
        tx.create(
            NodeData::new("code")
                .with_id("k1")
                .with("start", Coordinate::new(content("p1"), 0))
                .with("end", Coordinate::new(content("p1"), 2)),
        )?;
        tx.create(
            NodeData::new("code")
                .with_id("k2")
                .with("start", Coordinate::new(content("p1"), 4))
                .with("end", Coordinate::new(content("p1"), 6)),
        )?;
        let survivor = fuse_annotations(tx, &["k1".to_string(), "k2".to_string()])?;
        assert_eq!(survivor, "k1");
        Ok(())
    })
    .unwrap();
    assert_eq!(offsets(&doc, "k1"), (0, 6));
    assert!(doc.get("k2").is_none());
}

#[test]
fn test_truncate_container_annotation_with_property_selection() {
    let mut doc = fixture();
    doc.transaction(Selection::Null, |tx| {
        truncate_annotation(tx, "cm1", &Selection::property(content("li2"), 0, 3))
    })
    .unwrap();

    let cm1 = doc.get("cm1").unwrap();
    assert_eq!(cm1.start().unwrap(), &Coordinate::new(content("p1"), 6));
    assert_eq!(cm1.end().unwrap(), &Coordinate::new(content("li2"), 0));
}

#[test]
fn test_truncate_with_contained_selection_fails() {
    let mut doc = fixture();
    let result = doc.transaction(Selection::Null, |tx| {
        truncate_annotation(tx, "s1", &Selection::property(content("p1"), 1, 3))
    });
    assert!(matches!(result, Err(DocumentError::InvalidSelection { .. })));
    assert_eq!(offsets(&doc, "s1"), (0, 5));
}

#[test]
fn test_deep_delete_removes_owned_tree_and_annotations() {
    let mut doc = fixture();
    doc.transaction(Selection::Null, |tx| deep_delete_node(tx, "l1")).unwrap();

    assert!(doc.get("l1").is_none());
    assert!(doc.get("li1").is_none());
    assert!(doc.get("li2").is_none());
    assert!(doc.get("cm1").is_none());
    assert_eq!(doc.container(&body()).unwrap().node_ids(), &["p1".to_string(), "f1".to_string()]);
    assert!(check_integrity(&doc).is_empty());
}

#[test]
fn test_copy_node_includes_children_and_annotations() {
    let doc = fixture();
    let ids: Vec<String> = copy_node(&doc, "f1").unwrap().into_iter().map(|n| n.id).collect();
    assert_eq!(ids, vec!["f1", "c1"]);

    let ids: Vec<String> = copy_node(&doc, "p1").unwrap().into_iter().map(|n| n.id).collect();
    assert_eq!(ids, vec!["p1", "s1"]);
}

#[test]
fn test_transfer_annotations_splits_spanning_ones() {
    let mut doc = fixture();
    doc.transaction(Selection::Null, |tx| {
        tx.create(NodeData::new("paragraph").with_id("p2").with("content", "llo world"))?;
        transfer_annotations(tx, &content("p1"), 2, &content("p2"), 0)
    })
    .unwrap();

    assert_eq!(offsets(&doc, "s1"), (0, 2));
    let tail = doc.get_annotations(&content("p2"));
    assert_eq!(tail.len(), 1);
    assert_eq!(tail[0].node_type, "strong");
    assert_eq!(offsets(&doc, &tail[0].id.clone()), (0, 3));

    let cm1 = doc.get("cm1").unwrap();
    assert_eq!(cm1.start().unwrap(), &Coordinate::new(content("p2"), 4));
}

#[test]
fn test_selection_validation() {
    let mut doc = fixture();
    let result = doc.transaction(Selection::Null, |tx| {
        tx.set_selection(Selection::container(
            body(),
            Coordinate::new(content("li2"), 1),
            Coordinate::new(content("p1"), 0),
        ))
    });
    assert!(matches!(result, Err(DocumentError::InvalidSelection { .. })));

    let past_end = doc.transaction(Selection::Null, |tx| {
        tx.set_selection(Selection::property(content("li1"), 0, 10))
    });
    assert!(past_end.is_err());

    let (_, change) = doc
        .transaction(Selection::Null, |tx| {
            tx.set_selection(Selection::container(
                body(),
                Coordinate::new(content("p1"), 2),
                Coordinate::new(content("c1"), 1),
            ))
        })
        .unwrap();
    assert!(change.after.is_container_selection());
}

#[test]
fn test_session_undo_redo() -> anyhow::Result<()> {
    let snapshot = DocumentSnapshot::from_json(FIXTURE)?;
    let mut session = DocumentSession::load("s1", prose::schema()?, &snapshot, &SessionConfig::default())?;
    session.set_selection(Selection::collapsed(Coordinate::new(content("p1"), 5)))?;

    session.transaction(|tx| {
        tx.update(&content("p1"), DiffOp::insert(5, ","))?;
        tx.update(&Path::new("cm1", "start"), DiffOp::shift(1))?;
        tx.set_info("description", "comma".into());
        tx.set_selection(Selection::collapsed(Coordinate::new(content("p1"), 6)))
    })?;
    session.transaction(|tx| deep_delete_node(tx, "f1"))?;

    assert_eq!(session.history().undo_levels(), 2);

    assert!(session.undo()?);
    assert!(session.document().get("c1").is_some());
    assert_eq!(session.document().get_parent("c1").unwrap().id, "f1");

    assert!(session.undo()?);
    assert_eq!(session.document().get_text(&content("p1"))?, "Hello world");
    assert_eq!(session.selection().start().unwrap().offset, 5);
    assert_eq!(session.history().redo_description(), Some("comma"));
    assert!(!session.undo()?);

    assert!(session.redo()?);
    assert_eq!(session.document().get_text(&content("p1"))?, "Hello, world");
    assert_eq!(session.selection().start().unwrap().offset, 6);
    assert_eq!(session.document().get("cm1").unwrap().start().unwrap().offset, 7);
    Ok(())
}
