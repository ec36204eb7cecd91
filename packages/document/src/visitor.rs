use crate::document::Document;
use folio_model::{DocumentNode, Value};

/// Walks the owned tree below a node.
///
/// Override `enter`/`leave` to act on nodes; returning `false` from
/// `enter` skips the node's children.
pub trait NodeVisitor: Sized {
    fn enter(&mut self, _node: &DocumentNode, _depth: usize) -> bool {
        true
    }

    fn leave(&mut self, _node: &DocumentNode, _depth: usize) {}
}

/// Visit `root` and its owned descendants in document order
pub fn walk<V: NodeVisitor>(visitor: &mut V, doc: &Document, root: &str) {
    walk_node(visitor, doc, root, 0, doc.len());
}

fn walk_node<V: NodeVisitor>(visitor: &mut V, doc: &Document, id: &str, depth: usize, budget: usize) {
    let Some(node) = doc.get(id) else {
        return;
    };
    if depth > budget {
        return;
    }

    if visitor.enter(node, depth) {
        for child in owned_children(doc, node) {
            walk_node(visitor, doc, &child, depth + 1, budget);
        }
    }
    visitor.leave(node, depth);
}

/// Ids held by the node's owned properties, in declaration order
pub fn owned_children(doc: &Document, node: &DocumentNode) -> Vec<String> {
    let Some(node_type) = doc.schema().get(&node.node_type) else {
        return Vec::new();
    };
    let mut children = Vec::new();
    for spec in node_type.owned_properties() {
        match node.get(&spec.name) {
            Some(Value::String(id)) => children.push(id.clone()),
            Some(Value::Strings(ids)) => children.extend(ids.iter().cloned()),
            _ => {}
        }
    }
    children
}

/// Collects ids in pre-order
#[derive(Default)]
pub struct CollectIds {
    pub ids: Vec<String>,
}

impl NodeVisitor for CollectIds {
    fn enter(&mut self, node: &DocumentNode, _depth: usize) -> bool {
        self.ids.push(node.id.clone());
        true
    }
}

/// Ids of `root` and every owned descendant, pre-order
pub fn descendants(doc: &Document, root: &str) -> Vec<String> {
    let mut collect = CollectIds::default();
    walk(&mut collect, doc, root);
    collect.ids
}
