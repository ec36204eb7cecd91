//! # Document
//!
//! The node graph, its indices and the transaction that guards every
//! mutation.
//!
//! ## Lifecycle
//!
//! ```text
//! transaction(selection, f)
//!   ├─ f calls create / delete / set / update
//!   │    └─ each op: apply → notify indices → record
//!   ├─ Ok  → derive change info → notify listeners → return change
//!   └─ Err → invert recorded ops (indices follow, listeners don't)
//! ```

use crate::change::DocumentChange;
use crate::index::{
    builtin_indices, ContainerAnnotationIndex, DocumentIndex, ParentIndex, PropertyAnnotationIndex,
    ANNOTATION_INDEX, CONTAINER_ANNOTATION_INDEX, PARENT_INDEX, TYPE_INDEX,
};
use crate::operation::{DiffOp, Operation};
use crate::xpath::{XPath, XPathEntry};
use chrono::Utc;
use folio_model::{
    compare_coordinates, text, CoordinateOrder, DocumentError, DocumentNode, DocumentResult, DocumentSnapshot,
    IdGenerator, NodeData, NodeType, Path, PropertyKind, Schema, Selection, SelectionDescriptor, SequentialIds,
    Value,
};
use indexmap::IndexMap;
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Deref, DerefMut};
use tracing::{debug, instrument, warn};

pub type ListenerId = u64;

type Listener = Box<dyn FnMut(&DocumentChange)>;

/// In-memory document: exclusively owns its nodes and indices
pub struct Document {
    schema: Schema,
    nodes: IndexMap<String, DocumentNode>,
    indices: IndexMap<String, Box<dyn DocumentIndex>>,
    ids: Box<dyn IdGenerator>,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener: ListenerId,
    /// Change being recorded by the open transaction
    stage: Option<DocumentChange>,
    version: u64,
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("schema", &self.schema.name())
            .field("nodes", &self.nodes.len())
            .field("indices", &self.indices.keys().collect::<Vec<_>>())
            .field("version", &self.version)
            .field("transacting", &self.stage.is_some())
            .finish()
    }
}

impl Document {
    pub fn new(schema: Schema) -> Self {
        Self::with_id_generator(schema, Box::new(SequentialIds::new()))
    }

    pub fn with_id_generator(schema: Schema, ids: Box<dyn IdGenerator>) -> Self {
        Self {
            schema,
            nodes: IndexMap::new(),
            indices: builtin_indices(),
            ids,
            listeners: Vec::new(),
            next_listener: 0,
            stage: None,
            version: 0,
        }
    }

    /// Build a document from a snapshot written against `schema`
    pub fn load(schema: Schema, snapshot: &DocumentSnapshot) -> DocumentResult<Self> {
        Self::load_with(schema, snapshot, Box::new(SequentialIds::new()))
    }

    #[instrument(skip_all, fields(schema = %snapshot.schema, nodes = snapshot.nodes.len()))]
    pub fn load_with(schema: Schema, snapshot: &DocumentSnapshot, ids: Box<dyn IdGenerator>) -> DocumentResult<Self> {
        if snapshot.schema != schema.name() {
            return Err(DocumentError::schema(format!(
                "snapshot was written for schema '{}', not '{}'",
                snapshot.schema,
                schema.name()
            )));
        }

        let mut doc = Self::with_id_generator(schema, ids);
        doc.transaction(Selection::Null, |tx| {
            for node in &snapshot.nodes {
                tx.create(NodeData::from(node))?;
            }
            Ok(())
        })?;
        doc.version = 0;
        Ok(doc)
    }

    /// Every node in enumeration order
    pub fn snapshot(&self) -> DocumentSnapshot {
        DocumentSnapshot {
            schema: self.schema.name().to_string(),
            nodes: self.nodes.values().cloned().collect(),
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Number of committed transactions
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &DocumentNode> {
        self.nodes.values()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&DocumentNode> {
        self.nodes.get(id)
    }

    pub fn get_strict(&self, id: &str) -> DocumentResult<&DocumentNode> {
        self.get(id).ok_or_else(|| DocumentError::not_found(id))
    }

    pub fn node_type_of(&self, id: &str) -> DocumentResult<&NodeType> {
        let node = self.get_strict(id)?;
        self.schema.get_strict(&node.node_type)
    }

    pub fn get_property(&self, path: &Path) -> Option<&Value> {
        path.property()
            .and_then(|property| self.get(path.node_id())?.get(property))
    }

    pub fn get_text(&self, path: &Path) -> DocumentResult<&str> {
        self.get_strict(path.node_id())?;
        self.get_property(path)
            .and_then(Value::as_str)
            .ok_or_else(|| DocumentError::invalid_state(format!("{} is not a text property", path)))
    }

    /// Kind of the property at `path`
    pub fn property_kind(&self, path: &Path) -> DocumentResult<&PropertyKind> {
        let node_type = self.node_type_of(path.node_id())?;
        let property = path.property().unwrap_or_default();
        node_type
            .get_property(property)
            .map(|spec| &spec.kind)
            .ok_or_else(|| {
                DocumentError::schema(format!(
                    "node type '{}' has no property '{}'",
                    node_type.name(),
                    property
                ))
            })
    }

    // -- indices ------------------------------------------------------------

    pub fn get_index(&self, name: &str) -> Option<&dyn DocumentIndex> {
        self.indices.get(name).map(|index| index.as_ref())
    }

    /// Typed access to a registered index
    pub fn index<T: DocumentIndex>(&self, name: &str) -> Option<&T> {
        self.get_index(name)?.as_any().downcast_ref::<T>()
    }

    /// Attach an index and warm it up with every selected node
    pub fn add_index(&mut self, name: impl Into<String>, mut index: Box<dyn DocumentIndex>) -> DocumentResult<()> {
        let name = name.into();
        if self.indices.contains_key(&name) {
            return Err(DocumentError::invalid_state(format!("index '{}' already registered", name)));
        }

        index.reset();
        let mut warmed = 0;
        for node in self.nodes.values() {
            let node_type = self.schema.get_strict(&node.node_type)?;
            if index.select(node, node_type) {
                index.create(node, node_type);
                warmed += 1;
            }
        }
        debug!(index = %name, nodes = warmed, "warmed up index");

        self.indices.insert(name, index);
        Ok(())
    }

    pub fn remove_index(&mut self, name: &str) -> DocumentResult<Box<dyn DocumentIndex>> {
        if [TYPE_INDEX, ANNOTATION_INDEX, CONTAINER_ANNOTATION_INDEX, PARENT_INDEX].contains(&name) {
            return Err(DocumentError::invalid_state(format!(
                "built-in index '{}' cannot be removed",
                name
            )));
        }
        self.indices
            .shift_remove(name)
            .ok_or_else(|| DocumentError::invalid_state(format!("no index named '{}'", name)))
    }

    /// Property annotations on a text property
    pub fn get_annotations(&self, path: &Path) -> Vec<&DocumentNode> {
        self.index::<PropertyAnnotationIndex>(ANNOTATION_INDEX)
            .map(|index| index.ids(path))
            .unwrap_or_default()
            .iter()
            .filter_map(|id| self.get(id))
            .collect()
    }

    pub fn get_container_annotations(&self, container_path: &Path) -> Vec<&DocumentNode> {
        self.index::<ContainerAnnotationIndex>(CONTAINER_ANNOTATION_INDEX)
            .map(|index| index.ids(container_path))
            .unwrap_or_default()
            .iter()
            .filter_map(|id| self.get(id))
            .collect()
    }

    /// Container annotations with an endpoint inside `node_id`
    pub fn get_container_annotations_at(&self, node_id: &str) -> Vec<&DocumentNode> {
        self.index::<ContainerAnnotationIndex>(CONTAINER_ANNOTATION_INDEX)
            .map(|index| index.anchored_at(node_id))
            .unwrap_or_default()
            .iter()
            .filter_map(|id| self.get(id))
            .collect()
    }

    // -- structure ----------------------------------------------------------

    /// Owning node and property of an owned child
    pub fn owner_of(&self, id: &str) -> Option<(&str, &str)> {
        self.index::<ParentIndex>(PARENT_INDEX)?.owner_of(id)
    }

    /// Position of `child_id` inside `owner.property` (0 for single references)
    pub fn position_in(&self, owner_id: &str, property: &str, child_id: &str) -> Option<usize> {
        match self.get(owner_id)?.get(property)? {
            Value::Strings(ids) => ids.iter().position(|id| id == child_id),
            Value::String(id) if id == child_id => Some(0),
            _ => None,
        }
    }

    /// Derived parent: the owner for owned children, the annotated node
    /// for annotations
    pub fn get_parent(&self, id: &str) -> Option<&DocumentNode> {
        let node = self.get(id)?;
        let node_type = self.schema.get(&node.node_type)?;
        if node_type.is_annotation() {
            return node.start().and_then(|start| self.get(start.node_id()));
        }
        let (owner, _) = self.owner_of(id)?;
        self.get(owner)
    }

    /// Ancestor chain of `id`, root first
    pub fn get_xpath(&self, id: &str) -> DocumentResult<XPath> {
        let mut entries = Vec::new();
        let mut current = self.get_strict(id)?;

        for _ in 0..=self.nodes.len() {
            let node_type = self.schema.get_strict(&current.node_type)?;
            let (property, pos) = if node_type.is_annotation() {
                (
                    current.start().and_then(|s| s.path.property()).map(str::to_string),
                    None,
                )
            } else {
                match self.owner_of(&current.id) {
                    Some((owner, property)) => (
                        Some(property.to_string()),
                        self.position_in(owner, property, &current.id),
                    ),
                    None => (None, None),
                }
            };

            entries.push(XPathEntry {
                id: current.id.clone(),
                node_type: current.node_type.clone(),
                property,
                pos,
            });

            match self.get_parent(&current.id) {
                Some(parent) => current = parent,
                None => {
                    entries.reverse();
                    return Ok(XPath::new(entries));
                }
            }
        }

        Err(DocumentError::invalid_state(format!("ownership cycle above '{}'", id)))
    }

    /// Ancestor of `id` that sits directly in `container_path`
    pub fn container_root(&self, container_path: &Path, id: &str) -> Option<&DocumentNode> {
        let address = self.address(container_path, id)?;
        let pos = *address.first()?;
        let root_id = self.get_property(container_path)?.as_strings()?.get(pos)?;
        self.get(root_id)
    }

    // -- listeners ----------------------------------------------------------

    /// Register a listener; called once per committed transaction
    pub fn on_change(&mut self, listener: impl FnMut(&DocumentChange) + 'static) -> ListenerId {
        self.next_listener += 1;
        self.listeners.push((self.next_listener, Box::new(listener)));
        self.next_listener
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        before != self.listeners.len()
    }

    // -- transactions -------------------------------------------------------

    pub fn is_transacting(&self) -> bool {
        self.stage.is_some()
    }

    /// Run `f` as one transaction and return its result with the committed
    /// change. If `f` fails every op it applied is reverted.
    #[instrument(skip(self, selection, f), fields(version = self.version))]
    pub fn transaction<T, F>(&mut self, selection: Selection, f: F) -> DocumentResult<(T, DocumentChange)>
    where
        F: FnOnce(&mut Transaction<'_>) -> DocumentResult<T>,
    {
        if self.stage.is_some() {
            return Err(DocumentError::invalid_state("already transacting"));
        }
        self.stage = Some(DocumentChange::new(selection.clone()));

        let mut tx = Transaction { doc: self, selection };
        let result = f(&mut tx);
        let after = tx.selection;

        let mut change = self
            .stage
            .take()
            .ok_or_else(|| DocumentError::invalid_state("transaction lost its change record"))?;

        match result {
            Ok(value) => {
                change.after = after;
                change.timestamp = Utc::now();
                change.extract_information(self);
                self.version += 1;
                debug!(ops = change.ops.len(), created = change.created.len(), deleted = change.deleted.len(), "committed");

                for (_, listener) in self.listeners.iter_mut() {
                    listener(&change);
                }
                Ok((value, change))
            }
            Err(err) => {
                warn!(error = %err, ops = change.ops.len(), "transaction failed, rolling back");
                self.rollback(&change.ops);
                Err(err)
            }
        }
    }

    fn rollback(&mut self, ops: &[Operation]) {
        for op in ops.iter().rev() {
            if let Err(err) = self.apply(op.invert()) {
                warn!(error = %err, node = op.node_id(), "could not revert operation");
            }
        }
    }

    fn ensure_transacting(&self) -> DocumentResult<()> {
        if self.stage.is_none() {
            return Err(DocumentError::invalid_state("mutation outside of a transaction"));
        }
        Ok(())
    }

    fn fresh_id(&mut self, node_type: &str) -> String {
        loop {
            let id = self.ids.next_id(node_type);
            if !self.nodes.contains_key(&id) {
                return id;
            }
        }
    }

    // -- mutation primitives ------------------------------------------------

    /// Create a node, allocating an id when `data` has none
    pub fn create(&mut self, data: NodeData) -> DocumentResult<&DocumentNode> {
        self.ensure_transacting()?;
        self.schema.get_strict(&data.node_type)?;

        let id = match &data.id {
            Some(id) if self.nodes.contains_key(id) => {
                return Err(DocumentError::invalid_state(format!("node '{}' already exists", id)))
            }
            Some(id) => id.clone(),
            None => self.fresh_id(&data.node_type),
        };

        let node = self.schema.get_strict(&data.node_type)?.instantiate(id.clone(), &data)?;
        self.record(Operation::Create { node })?;
        self.get_strict(&id)
    }

    /// Remove a single node. Owned children are not touched; detach the
    /// node from its owner first.
    pub fn delete(&mut self, id: &str) -> DocumentResult<DocumentNode> {
        self.ensure_transacting()?;
        let node = self.get_strict(id)?.clone();

        if let Some((owner, property)) = self.owner_of(id) {
            if self.nodes.contains_key(owner) {
                return Err(DocumentError::invalid_state(format!(
                    "node '{}' is still owned by {}.{}",
                    id, owner, property
                )));
            }
        }

        let referrers = self.referrers(id);
        if !referrers.is_empty() {
            warn!(node = id, referrers = ?referrers, "deleting a node that is still referenced");
        }

        self.record(Operation::Delete { node: node.clone() })?;
        Ok(node)
    }

    /// Replace a property value. Text properties are rejected; change them
    /// with [`DiffOp::insert`] and [`DiffOp::delete`] through [`Document::update`].
    pub fn set(&mut self, path: &Path, value: impl Into<Value>) -> DocumentResult<()> {
        self.ensure_transacting()?;
        let node = self.get_strict(path.node_id())?;
        let property = path.property().unwrap_or_default();
        let original = node.get(property).cloned().unwrap_or(Value::Null);

        self.record(Operation::Set {
            path: path.clone(),
            original,
            value: value.into(),
        })
    }

    /// Apply an incremental diff to a property
    pub fn update(&mut self, path: &Path, diff: DiffOp) -> DocumentResult<()> {
        self.ensure_transacting()?;
        self.record(Operation::Update {
            path: path.clone(),
            diff,
            removed: None,
        })
    }

    /// Replay a recorded operation through the public primitives
    pub fn apply_operation(&mut self, op: &Operation) -> DocumentResult<()> {
        match op {
            Operation::Create { node } => self.create(NodeData::from(node)).map(|_| ()),
            Operation::Delete { node } => self.delete(&node.id).map(|_| ()),
            Operation::Set { path, value, .. } => self.set(path, value.clone()),
            Operation::Update { path, diff, .. } => self.update(path, diff.clone()),
        }
    }

    fn record(&mut self, op: Operation) -> DocumentResult<()> {
        let applied = self.apply(op)?;
        if let Some(stage) = self.stage.as_mut() {
            stage.ops.push(applied);
        }
        Ok(())
    }

    /// Nodes holding a non-owning reference to `id`
    fn referrers(&self, id: &str) -> Vec<String> {
        let mut referrers = Vec::new();
        for node in self.nodes.values() {
            let Some(node_type) = self.schema.get(&node.node_type) else {
                continue;
            };
            for spec in node_type.properties() {
                let refers = match (&spec.kind, node.get(&spec.name)) {
                    (PropertyKind::Reference { owned: false, .. }, Some(Value::String(target))) => target == id,
                    (PropertyKind::ReferenceArray { owned: false, .. }, Some(Value::Strings(targets))) => {
                        targets.iter().any(|t| t == id)
                    }
                    _ => false,
                };
                if refers {
                    referrers.push(format!("{}.{}", node.id, spec.name));
                }
            }
        }
        referrers
    }

    /// Apply one op to the node map and the indices. Returns the op with
    /// any removed content filled in.
    fn apply(&mut self, op: Operation) -> DocumentResult<Operation> {
        debug!(op = ?op, "apply");
        match op {
            Operation::Create { node } => {
                if self.nodes.contains_key(&node.id) {
                    return Err(DocumentError::invalid_state(format!("node '{}' already exists", node.id)));
                }
                let node_type = self.schema.get_strict(&node.node_type)?;
                for index in self.indices.values_mut() {
                    if index.select(&node, node_type) {
                        index.create(&node, node_type);
                    }
                }
                self.nodes.insert(node.id.clone(), node.clone());
                Ok(Operation::Create { node })
            }

            Operation::Delete { node } => {
                let removed = self
                    .nodes
                    .shift_remove(&node.id)
                    .ok_or_else(|| DocumentError::not_found(&node.id))?;
                let node_type = self.schema.get_strict(&removed.node_type)?;
                for index in self.indices.values_mut() {
                    if index.select(&removed, node_type) {
                        index.delete(&removed, node_type);
                    }
                }
                Ok(Operation::Delete { node: removed })
            }

            Operation::Set { path, value, .. } => {
                let property = path.property().unwrap_or_default().to_string();
                let node = self
                    .nodes
                    .get_mut(path.node_id())
                    .ok_or_else(|| DocumentError::not_found(path.node_id()))?;
                let node_type = self.schema.get_strict(&node.node_type)?;
                let spec = node_type.get_property(&property).ok_or_else(|| {
                    DocumentError::schema(format!(
                        "node type '{}' has no property '{}'",
                        node_type.name(),
                        property
                    ))
                })?;
                if !(value.is_null() && spec.optional) && !spec.kind.accepts(&value) {
                    return Err(DocumentError::schema(format!(
                        "property {} does not accept a {} value",
                        path,
                        value.kind_name()
                    )));
                }
                if spec.kind == PropertyKind::Text {
                    // annotations in the property could not follow a wholesale replace
                    return Err(DocumentError::invalid_state(format!(
                        "text property {} only accepts insert and delete diffs",
                        path
                    )));
                }

                let original = node
                    .properties
                    .insert(property, value.clone())
                    .unwrap_or(Value::Null);
                let node = &self.nodes[path.node_id()];
                for index in self.indices.values_mut() {
                    if index.select(node, node_type) {
                        index.update(node, node_type, &path, &original, &value);
                    }
                }
                Ok(Operation::Set { path, original, value })
            }

            Operation::Update { path, diff, .. } => {
                let property = path.property().unwrap_or_default().to_string();
                let node = self
                    .nodes
                    .get_mut(path.node_id())
                    .ok_or_else(|| DocumentError::not_found(path.node_id()))?;
                let node_type = self.schema.get_strict(&node.node_type)?;
                let kind = node_type
                    .get_property(&property)
                    .map(|spec| &spec.kind)
                    .ok_or_else(|| DocumentError::schema(format!("unknown property {}", path)))?;

                let old = node.properties.get(&property).cloned().unwrap_or(Value::Null);
                let (new, removed) = apply_diff(&path, kind, &old, &diff)?;
                node.properties.insert(property, new.clone());

                let node = &self.nodes[path.node_id()];
                for index in self.indices.values_mut() {
                    if index.select(node, node_type) {
                        index.update(node, node_type, &path, &old, &new);
                    }
                }
                Ok(Operation::Update { path, diff, removed })
            }
        }
    }

    // -- selections ---------------------------------------------------------

    /// Check that `selection` is anchored to existing nodes and ordered
    pub fn validate_selection(&self, selection: &Selection) -> DocumentResult<()> {
        let exists = |id: &str| {
            if self.contains(id) {
                Ok(())
            } else {
                Err(DocumentError::invalid_selection(format!("node '{}' does not exist", id)))
            }
        };
        let within_text = |path: &Path, offset: usize| -> DocumentResult<()> {
            exists(path.node_id())?;
            if let Some(Value::String(content)) = self.get_property(path) {
                if offset > text::char_len(content) {
                    return Err(DocumentError::invalid_selection(format!(
                        "offset {} is past the end of {}",
                        offset, path
                    )));
                }
            }
            Ok(())
        };

        match selection {
            Selection::Null | Selection::Custom(_) => Ok(()),
            Selection::Property(sel) => {
                if let Some(container) = &sel.container_path {
                    exists(container.node_id())?;
                }
                if sel.start_offset > sel.end_offset {
                    return Err(DocumentError::invalid_selection("start offset is after end offset"));
                }
                within_text(&sel.path, sel.end_offset)
            }
            Selection::Container(sel) => {
                exists(sel.container_path.node_id())?;
                within_text(&sel.start_path, sel.start_offset)?;
                within_text(&sel.end_path, sel.end_offset)?;
                let range = selection.range().ok_or_else(|| DocumentError::invalid_selection("empty range"))?;
                if compare_coordinates(&range.start, &range.end, Some(&sel.container_path), self)? == Ordering::Greater {
                    return Err(DocumentError::invalid_selection("container selection ends before it starts"));
                }
                Ok(())
            }
            Selection::Node(sel) => {
                exists(sel.container_path.node_id())?;
                exists(&sel.node_id)
            }
        }
    }
}

impl CoordinateOrder for Document {
    fn address(&self, container_path: &Path, node_id: &str) -> Option<Vec<usize>> {
        let mut positions = Vec::new();
        let mut current = node_id.to_string();

        for _ in 0..=self.nodes.len() {
            let (owner, property) = self.owner_of(&current)?;
            positions.push(self.position_in(owner, property, &current)?);
            if owner == container_path.node_id() && Some(property) == container_path.property() {
                positions.reverse();
                return Some(positions);
            }
            current = owner.to_string();
        }
        None
    }
}

/// Compute the new value of a property after `diff`, plus what it removed
fn apply_diff(path: &Path, kind: &PropertyKind, old: &Value, diff: &DiffOp) -> DocumentResult<(Value, Option<Value>)> {
    let out_of_range = |what: &str| {
        DocumentError::invalid_state(format!("{} out of range for {}", what, path))
    };

    match (kind, old, diff) {
        (PropertyKind::Text, Value::String(content), DiffOp::Insert { pos, value }) => {
            let inserted = value
                .as_str()
                .ok_or_else(|| DocumentError::invalid_state(format!("text insert into {} needs a string", path)))?;
            if *pos > text::char_len(content) {
                return Err(out_of_range("insert position"));
            }
            let mut content = content.clone();
            text::insert(&mut content, *pos, inserted);
            Ok((Value::String(content), None))
        }
        (PropertyKind::Text, Value::String(content), DiffOp::Delete { start, end }) => {
            if start > end || *end > text::char_len(content) {
                return Err(out_of_range("delete range"));
            }
            let mut content = content.clone();
            let removed = text::remove(&mut content, *start, *end);
            Ok((Value::String(content), Some(Value::String(removed))))
        }
        (PropertyKind::ReferenceArray { .. }, Value::Strings(ids), DiffOp::Insert { pos, value }) => {
            let inserted: Vec<String> = match value {
                Value::String(id) => vec![id.clone()],
                Value::Strings(new_ids) => new_ids.clone(),
                _ => {
                    return Err(DocumentError::invalid_state(format!(
                        "array insert into {} needs ids",
                        path
                    )))
                }
            };
            if *pos > ids.len() {
                return Err(out_of_range("insert position"));
            }
            let mut ids = ids.clone();
            ids.splice(*pos..*pos, inserted);
            Ok((Value::Strings(ids), None))
        }
        (PropertyKind::ReferenceArray { .. }, Value::Strings(ids), DiffOp::Delete { start, end }) => {
            if start > end || *end > ids.len() {
                return Err(out_of_range("delete range"));
            }
            let mut ids = ids.clone();
            let removed: Vec<String> = ids.drain(*start..*end).collect();
            Ok((Value::Strings(ids), Some(Value::Strings(removed))))
        }
        (PropertyKind::Coordinate, Value::Coordinate(coordinate), DiffOp::Shift { delta }) => {
            let offset = coordinate.offset as isize + delta;
            if offset < 0 {
                return Err(out_of_range("shifted offset"));
            }
            Ok((Value::Coordinate(coordinate.shifted(*delta)), None))
        }
        _ => Err(DocumentError::invalid_state(format!(
            "{:?} is not supported on {}",
            diff, path
        ))),
    }
}

/// Mutable handle on a document while a transaction is open
pub struct Transaction<'a> {
    doc: &'a mut Document,
    selection: Selection,
}

impl<'a> Transaction<'a> {
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Selection reported as the change's `after`
    pub fn set_selection(&mut self, selection: Selection) -> DocumentResult<()> {
        self.doc.validate_selection(&selection)?;
        self.selection = selection;
        Ok(())
    }

    pub fn set_selection_descriptor(&mut self, descriptor: SelectionDescriptor) -> DocumentResult<()> {
        self.set_selection(Selection::from_descriptor(descriptor)?)
    }

    /// Attach free-form information to the change
    pub fn set_info(&mut self, key: impl Into<String>, value: serde_json::Value) {
        if let Some(stage) = self.doc.stage.as_mut() {
            stage.info.insert(key.into(), value);
        }
    }

    /// Ops recorded so far
    pub fn ops(&self) -> &[Operation] {
        self.doc.stage.as_ref().map(|c| c.ops.as_slice()).unwrap_or(&[])
    }
}

impl<'a> Deref for Transaction<'a> {
    type Target = Document;

    fn deref(&self) -> &Document {
        self.doc
    }
}

impl<'a> DerefMut for Transaction<'a> {
    fn deref_mut(&mut self) -> &mut Document {
        self.doc
    }
}
