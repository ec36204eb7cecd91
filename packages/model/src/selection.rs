//! # Selection
//!
//! Selections, ranges and the coordinate ordering they rely on.
//!
//! Two coordinates on the same property compare by offset. Coordinates on
//! different properties compare by structural position inside a container,
//! which only the document knows; that knowledge is passed in through
//! [`CoordinateOrder`].

use crate::error::{DocumentError, DocumentResult};
use crate::path::{Coordinate, Path};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::convert::TryFrom;

/// Structural addresses of nodes inside a container.
pub trait CoordinateOrder {
    /// Address of `node_id` inside `container_path`: the position of its
    /// root in the container followed by positions inside that root.
    fn address(&self, container_path: &Path, node_id: &str) -> Option<Vec<usize>>;
}

/// Ordering for selections that never leave one property
pub struct SamePropertyOnly;

impl CoordinateOrder for SamePropertyOnly {
    fn address(&self, _container_path: &Path, _node_id: &str) -> Option<Vec<usize>> {
        None
    }
}

/// Compare two coordinates in document order.
pub fn compare_coordinates(
    a: &Coordinate,
    b: &Coordinate,
    container_path: Option<&Path>,
    order: &dyn CoordinateOrder,
) -> DocumentResult<Ordering> {
    if a.path == b.path {
        return Ok(a.offset.cmp(&b.offset));
    }

    let container_path = container_path.ok_or_else(|| {
        DocumentError::invalid_selection(format!(
            "cannot order {} and {} outside of a container",
            a, b
        ))
    })?;

    let address_of = |c: &Coordinate| {
        order.address(container_path, c.node_id()).ok_or_else(|| {
            DocumentError::invalid_selection(format!(
                "node '{}' is not inside container {}",
                c.node_id(),
                container_path
            ))
        })
    };

    let ordering = address_of(a)?
        .cmp(&address_of(b)?)
        .then_with(|| a.path.cmp(&b.path))
        .then_with(|| a.offset.cmp(&b.offset));
    Ok(ordering)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeSelectionMode {
    Before,
    After,
    Full,
}

/// A range of characters inside one text property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertySelection {
    pub path: Path,
    pub start_offset: usize,
    pub end_offset: usize,
    pub reverse: bool,
    pub container_path: Option<Path>,
}

/// A range spanning several nodes of a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSelection {
    pub container_path: Path,
    pub start_path: Path,
    pub start_offset: usize,
    pub end_path: Path,
    pub end_offset: usize,
    pub reverse: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeSelection {
    pub container_path: Path,
    pub node_id: String,
    pub mode: NodeSelectionMode,
}

/// Opaque selection owned by an external tool.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomSelection {
    pub custom_type: String,
    pub data: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SelectionDescriptor", into = "SelectionDescriptor")]
pub enum Selection {
    Null,
    Property(PropertySelection),
    Container(ContainerSelection),
    Node(NodeSelection),
    Custom(CustomSelection),
}

impl Default for Selection {
    fn default() -> Self {
        Selection::Null
    }
}

/// Start and end coordinates of a selection, plus the container that orders
/// them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Range {
    pub start: Coordinate,
    pub end: Coordinate,
    pub container_path: Option<Path>,
}

impl Range {
    pub fn new(start: Coordinate, end: Coordinate, container_path: Option<Path>) -> Self {
        Self {
            start,
            end,
            container_path,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }

    fn shared_container(&self, other: &Range) -> DocumentResult<Option<Path>> {
        match (&self.container_path, &other.container_path) {
            (Some(a), Some(b)) if a != b => Err(DocumentError::invalid_selection(format!(
                "ranges live in different containers ({} and {})",
                a, b
            ))),
            (Some(a), _) => Ok(Some(a.clone())),
            (None, b) => Ok(b.clone()),
        }
    }

    fn order_of(
        a: &Coordinate,
        b: &Coordinate,
        container: &Option<Path>,
        order: &dyn CoordinateOrder,
    ) -> DocumentResult<Ordering> {
        compare_coordinates(a, b, container.as_ref(), order)
    }

    /// Whether the two ranges share characters. Non-strict also accepts
    /// ranges that only touch.
    pub fn overlaps(&self, other: &Range, strict: bool, order: &dyn CoordinateOrder) -> DocumentResult<bool> {
        let container = self.shared_container(other)?;
        let a = Self::order_of(&self.start, &other.end, &container, order)?;
        let b = Self::order_of(&other.start, &self.end, &container, order)?;
        Ok(if strict {
            a == Ordering::Less && b == Ordering::Less
        } else {
            a != Ordering::Greater && b != Ordering::Greater
        })
    }

    pub fn is_inside_of(&self, other: &Range, strict: bool, order: &dyn CoordinateOrder) -> DocumentResult<bool> {
        let container = self.shared_container(other)?;
        let a = Self::order_of(&other.start, &self.start, &container, order)?;
        let b = Self::order_of(&self.end, &other.end, &container, order)?;
        Ok(if strict {
            a == Ordering::Less && b == Ordering::Less
        } else {
            a != Ordering::Greater && b != Ordering::Greater
        })
    }

    pub fn contains(&self, other: &Range, strict: bool, order: &dyn CoordinateOrder) -> DocumentResult<bool> {
        other.is_inside_of(self, strict, order)
    }

    pub fn is_left_aligned_with(&self, other: &Range) -> bool {
        self.start == other.start
    }

    pub fn is_right_aligned_with(&self, other: &Range) -> bool {
        self.end == other.end
    }
}

impl Selection {
    pub fn property(path: Path, start_offset: usize, end_offset: usize) -> Self {
        Selection::Property(PropertySelection {
            path,
            start_offset,
            end_offset,
            reverse: false,
            container_path: None,
        })
    }

    /// Caret at `coordinate`
    pub fn collapsed(coordinate: Coordinate) -> Self {
        Self::property(coordinate.path, coordinate.offset, coordinate.offset)
    }

    pub fn container(
        container_path: Path,
        start: Coordinate,
        end: Coordinate,
    ) -> Self {
        Selection::Container(ContainerSelection {
            container_path,
            start_path: start.path,
            start_offset: start.offset,
            end_path: end.path,
            end_offset: end.offset,
            reverse: false,
        })
    }

    pub fn node(container_path: Path, node_id: impl Into<String>, mode: NodeSelectionMode) -> Self {
        Selection::Node(NodeSelection {
            container_path,
            node_id: node_id.into(),
            mode,
        })
    }

    /// Property selection when both ends share a path, container selection
    /// otherwise.
    pub fn from_range(range: Range) -> DocumentResult<Self> {
        if range.start.path == range.end.path {
            return Ok(Selection::Property(PropertySelection {
                path: range.start.path,
                start_offset: range.start.offset,
                end_offset: range.end.offset,
                reverse: false,
                container_path: range.container_path,
            }));
        }
        let container_path = range.container_path.ok_or_else(|| {
            DocumentError::invalid_selection("a range across properties needs a container")
        })?;
        Ok(Selection::container(container_path, range.start, range.end))
    }

    /// Attach a container to a property selection
    pub fn within(mut self, container: Path) -> Self {
        if let Selection::Property(sel) = &mut self {
            sel.container_path = Some(container);
        }
        self
    }

    pub fn reversed(mut self) -> Self {
        match &mut self {
            Selection::Property(sel) => sel.reverse = !sel.reverse,
            Selection::Container(sel) => sel.reverse = !sel.reverse,
            _ => {}
        }
        self
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Selection::Null)
    }

    pub fn is_property_selection(&self) -> bool {
        matches!(self, Selection::Property(_))
    }

    pub fn is_container_selection(&self) -> bool {
        matches!(self, Selection::Container(_))
    }

    pub fn is_node_selection(&self) -> bool {
        matches!(self, Selection::Node(_))
    }

    pub fn is_custom_selection(&self) -> bool {
        matches!(self, Selection::Custom(_))
    }

    pub fn container_path(&self) -> Option<&Path> {
        match self {
            Selection::Property(sel) => sel.container_path.as_ref(),
            Selection::Container(sel) => Some(&sel.container_path),
            Selection::Node(sel) => Some(&sel.container_path),
            _ => None,
        }
    }

    pub fn range(&self) -> Option<Range> {
        match self {
            Selection::Property(sel) => Some(Range::new(
                Coordinate::new(sel.path.clone(), sel.start_offset),
                Coordinate::new(sel.path.clone(), sel.end_offset),
                sel.container_path.clone(),
            )),
            Selection::Container(sel) => Some(Range::new(
                Coordinate::new(sel.start_path.clone(), sel.start_offset),
                Coordinate::new(sel.end_path.clone(), sel.end_offset),
                Some(sel.container_path.clone()),
            )),
            _ => None,
        }
    }

    fn range_strict(&self) -> DocumentResult<Range> {
        self.range().ok_or_else(|| {
            DocumentError::invalid_selection(format!("{} selection has no range", self.kind_name()))
        })
    }

    pub fn start(&self) -> Option<Coordinate> {
        self.range().map(|r| r.start)
    }

    pub fn end(&self) -> Option<Coordinate> {
        self.range().map(|r| r.end)
    }

    pub fn is_collapsed(&self) -> bool {
        match self {
            Selection::Property(sel) => sel.start_offset == sel.end_offset,
            Selection::Container(sel) => sel.start_path == sel.end_path && sel.start_offset == sel.end_offset,
            _ => false,
        }
    }

    pub fn overlaps(&self, other: &Selection, strict: bool, order: &dyn CoordinateOrder) -> DocumentResult<bool> {
        self.range_strict()?.overlaps(&other.range_strict()?, strict, order)
    }

    pub fn is_inside_of(&self, other: &Selection, strict: bool, order: &dyn CoordinateOrder) -> DocumentResult<bool> {
        self.range_strict()?.is_inside_of(&other.range_strict()?, strict, order)
    }

    pub fn contains(&self, other: &Selection, strict: bool, order: &dyn CoordinateOrder) -> DocumentResult<bool> {
        self.range_strict()?.contains(&other.range_strict()?, strict, order)
    }

    pub fn is_left_aligned_with(&self, other: &Selection) -> DocumentResult<bool> {
        Ok(self.range_strict()?.is_left_aligned_with(&other.range_strict()?))
    }

    pub fn is_right_aligned_with(&self, other: &Selection) -> DocumentResult<bool> {
        Ok(self.range_strict()?.is_right_aligned_with(&other.range_strict()?))
    }

    /// Caret at one end of the selection
    pub fn collapse(&self, side: Side) -> DocumentResult<Selection> {
        let range = self.range_strict()?;
        let at = match side {
            Side::Left => range.start,
            Side::Right => range.end,
        };
        let mut collapsed = Selection::collapsed(at);
        if let Some(container) = range.container_path {
            collapsed = collapsed.within(container);
        }
        Ok(collapsed)
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Selection::Null => "null",
            Selection::Property(_) => "property",
            Selection::Container(_) => "container",
            Selection::Node(_) => "node",
            Selection::Custom(_) => "custom",
        }
    }

    pub fn from_descriptor(descriptor: SelectionDescriptor) -> DocumentResult<Self> {
        fn required<T>(value: Option<T>, field: &str, kind: &str) -> DocumentResult<T> {
            value.ok_or_else(|| {
                DocumentError::invalid_selection(format!("{} selection requires '{}'", kind, field))
            })
        }

        let kind = descriptor.selection_type.as_str();
        let selection = match kind {
            "null" => Selection::Null,
            "property" => {
                let start_offset = required(descriptor.start_offset, "startOffset", kind)?;
                let end_offset = descriptor.end_offset.unwrap_or(start_offset);
                if start_offset > end_offset {
                    return Err(DocumentError::invalid_selection(format!(
                        "start offset {} is after end offset {}",
                        start_offset, end_offset
                    )));
                }
                Selection::Property(PropertySelection {
                    path: required(descriptor.path, "path", kind)?,
                    start_offset,
                    end_offset,
                    reverse: descriptor.reverse,
                    container_path: descriptor.container_path,
                })
            }
            "container" => Selection::Container(ContainerSelection {
                container_path: required(descriptor.container_path, "containerPath", kind)?,
                start_path: required(descriptor.start_path, "startPath", kind)?,
                start_offset: required(descriptor.start_offset, "startOffset", kind)?,
                end_path: required(descriptor.end_path, "endPath", kind)?,
                end_offset: required(descriptor.end_offset, "endOffset", kind)?,
                reverse: descriptor.reverse,
            }),
            "node" => Selection::Node(NodeSelection {
                container_path: required(descriptor.container_path, "containerPath", kind)?,
                node_id: required(descriptor.node_id, "nodeId", kind)?,
                mode: descriptor.mode.unwrap_or(NodeSelectionMode::Full),
            }),
            "custom" => Selection::Custom(CustomSelection {
                custom_type: required(descriptor.custom_type, "customType", kind)?,
                data: descriptor.data.unwrap_or(serde_json::Value::Null),
            }),
            other => {
                return Err(DocumentError::invalid_selection(format!(
                    "unknown selection type '{}'",
                    other
                )))
            }
        };
        Ok(selection)
    }

    pub fn to_descriptor(&self) -> SelectionDescriptor {
        let mut descriptor = SelectionDescriptor::of_type(self.kind_name());
        match self {
            Selection::Null => {}
            Selection::Property(sel) => {
                descriptor.path = Some(sel.path.clone());
                descriptor.start_offset = Some(sel.start_offset);
                descriptor.end_offset = Some(sel.end_offset);
                descriptor.container_path = sel.container_path.clone();
                descriptor.reverse = sel.reverse;
            }
            Selection::Container(sel) => {
                descriptor.container_path = Some(sel.container_path.clone());
                descriptor.start_path = Some(sel.start_path.clone());
                descriptor.start_offset = Some(sel.start_offset);
                descriptor.end_path = Some(sel.end_path.clone());
                descriptor.end_offset = Some(sel.end_offset);
                descriptor.reverse = sel.reverse;
            }
            Selection::Node(sel) => {
                descriptor.container_path = Some(sel.container_path.clone());
                descriptor.node_id = Some(sel.node_id.clone());
                descriptor.mode = Some(sel.mode);
            }
            Selection::Custom(sel) => {
                descriptor.custom_type = Some(sel.custom_type.clone());
                descriptor.data = Some(sel.data.clone());
            }
        }
        descriptor
    }
}

/// Wire shape of a selection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionDescriptor {
    #[serde(rename = "type")]
    pub selection_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Path>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_path: Option<Path>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_offset: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_offset: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_path: Option<Path>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_path: Option<Path>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<NodeSelectionMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub reverse: bool,
}

impl SelectionDescriptor {
    pub fn of_type(selection_type: impl Into<String>) -> Self {
        Self {
            selection_type: selection_type.into(),
            ..Default::default()
        }
    }
}

impl TryFrom<SelectionDescriptor> for Selection {
    type Error = DocumentError;

    fn try_from(descriptor: SelectionDescriptor) -> Result<Self, Self::Error> {
        Selection::from_descriptor(descriptor)
    }
}

impl From<Selection> for SelectionDescriptor {
    fn from(selection: Selection) -> Self {
        selection.to_descriptor()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// Flat container: position of each node id
    struct Flat(HashMap<String, usize>);

    impl Flat {
        fn new(ids: &[&str]) -> Self {
            Self(ids.iter().enumerate().map(|(i, id)| (id.to_string(), i)).collect())
        }
    }

    impl CoordinateOrder for Flat {
        fn address(&self, _container_path: &Path, node_id: &str) -> Option<Vec<usize>> {
            self.0.get(node_id).map(|pos| vec![*pos])
        }
    }

    fn p(id: &str) -> Path {
        Path::new(id, "content")
    }

    fn body() -> Path {
        Path::new("body", "nodes")
    }

    #[test]
    fn test_property_overlap_strict_and_touching() {
        let a = Selection::property(p("p1"), 0, 3);
        let b = Selection::property(p("p1"), 3, 5);
        let c = Selection::property(p("p1"), 2, 4);

        assert!(a.overlaps(&b, false, &SamePropertyOnly).unwrap());
        assert!(!a.overlaps(&b, true, &SamePropertyOnly).unwrap());
        assert!(a.overlaps(&c, true, &SamePropertyOnly).unwrap());
    }

    #[test]
    fn test_inside_and_contains() {
        let outer = Selection::property(p("p1"), 0, 6);
        let inner = Selection::property(p("p1"), 0, 2);

        assert!(inner.is_inside_of(&outer, false, &SamePropertyOnly).unwrap());
        assert!(!inner.is_inside_of(&outer, true, &SamePropertyOnly).unwrap());
        assert!(outer.contains(&inner, false, &SamePropertyOnly).unwrap());
        assert!(inner.is_left_aligned_with(&outer).unwrap());
        assert!(!inner.is_right_aligned_with(&outer).unwrap());
    }

    #[test]
    fn test_container_order_uses_structure_first() {
        let order = Flat::new(&["p1", "p2", "p3"]);
        let sel = Selection::container(body(), Coordinate::new(p("p1"), 4), Coordinate::new(p("p3"), 1));
        let inner = Selection::property(p("p2"), 0, 10).within(body());

        assert!(inner.is_inside_of(&sel, false, &order).unwrap());
        assert!(sel.contains(&inner, true, &order).unwrap());

        let ordering = compare_coordinates(
            &Coordinate::new(p("p1"), 9),
            &Coordinate::new(p("p2"), 0),
            Some(&body()),
            &order,
        )
        .unwrap();
        assert_eq!(ordering, Ordering::Less);
    }

    #[test]
    fn test_cross_container_comparison_fails() {
        let order = Flat::new(&["p1", "p2"]);
        let a = Selection::property(p("p1"), 0, 1).within(body());
        let b = Selection::property(p("p2"), 0, 1).within(Path::new("aside", "nodes"));

        assert!(matches!(
            a.overlaps(&b, false, &order),
            Err(DocumentError::InvalidSelection { .. })
        ));
    }

    #[test]
    fn test_different_properties_without_container_fail() {
        let a = Selection::property(p("p1"), 0, 1);
        let b = Selection::property(p("p2"), 0, 1);
        assert!(a.overlaps(&b, false, &SamePropertyOnly).is_err());
    }

    #[test]
    fn test_collapse() {
        let sel = Selection::property(p("p1"), 2, 5).within(body());
        let left = sel.collapse(Side::Left).unwrap();
        let right = sel.collapse(Side::Right).unwrap();

        assert!(left.is_collapsed());
        assert_eq!(left.start().unwrap().offset, 2);
        assert_eq!(right.start().unwrap().offset, 5);
        assert_eq!(right.container_path(), Some(&body()));
    }

    #[test]
    fn test_descriptor_wire_shape() {
        let json = r#"{"type":"property","path":["p1","content"],"startOffset":1,"endOffset":3,"reverse":true}"#;
        let sel: Selection = serde_json::from_str(json).unwrap();

        match &sel {
            Selection::Property(p) => {
                assert_eq!(p.start_offset, 1);
                assert!(p.reverse);
            }
            other => panic!("unexpected selection {:?}", other),
        }
        assert_eq!(serde_json::to_string(&sel).unwrap(), json);
    }

    #[test]
    fn test_descriptor_missing_field() {
        let descriptor = SelectionDescriptor::of_type("node");
        assert!(matches!(
            Selection::from_descriptor(descriptor),
            Err(DocumentError::InvalidSelection { .. })
        ));
    }

    #[test]
    fn test_descriptor_rejects_backwards_offsets() {
        let mut descriptor = SelectionDescriptor::of_type("property");
        descriptor.path = Some(p("p1"));
        descriptor.start_offset = Some(4);
        descriptor.end_offset = Some(1);
        assert!(Selection::from_descriptor(descriptor).is_err());
    }
}
