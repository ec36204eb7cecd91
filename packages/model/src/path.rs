use serde::{Deserialize, Serialize};
use std::fmt;

/// Address of a property: `[node_id, property]`.
///
/// Container paths use the same shape (`[container_id, "nodes"]`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path(Vec<String>);

impl Path {
    pub fn new(node_id: impl Into<String>, property: impl Into<String>) -> Self {
        Self(vec![node_id.into(), property.into()])
    }

    pub fn from_segments(segments: Vec<String>) -> Self {
        Self(segments)
    }

    pub fn node_id(&self) -> &str {
        self.0.first().map(String::as_str).unwrap_or("")
    }

    pub fn property(&self) -> Option<&str> {
        self.0.get(1).map(String::as_str)
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Same property on another node.
    pub fn with_node(&self, node_id: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        match segments.first_mut() {
            Some(first) => *first = node_id.into(),
            None => segments.push(node_id.into()),
        }
        Self(segments)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

impl From<(&str, &str)> for Path {
    fn from((node_id, property): (&str, &str)) -> Self {
        Path::new(node_id, property)
    }
}

/// A character offset inside a text property.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coordinate {
    pub path: Path,
    pub offset: usize,
}

impl Coordinate {
    pub fn new(path: Path, offset: usize) -> Self {
        Self { path, offset }
    }

    pub fn node_id(&self) -> &str {
        self.path.node_id()
    }

    /// Offset moved by `delta`, saturating at zero.
    pub fn shifted(&self, delta: isize) -> Self {
        Self {
            path: self.path.clone(),
            offset: shift_offset(self.offset, delta),
        }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.path, self.offset)
    }
}

pub fn shift_offset(offset: usize, delta: isize) -> usize {
    if delta < 0 {
        offset.saturating_sub(delta.unsigned_abs())
    } else {
        offset + delta as usize
    }
}
