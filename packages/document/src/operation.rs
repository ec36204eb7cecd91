//! # Operations
//!
//! The four primitive operations a transaction records. Every operation
//! carries enough state to be inverted without looking at the document.

use folio_model::{DocumentNode, Path, Value};
use serde::{Deserialize, Serialize};

/// Incremental update of a single property.
///
/// Text and reference arrays accept `Insert`/`Delete`; coordinates accept
/// `Shift`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum DiffOp {
    /// Insert characters (text) or ids (reference array) at `pos`
    Insert { pos: usize, value: Value },
    /// Remove `[start, end)`
    Delete { start: usize, end: usize },
    /// Move a coordinate's offset
    Shift { delta: isize },
}

impl DiffOp {
    pub fn insert(pos: usize, value: impl Into<Value>) -> Self {
        DiffOp::Insert {
            pos,
            value: value.into(),
        }
    }

    pub fn delete(start: usize, end: usize) -> Self {
        DiffOp::Delete { start, end }
    }

    pub fn shift(delta: isize) -> Self {
        DiffOp::Shift { delta }
    }
}

/// Number of characters or ids carried by an insert value.
pub(crate) fn insert_len(value: &Value) -> usize {
    match value {
        Value::String(s) => s.chars().count(),
        Value::Strings(ids) => ids.len(),
        _ => 0,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Operation {
    Create {
        node: DocumentNode,
    },
    Delete {
        node: DocumentNode,
    },
    Set {
        path: Path,
        original: Value,
        value: Value,
    },
    Update {
        path: Path,
        diff: DiffOp,
        /// Content removed by a `Delete` diff, filled in when applied
        #[serde(default, skip_serializing_if = "Option::is_none")]
        removed: Option<Value>,
    },
}

impl Operation {
    /// Id of the node the operation touches
    pub fn node_id(&self) -> &str {
        match self {
            Operation::Create { node } | Operation::Delete { node } => &node.id,
            Operation::Set { path, .. } | Operation::Update { path, .. } => path.node_id(),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            Operation::Set { path, .. } | Operation::Update { path, .. } => Some(path),
            _ => None,
        }
    }

    pub fn invert(&self) -> Operation {
        match self {
            Operation::Create { node } => Operation::Delete { node: node.clone() },
            Operation::Delete { node } => Operation::Create { node: node.clone() },
            Operation::Set {
                path,
                original,
                value,
            } => Operation::Set {
                path: path.clone(),
                original: value.clone(),
                value: original.clone(),
            },
            Operation::Update { path, diff, removed } => {
                let diff = match diff {
                    DiffOp::Insert { pos, value } => DiffOp::Delete {
                        start: *pos,
                        end: pos + insert_len(value),
                    },
                    DiffOp::Delete { start, .. } => DiffOp::Insert {
                        pos: *start,
                        value: removed.clone().unwrap_or(Value::Null),
                    },
                    DiffOp::Shift { delta } => DiffOp::Shift { delta: -delta },
                };
                let removed = match self {
                    Operation::Update {
                        diff: DiffOp::Insert { value, .. },
                        ..
                    } => Some(value.clone()),
                    _ => None,
                };
                Operation::Update {
                    path: path.clone(),
                    diff,
                    removed,
                }
            }
        }
    }
}
