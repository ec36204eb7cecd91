use serde::{Deserialize, Serialize};
use std::fmt;

/// One step of a node's ancestor chain.
///
/// `property`/`pos` say where the node sits inside the previous entry;
/// the root has neither.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct XPathEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pos: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct XPath {
    entries: Vec<XPathEntry>,
}

impl XPath {
    /// Entries must be root-first
    pub fn new(entries: Vec<XPathEntry>) -> Self {
        Self { entries }
    }

    pub fn to_array(&self) -> Vec<XPathEntry> {
        self.entries.clone()
    }

    pub fn entries(&self) -> &[XPathEntry] {
        &self.entries
    }

    pub fn root(&self) -> Option<&XPathEntry> {
        self.entries.first()
    }

    pub fn depth(&self) -> usize {
        self.entries.len()
    }
}

impl fmt::Display for XPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, "/")?;
            }
            match (&entry.property, entry.pos) {
                (Some(property), Some(pos)) => write!(f, "{}[{}]:", property, pos)?,
                (Some(property), None) => write!(f, "{}:", property)?,
                _ => {}
            }
            write!(f, "{}#{}", entry.node_type, entry.id)?;
        }
        Ok(())
    }
}
