//! # Folio Document
//!
//! Transactional node graph for the Folio document engine.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ model: schema, nodes, coordinates, selection│
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ document: nodes + indices + transactions    │
//! │  - create / delete / set / update           │
//! │  - derived parents, xpath, annotations      │
//! │  - one DocumentChange per transaction       │
//! │  - session: selection + undo/redo           │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editing: selection-driven verbs             │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use folio_document::{DocumentSession, SessionConfig};
//! use folio_model::{prose, NodeData, Path};
//!
//! let mut session = DocumentSession::with_config("s1", prose::schema()?, &SessionConfig::default());
//! session.transaction(|tx| {
//!     tx.create(NodeData::new("container").with_id("body"))?;
//!     let p = tx.create(NodeData::new("paragraph").with("content", "Hello"))?.id.clone();
//!     folio_document::container::append(tx, &Path::new("body", "nodes"), &p)
//! })?;
//! session.undo()?;
//! ```

pub mod annotations;
mod change;
pub mod config;
pub mod container;
mod document;
pub mod helpers;
pub mod index;
mod operation;
mod session;
mod undo_stack;
pub mod visitor;
mod xpath;

pub use change::DocumentChange;
pub use config::{IdStrategy, SessionConfig};
pub use container::Container;
pub use document::{Document, ListenerId, Transaction};
pub use index::DocumentIndex;
pub use operation::{DiffOp, Operation};
pub use session::DocumentSession;
pub use undo_stack::UndoStack;
pub use xpath::{XPath, XPathEntry};
