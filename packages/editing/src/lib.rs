//! # Folio Editing
//!
//! Selection-driven editing verbs on top of `folio-document`. Every verb
//! runs inside an open transaction, reads the transaction's selection and
//! leaves the selection the user would expect afterwards.
//!
//! ```rust,ignore
//! use folio_editing::{break_node, insert_text};
//!
//! session.transaction(|tx| {
//!     insert_text(tx, "Hello")?;
//!     break_node(tx)
//! })?;
//! ```
//!
//! Text changes go through [`insert_text_at`] and [`delete_text_range`],
//! which keep the annotations of the edited property in place. Structural
//! verbs (break, merge, lists, block insertion) work on the leaves of a
//! container, where lists count as their items.

mod block_verbs;
mod context;
mod edit;
mod list_verbs;
mod paste;
mod property_edit;
mod text_verbs;

pub use block_verbs::{insert_block_node, insert_inline_node, switch_text_type, INLINE_PLACEHOLDER};
pub use edit::{annotate, select_all, Edit};
pub use list_verbs::{dedent, indent, toggle_list};
pub use paste::{paste, PasteContent};
pub use property_edit::{delete_text_range, insert_text_at};
pub use text_verbs::{break_node, delete, insert_text, Direction};
