//! # Folio Fragmenter
//!
//! Resolves overlapping annotations on a text into non-overlapping,
//! properly nested fragments for rendering.
//!
//! ```rust,ignore
//! use folio_fragmenter::{fragment, render_markup, AnnotationSpan};
//!
//! let result = fragment(11, &[AnnotationSpan::new("b", 0, 5), AnnotationSpan::new("i", 3, 8)]);
//! assert_eq!(render_markup("Hello world", &result), "[b]Hel[i]lo[/i][/b][i] w[/i]orld");
//! ```

mod adapter;
mod fragmenter;
mod visitor;

pub use adapter::fragment_property;
pub use fragmenter::{fragment, AnnotationSpan, FragmentNode, Fragmentation, Fragmenter, Piece, Segment};
pub use visitor::{render_markup, walk, FragmentVisitor, MarkupPrinter};
