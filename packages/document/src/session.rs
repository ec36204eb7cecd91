//! # Document Session
//!
//! One editor's view of a document: the document itself, the current
//! selection and the undo history.

use crate::change::DocumentChange;
use crate::config::SessionConfig;
use crate::document::{Document, Transaction};
use crate::undo_stack::UndoStack;
use folio_model::{DocumentResult, DocumentSnapshot, Schema, Selection};
use tracing::{debug, instrument};

pub struct DocumentSession {
    /// Unique session identifier
    pub id: String,

    doc: Document,
    selection: Selection,
    history: UndoStack,
}

impl DocumentSession {
    pub fn new(id: impl Into<String>, doc: Document) -> Self {
        Self {
            id: id.into(),
            doc,
            selection: Selection::Null,
            history: UndoStack::new(),
        }
    }

    /// Empty document set up according to `config`
    pub fn with_config(id: impl Into<String>, schema: Schema, config: &SessionConfig) -> Self {
        Self {
            id: id.into(),
            doc: Document::with_id_generator(schema, config.id_strategy.generator()),
            selection: Selection::Null,
            history: UndoStack::with_max_levels(config.history_levels),
        }
    }

    pub fn load(
        id: impl Into<String>,
        schema: Schema,
        snapshot: &DocumentSnapshot,
        config: &SessionConfig,
    ) -> DocumentResult<Self> {
        let doc = Document::load_with(schema, snapshot, config.id_strategy.generator())?;
        Ok(Self {
            id: id.into(),
            doc,
            selection: Selection::Null,
            history: UndoStack::with_max_levels(config.history_levels),
        })
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// Direct access for listeners and indices. Mutations still need a
    /// transaction, and ones made this way bypass the history.
    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn set_selection(&mut self, selection: Selection) -> DocumentResult<()> {
        self.doc.validate_selection(&selection)?;
        self.selection = selection;
        Ok(())
    }

    pub fn history(&self) -> &UndoStack {
        &self.history
    }

    /// Run `f` against the current selection and record the change
    #[instrument(skip(self, f), fields(session = %self.id))]
    pub fn transaction<T, F>(&mut self, f: F) -> DocumentResult<T>
    where
        F: FnOnce(&mut Transaction<'_>) -> DocumentResult<T>,
    {
        let (value, change) = self.doc.transaction(self.selection.clone(), f)?;
        self.selection = change.after.clone();
        self.history.record(change);
        Ok(value)
    }

    /// Revert the most recent change. Returns `false` when there is
    /// nothing to undo.
    #[instrument(skip(self), fields(session = %self.id))]
    pub fn undo(&mut self) -> DocumentResult<bool> {
        let Some(change) = self.history.pop_undo() else {
            return Ok(false);
        };

        match self.replay(&change.invert()) {
            Ok(()) => {
                debug!(ops = change.ops.len(), "undone");
                self.history.push_redo(change);
                Ok(true)
            }
            Err(err) => {
                self.history.push_redone(change);
                Err(err)
            }
        }
    }

    #[instrument(skip(self), fields(session = %self.id))]
    pub fn redo(&mut self) -> DocumentResult<bool> {
        let Some(change) = self.history.pop_redo() else {
            return Ok(false);
        };

        match self.replay(&change) {
            Ok(()) => {
                debug!(ops = change.ops.len(), "redone");
                self.history.push_redone(change);
                Ok(true)
            }
            Err(err) => {
                self.history.push_redo(change);
                Err(err)
            }
        }
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    fn replay(&mut self, change: &DocumentChange) -> DocumentResult<()> {
        let (_, applied) = self.doc.transaction(change.before.clone(), |tx| {
            for op in &change.ops {
                tx.apply_operation(op)?;
            }
            tx.set_selection(change.after.clone())
        })?;
        self.selection = applied.after;
        Ok(())
    }
}
