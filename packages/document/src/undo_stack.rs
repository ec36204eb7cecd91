//! # Undo/Redo Stack
//!
//! Committed changes, most recent last.
//!
//! - Undo pops a change; the session applies its inverse and parks the
//!   change on the redo stack
//! - Redo re-applies the parked change
//! - Recording a new change clears the redo stack

use crate::change::DocumentChange;

#[derive(Debug)]
pub struct UndoStack {
    done: Vec<DocumentChange>,
    undone: Vec<DocumentChange>,

    /// Maximum number of undo levels (0 = unlimited)
    max_levels: usize,
}

impl UndoStack {
    /// Create a new undo stack with default max levels (100)
    pub fn new() -> Self {
        Self::with_max_levels(100)
    }

    pub fn with_max_levels(max_levels: usize) -> Self {
        Self {
            done: Vec::new(),
            undone: Vec::new(),
            max_levels,
        }
    }

    /// Record a freshly committed change. Empty changes are ignored.
    pub fn record(&mut self, change: DocumentChange) {
        if change.is_empty() {
            return;
        }
        self.push_done(change);
        self.undone.clear();
    }

    fn push_done(&mut self, change: DocumentChange) {
        self.done.push(change);
        if self.max_levels > 0 && self.done.len() > self.max_levels {
            self.done.remove(0);
        }
    }

    /// Take the change to undo next
    pub fn pop_undo(&mut self) -> Option<DocumentChange> {
        self.done.pop()
    }

    /// Take the change to redo next
    pub fn pop_redo(&mut self) -> Option<DocumentChange> {
        self.undone.pop()
    }

    /// Park an undone change for redo
    pub fn push_redo(&mut self, change: DocumentChange) {
        self.undone.push(change);
    }

    /// Put a redone change back without clearing redo
    pub fn push_redone(&mut self, change: DocumentChange) {
        self.push_done(change);
    }

    pub fn can_undo(&self) -> bool {
        !self.done.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.undone.is_empty()
    }

    pub fn undo_levels(&self) -> usize {
        self.done.len()
    }

    pub fn redo_levels(&self) -> usize {
        self.undone.len()
    }

    pub fn clear(&mut self) {
        self.done.clear();
        self.undone.clear();
    }

    /// `info.description` of the next change to undo
    pub fn undo_description(&self) -> Option<&str> {
        self.done.last().and_then(description)
    }

    pub fn redo_description(&self) -> Option<&str> {
        self.undone.last().and_then(description)
    }
}

fn description(change: &DocumentChange) -> Option<&str> {
    change.info.get("description").and_then(|v| v.as_str())
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new()
    }
}
