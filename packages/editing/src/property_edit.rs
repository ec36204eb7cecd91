//! # Text edits on one property
//!
//! Every change to the characters of a text property goes through
//! [`insert_text_at`] or [`delete_text_range`]. Both apply the text diff and
//! then reposition the annotations anchored in that property.
//!
//! For an edit replacing `[s, e)` with `L` characters, an annotation
//! `[a, b)` moves as follows:
//!
//! | Case | Relation | Shift |
//! |---|---|---|
//! | I | b < s | none |
//! | II | a ≥ e | a, b += s−e+L |
//! | III | s ≤ a and b < e (or inline node covered) | deleted |
//! | IV | a ≥ s, b ≥ e | a += s−a+L unless typing over and a == s; b += s−e+L |
//! | V | a < s, b < e | b += s−b+L |
//! | VI | b == s and no auto-expand-right | none |
//! | VII | a < s, b ≥ e | b += s−e+L unless inline node |
//!
//! Pure deletions (`L = 0`) use the closed variant: I is `b ≤ s`, III is
//! `s ≤ a and b ≤ e`, and in IV the start only moves when `a > s`.

use folio_document::{DiffOp, Document};
use folio_model::{text, Coordinate, DocumentError, DocumentNode, DocumentResult, Path};
use tracing::{debug, warn};

/// What happens to one annotation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Shift {
    Keep,
    Move { start: isize, end: isize },
    Remove,
}

/// `[start, end)` replaced by `inserted` characters
#[derive(Debug, Clone, Copy)]
pub(crate) struct TextEdit {
    pub start: usize,
    pub end: usize,
    pub inserted: usize,
}

impl TextEdit {
    fn is_deletion(&self) -> bool {
        self.inserted == 0 && self.start < self.end
    }

    fn typeover(&self) -> bool {
        self.start < self.end
    }

    fn delta(&self) -> isize {
        self.start as isize - self.end as isize + self.inserted as isize
    }
}

/// Repositioning of a property annotation `[a, b)`. `None` when the
/// annotation is malformed.
pub(crate) fn shift_annotation(a: usize, b: usize, edit: TextEdit, expands_right: bool, inline: bool) -> Option<Shift> {
    if a > b {
        return None;
    }
    if edit.is_deletion() {
        return Some(shift_for_deletion(a, b, edit));
    }

    let (a, b) = (a as isize, b as isize);
    let (s, e, l) = (edit.start as isize, edit.end as isize, edit.inserted as isize);
    let delta = edit.delta();

    // cases are tried in table order; VI only sees what II to V left over
    let shift = if b < s {
        Shift::Keep
    } else if a >= e {
        Shift::Move { start: delta, end: delta }
    } else if s <= a && (b < e || (inline && b <= e)) {
        Shift::Remove
    } else if a >= s {
        let start = if edit.typeover() && a == s { 0 } else { s - a + l };
        Shift::Move { start, end: delta }
    } else if b < e {
        // an inline node here ends exactly at `s` and never grows
        if inline {
            Shift::Keep
        } else {
            Shift::Move { start: 0, end: s - b + l }
        }
    } else if b == s && !expands_right {
        Shift::Keep
    } else if inline {
        Shift::Keep
    } else {
        Shift::Move { start: 0, end: delta }
    };
    Some(shift)
}

fn shift_for_deletion(a: usize, b: usize, edit: TextEdit) -> Shift {
    let (a, b) = (a as isize, b as isize);
    let (s, e) = (edit.start as isize, edit.end as isize);
    let delta = edit.delta();

    if b <= s {
        Shift::Keep
    } else if a >= e {
        Shift::Move { start: delta, end: delta }
    } else if s <= a && b <= e {
        Shift::Remove
    } else if a >= s {
        let start = if a > s { s - a } else { 0 };
        Shift::Move { start, end: delta }
    } else if b <= e {
        Shift::Move { start: 0, end: s - b }
    } else {
        Shift::Move { start: 0, end: delta }
    }
}

/// New offset of a container annotation endpoint
pub(crate) fn shift_endpoint(offset: usize, edit: TextEdit) -> usize {
    if offset <= edit.start {
        offset
    } else if offset >= edit.end {
        (offset as isize + edit.delta()) as usize
    } else {
        edit.start + edit.inserted
    }
}

/// Replace `[start, end)` of `path` with `content`
pub fn insert_text_at(doc: &mut Document, path: &Path, start: usize, end: usize, content: &str) -> DocumentResult<()> {
    check_range(doc, path, start, end)?;
    let inserted = text::char_len(content);
    if start == end && inserted == 0 {
        return Ok(());
    }

    if start < end {
        doc.update(path, DiffOp::delete(start, end))?;
    }
    if inserted > 0 {
        doc.update(path, DiffOp::insert(start, content))?;
    }
    reposition(doc, path, TextEdit { start, end, inserted })
}

/// Remove `[start, end)` of `path`
pub fn delete_text_range(doc: &mut Document, path: &Path, start: usize, end: usize) -> DocumentResult<()> {
    check_range(doc, path, start, end)?;
    if start == end {
        return Ok(());
    }
    doc.update(path, DiffOp::delete(start, end))?;
    reposition(doc, path, TextEdit { start, end, inserted: 0 })
}

fn check_range(doc: &Document, path: &Path, start: usize, end: usize) -> DocumentResult<()> {
    let len = text::char_len(doc.get_text(path)?);
    if start > end || end > len {
        return Err(DocumentError::invalid_selection(format!(
            "[{}, {}) is not inside {} (length {})",
            start, end, path, len
        )));
    }
    Ok(())
}

fn reposition(doc: &mut Document, path: &Path, edit: TextEdit) -> DocumentResult<()> {
    let annotations: Vec<DocumentNode> = doc.get_annotations(path).into_iter().cloned().collect();
    for anno in annotations {
        let (Some(start), Some(end)) = (anno.start(), anno.end()) else {
            continue;
        };
        let node_type = doc.node_type_of(&anno.id)?;
        let shift = shift_annotation(
            start.offset,
            end.offset,
            edit,
            node_type.expands_right(),
            node_type.is_inline_node(),
        );

        match shift {
            Some(Shift::Keep) => {}
            Some(Shift::Move { start, end }) => {
                if start != 0 {
                    doc.update(&anno.path("start"), DiffOp::shift(start))?;
                }
                if end != 0 {
                    doc.update(&anno.path("end"), DiffOp::shift(end))?;
                }
            }
            Some(Shift::Remove) => {
                debug!(annotation = %anno.id, "annotation removed with its text");
                doc.delete(&anno.id)?;
            }
            None => {
                warn!(
                    annotation = %anno.id,
                    start = start.offset,
                    end = end.offset,
                    edit_start = edit.start,
                    edit_end = edit.end,
                    "unhandled annotation case, leaving it in place"
                );
            }
        }
    }

    let container_annotations: Vec<DocumentNode> = doc
        .get_container_annotations_at(path.node_id())
        .into_iter()
        .cloned()
        .collect();
    for anno in container_annotations {
        for (property, coordinate) in [("start", anno.start()), ("end", anno.end())] {
            let Some(coordinate) = coordinate.filter(|c| &c.path == path) else {
                continue;
            };
            let offset = shift_endpoint(coordinate.offset, edit);
            if offset != coordinate.offset {
                doc.set(&anno.path(property), Coordinate::new(path.clone(), offset))?;
            }
        }
    }
    Ok(())
}
