//! Fragment a text property of a live document.

use crate::fragmenter::{AnnotationSpan, Fragmentation, Fragmenter};
use folio_document::Document;
use folio_model::{compare_coordinates, text, Coordinate, DocumentNode, DocumentResult, Path};
use std::cmp::Ordering;
use std::collections::HashSet;
use tracing::instrument;

/// Fragment `path` with its property annotations and every container
/// annotation that covers part of it
#[instrument(skip(doc), fields(path = %path))]
pub fn fragment_property(doc: &Document, path: &Path) -> DocumentResult<Fragmentation> {
    let length = text::char_len(doc.get_text(path)?);
    let mut fragmenter = Fragmenter::new(length);

    for anno in doc.get_annotations(path) {
        let node_type = doc.schema().get_strict(&anno.node_type)?;
        let (Some(start), Some(end)) = (anno.start(), anno.end()) else {
            continue;
        };
        let mut span = AnnotationSpan::new(anno.id.clone(), start.offset, end.offset).weight(node_type.fragmentation());
        if node_type.is_inline_node() {
            span = span.inline();
        }
        fragmenter.add(span);
    }

    for anno in container_annotations(doc, path.node_id()) {
        let node_type = doc.schema().get_strict(&anno.node_type)?;
        if let Some((start, end)) = coverage(doc, anno, path, length) {
            fragmenter.add(AnnotationSpan::new(anno.id.clone(), start, end).weight(node_type.fragmentation()));
        }
    }

    Ok(fragmenter.fragment())
}

/// Container annotations that may cover `node_id`: those anchored in it and
/// those living in any container on its ownership chain
fn container_annotations<'a>(doc: &'a Document, node_id: &str) -> Vec<&'a DocumentNode> {
    let mut found: Vec<&DocumentNode> = doc.get_container_annotations_at(node_id);
    let mut seen: HashSet<String> = HashSet::from([node_id.to_string()]);
    let mut current = node_id.to_string();

    while let Some((owner, property)) = doc.owner_of(&current) {
        let owner = owner.to_string();
        for anno in doc.get_container_annotations(&Path::new(owner.clone(), property)) {
            if !found.iter().any(|n| n.id == anno.id) {
                found.push(anno);
            }
        }
        if !seen.insert(owner.clone()) {
            break;
        }
        current = owner;
    }
    found
}

/// Part of `path` covered by a container annotation
fn coverage(doc: &Document, anno: &DocumentNode, path: &Path, length: usize) -> Option<(usize, usize)> {
    let container = anno.container_path()?;
    let (start, end) = (anno.start()?, anno.end()?);
    let first = Coordinate::new(path.clone(), 0);
    let last = Coordinate::new(path.clone(), length);

    let from = if &start.path == path {
        start.offset
    } else if compare_coordinates(start, &first, Some(&container), doc).ok()? == Ordering::Less {
        0
    } else {
        return None;
    };
    let to = if &end.path == path {
        end.offset
    } else if compare_coordinates(end, &last, Some(&container), doc).ok()? == Ordering::Greater {
        length
    } else {
        return None;
    };

    (from <= to).then_some((from, to))
}
