//! # Annotation helpers
//!
//! Truncate, expand and fuse annotations against a selection. Ordering of
//! endpoints goes through the document, so these work for both property
//! and container annotations.

use crate::document::Document;
use folio_model::{
    compare_coordinates, Coordinate, DocumentError, DocumentNode, DocumentResult, NodeData, NodeKind, Path,
    Range, Selection,
};
use std::cmp::Ordering;
use tracing::{debug, instrument};

fn endpoints(anno: &DocumentNode) -> DocumentResult<(Coordinate, Coordinate)> {
    match (anno.start(), anno.end()) {
        (Some(start), Some(end)) => Ok((start.clone(), end.clone())),
        _ => Err(DocumentError::invalid_state(format!("'{}' is not an annotation", anno.id))),
    }
}

fn selection_range(selection: &Selection) -> DocumentResult<Range> {
    selection
        .range()
        .ok_or_else(|| DocumentError::invalid_selection(format!("{} selection has no range", selection.kind_name())))
}

fn order(doc: &Document, a: &Coordinate, b: &Coordinate, container: Option<&Path>) -> DocumentResult<Ordering> {
    compare_coordinates(a, b, container, doc)
}

/// Clip the side of an annotation that lies inside `selection` to the
/// selection's nearest boundary. An annotation covered entirely is deleted.
#[instrument(skip(doc, selection))]
pub fn truncate_annotation(doc: &mut Document, anno_id: &str, selection: &Selection) -> DocumentResult<()> {
    if selection.is_collapsed() {
        return Err(DocumentError::invalid_selection("cannot truncate with a collapsed selection"));
    }
    let anno = doc.get_strict(anno_id)?.clone();
    let (a, b) = endpoints(&anno)?;
    let range = selection_range(selection)?;
    let container = anno.container_path().or_else(|| range.container_path.clone());
    let (s, e) = (range.start, range.end);

    let (starts_inside, ends_inside) = {
        let view: &Document = doc;
        let cmp = |x: &Coordinate, y: &Coordinate| order(view, x, y, container.as_ref());
        if cmp(&b, &s)? != Ordering::Greater || cmp(&e, &a)? != Ordering::Greater {
            return Ok(());
        }
        (cmp(&s, &a)? != Ordering::Greater, cmp(&b, &e)? != Ordering::Greater)
    };

    match (starts_inside, ends_inside) {
        (true, true) => {
            debug!(annotation = anno_id, "truncated away");
            doc.delete(anno_id)?;
        }
        (false, true) => doc.set(&anno.path("end"), s)?,
        (true, false) => doc.set(&anno.path("start"), e)?,
        (false, false) => {
            return Err(DocumentError::invalid_selection(
                "cannot truncate with a selection inside the annotation",
            ))
        }
    }
    Ok(())
}

/// Grow an annotation to cover `selection`; never shrinks it.
#[instrument(skip(doc, selection))]
pub fn expand_annotation(doc: &mut Document, anno_id: &str, selection: &Selection) -> DocumentResult<()> {
    let anno = doc.get_strict(anno_id)?.clone();
    let (a, b) = endpoints(&anno)?;
    let range = selection_range(selection)?;
    let property_annotation = doc
        .schema()
        .get_strict(&anno.node_type)?
        .kind()
        .is_property_annotation();
    if property_annotation && (range.start.path != a.path || range.end.path != a.path) {
        return Err(DocumentError::invalid_selection(format!(
            "'{}' cannot be expanded beyond {}",
            anno_id, a.path
        )));
    }

    let container = anno.container_path().or_else(|| range.container_path.clone());
    let move_start = order(doc, &range.start, &a, container.as_ref())? == Ordering::Less;
    let move_end = order(doc, &range.end, &b, container.as_ref())? == Ordering::Greater;

    if move_start {
        doc.set(&anno.path("start"), range.start)?;
    }
    if move_end {
        doc.set(&anno.path("end"), range.end)?;
    }
    Ok(())
}

/// Merge annotations of one type into the earliest-starting one, extended
/// to the latest end. Returns the surviving id.
#[instrument(skip(doc))]
pub fn fuse_annotations(doc: &mut Document, ids: &[String]) -> DocumentResult<String> {
    if ids.len() < 2 {
        return Err(DocumentError::invalid_state("fusing needs at least two annotations"));
    }
    let annos = ids
        .iter()
        .map(|id| doc.get_strict(id).cloned())
        .collect::<DocumentResult<Vec<_>>>()?;
    let node_type = &annos[0].node_type;
    if annos.iter().any(|anno| &anno.node_type != node_type) {
        return Err(DocumentError::invalid_state("only annotations of one type can be fused"));
    }

    let container = annos[0].container_path();
    let (mut first, mut first_start) = (0, endpoints(&annos[0])?.0);
    let mut last_end = endpoints(&annos[0])?.1;
    for (i, anno) in annos.iter().enumerate().skip(1) {
        let (start, end) = endpoints(anno)?;
        if order(doc, &start, &first_start, container.as_ref())? == Ordering::Less {
            first = i;
            first_start = start;
        }
        if order(doc, &end, &last_end, container.as_ref())? == Ordering::Greater {
            last_end = end;
        }
    }

    let survivor = annos[first].id.clone();
    for (i, anno) in annos.iter().enumerate() {
        if i != first {
            doc.delete(&anno.id)?;
        }
    }
    if annos[first].end() != Some(&last_end) {
        doc.set(&Path::new(survivor.clone(), "end"), last_end)?;
    }
    Ok(survivor)
}

/// Create an annotation spanning `selection`: a property annotation for a
/// property selection, a container annotation for a container selection.
pub fn annotate(doc: &mut Document, selection: &Selection, data: NodeData) -> DocumentResult<String> {
    if selection.is_collapsed() {
        return Err(DocumentError::invalid_selection("cannot annotate a collapsed selection"));
    }
    let kind = doc.schema().get_strict(&data.node_type)?.kind();
    let range = selection_range(selection)?;

    let data = match (kind, selection) {
        (NodeKind::PropertyAnnotation, Selection::Property(_)) => data
            .with("start", range.start)
            .with("end", range.end),
        (NodeKind::ContainerAnnotation, Selection::Container(_) | Selection::Property(_)) => {
            let container = range.container_path.ok_or_else(|| {
                DocumentError::invalid_selection("container annotation needs a container")
            })?;
            data.with("start", range.start)
                .with("end", range.end)
                .with("container_path", container)
        }
        _ => {
            return Err(DocumentError::invalid_state(format!(
                "cannot create '{}' from a {} selection",
                data.node_type,
                selection.kind_name()
            )))
        }
    };
    Ok(doc.create(data)?.id.clone())
}
