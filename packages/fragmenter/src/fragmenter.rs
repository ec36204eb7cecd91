//! # Fragmenter
//!
//! Turns possibly overlapping annotation ranges over one text into a tree
//! of properly nested pieces.
//!
//! ## Algorithm
//!
//! 1. Rank annotations: inline nodes, then by weight (strongest first),
//!    ties by input order.
//! 2. Place them one by one. A new annotation is cut at the boundaries of
//!    every placed piece that crosses it, so placed pieces never cross.
//!    Lower-ranked annotations are the ones that get split.
//! 3. Sort pieces by start (empty pieces first), then longest first, and
//!    nest them. Gaps become text leaves.
//!
//! A `MustNotSplit` annotation can therefore only be split by another
//! `MustNotSplit` annotation placed before it. Inline nodes cover a single
//! character, so nothing can cross them, and they are always the innermost
//! piece over their character.

use folio_model::Weight;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

/// One annotation as seen by the fragmenter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationSpan {
    pub id: String,
    pub start: usize,
    pub end: usize,
    pub weight: Weight,
    /// Atomic one-character annotation
    #[serde(default)]
    pub inline: bool,
}

impl AnnotationSpan {
    pub fn new(id: impl Into<String>, start: usize, end: usize) -> Self {
        Self {
            id: id.into(),
            start,
            end,
            weight: Weight::Normal,
            inline: false,
        }
    }

    pub fn weight(mut self, weight: Weight) -> Self {
        self.weight = weight;
        self
    }

    pub fn inline(mut self) -> Self {
        self.inline = true;
        self.weight = Weight::MustNotSplit;
        self
    }
}

/// A contiguous part of one annotation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Piece {
    pub annotation: String,
    /// Position of the annotation in the input
    pub index: usize,
    /// 0 for the first piece of an annotation, 1 for the next, ...
    pub piece: usize,
    pub start: usize,
    pub end: usize,
    pub weight: Weight,
    pub inline: bool,
    pub children: Vec<FragmentNode>,
}

impl Piece {
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FragmentNode {
    Text { start: usize, end: usize },
    Piece(Piece),
}

impl FragmentNode {
    pub fn start(&self) -> usize {
        match self {
            FragmentNode::Text { start, .. } => *start,
            FragmentNode::Piece(piece) => piece.start,
        }
    }

    pub fn end(&self) -> usize {
        match self {
            FragmentNode::Text { end, .. } => *end,
            FragmentNode::Piece(piece) => piece.end,
        }
    }
}

/// A run of characters and the annotations covering it, outermost first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub start: usize,
    pub end: usize,
    pub annotations: Vec<String>,
}

/// Result of fragmenting one text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fragmentation {
    pub length: usize,
    pub roots: Vec<FragmentNode>,
}

impl Fragmentation {
    /// Flat partition of `[0, length)`
    pub fn segments(&self) -> Vec<Segment> {
        fn collect(nodes: &[FragmentNode], stack: &mut Vec<String>, out: &mut Vec<Segment>) {
            for node in nodes {
                match node {
                    FragmentNode::Text { start, end } => out.push(Segment {
                        start: *start,
                        end: *end,
                        annotations: stack.clone(),
                    }),
                    FragmentNode::Piece(piece) => {
                        stack.push(piece.annotation.clone());
                        collect(&piece.children, stack, out);
                        stack.pop();
                    }
                }
            }
        }

        let mut segments = Vec::new();
        collect(&self.roots, &mut Vec::new(), &mut segments);
        segments
    }

    /// All pieces in document order (pre-order)
    pub fn pieces(&self) -> Vec<&Piece> {
        fn collect<'a>(nodes: &'a [FragmentNode], out: &mut Vec<&'a Piece>) {
            for node in nodes {
                if let FragmentNode::Piece(piece) = node {
                    out.push(piece);
                    collect(&piece.children, out);
                }
            }
        }

        let mut pieces = Vec::new();
        collect(&self.roots, &mut pieces);
        pieces
    }

    /// Number of pieces `annotation` was cut into
    pub fn piece_count(&self, annotation: &str) -> usize {
        self.pieces().iter().filter(|p| p.annotation == annotation).count()
    }
}

/// Collects annotations over a text of `length` characters
#[derive(Debug, Clone, Default)]
pub struct Fragmenter {
    length: usize,
    spans: Vec<AnnotationSpan>,
}

#[derive(Debug, Clone)]
struct Placed {
    span: usize,
    piece: usize,
    start: usize,
    end: usize,
}

impl Fragmenter {
    pub fn new(length: usize) -> Self {
        Self {
            length,
            spans: Vec::new(),
        }
    }

    pub fn add(&mut self, span: AnnotationSpan) -> &mut Self {
        self.spans.push(span);
        self
    }

    pub fn extend(&mut self, spans: impl IntoIterator<Item = AnnotationSpan>) -> &mut Self {
        self.spans.extend(spans);
        self
    }

    #[instrument(skip(self), fields(length = self.length, annotations = self.spans.len()))]
    pub fn fragment(&self) -> Fragmentation {
        let spans: Vec<AnnotationSpan> = self.spans.iter().map(|span| self.clamp(span)).collect();

        let mut order: Vec<usize> = (0..spans.len()).collect();
        order.sort_by_key(|&i| rank(&spans[i], i));

        let mut placed: Vec<Placed> = Vec::new();
        for i in order {
            let span = &spans[i];
            let cuts = cut_points(span.start, span.end, &placed);
            if !cuts.is_empty() {
                debug!(annotation = %span.id, cuts = cuts.len(), "splitting annotation");
            }

            let mut from = span.start;
            for (piece, to) in cuts.into_iter().chain(std::iter::once(span.end)).enumerate() {
                placed.push(Placed {
                    span: i,
                    piece,
                    start: from,
                    end: to,
                });
                from = to;
            }
        }

        placed.sort_by_key(|p| {
            let span = &spans[p.span];
            (
                p.start,
                p.start != p.end,
                std::cmp::Reverse(p.end),
                span.inline,
                span.weight,
                p.span,
                p.piece,
            )
        });

        let roots = nest(&placed, &spans, 0, self.length);
        Fragmentation {
            length: self.length,
            roots,
        }
    }

    fn clamp(&self, span: &AnnotationSpan) -> AnnotationSpan {
        let mut span = span.clone();
        if span.end > self.length || span.start > span.end {
            warn!(annotation = %span.id, start = span.start, end = span.end, length = self.length, "annotation out of range, clamping");
        }
        span.end = span.end.min(self.length);
        span.start = span.start.min(span.end);
        span
    }
}

/// Fragment `spans` over a text of `length` characters
pub fn fragment(length: usize, spans: &[AnnotationSpan]) -> Fragmentation {
    let mut fragmenter = Fragmenter::new(length);
    fragmenter.extend(spans.iter().cloned());
    fragmenter.fragment()
}

/// Lower ranks are placed first and nest outside equal ranges
fn rank(span: &AnnotationSpan, index: usize) -> (bool, Weight, usize) {
    (!span.inline, span.weight, index)
}

/// Boundaries of placed pieces that cross `[start, end)`, ascending
fn cut_points(start: usize, end: usize, placed: &[Placed]) -> Vec<usize> {
    let mut cuts: Vec<usize> = placed
        .iter()
        .filter_map(|p| {
            if p.start < start && start < p.end && p.end < end {
                Some(p.end)
            } else if start < p.start && p.start < end && end < p.end {
                Some(p.start)
            } else {
                None
            }
        })
        .collect();
    cuts.sort_unstable();
    cuts.dedup();
    cuts
}

fn contains(outer: &Placed, inner: &Placed, spans: &[AnnotationSpan]) -> bool {
    if outer.start > inner.start || inner.end > outer.end {
        return false;
    }
    if spans[outer.span].inline {
        return inner.start == outer.start && inner.end == outer.end;
    }
    // an empty piece on the end boundary sits after `outer`, not inside it
    !(inner.start == inner.end && inner.start == outer.end)
}

/// Nest sorted pieces inside `[from, to)`, filling gaps with text
fn nest(pieces: &[Placed], spans: &[AnnotationSpan], from: usize, to: usize) -> Vec<FragmentNode> {
    let mut nodes = Vec::new();
    let mut cursor = from;
    let mut i = 0;

    while i < pieces.len() {
        let outer = &pieces[i];
        let mut j = i + 1;
        while j < pieces.len() && contains(outer, &pieces[j], spans) {
            j += 1;
        }

        if outer.start > cursor {
            nodes.push(FragmentNode::Text {
                start: cursor,
                end: outer.start,
            });
        }

        let span = &spans[outer.span];
        nodes.push(FragmentNode::Piece(Piece {
            annotation: span.id.clone(),
            index: outer.span,
            piece: outer.piece,
            start: outer.start,
            end: outer.end,
            weight: span.weight,
            inline: span.inline,
            children: nest(&pieces[i + 1..j], spans, outer.start, outer.end),
        }));
        cursor = cursor.max(outer.end);
        i = j;
    }

    if cursor < to {
        nodes.push(FragmentNode::Text { start: cursor, end: to });
    }
    nodes
}
