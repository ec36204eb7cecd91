use crate::fragmenter::{FragmentNode, Fragmentation, Piece};
use folio_model::text;

/// Receives fragments in position order. A piece ending at an offset is
/// exited before any piece starting there is entered.
pub trait FragmentVisitor {
    fn enter(&mut self, _piece: &Piece) {}

    fn text(&mut self, _start: usize, _end: usize) {}

    fn exit(&mut self, _piece: &Piece) {}
}

pub fn walk<V: FragmentVisitor>(visitor: &mut V, fragmentation: &Fragmentation) {
    walk_nodes(visitor, &fragmentation.roots);
}

fn walk_nodes<V: FragmentVisitor>(visitor: &mut V, nodes: &[FragmentNode]) {
    for node in nodes {
        match node {
            FragmentNode::Text { start, end } => visitor.text(*start, *end),
            FragmentNode::Piece(piece) => {
                visitor.enter(piece);
                walk_nodes(visitor, &piece.children);
                visitor.exit(piece);
            }
        }
    }
}

/// Renders fragments as bracket markup, e.g. `[strong]He[/strong]llo`
pub struct MarkupPrinter<'a, F: Fn(&Piece) -> String> {
    text: &'a str,
    label: F,
    out: String,
}

impl<'a, F: Fn(&Piece) -> String> MarkupPrinter<'a, F> {
    pub fn new(text: &'a str, label: F) -> Self {
        Self {
            text,
            label,
            out: String::new(),
        }
    }

    pub fn finish(self) -> String {
        self.out
    }
}

impl<'a, F: Fn(&Piece) -> String> FragmentVisitor for MarkupPrinter<'a, F> {
    fn enter(&mut self, piece: &Piece) {
        self.out.push('[');
        self.out.push_str(&(self.label)(piece));
        self.out.push(']');
    }

    fn text(&mut self, start: usize, end: usize) {
        self.out.push_str(text::slice(self.text, start, end));
    }

    fn exit(&mut self, piece: &Piece) {
        self.out.push_str("[/");
        self.out.push_str(&(self.label)(piece));
        self.out.push(']');
    }
}

/// Markup labelled with annotation ids
pub fn render_markup(text: &str, fragmentation: &Fragmentation) -> String {
    let mut printer = MarkupPrinter::new(text, |piece: &Piece| piece.annotation.clone());
    walk(&mut printer, fragmentation);
    printer.finish()
}
