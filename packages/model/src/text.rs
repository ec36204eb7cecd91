//! Character-offset helpers.
//!
//! Offsets throughout the engine count Unicode scalar values, not bytes.

pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn byte_offset(s: &str, offset: usize) -> usize {
    s.char_indices()
        .nth(offset)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

/// Characters in `[start, end)`, clamped to the string.
pub fn slice(s: &str, start: usize, end: usize) -> &str {
    let from = byte_offset(s, start);
    let to = byte_offset(s, end.max(start));
    &s[from..to]
}

pub fn insert(s: &mut String, offset: usize, text: &str) {
    let at = byte_offset(s, offset);
    s.insert_str(at, text);
}

/// Remove `[start, end)` and return the removed characters.
pub fn remove(s: &mut String, start: usize, end: usize) -> String {
    let from = byte_offset(s, start);
    let to = byte_offset(s, end.max(start));
    s.drain(from..to).collect()
}
