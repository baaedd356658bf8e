//! Text normalization and overlapping-window splitting.
//!
//! Source documents arrive as extracted text with irregular line breaks.
//! Normalization collapses that into a single flowing line so window
//! boundaries never depend on the original layout.

/// Collapse blank-line runs and whitespace runs into single spaces.
pub fn normalize_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_was_space = true; // swallow leading whitespace
    for ch in text.chars() {
        if ch.is_whitespace() {
            if !last_was_space {
                out.push(' ');
                last_was_space = true;
            }
        } else {
            out.push(ch);
            last_was_space = false;
        }
    }
    if out.ends_with(' ') {
        out.pop();
    }
    out
}

/// Split text into overlapping windows of `size` characters with `overlap`
/// characters shared between consecutive windows.
///
/// Operates on character boundaries, so multi-byte text is never split
/// mid-codepoint. An `overlap >= size` is clamped to `size - 1` so the
/// window start always advances.
pub fn split_overlapping(text: &str, size: usize, overlap: usize) -> Vec<String> {
    if text.is_empty() || size == 0 {
        return Vec::new();
    }

    let overlap = overlap.min(size.saturating_sub(1));
    let step = size - overlap;
    let chars: Vec<char> = text.chars().collect();

    let mut windows = Vec::new();
    let mut start = 0;
    while start < chars.len() {
        let end = (start + size).min(chars.len());
        windows.push(chars[start..end].iter().collect());
        if end == chars.len() {
            break;
        }
        start += step;
    }
    windows
}
