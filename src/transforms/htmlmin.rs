//! HTML whitespace collapsing for template-cache generation.
//!
//! Markup destined for the template cache is embedded in a generated
//! script module, so insignificant whitespace is pure payload. Collapsing
//! mirrors what a browser renders anyway: runs of whitespace become a
//! single space, and inter-tag whitespace disappears entirely.

/// Collapse insignificant whitespace in an HTML fragment.
///
/// - Runs of whitespace (spaces, tabs, newlines) become a single space
/// - Whitespace between a closing `>` and the next `<` is removed
/// - Leading and trailing whitespace is trimmed
pub fn collapse_whitespace(html: &str) -> String {
    let mut collapsed = String::with_capacity(html.len());
    let mut pending_space = false;

    for ch in html.chars() {
        if ch.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space {
            // Whitespace between tags carries no content
            if !(ch == '<' && collapsed.ends_with('>')) && !collapsed.is_empty() {
                collapsed.push(' ');
            }
            pending_space = false;
        }
        collapsed.push(ch);
    }

    collapsed
}
