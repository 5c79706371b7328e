//! Conservative JavaScript minification.
//!
//! A pure-Rust minifier for bundle output: strips comments and collapses
//! whitespace without parsing the full grammar. Newlines are preserved by
//! the individual passes so line-based source maps built before
//! minification stay valid; `minify` drops blank lines as a final step
//! for callers that do not need line fidelity.
//!
//! Constraints:
//! - No shell-out to external tools
//! - Must not panic on any input; if a construct is ambiguous, emit it
//!   unchanged (conservative fallback)
//! - Deterministic: same input, same output

/// Lexer state for the single-pass scanner.
enum Mode {
    Normal,
    LineComment,
    BlockComment,
    Str(char),
    StrEscape(char),
    Regex,
    RegexClass,
    RegexEscape { in_class: bool },
}

/// Whether a `/` in this position starts a regex literal rather than a
/// division. Classic heuristic: look at the preceding significant token.
fn regex_follows(last_significant: Option<char>, last_word: &str) -> bool {
    if matches!(
        last_word,
        "return"
            | "case"
            | "typeof"
            | "instanceof"
            | "in"
            | "of"
            | "new"
            | "delete"
            | "void"
            | "do"
            | "else"
            | "yield"
            | "throw"
    ) {
        return true;
    }
    match last_significant {
        None => true,
        Some(c) => matches!(
            c,
            '(' | ',' | '=' | ':' | '[' | '!' | '&' | '|' | '?' | '{' | ';' | '+' | '-' | '*'
                | '%' | '<' | '>' | '~' | '^'
        ),
    }
}

/// One pass over the source. `strip` removes comments, `collapse`
/// reduces whitespace runs to a single inter-token space and trims line
/// ends. Both options preserve the line count.
fn process(source: &str, strip: bool, collapse: bool) -> String {
    let mut out = String::with_capacity(source.len());
    let mut mode = Mode::Normal;
    let mut chars = source.chars().peekable();
    let mut last_significant: Option<char> = None;
    let mut last_word = String::new();
    let mut pending_space = false;
    let mut line_has_content = false;

    while let Some(ch) = chars.next() {
        match mode {
            Mode::Normal => {
                if ch == '\n' {
                    out.push('\n');
                    pending_space = false;
                    line_has_content = false;
                    continue;
                }
                if ch.is_whitespace() {
                    if collapse {
                        pending_space = true;
                    } else {
                        out.push(ch);
                    }
                    continue;
                }
                if ch == '/' && strip {
                    match chars.peek() {
                        Some('/') => {
                            chars.next();
                            mode = Mode::LineComment;
                            continue;
                        }
                        Some('*') => {
                            chars.next();
                            mode = Mode::BlockComment;
                            continue;
                        }
                        _ => {}
                    }
                }

                if pending_space && line_has_content {
                    out.push(' ');
                }
                pending_space = false;
                line_has_content = true;
                out.push(ch);

                match ch {
                    '"' | '\'' | '`' => {
                        mode = Mode::Str(ch);
                        last_word.clear();
                        last_significant = Some(ch);
                    }
                    '/' => {
                        if regex_follows(last_significant, &last_word) {
                            mode = Mode::Regex;
                        }
                        last_word.clear();
                        last_significant = Some('/');
                    }
                    _ => {
                        if ch.is_ascii_alphanumeric() || ch == '_' || ch == '$' {
                            last_word.push(ch);
                        } else {
                            last_word.clear();
                        }
                        last_significant = Some(ch);
                    }
                }
            }
            Mode::LineComment => {
                if ch == '\n' {
                    out.push('\n');
                    pending_space = false;
                    line_has_content = false;
                    mode = Mode::Normal;
                }
            }
            Mode::BlockComment => {
                if ch == '\n' {
                    out.push('\n');
                    pending_space = false;
                    line_has_content = false;
                } else if ch == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    // A comment separates tokens the way whitespace does
                    if collapse {
                        pending_space = true;
                    } else {
                        out.push(' ');
                    }
                    mode = Mode::Normal;
                }
            }
            Mode::Str(quote) => {
                out.push(ch);
                if ch == '\\' {
                    mode = Mode::StrEscape(quote);
                } else if ch == quote {
                    mode = Mode::Normal;
                }
            }
            Mode::StrEscape(quote) => {
                out.push(ch);
                mode = Mode::Str(quote);
            }
            Mode::Regex => {
                out.push(ch);
                match ch {
                    '\\' => mode = Mode::RegexEscape { in_class: false },
                    '[' => mode = Mode::RegexClass,
                    '/' => mode = Mode::Normal,
                    // Regex literals cannot span lines; bail back to normal
                    '\n' => mode = Mode::Normal,
                    _ => {}
                }
            }
            Mode::RegexClass => {
                out.push(ch);
                match ch {
                    '\\' => mode = Mode::RegexEscape { in_class: true },
                    ']' => mode = Mode::Regex,
                    _ => {}
                }
            }
            Mode::RegexEscape { in_class } => {
                out.push(ch);
                mode = if in_class { Mode::RegexClass } else { Mode::Regex };
            }
        }
    }

    out
}

/// Strip `//` and `/* */` comments, preserving the line count.
///
/// Comments inside string and regex literals are left alone. A removed
/// block comment leaves a single space so adjacent tokens do not merge.
pub fn strip_comments(source: &str) -> String {
    process(source, true, false)
}

/// Collapse whitespace runs to a single inter-token space and trim line
/// ends, preserving the line count.
///
/// String and regex literal contents are untouched. Newlines are kept, so
/// semicolon insertion is unaffected. Intended to run after
/// [`strip_comments`].
pub fn collapse_line_whitespace(source: &str) -> String {
    process(source, false, true)
}

/// Full conservative minification: strip comments, collapse whitespace,
/// drop blank lines.
pub fn minify(source: &str) -> String {
    let stripped = strip_comments(source);
    let collapsed = collapse_line_whitespace(&stripped);

    let mut out = String::with_capacity(collapsed.len());
    for line in collapsed.lines().filter(|l| !l.is_empty()) {
        out.push_str(line);
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_line_comment() {
        assert_eq!(strip_comments("var a = 1; // note\nvar b;"), "var a = 1; \nvar b;");
    }

    #[test]
    fn test_strip_block_comment_keeps_lines() {
        let src = "var a; /* one\ntwo */ var b;";
        assert_eq!(strip_comments(src), "var a; \n  var b;");
    }

    #[test]
    fn test_strip_keeps_comment_like_strings() {
        let src = "var url = 'http://example.com'; // real comment";
        assert_eq!(strip_comments(src), "var url = 'http://example.com'; ");
    }

    #[test]
    fn test_strip_block_comment_separates_tokens() {
        assert_eq!(strip_comments("var/*c*/x;"), "var x;");
    }

    #[test]
    fn test_strip_leaves_regex_with_slashes() {
        let src = "var re = /a\\/\\/b/; var c = 1;";
        assert_eq!(strip_comments(src), src);
    }

    #[test]
    fn test_division_not_treated_as_regex() {
        let src = "var x = a / b / c; // half";
        assert_eq!(strip_comments(src), "var x = a / b / c; ");
    }

    #[test]
    fn test_regex_after_return() {
        let src = "return /ab|cd/.test(s); // check";
        assert_eq!(strip_comments(src), "return /ab|cd/.test(s); ");
    }

    #[test]
    fn test_regex_character_class_with_slash() {
        let src = "var re = /[/]/; // slash class";
        assert_eq!(strip_comments(src), "var re = /[/]/; ");
    }

    #[test]
    fn test_collapse_preserves_strings() {
        let src = "var s = 'a   b';";
        assert_eq!(collapse_line_whitespace(src), "var s = 'a   b';");
    }

    #[test]
    fn test_collapse_trims_and_joins() {
        let src = "  var   a =  1;  \n\tvar b = 2;";
        assert_eq!(collapse_line_whitespace(src), "var a = 1;\nvar b = 2;");
    }

    #[test]
    fn test_collapse_preserves_line_count() {
        let src = "a;\n\n   \nb;\n";
        let out = collapse_line_whitespace(src);
        assert_eq!(out.matches('\n').count(), src.matches('\n').count());
    }

    #[test]
    fn test_minify_drops_blank_lines() {
        let src = "var a = 1;\n\n// gone\n\nvar b = 2;\n";
        assert_eq!(minify(src), "var a = 1;\nvar b = 2;\n");
    }

    #[test]
    fn test_minify_never_larger() {
        let src = "function add(a, b) {\n    // sum\n    return a + b;\n}\n";
        assert!(minify(src).len() <= src.len());
    }

    #[test]
    fn test_minify_idempotent() {
        let src = "var a = 1;   // x\nfunction f() { return a; }\n";
        let once = minify(src);
        assert_eq!(minify(&once), once);
    }

    #[test]
    fn test_minify_preserves_asi_newlines() {
        let src = "var a = b\n(1 + 2).toString()\n";
        let out = minify(src);
        assert!(out.contains('\n'));
        assert_eq!(out, "var a = b\n(1 + 2).toString()\n");
    }
}
