//! Angular dependency-injection annotation rewriting.
//!
//! Minification renames function parameters, which breaks Angular's
//! implicit parameter-name injection. This transform rewrites injectable
//! function expressions into the explicit array form before the bundle is
//! minified:
//!
//! ```text
//! .controller('Main', function($scope, $http) { ... })
//! .controller('Main', ['$scope', '$http', function($scope, $http) { ... }])
//! ```
//!
//! Covered forms: the named registrations (controller, directive,
//! factory, service, filter, provider, animation, component) and the
//! nameless `.config(...)` / `.run(...)` blocks. Sites that are already
//! annotated, take no parameters, or do not look exactly like the
//! patterns above are left unchanged. All insertions are in-line, so the
//! rewrite never changes the line count.

use regex::Regex;
use std::sync::OnceLock;

/// A point insertion into the original source.
struct Edit {
    pos: usize,
    text: String,
}

fn named_registration() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"\.(controller|directive|factory|service|filter|provider|animation|component)\s*\(\s*(?:'[^']*'|"[^"]*")\s*,\s*"#,
        )
        .expect("named registration pattern is valid")
    })
}

fn bare_registration() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\.(config|run)\s*\(\s*").expect("bare registration pattern is valid")
    })
}

/// Rewrite injectable function expressions into explicit array notation.
///
/// Idempotent: already-annotated sites do not match the rewrite patterns.
pub fn annotate(source: &str) -> String {
    let mut edits = Vec::new();

    for re in [named_registration(), bare_registration()] {
        for m in re.find_iter(source) {
            if let Some((head, tail)) = annotate_site(source, m.end()) {
                edits.push(Edit { pos: m.end(), text: head });
                edits.push(Edit { pos: tail, text: "]".to_string() });
            }
        }
    }

    apply_edits(source, edits)
}

/// Inspect one candidate site starting at the `function` keyword.
///
/// Returns the array-form prefix to insert at the site start and the
/// position (just before the call's closing paren) where the closing `]`
/// belongs. `None` means the site is left unchanged.
fn annotate_site(source: &str, fn_start: usize) -> Option<(String, usize)> {
    let rest = &source[fn_start..];
    if !rest.starts_with("function") {
        return None;
    }

    let params_open = fn_start + source[fn_start..].find('(')?;
    // Reject `function(` found past the parameter list of something else
    let between = &source[fn_start + "function".len()..params_open];
    if !between.chars().all(|c| c.is_whitespace() || c.is_ascii_alphanumeric() || c == '_' || c == '$')
    {
        return None;
    }

    let params_close = params_open + source[params_open..].find(')')?;
    let params: Vec<&str> = source[params_open + 1..params_close]
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();

    // Nothing is injected into a zero-parameter function
    if params.is_empty() {
        return None;
    }
    if !params.iter().all(|p| is_identifier(p)) {
        return None;
    }

    let body_open = params_close + source[params_close..].find('{')?;
    if !source[params_close + 1..body_open].chars().all(char::is_whitespace) {
        return None;
    }

    let body_close = find_matching_brace(source, body_open)?;

    // The function expression must be the call's last argument
    let mut after = body_close + 1;
    while source[after..].starts_with(|c: char| c.is_ascii_whitespace()) {
        after += 1;
    }
    if !source[after..].starts_with(')') {
        return None;
    }

    let quoted: Vec<String> = params.iter().map(|p| format!("'{}'", p)).collect();
    Some((format!("[{}, ", quoted.join(", ")), after))
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// Find the `}` matching the `{` at `open`, skipping string, comment, and
/// regex literals.
fn find_matching_brace(source: &str, open: usize) -> Option<usize> {
    #[derive(PartialEq)]
    enum Mode {
        Normal,
        LineComment,
        BlockComment,
        Str(char),
        StrEscape(char),
    }

    let mut depth = 0usize;
    let mut mode = Mode::Normal;
    let mut iter = source[open..].char_indices().peekable();

    while let Some((i, ch)) = iter.next() {
        match mode {
            Mode::Normal => match ch {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(open + i);
                    }
                }
                '"' | '\'' | '`' => mode = Mode::Str(ch),
                '/' => match iter.peek().map(|&(_, c)| c) {
                    Some('/') => mode = Mode::LineComment,
                    Some('*') => mode = Mode::BlockComment,
                    _ => {}
                },
                _ => {}
            },
            Mode::LineComment => {
                if ch == '\n' {
                    mode = Mode::Normal;
                }
            }
            Mode::BlockComment => {
                if ch == '*' && iter.peek().map(|&(_, c)| c) == Some('/') {
                    iter.next();
                    mode = Mode::Normal;
                }
            }
            Mode::Str(quote) => {
                if ch == '\\' {
                    mode = Mode::StrEscape(quote);
                } else if ch == quote {
                    mode = Mode::Normal;
                }
            }
            Mode::StrEscape(quote) => mode = Mode::Str(quote),
        }
    }

    None
}

/// Apply point insertions to the source, ascending by position.
fn apply_edits(source: &str, mut edits: Vec<Edit>) -> String {
    edits.sort_by_key(|e| e.pos);

    let mut out = String::with_capacity(source.len() + edits.len() * 16);
    let mut last = 0;
    for edit in edits {
        out.push_str(&source[last..edit.pos]);
        out.push_str(&edit.text);
        last = edit.pos;
    }
    out.push_str(&source[last..]);
    out
}
