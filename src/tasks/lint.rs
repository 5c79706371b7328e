//! The `style:js` and `hint:html` tasks: static checks.
//!
//! Diagnostics only: violations are printed with their location and
//! counted in the task summary, but never fail the run. The checks are
//! the project's house rules, not a full linter:
//!
//! JavaScript: loose equality (`==`/`!=`), stray `debugger` statements,
//! trailing whitespace. Markup: lowercase tag names, double-quoted
//! attribute values, unique `id` attributes per document.

use crate::pipeline::{discover_files, PipelineContext};
use crate::tasks::{TaskError, TaskResult};
use regex::Regex;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

/// A single reported violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// 1-based line number
    pub line: usize,
    /// Rule identifier
    pub rule: &'static str,
    /// Human-readable message
    pub message: String,
}

/// Check all scripts under the source root.
pub fn run_js(ctx: &PipelineContext) -> TaskResult {
    let files = discover_files(&ctx.src_dir(), "**/*.js")?;

    let mut total = 0usize;
    for path in &files {
        let content = fs::read_to_string(path).map_err(|e| TaskError::Read {
            path: path.clone(),
            source: e,
        })?;
        let violations = check_js(&content);
        report(path, &violations);
        total += violations.len();
    }

    Ok(summary("scripts", files.len(), total))
}

/// Check all markup under the source root.
pub fn run_html(ctx: &PipelineContext) -> TaskResult {
    let files = discover_files(&ctx.src_dir(), "**/*.html")?;

    let mut total = 0usize;
    for path in &files {
        let content = fs::read_to_string(path).map_err(|e| TaskError::Read {
            path: path.clone(),
            source: e,
        })?;
        let violations = check_html(&content);
        report(path, &violations);
        total += violations.len();
    }

    Ok(summary("documents", files.len(), total))
}

fn report(path: &Path, violations: &[Violation]) {
    for v in violations {
        println!("{}:{}: [{}] {}", path.display(), v.line, v.rule, v.message);
    }
}

fn summary(noun: &str, files: usize, problems: usize) -> String {
    if problems == 0 {
        format!("{} {} clean", files, noun)
    } else {
        format!("{} problems in {} {}", problems, files, noun)
    }
}

/// Line-based JavaScript checks.
pub fn check_js(source: &str) -> Vec<Violation> {
    static DEBUGGER: OnceLock<Regex> = OnceLock::new();
    let debugger =
        DEBUGGER.get_or_init(|| Regex::new(r"\bdebugger\b").expect("debugger pattern is valid"));

    let mut violations = Vec::new();
    for (i, line) in source.lines().enumerate() {
        let line_no = i + 1;

        if has_loose_equality(line) {
            violations.push(Violation {
                line: line_no,
                rule: "eqeqeq",
                message: "expected '===' or '!==' instead of loose equality".to_string(),
            });
        }
        if debugger.is_match(line) {
            violations.push(Violation {
                line: line_no,
                rule: "no-debugger",
                message: "unexpected 'debugger' statement".to_string(),
            });
        }
        if line != line.trim_end() {
            violations.push(Violation {
                line: line_no,
                rule: "no-trailing-spaces",
                message: "trailing whitespace".to_string(),
            });
        }
    }
    violations
}

/// Whether a line contains `==` or `!=` that is not part of a strict
/// operator or an arrow-like token.
fn has_loose_equality(line: &str) -> bool {
    let bytes = line.as_bytes();
    let mut i = 0;
    while i + 1 < bytes.len() {
        if bytes[i] == b'=' && bytes[i + 1] == b'=' {
            let prev = i.checked_sub(1).map(|p| bytes[p]);
            let next = bytes.get(i + 2);
            let strict = next == Some(&b'=') || matches!(prev, Some(b'=') | Some(b'!'));
            let comparison = matches!(prev, Some(b'<') | Some(b'>'));
            if !strict && !comparison {
                return true;
            }
            i += 2;
            continue;
        }
        if bytes[i] == b'!' && bytes[i + 1] == b'=' && bytes.get(i + 2) != Some(&b'=') {
            return true;
        }
        i += 1;
    }
    false
}

/// Tag-based markup checks.
pub fn check_html(source: &str) -> Vec<Violation> {
    static TAG: OnceLock<Regex> = OnceLock::new();
    static ATTR: OnceLock<Regex> = OnceLock::new();
    let tag = TAG.get_or_init(|| {
        Regex::new(r#"<([A-Za-z][A-Za-z0-9-]*)((?:[^>"']|"[^"]*"|'[^']*')*)>"#)
            .expect("tag pattern is valid")
    });
    let attr = ATTR.get_or_init(|| {
        Regex::new(r#"([A-Za-z][A-Za-z0-9-]*)\s*=\s*("[^"]*"|'[^']*'|[^\s>]+)"#)
            .expect("attribute pattern is valid")
    });

    let mut violations = Vec::new();
    let mut seen_ids: HashMap<String, usize> = HashMap::new();

    for (i, line) in source.lines().enumerate() {
        let line_no = i + 1;
        for caps in tag.captures_iter(line) {
            let name = &caps[1];
            if name.chars().any(|c| c.is_ascii_uppercase()) {
                violations.push(Violation {
                    line: line_no,
                    rule: "tagname-lowercase",
                    message: format!("tag name '{}' should be lowercase", name),
                });
            }

            let attrs = caps.get(2).map(|m| m.as_str()).unwrap_or("");
            for attr_caps in attr.captures_iter(attrs) {
                let attr_name = attr_caps[1].to_lowercase();
                let value = &attr_caps[2];
                if !value.starts_with('"') {
                    violations.push(Violation {
                        line: line_no,
                        rule: "attr-value-double-quotes",
                        message: format!("value of '{}' should use double quotes", attr_name),
                    });
                }
                if attr_name == "id" {
                    let id = value.trim_matches(|c| c == '"' || c == '\'').to_string();
                    if let Some(first) = seen_ids.get(&id) {
                        violations.push(Violation {
                            line: line_no,
                            rule: "id-unique",
                            message: format!("duplicate id '{}' (first used on line {})", id, first),
                        });
                    } else {
                        seen_ids.insert(id, line_no);
                    }
                }
            }
        }
    }
    violations
}
