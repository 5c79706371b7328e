//! The `templates` task: template-cache module generation.
//!
//! Collects HTML templates, strips insignificant whitespace, and emits a
//! standalone script module that primes Angular's `$templateCache` so the
//! application never fetches markup over HTTP. Cache keys are the
//! template file name with its directory segments replaced by `.`, the
//! convention the application's router uses (`app/widgets/view.html`
//! registers as `./view.html`).
//!
//! The module is written to the pipeline work directory, outside the
//! output tree, so `clean` cannot race it away from a concurrent
//! `scripts` chain.

use crate::pipeline::{discover, AssetKind, PipelineContext};
use crate::tasks::{TaskError, TaskResult};
use crate::transforms::collapse_whitespace;
use std::fs;

pub fn run(ctx: &PipelineContext) -> TaskResult {
    let assets = discover(ctx, AssetKind::Template)?;

    let mut entries = String::new();
    for asset in &assets {
        let raw = fs::read_to_string(&asset.path).map_err(|e| TaskError::Read {
            path: asset.path.clone(),
            source: e,
        })?;
        let minified = collapse_whitespace(&raw);
        entries.push_str(&format!(
            "$templateCache.put('{}','{}');\n",
            cache_key(&asset.path),
            escape_single_quoted(&minified)
        ));
    }

    let module = format!(
        "angular.module('{module}', []).run(['$templateCache', function($templateCache) {{\n\
         'use strict';\n\
         {entries}}}]);\n",
        module = ctx.config().bundle.templates_module,
        entries = entries
    );

    let out_path = ctx.template_cache_path();
    if let Some(parent) = out_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&out_path, module).map_err(|e| TaskError::Write {
        path: out_path.clone(),
        source: e,
    })?;

    Ok(format!("cached {} templates", assets.len()))
}

/// Cache key for a template: its file name with every directory segment
/// replaced by `.`.
fn cache_key(path: &std::path::Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("./{}", name)
}

/// Escape template markup for embedding in a single-quoted JS string.
fn escape_single_quoted(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_config;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    fn context(temp: &TempDir) -> PipelineContext {
        PipelineContext::new(default_config(), temp.path().to_path_buf())
    }

    fn write_template(root: &Path, rel: &str, content: &str) {
        let path = root.join("src").join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_cache_key_replaces_directories() {
        assert_eq!(cache_key(&PathBuf::from("app/widgets/view.html")), "./view.html");
        assert_eq!(cache_key(&PathBuf::from("view.html")), "./view.html");
    }

    #[test]
    fn test_escape_single_quoted() {
        assert_eq!(escape_single_quoted("it's a \\ test"), "it\\'s a \\\\ test");
        assert_eq!(escape_single_quoted("a\nb"), "a\\nb");
    }

    #[test]
    fn test_generates_standalone_module() {
        let temp = TempDir::new().unwrap();
        write_template(temp.path(), "app/widgets/view.html", "<div>\n  <b>hi</b>\n</div>");
        let ctx = context(&temp);

        run(&ctx).unwrap();

        let module = fs::read_to_string(ctx.template_cache_path()).unwrap();
        assert!(module.starts_with("angular.module('templates', [])"));
        assert!(module.contains("$templateCache.put('./view.html','<div><b>hi</b></div>');"));
    }

    #[test]
    fn test_entries_sorted_by_source_path() {
        let temp = TempDir::new().unwrap();
        write_template(temp.path(), "app/b/second.html", "<i>2</i>");
        write_template(temp.path(), "app/a/first.html", "<i>1</i>");
        let ctx = context(&temp);

        run(&ctx).unwrap();

        let module = fs::read_to_string(ctx.template_cache_path()).unwrap();
        let first = module.find("first.html").unwrap();
        let second = module.find("second.html").unwrap();
        assert!(first < second);
    }

    #[test]
    fn test_no_templates_still_writes_module() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("src")).unwrap();
        let ctx = context(&temp);

        let summary = run(&ctx).unwrap();
        assert_eq!(summary, "cached 0 templates");
        assert!(ctx.template_cache_path().is_file());
    }

    #[test]
    fn test_quotes_in_markup_escaped() {
        let temp = TempDir::new().unwrap();
        write_template(temp.path(), "app/q.html", "<p class='x'>it's</p>");
        let ctx = context(&temp);

        run(&ctx).unwrap();

        let module = fs::read_to_string(ctx.template_cache_path()).unwrap();
        assert!(module.contains("<p class=\\'x\\'>it\\'s</p>"));
    }
}
