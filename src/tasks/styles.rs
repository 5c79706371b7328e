//! The `styles` task: SCSS compilation and compression.
//!
//! Compiles each non-partial style source (partials are `_*.scss` and
//! only exist to be imported), concatenates the compiled CSS, compresses
//! it, and writes the single stylesheet bundle. Nothing is written until
//! every source compiled, so a broken edit leaves the previous stylesheet
//! in place; the runner's policy table turns the error into a recovered
//! failure rather than tearing down a watch session.

use crate::pipeline::{discover, AssetKind, PipelineContext};
use crate::tasks::{TaskError, TaskResult};
use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use std::fs;
use std::path::Path;

pub fn run(ctx: &PipelineContext) -> TaskResult {
    let assets = discover(ctx, AssetKind::Style)?;
    let entries: Vec<_> = assets.iter().filter(|a| !is_partial(&a.path)).collect();

    let mut compiled = String::new();
    for asset in &entries {
        let mut options = grass::Options::default().load_path(ctx.src_dir());
        if let Some(parent) = asset.path.parent() {
            options = options.load_path(parent);
        }
        let css = grass::from_path(&asset.path, &options).map_err(|e| {
            TaskError::StyleCompile(format!("{}: {}", asset.path.display(), e))
        })?;
        compiled.push_str(&css);
        if !compiled.ends_with('\n') {
            compiled.push('\n');
        }
    }

    let compressed = compress(&compiled)?;

    let out_path = ctx.dist_dir().join(&ctx.config().bundle.style);
    if let Some(parent) = out_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&out_path, &compressed).map_err(|e| TaskError::Write {
        path: out_path.clone(),
        source: e,
    })?;

    Ok(format!(
        "compiled {} stylesheets ({} bytes)",
        entries.len(),
        compressed.len()
    ))
}

/// Partials (`_name.scss`) are import-only and never compiled directly.
fn is_partial(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with('_'))
        .unwrap_or(false)
}

/// Compress compiled CSS.
fn compress(css: &str) -> Result<String, TaskError> {
    let mut sheet = StyleSheet::parse(css, ParserOptions::default())
        .map_err(|e| TaskError::StyleCompress(e.to_string()))?;
    sheet
        .minify(MinifyOptions::default())
        .map_err(|e| TaskError::StyleCompress(e.to_string()))?;
    let output = sheet
        .to_css(PrinterOptions { minify: true, ..Default::default() })
        .map_err(|e| TaskError::StyleCompress(e.to_string()))?;
    Ok(output.code)
}
