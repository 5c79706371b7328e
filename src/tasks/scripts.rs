//! The `scripts` task: application bundle assembly.
//!
//! Bundle order is significant for Angular: module declarations
//! (`*.module.js`) must register before anything attaches to them, so
//! they come first, then the remaining application scripts, then the
//! generated template-cache module. Each file is wrapped in an isolating
//! closure bound to the shared `window.angular` global, the concatenation
//! is rewritten to explicit DI annotations, deploy mode minifies, and a
//! line-based source map is emitted alongside the bundle.
//!
//! Output is byte-identical across runs on identical input; the map
//! carries no timestamps.

use crate::pipeline::{discover, Asset, AssetKind, PipelineContext};
use crate::tasks::{TaskError, TaskResult};
use crate::transforms::{annotate, collapse_line_whitespace, strip_comments, SourceMapBuilder};
use std::fs;
use std::path::{Path, PathBuf};

/// Closure head lines prepended to every bundled file.
const WRAP_HEAD: [&str; 2] = ["(function(angular){", "'use strict';"];
/// Closure tail line appended after every bundled file.
const WRAP_TAIL: &str = "})(window.angular);";

pub fn run(ctx: &PipelineContext) -> TaskResult {
    let sources = ordered_sources(ctx)?;

    let bundle_rel = ctx.config().bundle.script.clone();
    let bundle_path = ctx.dist_dir().join(&bundle_rel);
    let bundle_file = bundle_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "bundle.js".to_string());
    let map_file = format!("{}.map", bundle_file);

    let mut bundle = String::new();
    let mut map = SourceMapBuilder::new(&bundle_file);

    for path in &sources {
        let content = fs::read_to_string(path).map_err(|e| TaskError::Read {
            path: path.clone(),
            source: e,
        })?;
        let source_index = map.add_source(&display_name(ctx, path), &content);

        for head in WRAP_HEAD {
            bundle.push_str(head);
            bundle.push('\n');
            map.pad_line();
        }
        for (line_no, line) in content.lines().enumerate() {
            bundle.push_str(line);
            bundle.push('\n');
            map.map_line(source_index, line_no);
        }
        bundle.push_str(WRAP_TAIL);
        bundle.push('\n');
        map.pad_line();
    }

    // Annotation is line-preserving, so the map built above stays valid
    let mut bundle = annotate(&bundle);

    if ctx.is_deploy() {
        let collapsed = collapse_line_whitespace(&strip_comments(&bundle));
        let keep: Vec<bool> = collapsed.lines().map(|l| !l.is_empty()).collect();
        let mut kept = String::with_capacity(collapsed.len());
        for line in collapsed.lines().filter(|l| !l.is_empty()) {
            kept.push_str(line);
            kept.push('\n');
        }
        map.retain_lines(&keep);
        bundle = kept;
    }

    bundle.push_str(&format!("//# sourceMappingURL={}\n", map_file));

    if let Some(parent) = bundle_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&bundle_path, &bundle).map_err(|e| TaskError::Write {
        path: bundle_path.clone(),
        source: e,
    })?;

    let map_path = bundle_path.with_file_name(&map_file);
    fs::write(&map_path, map.to_json()).map_err(|e| TaskError::Write {
        path: map_path.clone(),
        source: e,
    })?;

    Ok(format!(
        "bundled {} scripts ({} bytes)",
        sources.len(),
        bundle.len()
    ))
}

/// The bundle's source files in their defined order: module declarations,
/// remaining application scripts, then the generated template-cache
/// module. Discovery output is sorted, so each group is stable.
fn ordered_sources(ctx: &PipelineContext) -> Result<Vec<PathBuf>, TaskError> {
    let assets = discover(ctx, AssetKind::Script)?;
    let (modules, rest): (Vec<&Asset>, Vec<&Asset>) =
        assets.iter().partition(|a| is_module_file(&a.path));

    let mut ordered: Vec<PathBuf> = Vec::with_capacity(assets.len() + 1);
    ordered.extend(modules.iter().map(|a| a.path.clone()));
    ordered.extend(rest.iter().map(|a| a.path.clone()));
    ordered.push(ctx.template_cache_path());
    Ok(ordered)
}

fn is_module_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.ends_with(".module.js"))
        .unwrap_or(false)
}

/// Source name recorded in the map: relative to the source root where
/// possible, with forward slashes.
fn display_name(ctx: &PipelineContext, path: &Path) -> String {
    let rel = path
        .strip_prefix(ctx.src_dir())
        .or_else(|_| path.strip_prefix(ctx.project_root()))
        .unwrap_or(path);
    rel.to_string_lossy().replace('\\', "/")
}
