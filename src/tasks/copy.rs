//! The `copy` task: static passthrough files.
//!
//! Copies the configured static assets (entry page, fonts, images) into
//! the output directory, preserving their structure relative to the
//! source root.

use crate::pipeline::{discover, AssetKind, PipelineContext};
use crate::tasks::{TaskError, TaskResult};
use std::fs;

pub fn run(ctx: &PipelineContext) -> TaskResult {
    let assets = discover(ctx, AssetKind::Static)?;
    let src_dir = ctx.src_dir();
    let dist_dir = ctx.dist_dir();

    let mut copied = 0usize;
    for asset in &assets {
        let rel = asset.path.strip_prefix(&src_dir).unwrap_or(&asset.path);
        let dest = dist_dir.join(rel);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(&asset.path, &dest).map_err(|e| TaskError::Write {
            path: dest.clone(),
            source: e,
        })?;
        copied += 1;
    }

    Ok(format!("copied {} files", copied))
}
