//! The `clean` task: delete the output directory's contents.
//!
//! The directory itself is kept (and created if missing) so a running
//! dev server keeps a valid root across rebuilds.

use crate::pipeline::PipelineContext;
use crate::tasks::TaskResult;
use std::fs;

pub fn run(ctx: &PipelineContext) -> TaskResult {
    let dist = ctx.dist_dir();
    if !dist.exists() {
        fs::create_dir_all(&dist)?;
        return Ok("created empty output directory".to_string());
    }

    let mut removed = 0usize;
    for entry in fs::read_dir(&dist)? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_dir() {
            fs::remove_dir_all(&path)?;
        } else {
            fs::remove_file(&path)?;
        }
        removed += 1;
    }

    Ok(format!("removed {} entries", removed))
}
