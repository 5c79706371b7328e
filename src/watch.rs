//! The `watch` task: re-run build tasks when sources change.
//!
//! Watches the source tree with a debounced filesystem watcher and maps
//! change classes to pipeline re-runs: script and template changes re-run
//! `scripts` (which transitively regenerates the template cache and the
//! vendor bundle), style changes re-run `styles`. One re-run per detected
//! change set.
//!
//! The loop runs on a background thread registered as a service; it lives
//! until the process is terminated.

use crate::pipeline::{Pipeline, PipelineContext, TaskName};
use crate::tasks::{TaskError, TaskResult};
use notify::RecursiveMode;
use notify_debouncer_mini::{new_debouncer, DebouncedEvent, DebouncedEventKind};
use std::path::Path;
use std::sync::mpsc::channel;
use std::thread;
use std::time::Duration;

/// Start the source watcher service.
pub fn start(ctx: &PipelineContext) -> TaskResult {
    let src_dir = ctx.src_dir();
    if !src_dir.exists() {
        return Err(TaskError::Watch(format!(
            "source directory not found: {}",
            src_dir.display()
        )));
    }

    let thread_ctx = ctx.clone();
    let handle = thread::Builder::new()
        .name("sitepack-watch".to_string())
        .spawn(move || watch_loop(thread_ctx))
        .map_err(TaskError::Io)?;
    ctx.services().register("watch", handle);

    Ok(format!("watching {}", src_dir.display()))
}

/// The long-running watch loop.
fn watch_loop(ctx: PipelineContext) {
    let src_dir = ctx.src_dir();
    let debounce = Duration::from_millis(ctx.config().watch.debounce_ms);

    let (tx, rx) = channel();
    let mut debouncer = match new_debouncer(debounce, tx) {
        Ok(debouncer) => debouncer,
        Err(e) => {
            eprintln!("[{}] Failed to initialize file watcher: {}", timestamp(), e);
            return;
        }
    };
    if let Err(e) = debouncer.watcher().watch(&src_dir, RecursiveMode::Recursive) {
        eprintln!("[{}] Failed to watch {}: {}", timestamp(), src_dir.display(), e);
        return;
    }

    let pipeline = match Pipeline::standard(ctx.clone()) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            eprintln!("[{}] Watch cannot build pipeline: {}", timestamp(), e);
            return;
        }
    };

    println!("[{}] Watching {} for changes...", timestamp(), src_dir.display());

    loop {
        match rx.recv() {
            Ok(Ok(events)) => {
                for task in affected_tasks(&events) {
                    println!("[{}] Change detected, running '{}'", timestamp(), task);
                    let report = pipeline.run(task);
                    println!("{}", report.summary());
                    println!("[{}] Watching {} for changes...", timestamp(), src_dir.display());
                }
            }
            Ok(Err(error)) => {
                // Watch error (non-fatal) - log but continue watching
                eprintln!("[{}] Watch error: {:?}", timestamp(), error);
            }
            Err(_) => {
                // Channel closed, watcher is gone
                return;
            }
        }
    }
}

/// Map a debounced change set to the tasks to re-run, deduplicated, in a
/// stable order.
fn affected_tasks(events: &[DebouncedEvent]) -> Vec<TaskName> {
    tasks_for_paths(
        events
            .iter()
            .filter(|e| matches!(e.kind, DebouncedEventKind::Any))
            .map(|e| e.path.as_path()),
    )
}

/// Deduplicate the tasks affected by a set of changed paths.
fn tasks_for_paths<'a>(paths: impl Iterator<Item = &'a Path>) -> Vec<TaskName> {
    let mut scripts = false;
    let mut styles = false;

    for path in paths {
        match task_for(path) {
            Some(TaskName::Scripts) => scripts = true,
            Some(TaskName::Styles) => styles = true,
            _ => {}
        }
    }

    let mut tasks = Vec::new();
    if scripts {
        tasks.push(TaskName::Scripts);
    }
    if styles {
        tasks.push(TaskName::Styles);
    }
    tasks
}

/// Which task a changed file affects, if any.
fn task_for(path: &Path) -> Option<TaskName> {
    let name = path.file_name().and_then(|n| n.to_str())?;
    let ext = path.extension().and_then(|e| e.to_str())?;
    match ext {
        // Spec files are not part of the bundle
        "js" if !name.ends_with(".spec.js") => Some(TaskName::Scripts),
        "html" => Some(TaskName::Scripts),
        "scss" => Some(TaskName::Styles),
        _ => None,
    }
}

/// Get current timestamp for logging
fn timestamp() -> String {
    use std::time::SystemTime;
    let now = SystemTime::now().duration_since(SystemTime::UNIX_EPOCH).unwrap_or_default();
    let secs = now.as_secs() % 86400; // seconds since midnight
    let hours = (secs / 3600) % 24;
    let minutes = (secs / 60) % 60;
    let seconds = secs % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}
