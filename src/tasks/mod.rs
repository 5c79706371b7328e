//! Task bodies for the build pipeline
//!
//! Each task is a function from the pipeline context to a typed result:
//! a short human-readable summary on success, a [`TaskError`] on failure.
//! The runner's policy table decides what a failure does to the rest of
//! the run; bodies themselves never abort the process.
//!
//! # Module Structure
//!
//! - [`clean`] - delete the output directory's contents
//! - [`templates`] - HTML minification + template-cache module generation
//! - [`lint`] - static checks over scripts and markup
//! - [`vendor`] - vendor script bundle and vendor stylesheet copies
//! - [`styles`] - SCSS compilation and compression
//! - [`scripts`] - application bundle assembly
//! - [`copy`] - static passthrough files

pub mod clean;
pub mod copy;
pub mod lint;
pub mod scripts;
pub mod styles;
pub mod templates;
pub mod vendor;

use crate::pipeline::{DiscoveryError, PipelineContext, TaskName};
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Error from a task body.
#[derive(Debug, Error)]
pub enum TaskError {
    /// Asset discovery failed
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),
    /// A source file could not be read
    #[error("failed to read {path}: {source}")]
    Read {
        /// File being read
        path: PathBuf,
        /// Underlying error
        source: io::Error,
    },
    /// An output file could not be written
    #[error("failed to write {path}: {source}")]
    Write {
        /// File being written
        path: PathBuf,
        /// Underlying error
        source: io::Error,
    },
    /// A configured vendor file does not exist
    #[error("vendor file not found: {0}")]
    MissingVendor(PathBuf),
    /// Style source failed to compile
    #[error("style compilation failed: {0}")]
    StyleCompile(String),
    /// Compiled stylesheet failed to parse or compress
    #[error("stylesheet compression failed: {0}")]
    StyleCompress(String),
    /// The dev server could not bind its port
    #[error("failed to bind {addr}: {source}")]
    ServerBind {
        /// Address that was requested
        addr: String,
        /// Underlying error
        source: io::Error,
    },
    /// The source watcher could not start
    #[error("watcher error: {0}")]
    Watch(String),
    /// Other I/O failure
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Result type for task bodies: a short summary or a task error.
pub type TaskResult = Result<String, TaskError>;

/// Execute the body of a task.
///
/// Composite tasks (`lint`, `default`, `production`) have no body of
/// their own; their work is entirely in their prerequisites.
pub fn execute(task: TaskName, ctx: &PipelineContext) -> TaskResult {
    match task {
        TaskName::Clean => clean::run(ctx),
        TaskName::Templates => templates::run(ctx),
        TaskName::LintJs => lint::run_js(ctx),
        TaskName::LintHtml => lint::run_html(ctx),
        TaskName::Modules => vendor::run_scripts(ctx),
        TaskName::Tree => vendor::run_styles(ctx),
        TaskName::Styles => styles::run(ctx),
        TaskName::Scripts => scripts::run(ctx),
        TaskName::Copy => copy::run(ctx),
        TaskName::Serve => crate::serve::start(ctx),
        TaskName::Watch => crate::watch::start(ctx),
        TaskName::Lint | TaskName::Default | TaskName::Production => Ok(String::new()),
    }
}
