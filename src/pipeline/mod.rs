//! Build pipeline module for sitepack
//!
//! Provides the task-graph executor that turns source assets into the
//! output directory tree.
//!
//! # Overview
//!
//! The pipeline consists of:
//! - **Graph**: the fixed task registry as an explicit DAG, validated for
//!   cycles and unknown prerequisites at construction time
//! - **Discovery**: find source assets using glob patterns from config
//! - **Runner**: execute the transitive prerequisite closure of a task in
//!   dependency waves, each task exactly once per invocation
//!
//! # Example
//!
//! ```ignore
//! use sitepack::config::default_config;
//! use sitepack::pipeline::{Pipeline, PipelineContext, TaskName};
//!
//! let ctx = PipelineContext::new(default_config(), project_root);
//! let pipeline = Pipeline::standard(ctx)?;
//! let report = pipeline.run(TaskName::Production);
//! println!("{}", report.summary());
//! ```

pub mod context;
pub mod discovery;
pub mod graph;
pub mod result;
pub mod runner;

pub use context::*;
pub use discovery::*;
pub use graph::*;
pub use result::*;
pub use runner::*;
