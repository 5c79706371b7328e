//! Pipeline runner: wave-based task execution.
//!
//! The runner executes the transitive prerequisite closure of an entry
//! task in dependency waves:
//!
//! 1. Compute the closure and the unmet-prerequisite count of each member
//! 2. Take every task whose prerequisites have all finished (a wave)
//! 3. Execute the wave concurrently, wait for all of it
//! 4. Repeat until nothing is pending
//!
//! Each task executes exactly once per run, even when reachable through
//! multiple composite paths. A failing task halts only its dependent
//! chain: transitive dependents are recorded as skipped while unrelated
//! siblings keep running. Tasks in the policy table's recover set report
//! their error through the failure banner and do not poison dependents.
//!
//! Sibling tasks writing overlapping output paths concurrently is
//! undefined and unsupported; the configuration keeps the built-in tasks
//! on disjoint subtrees.

use crate::pipeline::context::PipelineContext;
use crate::pipeline::graph::{GraphError, TaskGraph, TaskName};
use crate::pipeline::result::{RunReport, TaskRun, TaskStatus};
use crate::tasks;
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use std::time::Instant;

/// What the runner does with a task body error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Report through the failure banner and keep the run going
    Recover,
    /// Fail the task and skip its transitive dependents
    Halt,
}

/// Policy table mapping tasks to their failure behavior.
///
/// Style compilation errors are routine while editing stylesheets, so the
/// styles task recovers instead of tearing down a watch session.
pub fn error_policy(task: TaskName) -> ErrorPolicy {
    match task {
        TaskName::Styles => ErrorPolicy::Recover,
        _ => ErrorPolicy::Halt,
    }
}

/// Print an error with visual emphasis, the dedicated handler for
/// recovered failures.
pub fn error_banner(message: &str) {
    if atty::is(atty::Stream::Stderr) {
        eprintln!("\x1b[41;97m ------------------------------ \x1b[0m");
        eprintln!("\x1b[97m{}\x1b[0m", message);
        eprintln!("\x1b[41;97m ------------------------------ \x1b[0m");
    } else {
        eprintln!(" ------------------------------ ");
        eprintln!("{}", message);
        eprintln!(" ------------------------------ ");
    }
}

/// The pipeline: a validated task graph plus run context.
pub struct Pipeline {
    graph: TaskGraph,
    ctx: PipelineContext,
}

impl Pipeline {
    /// Create a pipeline over the standard task registry.
    pub fn standard(ctx: PipelineContext) -> Result<Self, GraphError> {
        Ok(Self { graph: TaskGraph::standard()?, ctx })
    }

    /// Create a pipeline over a custom graph.
    pub fn with_graph(graph: TaskGraph, ctx: PipelineContext) -> Self {
        Self { graph, ctx }
    }

    /// The run context.
    pub fn context(&self) -> &PipelineContext {
        &self.ctx
    }

    /// The task graph.
    pub fn graph(&self) -> &TaskGraph {
        &self.graph
    }

    /// Run a task and its transitive prerequisites.
    pub fn run(&self, entry: TaskName) -> RunReport {
        let started = Instant::now();
        let mut report = RunReport::new(entry);

        let closure = self.graph.closure(entry);
        if self.ctx.is_verbose() {
            let plan: Vec<&str> = closure.iter().map(|t| t.as_str()).collect();
            println!("Task plan for '{}': {}", entry, plan.join(", "));
        }
        let members: HashSet<TaskName> = closure.iter().copied().collect();
        let mut unmet: HashMap<TaskName, usize> = closure
            .iter()
            .map(|t| (*t, self.graph.prerequisites(*t).len()))
            .collect();
        let mut pending = members.clone();
        let mut poisoned: HashSet<TaskName> = HashSet::new();

        while !pending.is_empty() {
            let mut wave: Vec<TaskName> =
                pending.iter().copied().filter(|t| unmet[t] == 0).collect();
            if wave.is_empty() {
                // Unreachable on a validated DAG
                break;
            }
            wave.sort();

            let (skipped, runnable): (Vec<TaskName>, Vec<TaskName>) =
                wave.into_iter().partition(|t| poisoned.contains(t));

            let mut outcomes: Vec<TaskRun> =
                runnable.par_iter().map(|t| self.execute(*t)).collect();
            for task in skipped {
                outcomes.push(TaskRun::skipped(task));
            }

            for run in outcomes {
                pending.remove(&run.task);
                let halts = matches!(run.status, TaskStatus::Failed(_) | TaskStatus::Skipped);
                for dependent in self.graph.dependents_of(run.task) {
                    if !members.contains(&dependent) {
                        continue;
                    }
                    if let Some(count) = unmet.get_mut(&dependent) {
                        *count = count.saturating_sub(1);
                    }
                    if halts {
                        poisoned.insert(dependent);
                    }
                }
                report.push(run);
            }
        }

        report.total_duration = started.elapsed();
        report
    }

    /// Execute one task body and apply the error policy.
    fn execute(&self, task: TaskName) -> TaskRun {
        let start = Instant::now();
        println!("Starting '{}' ...", task);

        match tasks::execute(task, &self.ctx) {
            Ok(summary) => {
                let duration = start.elapsed();
                if summary.is_empty() {
                    println!("Finished '{}' after {:.2?}", task, duration);
                } else {
                    println!("Finished '{}' after {:.2?} ({})", task, duration, summary);
                }
                TaskRun::success(task, summary, duration)
            }
            Err(err) => {
                let duration = start.elapsed();
                match error_policy(task) {
                    ErrorPolicy::Recover => {
                        error_banner(&err.to_string());
                        TaskRun::recovered(task, err.to_string(), duration)
                    }
                    ErrorPolicy::Halt => {
                        eprintln!("Task '{}' failed: {}", task, err);
                        TaskRun::failed(task, err.to_string(), duration)
                    }
                }
            }
        }
    }
}
