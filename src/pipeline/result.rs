//! Pipeline run result types.

use crate::pipeline::graph::TaskName;
use std::time::Duration;

/// Outcome of a single task execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    /// Task completed
    Success,
    /// Task failed but the failure was recovered per the pipeline policy;
    /// the run continued
    Recovered(String),
    /// Task failed and halted its dependent chain
    Failed(String),
    /// Task was not executed because a prerequisite failed
    Skipped,
}

impl TaskStatus {
    /// Whether this status counts as an unrecovered failure.
    pub fn is_failure(&self) -> bool {
        matches!(self, TaskStatus::Failed(_))
    }

    /// Whether the task ran to completion (including recovered failures).
    pub fn is_success(&self) -> bool {
        matches!(self, TaskStatus::Success | TaskStatus::Recovered(_))
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskStatus::Success => write!(f, "success"),
            TaskStatus::Recovered(err) => write!(f, "recovered: {}", err),
            TaskStatus::Failed(err) => write!(f, "failed: {}", err),
            TaskStatus::Skipped => write!(f, "skipped"),
        }
    }
}

/// Result of executing a single task.
#[derive(Debug, Clone)]
pub struct TaskRun {
    /// The task that ran
    pub task: TaskName,
    /// Outcome
    pub status: TaskStatus,
    /// Short human-readable summary of what the task did
    pub summary: String,
    /// Execution duration
    pub duration: Duration,
}

impl TaskRun {
    /// Create a successful result.
    pub fn success(task: TaskName, summary: String, duration: Duration) -> Self {
        Self { task, status: TaskStatus::Success, summary, duration }
    }

    /// Create a recovered-failure result.
    pub fn recovered(task: TaskName, error: String, duration: Duration) -> Self {
        Self { task, status: TaskStatus::Recovered(error), summary: String::new(), duration }
    }

    /// Create a failed result.
    pub fn failed(task: TaskName, error: String, duration: Duration) -> Self {
        Self { task, status: TaskStatus::Failed(error), summary: String::new(), duration }
    }

    /// Create a skipped result.
    pub fn skipped(task: TaskName) -> Self {
        Self {
            task,
            status: TaskStatus::Skipped,
            summary: String::new(),
            duration: Duration::ZERO,
        }
    }
}

/// Result of a complete pipeline run.
#[derive(Debug)]
pub struct RunReport {
    /// The task the run was invoked with
    pub entry: TaskName,
    /// Results for each executed (or skipped) task
    pub runs: Vec<TaskRun>,
    /// Total run duration
    pub total_duration: Duration,
}

impl RunReport {
    /// Create an empty report for an entry task.
    pub fn new(entry: TaskName) -> Self {
        Self { entry, runs: Vec::new(), total_duration: Duration::ZERO }
    }

    /// Record a task result.
    pub fn push(&mut self, run: TaskRun) {
        self.runs.push(run);
    }

    /// Number of successful tasks.
    pub fn success_count(&self) -> usize {
        self.runs.iter().filter(|r| r.status == TaskStatus::Success).count()
    }

    /// Number of recovered failures.
    pub fn recovered_count(&self) -> usize {
        self.runs.iter().filter(|r| matches!(r.status, TaskStatus::Recovered(_))).count()
    }

    /// Number of unrecovered failures.
    pub fn failed_count(&self) -> usize {
        self.runs.iter().filter(|r| r.status.is_failure()).count()
    }

    /// Number of skipped tasks.
    pub fn skipped_count(&self) -> usize {
        self.runs.iter().filter(|r| r.status == TaskStatus::Skipped).count()
    }

    /// Whether the run succeeded (no unrecovered failures).
    pub fn is_success(&self) -> bool {
        self.failed_count() == 0
    }

    /// The recorded result for a task, if it was part of this run.
    pub fn status_of(&self, task: TaskName) -> Option<&TaskStatus> {
        self.runs.iter().find(|r| r.task == task).map(|r| &r.status)
    }

    /// How many times a task was executed in this run.
    pub fn times_run(&self, task: TaskName) -> usize {
        self.runs.iter().filter(|r| r.task == task).count()
    }

    /// Failed task results.
    pub fn failures(&self) -> Vec<&TaskRun> {
        self.runs.iter().filter(|r| r.status.is_failure()).collect()
    }

    /// Format a summary of the run.
    pub fn summary(&self) -> String {
        let mut lines = Vec::new();

        let success = self.success_count();
        let recovered = self.recovered_count();
        let failed = self.failed_count();
        let skipped = self.skipped_count();
        let total = self.runs.len();

        if failed > 0 {
            lines.push(format!(
                "'{}' failed: {} ok, {} recovered, {} failed, {} skipped ({} total)",
                self.entry, success, recovered, failed, skipped, total
            ));
            for run in self.failures() {
                lines.push(format!("  - {}: {}", run.task, run.status));
            }
        } else {
            lines.push(format!(
                "'{}' done: {} ok, {} recovered ({} total) in {:.2?}",
                self.entry, success, recovered, total, self.total_duration
            ));
        }

        lines.join("\n")
    }
}
