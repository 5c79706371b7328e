//! Task registry and dependency graph.
//!
//! Tasks form a DAG: each task lists its prerequisites, and the graph is
//! validated for duplicates, unknown prerequisites, and cycles when it is
//! constructed. There is no ambient global registry; the graph is an
//! explicit value owned by the pipeline.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Name of a task in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TaskName {
    /// Delete the output directory's contents
    Clean,
    /// Generate the template-cache module from HTML templates
    Templates,
    /// Static checks over application scripts
    LintJs,
    /// Static checks over markup
    LintHtml,
    /// Composite of the two lint tasks
    Lint,
    /// Concatenate vendor scripts into the vendor bundle
    Modules,
    /// Copy vendor stylesheets into the output css directory
    Tree,
    /// Compile and compress the stylesheet bundle
    Styles,
    /// Assemble the application script bundle
    Scripts,
    /// Start the local static server
    Serve,
    /// Copy static passthrough files
    Copy,
    /// Watch the source tree and re-run affected tasks
    Watch,
    /// Development composite: copy, styles, serve, watch, lint
    Default,
    /// One-shot deployable build: copy, scripts
    Production,
}

impl TaskName {
    /// Every task in the registry, in declaration order.
    pub const ALL: [TaskName; 14] = [
        TaskName::Clean,
        TaskName::Templates,
        TaskName::LintJs,
        TaskName::LintHtml,
        TaskName::Lint,
        TaskName::Modules,
        TaskName::Tree,
        TaskName::Styles,
        TaskName::Scripts,
        TaskName::Serve,
        TaskName::Copy,
        TaskName::Watch,
        TaskName::Default,
        TaskName::Production,
    ];

    /// The CLI-facing name of this task.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskName::Clean => "clean",
            TaskName::Templates => "templates",
            TaskName::LintJs => "style:js",
            TaskName::LintHtml => "hint:html",
            TaskName::Lint => "lint",
            TaskName::Modules => "modules",
            TaskName::Tree => "tree",
            TaskName::Styles => "styles",
            TaskName::Scripts => "scripts",
            TaskName::Serve => "serve",
            TaskName::Copy => "copy",
            TaskName::Watch => "watch",
            TaskName::Default => "default",
            TaskName::Production => "production",
        }
    }
}

impl fmt::Display for TaskName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for an unrecognized task name on the command line.
#[derive(Debug, Error)]
#[error("unknown task '{input}' (known tasks: {known})")]
pub struct UnknownTask {
    /// The name that failed to resolve
    pub input: String,
    /// Comma-separated list of registry names
    pub known: String,
}

impl FromStr for TaskName {
    type Err = UnknownTask;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskName::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownTask {
                input: s.to_string(),
                known: TaskName::ALL
                    .iter()
                    .map(|t| t.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }
}

/// A task declaration: a name plus its prerequisites.
#[derive(Debug, Clone)]
pub struct TaskSpec {
    /// Task name
    pub name: TaskName,
    /// Tasks that must complete before this one starts
    pub prerequisites: Vec<TaskName>,
}

impl TaskSpec {
    /// Create a task spec.
    pub fn new(name: TaskName, prerequisites: &[TaskName]) -> Self {
        Self { name, prerequisites: prerequisites.to_vec() }
    }
}

/// Error during graph construction.
#[derive(Debug, Error)]
pub enum GraphError {
    /// The same task was declared twice
    #[error("duplicate task '{0}' in registry")]
    DuplicateTask(TaskName),
    /// A prerequisite names a task missing from the registry
    #[error("task '{task}' lists unknown prerequisite '{prerequisite}'")]
    UnknownPrerequisite {
        /// The declaring task
        task: TaskName,
        /// The missing prerequisite
        prerequisite: TaskName,
    },
    /// The declared prerequisites form a cycle
    #[error("task dependency cycle detected involving '{0}'")]
    Cycle(TaskName),
}

/// The task dependency graph.
///
/// Construction validates the invariants; a `TaskGraph` value is always
/// acyclic with fully resolvable prerequisites.
#[derive(Debug, Clone)]
pub struct TaskGraph {
    specs: Vec<TaskSpec>,
    index: HashMap<TaskName, usize>,
}

impl TaskGraph {
    /// Build a graph from task specs, rejecting duplicates, unknown
    /// prerequisites, and cycles.
    pub fn new(specs: Vec<TaskSpec>) -> Result<Self, GraphError> {
        let mut index = HashMap::new();
        for (i, spec) in specs.iter().enumerate() {
            if index.insert(spec.name, i).is_some() {
                return Err(GraphError::DuplicateTask(spec.name));
            }
        }

        for spec in &specs {
            for prereq in &spec.prerequisites {
                if !index.contains_key(prereq) {
                    return Err(GraphError::UnknownPrerequisite {
                        task: spec.name,
                        prerequisite: *prereq,
                    });
                }
            }
        }

        let graph = Self { specs, index };
        graph.check_cycles()?;
        Ok(graph)
    }

    /// The standard sitepack registry.
    pub fn standard() -> Result<Self, GraphError> {
        use TaskName::*;
        Self::new(vec![
            TaskSpec::new(Clean, &[]),
            TaskSpec::new(Templates, &[]),
            TaskSpec::new(LintJs, &[]),
            TaskSpec::new(LintHtml, &[]),
            TaskSpec::new(Lint, &[LintJs, LintHtml]),
            TaskSpec::new(Modules, &[Templates]),
            TaskSpec::new(Tree, &[]),
            TaskSpec::new(Styles, &[]),
            TaskSpec::new(Scripts, &[Modules]),
            TaskSpec::new(Serve, &[]),
            TaskSpec::new(Copy, &[Clean]),
            TaskSpec::new(Watch, &[Serve, Scripts]),
            TaskSpec::new(Default, &[Copy, Styles, Serve, Watch, Lint]),
            TaskSpec::new(Production, &[Copy, Scripts]),
        ])
    }

    /// Whether the graph contains a task.
    pub fn contains(&self, task: TaskName) -> bool {
        self.index.contains_key(&task)
    }

    /// Prerequisites of a task (empty for tasks not in the graph).
    pub fn prerequisites(&self, task: TaskName) -> &[TaskName] {
        self.index
            .get(&task)
            .map(|&i| self.specs[i].prerequisites.as_slice())
            .unwrap_or(&[])
    }

    /// Tasks that list `task` as a prerequisite.
    pub fn dependents_of(&self, task: TaskName) -> Vec<TaskName> {
        self.specs
            .iter()
            .filter(|s| s.prerequisites.contains(&task))
            .map(|s| s.name)
            .collect()
    }

    /// The transitive prerequisite closure of `entry`, including `entry`
    /// itself, in topological order (prerequisites before dependents).
    ///
    /// Each task appears exactly once even when reachable through multiple
    /// paths.
    pub fn closure(&self, entry: TaskName) -> Vec<TaskName> {
        let mut order = Vec::new();
        let mut visited = HashSet::new();
        if self.contains(entry) {
            self.visit(entry, &mut visited, &mut order);
        }
        order
    }

    fn visit(&self, task: TaskName, visited: &mut HashSet<TaskName>, order: &mut Vec<TaskName>) {
        if !visited.insert(task) {
            return;
        }
        for prereq in self.prerequisites(task) {
            self.visit(*prereq, visited, order);
        }
        order.push(task);
    }

    /// Reject graphs containing a prerequisite cycle.
    fn check_cycles(&self) -> Result<(), GraphError> {
        let mut visited = HashSet::new();
        let mut visiting = HashSet::new();

        for spec in &self.specs {
            self.visit_for_cycle(spec.name, &mut visited, &mut visiting)?;
        }

        Ok(())
    }

    fn visit_for_cycle(
        &self,
        task: TaskName,
        visited: &mut HashSet<TaskName>,
        visiting: &mut HashSet<TaskName>,
    ) -> Result<(), GraphError> {
        if visited.contains(&task) {
            return Ok(());
        }
        if !visiting.insert(task) {
            return Err(GraphError::Cycle(task));
        }

        for prereq in self.prerequisites(task) {
            self.visit_for_cycle(*prereq, visited, visiting)?;
        }

        visiting.remove(&task);
        visited.insert(task);
        Ok(())
    }
}
