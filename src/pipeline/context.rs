//! Pipeline context carrying configuration and run state.

use crate::config::SiteConfig;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

/// A long-lived background service started by a task (dev server, watcher).
#[derive(Debug)]
pub struct Service {
    /// Human-readable service name
    pub name: String,
    /// Thread hosting the service's event loop
    pub handle: JoinHandle<()>,
}

/// Registry of background services started during a pipeline run.
///
/// Shared between the pipeline and the CLI: task bodies register service
/// threads here, and the CLI joins them after the run so the process stays
/// alive while a server or watcher is active.
#[derive(Debug, Clone, Default)]
pub struct ServiceRegistry {
    inner: Arc<Mutex<Vec<Service>>>,
}

impl ServiceRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a running service thread.
    pub fn register(&self, name: impl Into<String>, handle: JoinHandle<()>) {
        let mut services = self.inner.lock().expect("service registry poisoned");
        services.push(Service { name: name.into(), handle });
    }

    /// Number of registered services.
    pub fn len(&self) -> usize {
        self.inner.lock().expect("service registry poisoned").len()
    }

    /// Whether any service is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Block until every registered service thread exits.
    ///
    /// Services run until external process termination, so in practice this
    /// blocks for the lifetime of the process.
    pub fn join_all(&self) {
        loop {
            let service = {
                let mut services = self.inner.lock().expect("service registry poisoned");
                services.pop()
            };
            match service {
                Some(service) => {
                    let _ = service.handle.join();
                }
                None => break,
            }
        }
    }
}

/// Context for a pipeline run: configuration, paths, and flags.
///
/// Cloning is cheap apart from the configuration itself; the service
/// registry is shared between clones.
#[derive(Debug, Clone)]
pub struct PipelineContext {
    /// The loaded configuration
    config: SiteConfig,
    /// Project root directory (where sitepack.toml is located)
    project_root: PathBuf,
    /// Whether deploy mode (minification) is enabled
    deploy: bool,
    /// Whether to run in verbose mode
    verbose: bool,
    /// Background services started by tasks in this run
    services: ServiceRegistry,
}

impl PipelineContext {
    /// Create a new pipeline context.
    pub fn new(config: SiteConfig, project_root: PathBuf) -> Self {
        Self {
            config,
            project_root,
            deploy: false,
            verbose: false,
            services: ServiceRegistry::new(),
        }
    }

    /// Set deploy mode.
    pub fn with_deploy(mut self, deploy: bool) -> Self {
        self.deploy = deploy;
        self
    }

    /// Set verbose mode.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Get the configuration.
    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    /// Get the project root directory.
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Whether deploy mode is enabled.
    pub fn is_deploy(&self) -> bool {
        self.deploy
    }

    /// Whether verbose mode is enabled.
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// The source root directory (resolved to an absolute path).
    pub fn src_dir(&self) -> PathBuf {
        self.resolve_path(&self.config.project.src)
    }

    /// The output directory (resolved to an absolute path).
    pub fn dist_dir(&self) -> PathBuf {
        self.resolve_path(&self.config.project.dist)
    }

    /// The vendor directory (resolved to an absolute path).
    pub fn vendor_dir(&self) -> PathBuf {
        self.resolve_path(&self.config.vendor.dir)
    }

    /// The pipeline work directory for generated intermediates.
    ///
    /// Lives outside the output directory so `clean` does not erase the
    /// generated template-cache module between sibling tasks.
    pub fn work_dir(&self) -> PathBuf {
        self.project_root.join(".sitepack")
    }

    /// Path of the generated template-cache module.
    pub fn template_cache_path(&self) -> PathBuf {
        self.work_dir().join("templates.js")
    }

    /// Background services registered during this run.
    pub fn services(&self) -> &ServiceRegistry {
        &self.services
    }

    /// Resolve a path relative to the project root.
    ///
    /// If the path is absolute, returns it unchanged.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_root.join(path)
        }
    }
}
