//! Source asset discovery for the build pipeline.
//!
//! Discovers source files based on glob patterns from the configuration
//! and classifies them by media category.

use crate::pipeline::context::PipelineContext;
use glob::{glob, Pattern};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Media category of a source asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    /// Application script
    Script,
    /// HTML template
    Template,
    /// Style source
    Style,
    /// Static passthrough file
    Static,
    /// Third-party vendor file
    Vendor,
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetKind::Script => write!(f, "script"),
            AssetKind::Template => write!(f, "template"),
            AssetKind::Style => write!(f, "style"),
            AssetKind::Static => write!(f, "static"),
            AssetKind::Vendor => write!(f, "vendor"),
        }
    }
}

/// A source file classified for pipeline processing.
#[derive(Debug, Clone)]
pub struct Asset {
    /// Absolute path of the source file
    pub path: PathBuf,
    /// Media category
    pub kind: AssetKind,
}

impl Asset {
    /// Create an asset.
    pub fn new(path: PathBuf, kind: AssetKind) -> Self {
        Self { path, kind }
    }
}

/// Error during source discovery.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// Invalid glob pattern
    #[error("Invalid glob pattern '{pattern}': {source}")]
    InvalidPattern {
        /// The offending pattern
        pattern: String,
        /// Underlying parse error
        source: glob::PatternError,
    },
    /// IO error during file enumeration
    #[error("IO error during discovery: {0}")]
    Io(#[from] std::io::Error),
}

/// Discover files matching a glob pattern under a base directory.
///
/// Directories are skipped; results are sorted for determinism.
pub fn discover_files(base_dir: &Path, pattern: &str) -> Result<Vec<PathBuf>, DiscoveryError> {
    let full_pattern = base_dir.join(pattern);
    let pattern_str = full_pattern.to_string_lossy();

    let paths = glob(&pattern_str).map_err(|e| DiscoveryError::InvalidPattern {
        pattern: pattern.to_string(),
        source: e,
    })?;

    let mut files = Vec::new();
    for entry in paths {
        match entry {
            Ok(path) => {
                if path.is_file() {
                    files.push(path);
                }
            }
            Err(e) => {
                // Log but continue on unreadable entries
                eprintln!("Warning: error reading path: {}", e);
            }
        }
    }

    files.sort();
    Ok(files)
}

/// Discover all assets of one kind.
///
/// Script, template, style, and static patterns are resolved against the
/// source root; vendor files are the configured ordered list resolved
/// against the vendor directory (order preserved, existence not checked
/// here).
pub fn discover(ctx: &PipelineContext, kind: AssetKind) -> Result<Vec<Asset>, DiscoveryError> {
    let assets = &ctx.config().assets;
    let src_dir = ctx.src_dir();

    let patterns: &[String] = match kind {
        AssetKind::Script => &assets.scripts,
        AssetKind::Template => &assets.templates,
        AssetKind::Style => &assets.styles,
        AssetKind::Static => &assets.statics,
        AssetKind::Vendor => {
            // Vendor files are an ordered explicit list, not globs
            return Ok(ctx
                .config()
                .vendor
                .scripts
                .iter()
                .map(|rel| Asset::new(ctx.vendor_dir().join(rel), AssetKind::Vendor))
                .collect());
        }
    };

    let mut seen = HashSet::new();
    let mut files = Vec::new();
    for pattern in patterns {
        for path in discover_files(&src_dir, pattern)? {
            if seen.insert(path.clone()) {
                files.push(path);
            }
        }
    }
    files.sort();

    if kind == AssetKind::Script {
        let excludes = compile_excludes(&assets.script_excludes)?;
        files.retain(|path| !is_excluded(path, &src_dir, &excludes));
    }

    Ok(files.into_iter().map(|path| Asset::new(path, kind)).collect())
}

/// Compile exclude patterns once per discovery pass.
fn compile_excludes(patterns: &[String]) -> Result<Vec<Pattern>, DiscoveryError> {
    patterns
        .iter()
        .map(|p| {
            Pattern::new(p).map_err(|e| DiscoveryError::InvalidPattern {
                pattern: p.clone(),
                source: e,
            })
        })
        .collect()
}

/// Whether a discovered file matches any exclude pattern.
///
/// Exclude patterns are matched against the path relative to the source
/// root, the same way the include patterns were written.
fn is_excluded(path: &Path, src_dir: &Path, excludes: &[Pattern]) -> bool {
    let rel = path.strip_prefix(src_dir).unwrap_or(path);
    excludes.iter().any(|p| p.matches_path(rel))
}
