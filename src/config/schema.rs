//! Configuration schema types for `sitepack.toml`
//!
//! Defines the structure and validation rules for a sitepack project
//! configuration. Every field has a default mirroring the conventional
//! single-page-app layout, so a project with no `sitepack.toml` at all
//! still builds.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level project configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SiteConfig {
    /// Project metadata and directory layout
    #[serde(default)]
    pub project: ProjectConfig,
    /// Source asset glob patterns
    #[serde(default)]
    pub assets: AssetsConfig,
    /// Third-party vendor files
    #[serde(default)]
    pub vendor: VendorConfig,
    /// Output bundle names
    #[serde(default)]
    pub bundle: BundleConfig,
    /// Local dev server settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Source watcher settings
    #[serde(default)]
    pub watch: WatchConfig,
}

impl SiteConfig {
    /// Validate the configuration, returning a list of problems.
    ///
    /// An empty list means the configuration is usable.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.project.src.as_os_str().is_empty() {
            errors.push("project.src must not be empty".to_string());
        }
        if self.project.dist.as_os_str().is_empty() {
            errors.push("project.dist must not be empty".to_string());
        }
        if self.project.src == self.project.dist {
            errors.push("project.src and project.dist must be different directories".to_string());
        }
        if self.assets.scripts.is_empty() {
            errors.push("assets.scripts must contain at least one glob pattern".to_string());
        }
        if self.bundle.script.as_os_str().is_empty() {
            errors.push("bundle.script must not be empty".to_string());
        }
        if self.bundle.templates_module.is_empty() {
            errors.push("bundle.templates_module must not be empty".to_string());
        }

        errors
    }
}

/// Project metadata section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project name
    #[serde(default = "default_name")]
    pub name: String,
    /// Source root directory
    #[serde(default = "default_src")]
    pub src: PathBuf,
    /// Build output directory
    #[serde(default = "default_dist")]
    pub dist: PathBuf,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self { name: default_name(), src: default_src(), dist: default_dist() }
    }
}

fn default_name() -> String {
    "site".to_string()
}

fn default_src() -> PathBuf {
    PathBuf::from("src")
}

fn default_dist() -> PathBuf {
    PathBuf::from("dist")
}

/// Source asset glob patterns, relative to the source root
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetsConfig {
    /// Application script sources
    #[serde(default = "default_scripts")]
    pub scripts: Vec<String>,
    /// Script patterns excluded from the bundle (test specs)
    #[serde(default = "default_script_excludes")]
    pub script_excludes: Vec<String>,
    /// HTML template sources
    #[serde(default = "default_templates")]
    pub templates: Vec<String>,
    /// Style sources
    #[serde(default = "default_styles")]
    pub styles: Vec<String>,
    /// Static passthrough files, copied preserving relative structure
    #[serde(default = "default_statics")]
    pub statics: Vec<String>,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            scripts: default_scripts(),
            script_excludes: default_script_excludes(),
            templates: default_templates(),
            styles: default_styles(),
            statics: default_statics(),
        }
    }
}

fn default_scripts() -> Vec<String> {
    vec!["app/**/*.js".to_string()]
}

fn default_script_excludes() -> Vec<String> {
    vec!["app/**/*.spec.js".to_string()]
}

fn default_templates() -> Vec<String> {
    vec!["app/**/*.html".to_string()]
}

fn default_styles() -> Vec<String> {
    vec!["sass/**/*.scss".to_string()]
}

fn default_statics() -> Vec<String> {
    vec![
        "index.html".to_string(),
        "fonts/**/*".to_string(),
        "img/**/*".to_string(),
    ]
}

/// Third-party vendor files, resolved against the vendor directory.
///
/// Vendor script order is significant: files are concatenated in the
/// order listed here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendorConfig {
    /// Directory vendor paths are resolved against
    #[serde(default = "default_vendor_dir")]
    pub dir: PathBuf,
    /// Ordered vendor script files concatenated into the vendor bundle
    #[serde(default = "default_vendor_scripts")]
    pub scripts: Vec<String>,
    /// Vendor stylesheets copied into the output `css/` directory
    #[serde(default = "default_vendor_styles")]
    pub styles: Vec<String>,
}

impl Default for VendorConfig {
    fn default() -> Self {
        Self {
            dir: default_vendor_dir(),
            scripts: default_vendor_scripts(),
            styles: default_vendor_styles(),
        }
    }
}

fn default_vendor_dir() -> PathBuf {
    PathBuf::from("node_modules")
}

fn default_vendor_scripts() -> Vec<String> {
    [
        "angular/angular.min.js",
        "d3/d3.min.js",
        "nvd3/build/nv.d3.min.js",
        "angular-nvd3/dist/angular-nvd3.js",
        "angular-ui-router/release/angular-ui-router.js",
        "angular-loading-bar/build/loading-bar.min.js",
        "angular-animate/angular-animate.min.js",
        "angular-touch/angular-touch.min.js",
        "angular-ui-bootstrap/dist/ui-bootstrap.js",
        "angular-ui-bootstrap/dist/ui-bootstrap-tpls.js",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_vendor_styles() -> Vec<String> {
    vec!["angular-ivh-treeview/dist/angular-ivh-treeview.min.css".to_string()]
}

/// Output bundle names, relative to the output directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleConfig {
    /// Application script bundle
    #[serde(default = "default_bundle_script")]
    pub script: PathBuf,
    /// Vendor script bundle
    #[serde(default = "default_bundle_vendor")]
    pub vendor: PathBuf,
    /// Compiled stylesheet
    #[serde(default = "default_bundle_style")]
    pub style: PathBuf,
    /// Angular module name the generated template cache registers under
    #[serde(default = "default_templates_module")]
    pub templates_module: String,
}

impl Default for BundleConfig {
    fn default() -> Self {
        Self {
            script: default_bundle_script(),
            vendor: default_bundle_vendor(),
            style: default_bundle_style(),
            templates_module: default_templates_module(),
        }
    }
}

fn default_bundle_script() -> PathBuf {
    PathBuf::from("js/bundle.js")
}

fn default_bundle_vendor() -> PathBuf {
    PathBuf::from("js/vendor.js")
}

fn default_bundle_style() -> PathBuf {
    PathBuf::from("css/app.css")
}

fn default_templates_module() -> String {
    "templates".to_string()
}

/// Local dev server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Port the static server listens on
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: default_port() }
    }
}

fn default_port() -> u16 {
    4000
}

/// Source watcher settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Debounce window for change events, in milliseconds
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self { debounce_ms: default_debounce_ms() }
    }
}

fn default_debounce_ms() -> u64 {
    300
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = SiteConfig::default();
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_default_layout_matches_spa_conventions() {
        let config = SiteConfig::default();
        assert_eq!(config.project.src, PathBuf::from("src"));
        assert_eq!(config.project.dist, PathBuf::from("dist"));
        assert_eq!(config.assets.scripts, vec!["app/**/*.js"]);
        assert_eq!(config.assets.script_excludes, vec!["app/**/*.spec.js"]);
        assert_eq!(config.server.port, 4000);
        assert_eq!(config.bundle.script, PathBuf::from("js/bundle.js"));
    }

    #[test]
    fn test_vendor_scripts_preserve_order() {
        let config = SiteConfig::default();
        assert_eq!(config.vendor.scripts.first().unwrap(), "angular/angular.min.js");
        assert_eq!(
            config.vendor.scripts.last().unwrap(),
            "angular-ui-bootstrap/dist/ui-bootstrap-tpls.js"
        );
    }

    #[test]
    fn test_validate_rejects_equal_src_and_dist() {
        let mut config = SiteConfig::default();
        config.project.dist = config.project.src.clone();
        let errors = config.validate();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("different directories"));
    }

    #[test]
    fn test_validate_rejects_empty_script_globs() {
        let mut config = SiteConfig::default();
        config.assets.scripts.clear();
        assert!(!config.validate().is_empty());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let toml = r#"
            [project]
            name = "crimes"

            [server]
            port = 5000
        "#;
        let config: SiteConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.project.name, "crimes");
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.project.dist, PathBuf::from("dist"));
        assert_eq!(config.vendor.dir, PathBuf::from("node_modules"));
    }
}
