//! Build Pipeline Test Suite
//!
//! Integration tests for the sitepack build pipeline. Tests cover the
//! full task graph including:
//!
//! - Exactly-once prerequisite execution across composite tasks
//! - Cycle rejection at graph construction time
//! - Byte-identical re-runs of the scripts task
//! - Deploy-mode minification bounds
//! - Recovered style failures leaving previous output untouched
//! - Bundle content ordering

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use sitepack::config::{default_config, SiteConfig};
use sitepack::pipeline::{
    GraphError, Pipeline, PipelineContext, TaskGraph, TaskName, TaskSpec, TaskStatus,
};

// ============================================================================
// Test Utilities
// ============================================================================

/// Create a file with content, creating parent directories as needed.
fn create_file(root: &Path, rel: &str, content: &str) -> PathBuf {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, content).unwrap();
    path
}

/// Test configuration with a small local vendor set.
fn test_config() -> SiteConfig {
    let mut config = default_config();
    config.vendor.scripts = vec!["lib/one.js".to_string(), "lib/two.js".to_string()];
    config.vendor.styles = vec!["treeview/tree.css".to_string()];
    config
}

/// Seed a complete miniature project: app scripts, a template, styles,
/// statics, and the vendor files the test config points at.
fn create_project(temp: &TempDir) -> PipelineContext {
    let root = temp.path();

    create_file(root, "src/app/a.module.js", "angular.module('app', ['templates']);\n");
    create_file(
        root,
        "src/app/a.controller.js",
        "angular.module('app').controller('AController', function($scope) {\n  $scope.value = 1;\n});\n",
    );
    create_file(root, "src/app/a.controller.spec.js", "describe('a', function() {});\n");
    create_file(root, "src/app/view.html", "<div>\n  <span>{{value}}</span>\n</div>\n");
    create_file(root, "src/sass/main.scss", "$color: #333;\nbody {\n  color: $color;\n}\n");
    create_file(root, "src/index.html", "<html><body></body></html>\n");
    create_file(root, "src/fonts/icons.woff", "woff");
    create_file(root, "src/img/logo.png", "png");

    create_file(root, "node_modules/lib/one.js", "var one = 1; // vendor one\n");
    create_file(root, "node_modules/lib/two.js", "var two = 2;\n");
    create_file(root, "node_modules/treeview/tree.css", ".tree { color: red; }\n");

    PipelineContext::new(test_config(), root.to_path_buf())
}

fn pipeline(ctx: PipelineContext) -> Pipeline {
    Pipeline::standard(ctx).unwrap()
}

// ============================================================================
// Exactly-Once Execution
// ============================================================================

#[test]
fn test_production_runs_each_prerequisite_exactly_once() {
    let temp = TempDir::new().unwrap();
    let pipeline = pipeline(create_project(&temp));

    let report = pipeline.run(TaskName::Production);

    assert!(report.is_success(), "{}", report.summary());
    // scripts -> modules -> templates: templates must not run twice even
    // though the graph is re-entered through the composite
    assert_eq!(report.times_run(TaskName::Templates), 1);
    assert_eq!(report.times_run(TaskName::Modules), 1);
    assert_eq!(report.times_run(TaskName::Scripts), 1);
    for task in TaskName::ALL {
        assert!(report.times_run(task) <= 1, "task '{}' ran more than once", task);
    }
}

#[test]
fn test_production_produces_deployable_tree() {
    let temp = TempDir::new().unwrap();
    let pipeline = pipeline(create_project(&temp));

    let report = pipeline.run(TaskName::Production);
    assert!(report.is_success(), "{}", report.summary());

    let dist = pipeline.context().dist_dir();
    assert!(dist.join("js/vendor.js").is_file());
    assert!(dist.join("js/bundle.js").is_file());
    assert!(dist.join("js/bundle.js.map").is_file());
    assert!(dist.join("index.html").is_file());
    assert!(dist.join("fonts/icons.woff").is_file());
    assert!(dist.join("img/logo.png").is_file());
    // production starts no services
    assert!(pipeline.context().services().is_empty());
}

// ============================================================================
// Graph Validation
// ============================================================================

#[test]
fn test_cycle_rejected_at_configuration_time() {
    let specs = vec![
        TaskSpec::new(TaskName::Templates, &[TaskName::Scripts]),
        TaskSpec::new(TaskName::Modules, &[TaskName::Templates]),
        TaskSpec::new(TaskName::Scripts, &[TaskName::Modules]),
    ];
    assert!(matches!(TaskGraph::new(specs), Err(GraphError::Cycle(_))));
}

// ============================================================================
// Idempotence
// ============================================================================

#[test]
fn test_scripts_rerun_is_byte_identical() {
    let temp = TempDir::new().unwrap();
    let pipeline = pipeline(create_project(&temp));

    assert!(pipeline.run(TaskName::Scripts).is_success());
    let dist = pipeline.context().dist_dir();
    let first_bundle = fs::read(dist.join("js/bundle.js")).unwrap();
    let first_map = fs::read(dist.join("js/bundle.js.map")).unwrap();

    assert!(pipeline.run(TaskName::Scripts).is_success());
    let second_bundle = fs::read(dist.join("js/bundle.js")).unwrap();
    let second_map = fs::read(dist.join("js/bundle.js.map")).unwrap();

    assert_eq!(first_bundle, second_bundle);
    assert_eq!(first_map, second_map);
}

// ============================================================================
// Deploy Mode
// ============================================================================

#[test]
fn test_deploy_bundles_are_not_larger() {
    let plain_temp = TempDir::new().unwrap();
    let plain = pipeline(create_project(&plain_temp));
    assert!(plain.run(TaskName::Scripts).is_success());

    let deploy_temp = TempDir::new().unwrap();
    let deploy = pipeline(create_project(&deploy_temp).with_deploy(true));
    assert!(deploy.run(TaskName::Scripts).is_success());

    for bundle in ["js/bundle.js", "js/vendor.js"] {
        let plain_len = fs::metadata(plain.context().dist_dir().join(bundle)).unwrap().len();
        let deploy_len = fs::metadata(deploy.context().dist_dir().join(bundle)).unwrap().len();
        assert!(
            deploy_len <= plain_len,
            "{}: deploy output {} larger than plain {}",
            bundle,
            deploy_len,
            plain_len
        );
    }

    // Comments from vendor sources do not survive minification
    let vendor = fs::read_to_string(deploy.context().dist_dir().join("js/vendor.js")).unwrap();
    assert!(!vendor.contains("vendor one"));
}

// ============================================================================
// Error Recovery
// ============================================================================

#[test]
fn test_malformed_style_recovers_and_keeps_previous_output() {
    let temp = TempDir::new().unwrap();
    let ctx = create_project(&temp);
    let pipeline = pipeline(ctx);

    // First build succeeds and writes the stylesheet
    assert!(pipeline.run(TaskName::Styles).is_success());
    let css_path = pipeline.context().dist_dir().join("css/app.css");
    let good_css = fs::read_to_string(&css_path).unwrap();
    assert!(good_css.contains("#333"));

    // Break the stylesheet source
    create_file(temp.path(), "src/sass/main.scss", "body { color: ; }\n");

    let report = pipeline.run(TaskName::Styles);
    assert!(report.is_success(), "recovered failure must not fail the run");
    assert!(matches!(
        report.status_of(TaskName::Styles),
        Some(TaskStatus::Recovered(_))
    ));
    assert_eq!(fs::read_to_string(&css_path).unwrap(), good_css);
}

#[test]
fn test_missing_vendor_halts_scripts_chain_only() {
    let temp = TempDir::new().unwrap();
    let ctx = create_project(&temp);
    fs::remove_file(temp.path().join("node_modules/lib/two.js")).unwrap();
    let pipeline = pipeline(ctx);

    let report = pipeline.run(TaskName::Production);

    assert!(!report.is_success());
    assert!(report.status_of(TaskName::Modules).unwrap().is_failure());
    assert_eq!(report.status_of(TaskName::Scripts), Some(&TaskStatus::Skipped));
    // The unrelated copy chain is unaffected
    assert_eq!(report.status_of(TaskName::Copy), Some(&TaskStatus::Success));
    assert!(pipeline.context().dist_dir().join("index.html").is_file());
}

// ============================================================================
// Bundle Content
// ============================================================================

#[test]
fn test_bundle_content_order_and_template_key() {
    let temp = TempDir::new().unwrap();
    let pipeline = pipeline(create_project(&temp));

    assert!(pipeline.run(TaskName::Scripts).is_success());
    let bundle =
        fs::read_to_string(pipeline.context().dist_dir().join("js/bundle.js")).unwrap();

    let module_at = bundle.find("angular.module('app', ['templates'])").unwrap();
    let controller_at = bundle.find("'AController'").unwrap();
    let cache_at = bundle.find("$templateCache.put('./view.html'").unwrap();
    assert!(module_at < controller_at, "module declaration must come first");
    assert!(controller_at < cache_at, "template cache module must come last");

    // Spec files never reach the bundle
    assert!(!bundle.contains("describe("));
    // DI annotation was applied to the controller registration
    assert!(bundle.contains(".controller('AController', ['$scope', function($scope)"));
    // Each unit is wrapped in the isolating closure
    assert!(bundle.starts_with("(function(angular){\n'use strict';\n"));
    assert!(bundle.contains("})(window.angular);"));
}

#[test]
fn test_tree_and_styles_populate_css() {
    let temp = TempDir::new().unwrap();
    let pipeline = pipeline(create_project(&temp));

    assert!(pipeline.run(TaskName::Tree).is_success());
    assert!(pipeline.run(TaskName::Styles).is_success());

    let css = pipeline.context().dist_dir().join("css");
    assert!(css.join("tree.css").is_file());
    let app = fs::read_to_string(css.join("app.css")).unwrap();
    assert!(app.contains("body"));
}

// ============================================================================
// Lint
// ============================================================================

#[test]
fn test_lint_violations_do_not_fail_the_run() {
    let temp = TempDir::new().unwrap();
    let ctx = create_project(&temp);
    create_file(
        temp.path(),
        "src/app/sloppy.js",
        "if (a == b) { debugger; }\n",
    );
    let pipeline = pipeline(ctx);

    let report = pipeline.run(TaskName::Lint);

    assert!(report.is_success());
    assert_eq!(report.status_of(TaskName::LintJs), Some(&TaskStatus::Success));
    assert_eq!(report.status_of(TaskName::LintHtml), Some(&TaskStatus::Success));
}

// ============================================================================
// Clean
// ============================================================================

#[test]
fn test_clean_then_copy_rebuilds_statics() {
    let temp = TempDir::new().unwrap();
    let pipeline = pipeline(create_project(&temp));

    // Pre-existing stale output
    create_file(temp.path(), "dist/js/stale.js", "old");

    let report = pipeline.run(TaskName::Copy);
    assert!(report.is_success());
    assert_eq!(report.status_of(TaskName::Clean), Some(&TaskStatus::Success));

    let dist = pipeline.context().dist_dir();
    assert!(!dist.join("js/stale.js").exists(), "clean must empty the output directory");
    assert!(dist.join("index.html").is_file());
}
