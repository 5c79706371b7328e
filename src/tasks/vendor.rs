//! The `modules` and `tree` tasks: third-party vendor files.
//!
//! `modules` concatenates the configured vendor scripts, in order, into
//! the vendor bundle, minifying in deploy mode. `tree` copies the
//! configured vendor stylesheets into the output `css/` directory. A
//! missing vendor file is an unrecovered error: the dependency cache is
//! broken and everything downstream of it would be too.

use crate::pipeline::{discover, AssetKind, PipelineContext};
use crate::tasks::{TaskError, TaskResult};
use crate::transforms::minify;
use std::fs;

/// Concatenate vendor scripts into the vendor bundle.
pub fn run_scripts(ctx: &PipelineContext) -> TaskResult {
    let assets = discover(ctx, AssetKind::Vendor)?;

    let mut bundle = String::new();
    for asset in &assets {
        if !asset.path.is_file() {
            return Err(TaskError::MissingVendor(asset.path.clone()));
        }
        let content = fs::read_to_string(&asset.path).map_err(|e| TaskError::Read {
            path: asset.path.clone(),
            source: e,
        })?;
        bundle.push_str(&content);
        if !bundle.ends_with('\n') {
            bundle.push('\n');
        }
    }

    if ctx.is_deploy() {
        bundle = minify(&bundle);
    }

    let out_path = ctx.dist_dir().join(&ctx.config().bundle.vendor);
    if let Some(parent) = out_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&out_path, &bundle).map_err(|e| TaskError::Write {
        path: out_path.clone(),
        source: e,
    })?;

    Ok(format!("bundled {} vendor scripts ({} bytes)", assets.len(), bundle.len()))
}

/// Copy vendor stylesheets into the output `css/` directory.
pub fn run_styles(ctx: &PipelineContext) -> TaskResult {
    let vendor_dir = ctx.vendor_dir();
    let css_dir = ctx.dist_dir().join("css");
    fs::create_dir_all(&css_dir)?;

    let styles = &ctx.config().vendor.styles;
    for rel in styles {
        let source = vendor_dir.join(rel);
        if !source.is_file() {
            return Err(TaskError::MissingVendor(source));
        }
        let file_name = source
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        let dest = css_dir.join(file_name);
        fs::copy(&source, &dest).map_err(|e| TaskError::Write { path: dest.clone(), source: e })?;
    }

    Ok(format!("copied {} vendor stylesheets", styles.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_config;
    use crate::pipeline::PipelineContext;
    use std::path::Path;
    use tempfile::TempDir;

    fn write_vendor(root: &Path, rel: &str, content: &str) {
        let path = root.join("node_modules").join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn context_with_vendor(temp: &TempDir, scripts: &[&str]) -> PipelineContext {
        let mut config = default_config();
        config.vendor.scripts = scripts.iter().map(|s| s.to_string()).collect();
        PipelineContext::new(config, temp.path().to_path_buf())
    }

    #[test]
    fn test_vendor_bundle_preserves_order() {
        let temp = TempDir::new().unwrap();
        write_vendor(temp.path(), "b/b.js", "var b = 2;\n");
        write_vendor(temp.path(), "a/a.js", "var a = 1;\n");
        let ctx = context_with_vendor(&temp, &["b/b.js", "a/a.js"]);

        run_scripts(&ctx).unwrap();

        let bundle = fs::read_to_string(ctx.dist_dir().join("js/vendor.js")).unwrap();
        let b = bundle.find("var b").unwrap();
        let a = bundle.find("var a").unwrap();
        assert!(b < a, "configured order must win over path order");
    }

    #[test]
    fn test_missing_vendor_file_is_error() {
        let temp = TempDir::new().unwrap();
        let ctx = context_with_vendor(&temp, &["nope/missing.js"]);

        let err = run_scripts(&ctx).unwrap_err();
        assert!(matches!(err, TaskError::MissingVendor(_)));
        assert!(!ctx.dist_dir().join("js/vendor.js").exists());
    }

    #[test]
    fn test_deploy_minifies_vendor_bundle() {
        let temp = TempDir::new().unwrap();
        write_vendor(temp.path(), "a/a.js", "var a = 1;   // comment\n\nvar b = 2;\n");
        let plain_ctx = context_with_vendor(&temp, &["a/a.js"]);
        let deploy_ctx = context_with_vendor(&temp, &["a/a.js"]).with_deploy(true);

        run_scripts(&plain_ctx).unwrap();
        let plain = fs::read(plain_ctx.dist_dir().join("js/vendor.js")).unwrap();
        run_scripts(&deploy_ctx).unwrap();
        let deployed = fs::read(deploy_ctx.dist_dir().join("js/vendor.js")).unwrap();

        assert!(deployed.len() <= plain.len());
        assert!(!String::from_utf8(deployed).unwrap().contains("comment"));
    }

    #[test]
    fn test_tree_copies_vendor_styles() {
        let temp = TempDir::new().unwrap();
        write_vendor(
            temp.path(),
            "angular-ivh-treeview/dist/angular-ivh-treeview.min.css",
            ".tree{}",
        );
        let ctx = PipelineContext::new(default_config(), temp.path().to_path_buf());

        run_styles(&ctx).unwrap();

        let copied = ctx.dist_dir().join("css/angular-ivh-treeview.min.css");
        assert_eq!(fs::read_to_string(copied).unwrap(), ".tree{}");
    }

    #[test]
    fn test_tree_missing_style_is_error() {
        let temp = TempDir::new().unwrap();
        let ctx = PipelineContext::new(default_config(), temp.path().to_path_buf());

        let err = run_styles(&ctx).unwrap_err();
        assert!(matches!(err, TaskError::MissingVendor(_)));
    }
}
