//! Configuration loading and discovery for `sitepack.toml`
//!
//! Provides functions to find, load, and validate configuration.

use super::schema::SiteConfig;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration loading error
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// File I/O error
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error
    #[error("Failed to parse sitepack.toml: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error
    #[error("Config validation failed:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    Validation(Vec<String>),
}

/// Config file name searched for during discovery.
pub const CONFIG_FILE_NAME: &str = "sitepack.toml";

/// Find sitepack.toml by walking up from a starting directory.
///
/// # Returns
/// - `Some(path)` if a sitepack.toml file is found
/// - `None` if no config file is found before the filesystem root
pub fn find_config_from(start: PathBuf) -> Option<PathBuf> {
    let mut current = start;

    loop {
        let config_path = current.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            return Some(config_path);
        }

        // Move to parent directory
        if !current.pop() {
            // Reached root, no config found
            return None;
        }
    }
}

/// Load configuration from a sitepack.toml file.
///
/// If a path is provided, loads from that file. Otherwise returns the
/// default configuration.
///
/// # Returns
/// - `Ok(SiteConfig)` on success
/// - `Err(ConfigError)` if the file cannot be read, parsed, or validated
pub fn load_config(path: Option<&Path>) -> Result<SiteConfig, ConfigError> {
    match path {
        Some(p) => load_config_file(p),
        None => Ok(default_config()),
    }
}

/// Load configuration from a specific file path.
fn load_config_file(path: &Path) -> Result<SiteConfig, ConfigError> {
    let contents = fs::read_to_string(path)?;
    let config: SiteConfig = toml::from_str(&contents)?;

    let errors = config.validate();
    if !errors.is_empty() {
        return Err(ConfigError::Validation(errors));
    }

    Ok(config)
}

/// Create a default configuration when no sitepack.toml is found.
pub fn default_config() -> SiteConfig {
    SiteConfig::default()
}

/// Determine the project root from a config file path.
pub fn project_root(config_path: &Path) -> Option<&Path> {
    config_path.parent()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_config(dir: &Path, contents: &str) -> PathBuf {
        let path = dir.join(CONFIG_FILE_NAME);
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_find_config_in_start_dir() {
        let temp = TempDir::new().unwrap();
        let path = write_config(temp.path(), "");

        let found = find_config_from(temp.path().to_path_buf());
        assert_eq!(found, Some(path));
    }

    #[test]
    fn test_find_config_walks_up() {
        let temp = TempDir::new().unwrap();
        let path = write_config(temp.path(), "");
        let nested = temp.path().join("src/app/components");
        fs::create_dir_all(&nested).unwrap();

        let found = find_config_from(nested);
        assert_eq!(found, Some(path));
    }

    #[test]
    fn test_load_config_none_uses_defaults() {
        let config = load_config(None).unwrap();
        assert_eq!(config.server.port, 4000);
    }

    #[test]
    fn test_load_config_reads_overrides() {
        let temp = TempDir::new().unwrap();
        let path = write_config(
            temp.path(),
            r#"
                [project]
                dist = "public"
            "#,
        );

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.project.dist, PathBuf::from("public"));
    }

    #[test]
    fn test_load_config_rejects_invalid_toml() {
        let temp = TempDir::new().unwrap();
        let path = write_config(temp.path(), "[project\nname = oops");

        let err = load_config(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_config_rejects_failed_validation() {
        let temp = TempDir::new().unwrap();
        let path = write_config(
            temp.path(),
            r#"
                [project]
                src = "same"
                dist = "same"
            "#,
        );

        let err = load_config(Some(&path)).unwrap_err();
        match err {
            ConfigError::Validation(errors) => {
                assert!(errors.iter().any(|e| e.contains("different directories")));
            }
            other => panic!("expected validation error, got: {}", other),
        }
    }
}
