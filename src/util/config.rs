//! Configuration file support for gen-build.
//!
//! A project may carry `.gen-build/config.toml` next to its manifest:
//!
//! ```toml
//! [generate]
//! deps-repo = "@deps"
//! build-file-name = "BUILD.bazel"
//! rules-load = "@rules_clojure//:rules.bzl"
//! base-library = "org.clojure/clojure"
//! validate = true
//! ```
//!
//! Command-line flags take precedence over this file, which takes
//! precedence over built-in defaults.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Project config directory name.
pub const CONFIG_DIR: &str = ".gen-build";

/// gen-build configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Generation settings
    pub generate: GenerateConfig,
}

/// Settings for `srcs` and `deps`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct GenerateConfig {
    /// Repository tag holding library targets, e.g. `@deps`
    pub deps_repo: Option<String>,

    /// Name of generated declaration files
    pub build_file_name: Option<String>,

    /// Label of the rules file named in `load(...)`
    pub rules_load: Option<String>,

    /// Library every source target depends on
    pub base_library: Option<String>,

    /// Directory archive paths are rendered relative to
    pub repository_dir: Option<PathBuf>,

    /// Check every target before rendering
    pub validate: Option<bool>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }
}

/// Get the project config path (`.gen-build/config.toml`).
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(CONFIG_DIR).join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(config.generate.deps_repo.is_none());
        assert!(config.generate.validate.is_none());
    }

    #[test]
    fn test_config_load() {
        let tmp = TempDir::new().unwrap();
        let config_path = project_config_path(tmp.path());
        std::fs::create_dir_all(config_path.parent().unwrap()).unwrap();
        std::fs::write(
            &config_path,
            r#"
[generate]
deps-repo = "@maven"
build-file-name = "BUILD"
validate = true
"#,
        )
        .unwrap();

        let config = Config::load(&config_path).unwrap();
        assert_eq!(config.generate.deps_repo.as_deref(), Some("@maven"));
        assert_eq!(config.generate.build_file_name.as_deref(), Some("BUILD"));
        assert_eq!(config.generate.validate, Some(true));
    }

    #[test]
    fn test_load_or_default_tolerates_missing_and_broken_files() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        assert_eq!(Config::load_or_default(&path), Config::default());

        std::fs::write(&path, "[generate\n").unwrap();
        assert_eq!(Config::load_or_default(&path), Config::default());
    }
}
