//! Generation context - repository tag, rule file, and output settings.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::core::label::{library_label, RepoTag};
use crate::core::{Coordinate, Label};
use crate::util::fs::relative_path;
use crate::util::Config;

/// Default library every source target depends on.
pub const DEFAULT_BASE_LIBRARY: &str = "org.clojure/clojure";

/// Default rules file named in generated `load(...)` statements.
pub const DEFAULT_RULES_LOAD: &str = "@rules_clojure//:rules.bzl";

/// Default generated file name.
pub const DEFAULT_BUILD_FILE_NAME: &str = "BUILD.bazel";

/// Settings that shape every generated file.
///
/// Built once at startup from defaults, the project config, and command-line
/// flags, then passed by reference through the generators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenConfig {
    /// Repository holding library targets
    pub deps_repo: RepoTag,

    /// Library every source target depends on
    pub base_library: Coordinate,

    /// Rules file named in `load(...)`
    pub rules_load: String,

    /// Name of each generated file
    pub build_file_name: String,

    /// Archive paths under this directory are written relative to it
    pub repository_dir: Option<PathBuf>,

    /// Check every target before rendering
    pub validate: bool,
}

impl Default for GenConfig {
    fn default() -> Self {
        GenConfig {
            deps_repo: RepoTag::default(),
            base_library: Coordinate::new(DEFAULT_BASE_LIBRARY),
            rules_load: DEFAULT_RULES_LOAD.to_string(),
            build_file_name: DEFAULT_BUILD_FILE_NAME.to_string(),
            repository_dir: None,
            validate: false,
        }
    }
}

impl GenConfig {
    /// Defaults overlaid with the `[generate]` section of a project config.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut gen = GenConfig::default();
        let section = &config.generate;

        if let Some(tag) = &section.deps_repo {
            gen.deps_repo = tag
                .parse()
                .with_context(|| "invalid `deps-repo` in project config")?;
        }
        if let Some(lib) = &section.base_library {
            gen.base_library = Coordinate::new(lib.as_str());
        }
        if let Some(load) = &section.rules_load {
            gen.rules_load = load.clone();
        }
        if let Some(name) = &section.build_file_name {
            gen.build_file_name = name.clone();
        }
        if let Some(dir) = &section.repository_dir {
            gen.repository_dir = Some(dir.clone());
        }
        if let Some(validate) = section.validate {
            gen.validate = validate;
        }

        Ok(gen)
    }

    /// Qualified label of a library's archive import.
    pub fn library(&self, coord: &Coordinate) -> Label {
        Label::repo(&self.deps_repo, library_label(coord))
    }

    /// Label of the base library.
    pub fn base_library_label(&self) -> Label {
        self.library(&self.base_library)
    }

    /// Archive path as written into the library file.
    pub fn archive_path(&self, path: &Path) -> PathBuf {
        match &self.repository_dir {
            Some(dir) if path.starts_with(dir) => relative_path(dir, path),
            _ => path.to_path_buf(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::config::GenerateConfig;

    #[test]
    fn test_defaults() {
        let gen = GenConfig::default();
        assert_eq!(gen.deps_repo.as_str(), "@deps");
        assert_eq!(
            gen.base_library_label().to_string(),
            "@deps//:org_clojure_clojure"
        );
        assert!(!gen.validate);
    }

    #[test]
    fn test_from_config() {
        let config = Config {
            generate: GenerateConfig {
                deps_repo: Some("@maven".to_string()),
                build_file_name: Some("BUILD".to_string()),
                validate: Some(true),
                ..Default::default()
            },
        };

        let gen = GenConfig::from_config(&config).unwrap();
        assert_eq!(gen.deps_repo.as_str(), "@maven");
        assert_eq!(gen.build_file_name, "BUILD");
        assert!(gen.validate);
        assert_eq!(gen.rules_load, DEFAULT_RULES_LOAD);
    }

    #[test]
    fn test_from_config_rejects_bad_tag() {
        let config = Config {
            generate: GenerateConfig {
                deps_repo: Some("deps".to_string()),
                ..Default::default()
            },
        };
        assert!(GenConfig::from_config(&config).is_err());
    }

    #[test]
    fn test_archive_path() {
        let gen = GenConfig {
            repository_dir: Some(PathBuf::from("/repo")),
            ..Default::default()
        };
        assert_eq!(
            gen.archive_path(Path::new("/repo/m2/a.jar")),
            PathBuf::from("m2/a.jar")
        );
        assert_eq!(
            gen.archive_path(Path::new("/elsewhere/a.jar")),
            PathBuf::from("/elsewhere/a.jar")
        );
    }
}
