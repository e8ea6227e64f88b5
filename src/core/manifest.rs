//! deps.toml manifest parsing and schema.
//!
//! The manifest declares source paths, direct library coordinates, alias
//! bundles, and the `[bazel]` override block. It is immutable once loaded;
//! the override block is validated before any generation begins.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::coordinate::Coordinate;
use crate::core::label;
use crate::core::module::{is_valid_module_name, BOOTSTRAP_NO_COMPILE};
use crate::core::target::{ExtraConfig, DEPS};
use crate::emit::Node;

/// Canonical manifest file name.
pub const MANIFEST_NAME: &str = "deps.toml";

/// Failure to locate a manifest.
#[derive(Debug, Error)]
#[error("could not find `deps.toml` in {} or any parent directory", dir.display())]
pub struct ManifestNotFound {
    pub dir: PathBuf,
}

/// Find the manifest starting from `start` and searching upward.
pub fn find_manifest(start: &Path) -> Result<PathBuf, ManifestNotFound> {
    let mut current = start.to_path_buf();
    loop {
        let candidate = current.join(MANIFEST_NAME);
        if candidate.is_file() {
            return Ok(candidate);
        }
        if !current.pop() {
            return Err(ManifestNotFound {
                dir: start.to_path_buf(),
            });
        }
    }
}

/// A direct dependency declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DependencySpec {
    /// `"org.clojure/clojure" = "1.11.1"`
    Simple(String),
    /// `"org.clojure/clojure" = { version = "1.11.1" }`
    Detailed { version: String },
}

impl DependencySpec {
    pub fn version(&self) -> &str {
        match self {
            DependencySpec::Simple(v) => v,
            DependencySpec::Detailed { version } => version,
        }
    }
}

/// A named bundle of extra paths and dependencies, merged in on request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Alias {
    #[serde(default)]
    pub extra_paths: Vec<PathBuf>,

    #[serde(default)]
    pub extra_deps: BTreeMap<String, DependencySpec>,
}

/// Error in the `[bazel]` override block or other manifest fields.
#[derive(Debug, Clone, Error, Diagnostic, PartialEq, Eq)]
pub enum ConfigValidationError {
    #[error("override key `{key}` is not a label")]
    #[diagnostic(
        code(gen_build::manifest::override_key),
        help("keys of [bazel.extra-deps] must be labels such as \"//src/app:core.clj\" or \"@deps//:org_clojure_clojure\"")
    )]
    OverrideKey { key: String },

    #[error("override `{key}` has unsupported value for `{attr}`")]
    #[diagnostic(
        code(gen_build::manifest::override_value),
        help("values must be strings, integers, booleans, or lists of those")
    )]
    OverrideValue { key: String, attr: String },

    #[error("override `{key}` must list `deps` as strings")]
    #[diagnostic(code(gen_build::manifest::override_deps))]
    OverrideDeps { key: String },

    #[error("`{name}` in no-aot is not a valid module name")]
    #[diagnostic(code(gen_build::manifest::no_aot))]
    NoAot { name: String },

    #[error("path `{path}` must be relative and inside the manifest directory")]
    #[diagnostic(code(gen_build::manifest::path))]
    Path { path: String },
}

#[derive(Debug, Deserialize)]
struct RawManifest {
    #[serde(default)]
    paths: Vec<String>,

    #[serde(default)]
    deps: BTreeMap<String, DependencySpec>,

    #[serde(default)]
    aliases: BTreeMap<String, Alias>,

    #[serde(default)]
    bazel: RawOverrides,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct RawOverrides {
    #[serde(default)]
    extra_deps: BTreeMap<String, toml::Table>,

    #[serde(default)]
    ignore: Vec<String>,

    #[serde(default)]
    no_aot: Vec<String>,
}

/// The validated `[bazel]` override block.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    /// Extra target attributes keyed by fully qualified label.
    pub extra_deps: BTreeMap<String, ExtraConfig>,
    /// Paths relative to the manifest directory that are never scanned.
    pub ignore: Vec<PathBuf>,
    /// Modules excluded from ahead-of-time compilation, bootstrap set included.
    pub no_aot: BTreeSet<String>,
}

impl Overrides {
    /// Extra config for a label, if the manifest declares any.
    pub fn for_label(&self, label: &str) -> Option<&ExtraConfig> {
        self.extra_deps.get(label)
    }
}

/// The parsed deps.toml manifest.
#[derive(Debug, Clone)]
pub struct Manifest {
    /// Source paths relative to the manifest directory
    pub paths: Vec<PathBuf>,

    /// Direct library dependencies
    pub deps: BTreeMap<Coordinate, DependencySpec>,

    /// Named alias bundles
    pub aliases: BTreeMap<String, Alias>,

    /// Override block
    pub overrides: Overrides,

    /// The directory containing this manifest
    pub manifest_dir: PathBuf,
}

impl Manifest {
    /// Load a manifest from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read manifest: {}", path.display()))?;

        Self::parse(&content, path)
    }

    /// Parse manifest content.
    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        let mut raw: RawManifest = toml::from_str(content)
            .with_context(|| format!("failed to parse {}", path.display()))?;

        let manifest_dir = path.parent().unwrap_or(Path::new(".")).to_path_buf();

        let paths = raw
            .paths
            .iter()
            .map(|p| validate_relative_path(p))
            .collect::<Result<Vec<_>, _>>()?;

        for alias in raw.aliases.values_mut() {
            alias.extra_paths = alias
                .extra_paths
                .iter()
                .map(|p| validate_relative_path(&p.to_string_lossy()))
                .collect::<Result<Vec<_>, _>>()?;
        }

        let overrides = validate_overrides(raw.bazel)?;

        Ok(Manifest {
            paths,
            deps: raw
                .deps
                .into_iter()
                .map(|(coord, spec)| (Coordinate::new(coord), spec))
                .collect(),
            aliases: raw.aliases,
            overrides,
            manifest_dir,
        })
    }
}

fn validate_relative_path(path: &str) -> Result<PathBuf, ConfigValidationError> {
    let p = Path::new(path);
    let mut depth: i64 = 0;
    for component in p.components() {
        match component {
            Component::Normal(_) => depth += 1,
            Component::CurDir => {}
            Component::ParentDir => depth -= 1,
            Component::RootDir | Component::Prefix(_) => depth = -1,
        }
        if depth < 0 {
            return Err(ConfigValidationError::Path {
                path: path.to_string(),
            });
        }
    }

    Ok(p.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect())
}

fn validate_overrides(raw: RawOverrides) -> Result<Overrides, ConfigValidationError> {
    let mut extra_deps = BTreeMap::new();
    for (key, table) in raw.extra_deps {
        if !label::is_well_formed(&key) {
            return Err(ConfigValidationError::OverrideKey { key });
        }

        let mut config = ExtraConfig::new();
        for (attr, value) in table {
            if attr == DEPS {
                let deps = value
                    .as_array()
                    .filter(|items| items.iter().all(toml::Value::is_str))
                    .ok_or_else(|| ConfigValidationError::OverrideDeps { key: key.clone() })?;
                config.insert(
                    attr,
                    Node::strs(deps.iter().filter_map(|v| v.as_str().map(str::to_string))),
                );
                continue;
            }

            let node = toml_to_node(&value).ok_or_else(|| ConfigValidationError::OverrideValue {
                key: key.clone(),
                attr: attr.clone(),
            })?;
            config.insert(attr, node);
        }
        extra_deps.insert(key, config);
    }

    let ignore = raw
        .ignore
        .iter()
        .map(|p| validate_relative_path(p))
        .collect::<Result<Vec<_>, _>>()?;

    let mut no_aot: BTreeSet<String> = BOOTSTRAP_NO_COMPILE.iter().map(|s| s.to_string()).collect();
    for name in raw.no_aot {
        if !is_valid_module_name(&name) {
            return Err(ConfigValidationError::NoAot { name });
        }
        no_aot.insert(name);
    }

    Ok(Overrides {
        extra_deps,
        ignore,
        no_aot,
    })
}

/// Scalars and flat lists of scalars are the only override values.
fn toml_to_node(value: &toml::Value) -> Option<Node> {
    match value {
        toml::Value::String(s) => Some(Node::str(s)),
        toml::Value::Integer(i) => Some(Node::int(*i)),
        toml::Value::Boolean(b) => Some(Node::bool(*b)),
        toml::Value::Array(items) => items
            .iter()
            .map(|item| match item {
                toml::Value::Array(_) | toml::Value::Table(_) => None,
                scalar => toml_to_node(scalar),
            })
            .collect::<Option<Vec<_>>>()
            .map(Node::Seq),
        _ => None,
    }
}
