//! Build targets - what gets declared.
//!
//! A BuildTarget is one rule invocation in a generated BUILD file. Its
//! dependency set is kept apart from the other attributes so that every
//! configuration layer can add edges without ever removing computed ones.

use std::collections::{BTreeMap, BTreeSet};

use miette::Diagnostic;
use thiserror::Error;

use crate::core::label;
use crate::emit::{Call, Node};

/// Attribute key that carries dependency labels.
pub const DEPS: &str = "deps";

/// Extra target attributes from the manifest or inline metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtraConfig(BTreeMap<String, Node>);

impl ExtraConfig {
    pub fn new() -> Self {
        ExtraConfig(BTreeMap::new())
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Node) {
        self.0.insert(key.into(), value);
    }

    pub fn with(mut self, key: impl Into<String>, value: Node) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Node> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Dependency labels carried under `deps`.
    pub fn deps(&self) -> Vec<String> {
        match self.0.get(DEPS) {
            Some(Node::Seq(items)) => items
                .iter()
                .filter_map(|n| n.as_text().map(str::to_string))
                .collect(),
            Some(node) => node.as_text().map(str::to_string).into_iter().collect(),
            None => Vec::new(),
        }
    }
}

/// Kind of generated target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetKind {
    /// A single source file as a library.
    SourceLibrary,
    /// A test runner for a test source file.
    Test,
    /// A library archive import.
    ArchiveImport,
    /// A module from a library archive, compiled ahead of time.
    CompiledModule,
    /// Directory- or repository-level library aggregate.
    AggregateLibrary,
    /// Directory-level raw file aggregate.
    AggregateFilegroup,
}

impl TargetKind {
    /// Rule that declares this kind of target.
    pub fn rule(&self) -> &'static str {
        match self {
            TargetKind::SourceLibrary
            | TargetKind::CompiledModule
            | TargetKind::AggregateLibrary => "clojure_library",
            TargetKind::Test => "clojure_test",
            TargetKind::ArchiveImport => "java_import",
            TargetKind::AggregateFilegroup => "filegroup",
        }
    }

    /// Attributes that receive the dependency set.
    fn dep_attrs(&self) -> &'static [&'static str] {
        match self {
            TargetKind::ArchiveImport => &["deps", "runtime_deps"],
            TargetKind::AggregateFilegroup => &[],
            _ => &["deps"],
        }
    }
}

/// Error from the optional pre-render validation pass.
#[derive(Debug, Error, Diagnostic, PartialEq, Eq)]
pub enum TargetValidationError {
    #[error("target in `{package}` has an empty name")]
    #[diagnostic(code(gen_build::validate::empty_name))]
    EmptyName { package: String },

    #[error("target `{target}` depends on malformed label `{label}`")]
    #[diagnostic(code(gen_build::validate::malformed_label))]
    MalformedLabel { target: String, label: String },

    #[error("target `{target}` depends on itself")]
    #[diagnostic(code(gen_build::validate::self_dependency))]
    SelfDependency { target: String },
}

/// A generated target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildTarget {
    pub kind: TargetKind,
    pub name: String,
    /// Dependency labels, rendered relative to the target's BUILD file.
    pub deps: BTreeSet<String>,
    /// Every other attribute, including file lists.
    pub attrs: ExtraConfig,
}

impl BuildTarget {
    pub fn new(kind: TargetKind, name: impl Into<String>) -> Self {
        BuildTarget {
            kind,
            name: name.into(),
            deps: BTreeSet::new(),
            attrs: ExtraConfig::new(),
        }
    }

    pub fn attr(mut self, key: impl Into<String>, value: Node) -> Self {
        self.attrs.insert(key, value);
        self
    }

    pub fn add_deps<I, S>(&mut self, deps: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.deps.extend(deps.into_iter().map(Into::into));
    }

    /// Merge a higher-precedence layer into this target.
    ///
    /// `deps` entries are unioned into the dependency set; any other key
    /// replaces the current value.
    pub fn merge(&mut self, layer: &ExtraConfig) {
        for (key, value) in layer.iter() {
            if key == DEPS {
                continue;
            }
            self.attrs.insert(key, value.clone());
        }
        self.add_deps(layer.deps());
    }

    /// Check names and dependency labels. `package` is the label prefix of
    /// the BUILD file holding this target, e.g. `//src/app` or `@deps//`.
    pub fn validate(&self, package: &str) -> Result<(), TargetValidationError> {
        if self.name.is_empty() {
            return Err(TargetValidationError::EmptyName {
                package: package.to_string(),
            });
        }

        let local = format!(":{}", self.name);
        let qualified = format!("{}:{}", package, self.name);

        for dep in &self.deps {
            if !label::is_well_formed(dep) {
                return Err(TargetValidationError::MalformedLabel {
                    target: self.name.clone(),
                    label: dep.clone(),
                });
            }
            if *dep == local || *dep == qualified {
                return Err(TargetValidationError::SelfDependency {
                    target: self.name.clone(),
                });
            }
        }

        Ok(())
    }

    /// Rule invocation for this target: `name` first, remaining attributes
    /// in key order.
    pub fn to_node(&self) -> Node {
        let mut attrs: BTreeMap<&str, Node> = self
            .attrs
            .iter()
            .map(|(k, v)| (k, v.clone()))
            .collect();
        for key in self.kind.dep_attrs() {
            attrs.insert(key, Node::strs(self.deps.iter().cloned()));
        }

        let mut call = Call::new(self.kind.rule()).kwarg("name", Node::str(&self.name));
        for (key, value) in attrs {
            if key == "name" {
                continue;
            }
            call = call.kwarg(key, value);
        }
        call.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emit::render;

    #[test]
    fn test_merge_unions_deps_and_replaces_scalars() {
        let mut target = BuildTarget::new(TargetKind::SourceLibrary, "core.clj")
            .attr("resource_strip_prefix", Node::str("src"));
        target.add_deps(["@deps//:org_clojure_clojure"]);

        let layer = ExtraConfig::new()
            .with(DEPS, Node::strs(["@deps//:extra"]))
            .with("resource_strip_prefix", Node::str("other"));
        target.merge(&layer);

        assert_eq!(
            target.deps.iter().cloned().collect::<Vec<_>>(),
            vec!["@deps//:extra", "@deps//:org_clojure_clojure"]
        );
        assert_eq!(
            target.attrs.get("resource_strip_prefix"),
            Some(&Node::str("other"))
        );
    }

    #[test]
    fn test_archive_import_renders_runtime_deps() {
        let mut target = BuildTarget::new(TargetKind::ArchiveImport, "a_b")
            .attr("jars", Node::strs(["a.jar"]));
        target.add_deps([":c_d"]);

        let text = render(&target.to_node());
        assert!(text.starts_with("java_import(\n    name = \"a_b\","));
        assert!(text.contains("deps = [\":c_d\"]"));
        assert!(text.contains("runtime_deps = [\":c_d\"]"));
    }

    #[test]
    fn test_filegroup_has_no_deps_attr() {
        let target = BuildTarget::new(TargetKind::AggregateFilegroup, "__clj_files")
            .attr("srcs", Node::strs(["a.clj"]));
        let text = render(&target.to_node());
        assert!(!text.contains("deps"));
    }

    #[test]
    fn test_validate_rejects_self_dependency() {
        let mut target = BuildTarget::new(TargetKind::SourceLibrary, "core.clj");
        target.add_deps(["//src/app:core.clj"]);
        assert_eq!(
            target.validate("//src/app"),
            Err(TargetValidationError::SelfDependency {
                target: "core.clj".to_string()
            })
        );
    }

    #[test]
    fn test_validate_rejects_malformed_label() {
        let mut target = BuildTarget::new(TargetKind::Test, "foo_test");
        target.add_deps(["foo_test.clj"]);
        assert!(matches!(
            target.validate("//src"),
            Err(TargetValidationError::MalformedLabel { .. })
        ));
    }

    #[test]
    fn test_validate_accepts_repository_targets() {
        let mut target = BuildTarget::new(TargetKind::CompiledModule, "ns_a_b");
        target.add_deps([":a", "@//src:x.clj"]);
        assert!(target.validate("@deps//").is_ok());
    }
}
