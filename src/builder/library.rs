//! The library repository BUILD file.
//!
//! One `java_import` per resolved archive, a `clojure_library` per module
//! compiled out of it, and an `__all` umbrella over every import.

use tracing::debug;

use crate::builder::context::GenConfig;
use crate::builder::deps::DependencyExtractor;
use crate::builder::directory::{load_statement, package_statement};
use crate::builder::{validate_all, GenError};
use crate::core::label::{compiled_module_label, library_label};
use crate::core::target::DEPS;
use crate::core::{BuildTarget, ExtraConfig, Label, Library, Manifest, Scope, TargetKind};
use crate::emit::{render_file, Node};
use crate::index::ClasspathIndex;

/// Name of the umbrella target.
pub const ALL_TARGET: &str = "__all";

/// Renders the BUILD file at the root of the dependency repository.
pub struct LibraryBuildGenerator<'a> {
    manifest: &'a Manifest,
    index: &'a ClasspathIndex,
    config: &'a GenConfig,
    extractor: DependencyExtractor<'a>,
}

impl<'a> LibraryBuildGenerator<'a> {
    pub fn new(manifest: &'a Manifest, index: &'a ClasspathIndex, config: &'a GenConfig) -> Self {
        LibraryBuildGenerator {
            manifest,
            index,
            config,
            extractor: DependencyExtractor::new(index, config),
        }
    }

    fn scope(&self) -> Scope<'a> {
        Scope::Repository(&self.config.deps_repo)
    }

    /// Every library target, libraries sorted by label.
    pub fn targets(&self) -> Result<Vec<BuildTarget>, GenError> {
        let mut libraries: Vec<&Library> = self.index.libraries().iter().collect();
        libraries.sort_by_key(|lib| library_label(&lib.coord));

        let mut targets = Vec::new();
        let mut umbrella = BuildTarget::new(TargetKind::AggregateLibrary, ALL_TARGET);

        for library in libraries {
            let import = self.archive_import(library)?;
            umbrella.add_deps([format!(":{}", import.name)]);
            targets.push(import);
            targets.extend(self.compiled_modules(library)?);
        }

        targets.push(umbrella);
        Ok(targets)
    }

    fn archive_import(&self, library: &Library) -> Result<BuildTarget, GenError> {
        let coord = &library.coord;
        let name = library_label(coord);
        let archive = self.config.archive_path(self.index.archive(coord)?);

        let mut target = BuildTarget::new(TargetKind::ArchiveImport, name.as_str())
            .attr("jars", Node::Seq(vec![Node::path(archive)]));
        target.add_deps(
            self.index
                .library_deps(coord)?
                .into_iter()
                .map(|dep| self.config.library(dep).render(self.scope())),
        );

        if let Some(layer) = self.override_for(&name) {
            target.merge(&layer);
        }
        Ok(target)
    }

    fn compiled_modules(&self, library: &Library) -> Result<Vec<BuildTarget>, GenError> {
        let coord = &library.coord;
        let import = format!(":{}", library_label(coord));

        let mut targets = Vec::new();
        for decl in self.index.compiled_modules(coord)? {
            let name = compiled_module_label(coord, &decl.name);
            let own = Label::repo(&self.config.deps_repo, name.as_str());

            let mut target = BuildTarget::new(TargetKind::CompiledModule, name.as_str())
                .attr("aot", Node::strs([decl.name.as_str()]));
            target.add_deps([import.clone()]);
            target.add_deps(
                self.extractor
                    .extract(decl)?
                    .iter()
                    .filter(|label| **label != own)
                    .map(|label| label.render(self.scope())),
            );

            if let Some(layer) = self.override_for(&name) {
                target.merge(&layer);
            }
            targets.push(target);
        }
        Ok(targets)
    }

    /// Manifest override for a target of this repository, with labels into
    /// the repository itself rewritten relative to it.
    fn override_for(&self, name: &str) -> Option<ExtraConfig> {
        let repo = &self.config.deps_repo;
        let mut layer = self.manifest.overrides.for_label(&repo.qualify(name))?.clone();
        if layer.get(DEPS).is_some() {
            let deps: Vec<String> = layer.deps().iter().map(|dep| repo.localize(dep)).collect();
            layer.insert(DEPS, Node::strs(deps));
        }
        Some(layer)
    }

    /// Render the complete repository file.
    pub fn generate(&self) -> Result<String, GenError> {
        let targets = self.targets()?;
        validate_all(
            self.config.validate,
            &format!("{}//", self.config.deps_repo),
            &targets,
        )?;
        debug!(
            "{}: {} targets for {} libraries",
            self.config.deps_repo,
            targets.len(),
            self.index.libraries().len()
        );

        let mut statements = vec![
            package_statement(),
            load_statement(&self.config.rules_load, &["clojure_library"]),
        ];
        statements.extend(targets.iter().map(BuildTarget::to_node));
        Ok(render_file(&statements))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::fixtures::{ProjectFixture, TestProject};

    fn project() -> TestProject {
        ProjectFixture::new()
            .with_manifest(
                r#"
paths = ["src"]

[deps]
"acme-corp/widget-lib" = "2.3.0"

[bazel.extra-deps."@deps//:acme_corp_widget_lib"]
deps = ["@deps//:acme_corp_gizmo", "@deps//:org_slf4j_slf4j_api", "@maven//:extra"]

[bazel.extra-deps."@deps//:ns_acme_corp_widget_lib_widget_core"]
jvm_flags = ["-Dwidget=1"]
"#,
            )
            .with_jar(
                "acme-corp/widget-lib",
                "2.3.0",
                &[
                    ("widget/core.clj", "(ns widget.core (:require [widget.impl] [gizmo.core] [app.shared]))"),
                    ("widget/impl.clj", "(ns widget.impl (:import (com.acme Gear)))"),
                    ("widget/dup.clj", "(ns widget.dup (:require [gizmo.core]))"),
                    ("widget/dup.cljc", "(ns widget.dup)"),
                ],
            )
            .with_jar(
                "acme-corp/gizmo",
                "1.0.0",
                &[("gizmo/core.clj", "(ns gizmo.core)"), ("com/acme/Gear.class", "")],
            )
            .with_jar(
                "org.clojure/clojure",
                "1.11.1",
                &[("clojure/core.clj", "(ns clojure.core)"), ("clojure/core__init.class", "")],
            )
            .with_trace("acme-corp/gizmo", "acme-corp/widget-lib", "new-dep")
            .with_trace("org.clojure/clojure", "acme-corp/widget-lib", "excluded")
            .with_source("src/app/shared.clj", "(ns app.shared)")
            .create()
    }

    fn find<'t>(targets: &'t [BuildTarget], name: &str) -> &'t BuildTarget {
        targets.iter().find(|t| t.name == name).unwrap()
    }

    fn deps(target: &BuildTarget) -> Vec<&str> {
        target.deps.iter().map(String::as_str).collect()
    }

    #[test]
    fn test_archive_import_merges_override_with_graph_edges() {
        let project = project();
        let manifest = project.manifest();
        let index = project.index();
        let config = GenConfig::default();
        let targets = LibraryBuildGenerator::new(&manifest, &index, &config)
            .targets()
            .unwrap();

        let widget = find(&targets, "acme_corp_widget_lib");
        assert_eq!(widget.kind, TargetKind::ArchiveImport);
        // override labels into this repository are written like computed edges
        assert_eq!(
            deps(widget),
            vec![":acme_corp_gizmo", ":org_slf4j_slf4j_api", "@maven//:extra"]
        );
    }

    #[test]
    fn test_compiled_modules() {
        let project = project();
        let manifest = project.manifest();
        let index = project.index();
        let config = GenConfig::default();
        let targets = LibraryBuildGenerator::new(&manifest, &index, &config)
            .targets()
            .unwrap();

        let core = find(&targets, "ns_acme_corp_widget_lib_widget_core");
        assert_eq!(
            deps(core),
            vec![
                ":acme_corp_widget_lib",
                ":ns_acme_corp_gizmo_gizmo_core",
                ":ns_acme_corp_widget_lib_widget_impl",
                "@//src/app:shared.clj",
            ]
        );
        assert_eq!(core.attrs.get("jvm_flags"), Some(&Node::strs(["-Dwidget=1"])));

        let impl_ = find(&targets, "ns_acme_corp_widget_lib_widget_impl");
        assert_eq!(deps(impl_), vec![":acme_corp_gizmo", ":acme_corp_widget_lib"]);

        // first declaration in the archive wins
        let dup = find(&targets, "ns_acme_corp_widget_lib_widget_dup");
        assert_eq!(
            deps(dup),
            vec![":acme_corp_widget_lib", ":ns_acme_corp_gizmo_gizmo_core"]
        );
        assert_eq!(
            targets.iter().filter(|t| t.name == dup.name).count(),
            1
        );

        // precompiled archives get no compiled-module targets
        assert!(!targets.iter().any(|t| t.name.starts_with("ns_org_clojure_clojure")));
    }

    #[test]
    fn test_targets_sorted_with_umbrella_last() {
        let project = project();
        let manifest = project.manifest();
        let index = project.index();
        let config = GenConfig::default();
        let targets = LibraryBuildGenerator::new(&manifest, &index, &config)
            .targets()
            .unwrap();

        let imports: Vec<&str> = targets
            .iter()
            .filter(|t| t.kind == TargetKind::ArchiveImport)
            .map(|t| t.name.as_str())
            .collect();
        assert_eq!(
            imports,
            vec!["acme_corp_gizmo", "acme_corp_widget_lib", "org_clojure_clojure"]
        );

        let all = targets.last().unwrap();
        assert_eq!(all.name, ALL_TARGET);
        assert_eq!(
            deps(all),
            vec![":acme_corp_gizmo", ":acme_corp_widget_lib", ":org_clojure_clojure"]
        );
    }

    #[test]
    fn test_generate_renders_relative_jars() {
        let project = project();
        let manifest = project.manifest();
        let index = project.index();
        let config = GenConfig {
            repository_dir: Some(project.root().to_path_buf()),
            validate: true,
            ..Default::default()
        };

        let text = LibraryBuildGenerator::new(&manifest, &index, &config)
            .generate()
            .unwrap();
        assert!(text.starts_with(
            "package(default_visibility = [\"//visibility:public\"])\n\nload(\"@rules_clojure//:rules.bzl\", \"clojure_library\")\n\n"
        ));
        assert!(text.contains("jars = [\"m2/acme_corp_gizmo.jar\"]"));
        assert!(text.contains(
            "    runtime_deps = [\n        \":acme_corp_gizmo\",\n        \":org_slf4j_slf4j_api\",\n        \"@maven//:extra\",\n    ],\n)"
        ));
        assert!(!text.contains("@deps//:acme_corp_gizmo"));
        assert!(text.trim_end().ends_with(
            "clojure_library(\n    name = \"__all\",\n    deps = [\n        \":acme_corp_gizmo\",\n        \":acme_corp_widget_lib\",\n        \":org_clojure_clojure\",\n    ],\n)"
        ));
    }
}
