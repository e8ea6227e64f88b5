//! Per-file target synthesis.
//!
//! Each source file with a module declaration yields a `clojure_library`
//! target, and test files additionally yield a `clojure_test` target.
//! Configuration layers merge lowest to highest:
//!
//! 1. built-in defaults (the base library)
//! 2. computed dependency edges
//! 3. the manifest's `[bazel.extra-deps]` entry for the target's label
//! 4. inline `:bazel/...` metadata on the module declaration

use tracing::debug;

use crate::builder::context::GenConfig;
use crate::builder::deps::DependencyExtractor;
use crate::builder::GenError;
use crate::core::{BuildTarget, Manifest, ModuleDecl, Scope, TargetKind};
use crate::emit::Node;
use crate::index::{ClasspathIndex, SourceFile};
use crate::util::fs::to_slash;

/// Builds the targets of individual source files.
pub struct TargetSynthesizer<'a> {
    manifest: &'a Manifest,
    index: &'a ClasspathIndex,
    config: &'a GenConfig,
    extractor: DependencyExtractor<'a>,
}

impl<'a> TargetSynthesizer<'a> {
    pub fn new(manifest: &'a Manifest, index: &'a ClasspathIndex, config: &'a GenConfig) -> Self {
        TargetSynthesizer {
            manifest,
            index,
            config,
            extractor: DependencyExtractor::new(index, config),
        }
    }

    /// Whether a file's module is compiled ahead of time rather than
    /// shipped as a resource.
    pub fn compiles(&self, file: &SourceFile, decl: &ModuleDecl) -> bool {
        !file.is_test() && file.dialect.is_compilable() && !self.index.is_no_compile(&decl.name)
    }

    /// The source-library target, followed by the test target for test files.
    pub fn synthesize(
        &self,
        file: &SourceFile,
        decl: &ModuleDecl,
    ) -> Result<Vec<BuildTarget>, GenError> {
        let mut targets = vec![self.library_target(file, decl)?];
        if file.is_test() {
            targets.push(self.test_target(file, decl));
        }
        debug!(
            "{}: {} target(s) for {}",
            to_slash(&file.path),
            targets.len(),
            decl.name
        );
        Ok(targets)
    }

    fn library_target(&self, file: &SourceFile, decl: &ModuleDecl) -> Result<BuildTarget, GenError> {
        let name = file.file_name();
        let own = file.label();

        let mut target = BuildTarget::new(TargetKind::SourceLibrary, name.as_str()).attr(
            "resource_strip_prefix",
            Node::str(to_slash(&file.root)),
        );
        target = if self.compiles(file, decl) {
            target
                .attr("srcs", Node::strs([name.as_str()]))
                .attr("aot", Node::strs([decl.name.as_str()]))
        } else {
            target.attr("resources", Node::strs([name.as_str()]))
        };

        target.add_deps([self.config.base_library_label().render(Scope::Workspace)]);
        let edges = self.extractor.extract(decl)?;
        target.add_deps(
            edges
                .iter()
                .filter(|label| **label != own)
                .map(|label| label.render(Scope::Workspace)),
        );

        if let Some(layer) = self.manifest.overrides.for_label(&own.to_string()) {
            target.merge(layer);
        }
        target.merge(&decl.library_meta);

        Ok(target)
    }

    fn test_target(&self, file: &SourceFile, decl: &ModuleDecl) -> BuildTarget {
        let mut target = BuildTarget::new(TargetKind::Test, file.stem())
            .attr("test_ns", Node::str(decl.name.as_str()));
        target.add_deps([format!(":{}", file.file_name())]);

        if let Some(layer) = self.manifest.overrides.for_label(&file.test_label().to_string()) {
            target.merge(layer);
        }
        target.merge(&decl.test_meta);
        target
    }
}
