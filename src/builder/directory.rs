//! Per-directory BUILD files.
//!
//! One file per source directory: the per-file targets of that directory
//! and, for every dialect, a library aggregate and a filegroup aggregate
//! that also pull in the same aggregates of each immediate child directory.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::builder::context::GenConfig;
use crate::builder::target::TargetSynthesizer;
use crate::builder::{validate_all, GenError};
use crate::core::{BuildTarget, Dialect, Label, Manifest, Scope, TargetKind};
use crate::emit::{render_file, Call, Node};
use crate::index::{ClasspathIndex, SourceFile};
use crate::util::fs::to_slash;

/// Package statement opening every generated file.
pub(crate) fn package_statement() -> Node {
    Call::new("package")
        .kwarg("default_visibility", Node::strs(["//visibility:public"]))
        .into()
}

/// `load(...)` statement for the given rule names.
pub(crate) fn load_statement(rules_load: &str, rules: &[&str]) -> Node {
    rules
        .iter()
        .fold(Call::new("load").arg(Node::str(rules_load)), |call, rule| {
            call.arg(Node::str(*rule))
        })
        .into()
}

/// Renders the BUILD file of one source directory.
pub struct DirectoryAggregator<'a> {
    index: &'a ClasspathIndex,
    config: &'a GenConfig,
    synthesizer: TargetSynthesizer<'a>,
}

impl<'a> DirectoryAggregator<'a> {
    pub fn new(manifest: &'a Manifest, index: &'a ClasspathIndex, config: &'a GenConfig) -> Self {
        DirectoryAggregator {
            index,
            config,
            synthesizer: TargetSynthesizer::new(manifest, index, config),
        }
    }

    /// Source files directly inside `dir`, by file name.
    fn files_in(&self, dir: &Path) -> Vec<&'a SourceFile> {
        let mut files: Vec<&SourceFile> = self
            .index
            .source_files()
            .iter()
            .filter(|f| f.path.parent() == Some(dir))
            .collect();
        files.sort_by_key(|f| f.file_name());
        files.dedup_by(|a, b| a.path == b.path);
        files
    }

    /// Render the file for `dir`; both `dir` and `children` are relative to
    /// the manifest directory.
    pub fn generate(&self, dir: &Path, children: &[PathBuf]) -> Result<String, GenError> {
        let package = to_slash(dir);
        let files = self.files_in(dir);

        let mut targets = Vec::new();
        for file in &files {
            let Some(decl) = self.index.source_decl(&file.path) else {
                continue;
            };
            targets.extend(self.synthesizer.synthesize(file, decl)?);
        }

        let mut children: Vec<String> = children.iter().map(|c| to_slash(c)).collect();
        children.sort();
        children.dedup();

        for dialect in Dialect::ALL {
            targets.push(self.library_aggregate(dialect, &files, &children));
            targets.push(self.files_aggregate(dialect, &files, &children));
        }

        validate_all(self.config.validate, &format!("//{}", package), &targets)?;
        debug!("{}: {} targets", package, targets.len());

        let mut statements = vec![
            package_statement(),
            load_statement(&self.config.rules_load, &["clojure_library", "clojure_test"]),
        ];
        statements.extend(targets.iter().map(BuildTarget::to_node));
        Ok(render_file(&statements))
    }

    fn library_aggregate(&self, dialect: Dialect, files: &[&SourceFile], children: &[String]) -> BuildTarget {
        let mut target = BuildTarget::new(TargetKind::AggregateLibrary, dialect.library_target());
        target.add_deps(
            files
                .iter()
                .filter(|f| f.dialect == dialect && !f.is_test())
                .filter(|f| self.index.source_decl(&f.path).is_some())
                .map(|f| format!(":{}", f.file_name())),
        );
        target.add_deps(
            children
                .iter()
                .map(|c| Label::source(c.as_str(), dialect.library_target()).render(Scope::Workspace)),
        );
        target
    }

    fn files_aggregate(&self, dialect: Dialect, files: &[&SourceFile], children: &[String]) -> BuildTarget {
        let mut srcs: Vec<String> = files
            .iter()
            .filter(|f| f.dialect == dialect)
            .map(|f| f.file_name())
            .collect();
        srcs.extend(
            children
                .iter()
                .map(|c| Label::source(c.as_str(), dialect.files_target()).render(Scope::Workspace)),
        );
        srcs.sort();
        srcs.dedup();

        BuildTarget::new(TargetKind::AggregateFilegroup, dialect.files_target())
            .attr("srcs", Node::strs(srcs))
    }
}
