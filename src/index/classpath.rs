//! The classpath index.
//!
//! Built by one pass over the resolved basis:
//! - the library↔archive bijection
//! - compiled class name → archive
//! - the library dependency graph, from the resolution trace
//! - module name → label, for source paths and for library archives

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use petgraph::graph::{DiGraph, NodeIndex};
use tracing::debug;

use crate::core::label::{compiled_module_label, library_label};
use crate::core::module::ModuleDecl;
use crate::core::{Coordinate, Label, Library, Manifest};
use crate::index::archive::ArchiveContents;
use crate::index::sources::{scan_sources, IgnoreSet, SourceFile};
use crate::index::MalformedSourceError;
use crate::reader::{parse_declaration, ParseError};
use crate::resolver::Basis;
use crate::util::diagnostic::Diagnostic;
use crate::util::lookup::{LookupError, Require};

/// Where a library-defined module resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryModule {
    pub coord: Coordinate,
    /// Unqualified target name inside the dependency repository.
    pub label: String,
}

/// Read-only indices over one resolved basis.
#[derive(Debug, Clone)]
pub struct ClasspathIndex {
    manifest_dir: PathBuf,

    /// Libraries in classpath order
    libraries: Vec<Library>,

    library_to_archive: BTreeMap<Coordinate, PathBuf>,
    archive_to_library: BTreeMap<PathBuf, Coordinate>,
    archive_contents: BTreeMap<PathBuf, ArchiveContents>,
    class_to_archive: BTreeMap<String, PathBuf>,

    /// Library dependency graph
    graph: DiGraph<Coordinate, ()>,
    lib_to_node: HashMap<Coordinate, NodeIndex>,

    /// Every module source file, in classpath then walk order
    source_files: Vec<SourceFile>,
    /// Parsed declarations of source files that have one
    source_decls: BTreeMap<PathBuf, ModuleDecl>,

    source_modules: BTreeMap<String, Label>,
    library_modules: BTreeMap<String, LibraryModule>,

    no_compile: BTreeSet<String>,
}

impl ClasspathIndex {
    /// Build every index from a manifest and its resolved basis.
    pub fn build(manifest: &Manifest, basis: &Basis) -> Result<Self> {
        let mut index = ClasspathIndex {
            manifest_dir: manifest.manifest_dir.clone(),
            libraries: Vec::new(),
            library_to_archive: BTreeMap::new(),
            archive_to_library: BTreeMap::new(),
            archive_contents: BTreeMap::new(),
            class_to_archive: BTreeMap::new(),
            graph: DiGraph::new(),
            lib_to_node: HashMap::new(),
            source_files: Vec::new(),
            source_decls: BTreeMap::new(),
            source_modules: BTreeMap::new(),
            library_modules: BTreeMap::new(),
            no_compile: manifest.overrides.no_aot.clone(),
        };

        for (library, path) in basis.archives() {
            index.add_archive(library, path)?;
        }

        for (parent, child) in basis.edges() {
            index.add_edge(parent, child);
        }

        let ignore = IgnoreSet::new(&manifest.overrides.ignore);
        for root in basis.source_paths() {
            let files = scan_sources(&index.manifest_dir, root, &ignore)
                .with_context(|| format!("failed to scan source path {}", root.display()))?;
            for file in files {
                index.add_source(file)?;
            }
        }
        index.bind_source_modules();

        debug!(
            "indexed {} libraries, {} classes, {} source files",
            index.libraries.len(),
            index.class_to_archive.len(),
            index.source_files.len()
        );

        Ok(index)
    }

    fn add_archive(&mut self, library: &Library, path: &Path) -> Result<()> {
        let contents = ArchiveContents::scan(path)?;
        let coord = &library.coord;
        debug!(
            "scanned {} ({} modules, {} classes)",
            library.display_name(),
            contents.modules.len(),
            contents.classes.len()
        );

        for class in &contents.classes {
            self.class_to_archive.insert(class.clone(), path.to_path_buf());
        }

        // Later archives win on module name collisions.
        for decl in contents.unique_modules() {
            let label = if self.compiles(&contents, &decl.name) {
                compiled_module_label(coord, &decl.name)
            } else {
                library_label(coord)
            };
            self.library_modules.insert(
                decl.name.clone(),
                LibraryModule {
                    coord: coord.clone(),
                    label,
                },
            );
        }

        let node = self.graph.add_node(coord.clone());
        self.lib_to_node.insert(coord.clone(), node);
        self.library_to_archive.insert(coord.clone(), path.to_path_buf());
        self.archive_to_library.insert(path.to_path_buf(), coord.clone());
        self.archive_contents.insert(path.to_path_buf(), contents);
        self.libraries.push(library.clone());
        Ok(())
    }

    fn add_edge(&mut self, parent: &Coordinate, child: &Coordinate) {
        if let (Some(&from), Some(&to)) = (self.lib_to_node.get(parent), self.lib_to_node.get(child)) {
            if from != to && !self.graph.contains_edge(from, to) {
                self.graph.add_edge(from, to, ());
            }
        }
    }

    fn add_source(&mut self, file: SourceFile) -> Result<()> {
        let abs = self.manifest_dir.join(&file.path);
        let bytes = std::fs::read(&abs)
            .with_context(|| format!("failed to read source file: {}", abs.display()))?;

        let Ok(text) = String::from_utf8(bytes) else {
            Diagnostic::warning("skipping file that is not UTF-8 text")
                .with_location(&file.path)
                .log();
            self.source_files.push(file);
            return Ok(());
        };

        match parse_declaration(&text, file.dialect) {
            Ok(decl) => {
                self.source_decls.insert(file.path.clone(), decl);
            }
            Err(e) if e.is_fatal() => {
                return Err(MalformedSourceError {
                    path: file.path.clone(),
                    source: e,
                }
                .into());
            }
            Err(ParseError::NoModuleForm) => {
                Diagnostic::warning("skipping file without a namespace declaration")
                    .with_location(&file.path)
                    .log();
            }
            Err(e) => {
                Diagnostic::warning("skipping unreadable file")
                    .with_location(&file.path)
                    .with_context(e.to_string())
                    .log();
            }
        }

        self.source_files.push(file);
        Ok(())
    }

    /// Bind source modules to their file labels. Among JVM sources the last
    /// file in walk order wins; ClojureScript files only bind names no JVM
    /// source declares.
    fn bind_source_modules(&mut self) {
        let mut script_only = Vec::new();
        for file in &self.source_files {
            let Some(decl) = self.source_decls.get(&file.path) else {
                continue;
            };
            if file.dialect.is_compilable() {
                self.source_modules.insert(decl.name.clone(), file.label());
            } else {
                script_only.push((decl.name.clone(), file.label()));
            }
        }
        for (name, label) in script_only {
            self.source_modules.entry(name).or_insert(label);
        }
    }

    fn compiles(&self, contents: &ArchiveContents, module: &str) -> bool {
        !contents.precompiled && !self.no_compile.contains(module)
    }

    pub fn manifest_dir(&self) -> &Path {
        &self.manifest_dir
    }

    /// Libraries in classpath order.
    pub fn libraries(&self) -> &[Library] {
        &self.libraries
    }

    pub fn archive(&self, coord: &Coordinate) -> Result<&Path, LookupError> {
        self.library_to_archive
            .require("library archives", coord)
            .map(PathBuf::as_path)
    }

    pub fn library_for_archive(&self, path: &Path) -> Result<&Coordinate, LookupError> {
        self.archive_to_library.require("archive libraries", path)
    }

    pub fn contents(&self, coord: &Coordinate) -> Result<&ArchiveContents, LookupError> {
        let path = self.archive(coord)?;
        self.archive_contents.require("archive contents", path)
    }

    /// The library whose archive holds a compiled class, if any does.
    pub fn library_for_class(&self, class: &str) -> Result<Option<&Coordinate>, LookupError> {
        match self.class_to_archive.get(class) {
            Some(path) => self.library_for_archive(path).map(Some),
            None => Ok(None),
        }
    }

    /// Direct dependencies of a library, sorted.
    pub fn library_deps(&self, coord: &Coordinate) -> Result<Vec<&Coordinate>, LookupError> {
        let node = *self.lib_to_node.require("library graph", coord)?;
        let mut deps: Vec<_> = self.graph.neighbors(node).map(|n| &self.graph[n]).collect();
        deps.sort();
        Ok(deps)
    }

    /// Modules of a library that get their own compiled target, sorted by name.
    pub fn compiled_modules(&self, coord: &Coordinate) -> Result<Vec<&ModuleDecl>, LookupError> {
        let contents = self.contents(coord)?;
        let mut modules: Vec<_> = contents
            .unique_modules()
            .filter(|decl| self.compiles(contents, &decl.name))
            .collect();
        modules.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(modules)
    }

    /// Every module source file, in classpath then walk order.
    pub fn source_files(&self) -> &[SourceFile] {
        &self.source_files
    }

    /// Parsed declaration of a source file, `None` when it was skipped.
    pub fn source_decl(&self, path: &Path) -> Option<&ModuleDecl> {
        self.source_decls.get(path)
    }

    pub fn source_module(&self, name: &str) -> Option<&Label> {
        self.source_modules.get(name)
    }

    pub fn library_module(&self, name: &str) -> Option<&LibraryModule> {
        self.library_modules.get(name)
    }

    pub fn is_no_compile(&self, module: &str) -> bool {
        self.no_compile.contains(module)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::fixtures::ProjectFixture;

    fn widget_project() -> ProjectFixture {
        ProjectFixture::new()
            .with_manifest(
                r#"
paths = ["src"]

[deps]
"acme-corp/widget-lib" = "2.3.0"
"#,
            )
            .with_jar(
                "acme-corp/widget-lib",
                "2.3.0",
                &[
                    ("widget/core.clj", "(ns widget.core)"),
                    ("app/core.clj", "(ns app.core)"),
                    ("com/acme/Widget.class", ""),
                ],
            )
            .with_jar(
                "acme-corp/gizmo",
                "1.0.0",
                &[
                    ("gizmo/core.clj", "(ns gizmo.core)"),
                    ("widget/core.cljc", "(ns widget.core)"),
                    ("clojure/core.clj", "(ns clojure.core)"),
                ],
            )
            .with_trace("acme-corp/gizmo", "acme-corp/widget-lib", "new-dep")
            .with_source("src/app/core.clj", "(ns app.core (:require [widget.core]))")
            .with_source("src/app/util.cljs", "(ns app.util)")
            .with_source("src/app/util.clj", "(ns app.util)")
            .with_source("src/notes.clj", ";; just a comment")
    }

    #[test]
    fn test_bijection_and_classes() {
        let project = widget_project().create();
        let index = project.index();

        let widget = Coordinate::new("acme-corp/widget-lib");
        let path = index.archive(&widget).unwrap().to_path_buf();
        assert_eq!(index.library_for_archive(&path).unwrap(), &widget);
        assert_eq!(
            index.library_for_class("com.acme.Widget").unwrap(),
            Some(&widget)
        );
        assert_eq!(index.library_for_class("java.io.File").unwrap(), None);
    }

    #[test]
    fn test_library_graph_from_trace() {
        let project = widget_project().create();
        let index = project.index();

        let deps = index
            .library_deps(&Coordinate::new("acme-corp/widget-lib"))
            .unwrap();
        assert_eq!(deps, vec![&Coordinate::new("acme-corp/gizmo")]);
        assert!(index
            .library_deps(&Coordinate::new("acme-corp/gizmo"))
            .unwrap()
            .is_empty());
        assert!(matches!(
            index.library_deps(&Coordinate::new("nobody/nothing")),
            Err(LookupError::NotFound { .. })
        ));
    }

    #[test]
    fn test_library_modules_last_archive_wins() {
        let project = widget_project().create();
        let index = project.index();

        // widget.core is declared by both archives; gizmo comes later on the classpath.
        let module = index.library_module("widget.core").unwrap();
        assert_eq!(module.coord, Coordinate::new("acme-corp/gizmo"));
        assert_eq!(module.label, "ns_acme_corp_gizmo_widget_core");
    }

    #[test]
    fn test_no_compile_modules_bind_to_library() {
        let project = widget_project().create();
        let index = project.index();

        let module = index.library_module("clojure.core").unwrap();
        assert_eq!(module.label, "acme_corp_gizmo");

        let compiled: Vec<_> = index
            .compiled_modules(&Coordinate::new("acme-corp/gizmo"))
            .unwrap()
            .into_iter()
            .map(|d| d.name.as_str())
            .collect();
        assert_eq!(compiled, vec!["gizmo.core", "widget.core"]);
    }

    #[test]
    fn test_precompiled_archive_binds_to_library() {
        let project = ProjectFixture::new()
            .with_manifest("paths = []")
            .with_jar(
                "acme/aot",
                "1.0",
                &[("aot/core.clj", "(ns aot.core)"), ("aot/core__init.class", "")],
            )
            .create();
        let index = project.index();

        assert_eq!(index.library_module("aot.core").unwrap().label, "acme_aot");
        assert!(index
            .compiled_modules(&Coordinate::new("acme/aot"))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_source_modules() {
        let project = widget_project().create();
        let index = project.index();

        assert_eq!(
            index.source_module("app.core").unwrap().to_string(),
            "//src/app:core.clj"
        );
        // the JVM file wins over the ClojureScript file of the same name
        assert_eq!(
            index.source_module("app.util").unwrap().to_string(),
            "//src/app:util.clj"
        );
        assert_eq!(index.source_files().len(), 4);
        assert!(index.source_decl(Path::new("src/notes.clj")).is_none());
    }

    #[test]
    fn test_source_collision_last_file_wins() {
        let project = ProjectFixture::new()
            .with_manifest("paths = [\"src\"]")
            .with_source("src/a/dup.clj", "(ns dup)")
            .with_source("src/b/dup.clj", "(ns dup)")
            .create();
        let index = project.index();

        assert_eq!(
            index.source_module("dup").unwrap().to_string(),
            "//src/b:dup.clj"
        );
    }

    #[test]
    fn test_malformed_source_is_fatal() {
        let project = ProjectFixture::new()
            .with_manifest("paths = [\"src\"]")
            .with_source("src/bad.clj", "(ns bad (:require [x)")
            .create();

        let err = project.try_index().unwrap_err();
        let malformed = err.downcast_ref::<MalformedSourceError>().unwrap();
        assert_eq!(malformed.path, PathBuf::from("src/bad.clj"));
    }

    #[test]
    fn test_corrupt_archive_is_fatal() {
        let project = ProjectFixture::new().with_manifest("paths = []").create();
        std::fs::write(project.root().join("broken.jar"), "garbage").unwrap();
        project.write_basis(
            r#"{"libs": [{"lib": "x/x", "version": "1", "paths": ["broken.jar"]}]}"#,
        );

        let err = project.try_index().unwrap_err();
        assert!(err
            .downcast_ref::<crate::index::ArchiveFormatError>()
            .is_some());
    }
}
