//! Test fixtures for common test scenarios.
//!
//! This module provides project builders and file helpers for tests that
//! need a manifest, a source tree, and library archives on disk.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde_json::json;
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::core::label::{library_label, RepoTag};
use crate::core::{Coordinate, Manifest, MANIFEST_NAME};
use crate::index::ClasspathIndex;
use crate::resolver::basis_file::BASIS_FILE_NAME;
use crate::resolver::{Basis, BasisFileResolver, Resolver};

/// Write files under `root`, creating parent directories.
pub fn write_tree(root: &Path, files: &[(&str, &str)]) {
    for (path, content) in files {
        let path = root.join(path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("failed to create directory");
        }
        fs::write(&path, content).expect("failed to write file");
    }
}

/// Write a jar with the given entries into `dir`.
pub fn write_jar(dir: &Path, name: &str, entries: &[(&str, &str)]) -> PathBuf {
    fs::create_dir_all(dir).expect("failed to create directory");
    let path = dir.join(name);
    let file = fs::File::create(&path).expect("failed to create jar");
    let mut zip = ZipWriter::new(file);
    for (entry, content) in entries {
        zip.start_file(*entry, SimpleFileOptions::default())
            .expect("failed to start jar entry");
        zip.write_all(content.as_bytes())
            .expect("failed to write jar entry");
    }
    zip.finish().expect("failed to finish jar");
    path
}

/// The `@deps` repository tag used throughout tests.
pub fn deps_repo() -> RepoTag {
    RepoTag::new("@deps").expect("valid tag")
}

/// A library archive in a fixture.
#[derive(Debug, Clone)]
pub struct JarFixture {
    pub coord: String,
    pub version: String,
    pub entries: Vec<(String, String)>,
}

/// Fixture for a complete project: manifest, sources, and resolved libraries.
#[derive(Debug, Clone, Default)]
pub struct ProjectFixture {
    /// deps.toml content.
    pub manifest: String,
    /// Source files (path relative to project root -> content).
    pub sources: Vec<(String, String)>,
    /// Library archives, in classpath order.
    pub jars: Vec<JarFixture>,
    /// Resolution trace records: (lib, parent, reason).
    pub trace: Vec<(String, String, String)>,
}

impl ProjectFixture {
    /// Create a new empty project fixture.
    pub fn new() -> Self {
        ProjectFixture {
            manifest: "paths = [\"src\"]\n".to_string(),
            ..Default::default()
        }
    }

    pub fn with_manifest(mut self, manifest: impl Into<String>) -> Self {
        self.manifest = manifest.into();
        self
    }

    pub fn with_source(mut self, path: impl Into<String>, content: impl Into<String>) -> Self {
        self.sources.push((path.into(), content.into()));
        self
    }

    pub fn with_jar(mut self, coord: &str, version: &str, entries: &[(&str, &str)]) -> Self {
        self.jars.push(JarFixture {
            coord: coord.to_string(),
            version: version.to_string(),
            entries: entries
                .iter()
                .map(|(p, c)| (p.to_string(), c.to_string()))
                .collect(),
        });
        self
    }

    pub fn with_trace(mut self, lib: &str, parent: &str, reason: &str) -> Self {
        self.trace
            .push((lib.to_string(), parent.to_string(), reason.to_string()));
        self
    }

    /// Write the project into a fresh temporary directory.
    pub fn create(&self) -> TestProject {
        let tmp = TempDir::new().expect("failed to create temp dir");
        let root = tmp.path();

        fs::write(root.join(MANIFEST_NAME), &self.manifest).expect("failed to write manifest");

        let sources: Vec<(&str, &str)> = self
            .sources
            .iter()
            .map(|(p, c)| (p.as_str(), c.as_str()))
            .collect();
        write_tree(root, &sources);

        let mut libs = Vec::new();
        for jar in &self.jars {
            let entries: Vec<(&str, &str)> = jar
                .entries
                .iter()
                .map(|(p, c)| (p.as_str(), c.as_str()))
                .collect();
            let name = format!("{}.jar", library_label(&Coordinate::new(jar.coord.as_str())));
            let path = write_jar(&root.join("m2"), &name, &entries);
            libs.push(json!({
                "lib": jar.coord,
                "version": jar.version,
                "paths": [path],
            }));
        }

        let trace: Vec<_> = self
            .trace
            .iter()
            .map(|(lib, parent, reason)| json!({"lib": lib, "parent": parent, "reason": reason}))
            .collect();

        let project = TestProject { tmp };
        project.write_basis(&json!({"libs": libs, "trace": trace}).to_string());
        project
    }
}

/// A project written to disk. Dropping it removes the directory.
pub struct TestProject {
    tmp: TempDir,
}

impl TestProject {
    pub fn root(&self) -> &Path {
        self.tmp.path()
    }

    pub fn manifest(&self) -> Manifest {
        Manifest::load(&self.root().join(MANIFEST_NAME)).expect("failed to load manifest")
    }

    pub fn write_basis(&self, content: &str) {
        fs::write(self.root().join(BASIS_FILE_NAME), content).expect("failed to write basis");
    }

    pub fn basis(&self, manifest: &Manifest) -> Basis {
        BasisFileResolver::for_manifest(manifest)
            .resolve(manifest, &[])
            .expect("failed to resolve basis")
    }

    pub fn try_index(&self) -> Result<ClasspathIndex> {
        let manifest = self.manifest();
        let basis = self.basis(&manifest);
        ClasspathIndex::build(&manifest, &basis)
    }

    pub fn index(&self) -> ClasspathIndex {
        self.try_index().expect("failed to build index")
    }

    /// Read a generated file relative to the project root.
    pub fn read(&self, path: &str) -> String {
        fs::read_to_string(self.root().join(path)).expect("failed to read file")
    }
}
