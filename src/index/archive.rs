//! Library archive introspection.
//!
//! An archive is scanned once per run for its module declarations, its
//! compiled classes, and whether it already ships compiled output.

use std::collections::{BTreeSet, HashSet};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::core::module::{Dialect, ModuleDecl};
use crate::reader::parse_declaration;

/// Marker entry suffix of ahead-of-time compiled namespaces.
const COMPILED_INIT_SUFFIX: &str = "__init.class";

const CLASS_SUFFIX: &str = ".class";

/// An archive that cannot be opened or scanned. Always fatal.
#[derive(Debug, Error)]
pub enum ArchiveFormatError {
    #[error("failed to open archive {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt archive {}", path.display())]
    Zip {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("failed to read entry {entry} of archive {}", path.display())]
    Entry {
        path: PathBuf,
        entry: String,
        #[source]
        source: std::io::Error,
    },
}

/// What a library archive contains.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArchiveContents {
    /// Module declarations in entry order. The same module may appear more
    /// than once (e.g. as both `.clj` and `.cljc`).
    pub modules: Vec<ModuleDecl>,
    /// Fully-qualified compiled class names.
    pub classes: BTreeSet<String>,
    /// Whether the archive already contains ahead-of-time compiled output.
    pub precompiled: bool,
}

impl ArchiveContents {
    /// Scan an archive on disk.
    pub fn scan(path: &Path) -> Result<Self, ArchiveFormatError> {
        let file = File::open(path).map_err(|source| ArchiveFormatError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let zip_err = |source: zip::result::ZipError| ArchiveFormatError::Zip {
            path: path.to_path_buf(),
            source,
        };
        let mut archive = zip::ZipArchive::new(BufReader::new(file)).map_err(zip_err)?;

        let mut contents = ArchiveContents::default();
        for i in 0..archive.len() {
            let mut entry = archive.by_index(i).map_err(zip_err)?;
            if entry.is_dir() {
                continue;
            }
            let name = entry.name().to_string();

            if let Some(class) = class_name(&name) {
                contents.precompiled |= name.ends_with(COMPILED_INIT_SUFFIX);
                contents.classes.insert(class);
                continue;
            }

            let Some(dialect) = Dialect::from_path(Path::new(&name)) else {
                continue;
            };
            // Archive modules are loaded by the JVM; ClojureScript-only
            // sources never define one.
            if !dialect.is_compilable() {
                continue;
            }

            let mut bytes = Vec::new();
            entry
                .read_to_end(&mut bytes)
                .map_err(|source| ArchiveFormatError::Entry {
                    path: path.to_path_buf(),
                    entry: name.clone(),
                    source,
                })?;
            let Ok(text) = String::from_utf8(bytes) else {
                debug!("skipping non-text entry {} in {}", name, path.display());
                continue;
            };

            match parse_declaration(&text, dialect) {
                Ok(decl) => contents.modules.push(decl),
                Err(e) => debug!("skipping {} in {}: {}", name, path.display(), e),
            }
        }

        Ok(contents)
    }

    /// Module declarations grouped by name, keeping the first occurrence.
    pub fn unique_modules(&self) -> impl Iterator<Item = &ModuleDecl> {
        let mut seen = HashSet::new();
        self.modules
            .iter()
            .filter(move |decl| seen.insert(decl.name.as_str()))
    }
}

/// `clojure/lang/RT.class` → `clojure.lang.RT`.
fn class_name(entry: &str) -> Option<String> {
    entry
        .strip_suffix(CLASS_SUFFIX)
        .filter(|stem| !stem.is_empty())
        .map(|stem| stem.replace('/', "."))
}
