//! Basis file resolver.
//!
//! Reads the output of an external dependency resolver from a JSON file and
//! assembles the classpath in manifest order.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::core::{Coordinate, Library, Manifest};
use crate::resolver::{Basis, ClasspathEntry, ResolutionError, Resolver, TraceReason, TraceRecord};

/// Default basis file name, next to the manifest.
pub const BASIS_FILE_NAME: &str = "basis.json";

#[derive(Debug, Deserialize)]
struct BasisFile {
    #[serde(default)]
    libs: Vec<LibEntry>,

    #[serde(default)]
    trace: Vec<TraceEntry>,
}

#[derive(Debug, Deserialize)]
struct LibEntry {
    lib: String,
    version: String,
    #[serde(default)]
    paths: Vec<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct TraceEntry {
    lib: String,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    parent: Option<String>,
    reason: TraceReason,
}

/// Resolver backed by a pre-computed basis file.
#[derive(Debug, Clone)]
pub struct BasisFileResolver {
    path: PathBuf,
}

impl BasisFileResolver {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        BasisFileResolver { path: path.into() }
    }

    /// Resolver reading `basis.json` from the manifest directory.
    pub fn for_manifest(manifest: &Manifest) -> Self {
        Self::new(manifest.manifest_dir.join(BASIS_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BasisFile, ResolutionError> {
        let content =
            std::fs::read_to_string(&self.path).map_err(|source| ResolutionError::Unreadable {
                path: self.path.clone(),
                source,
            })?;
        serde_json::from_str(&content).map_err(|source| ResolutionError::Malformed {
            path: self.path.clone(),
            source,
        })
    }
}

impl Resolver for BasisFileResolver {
    fn resolve(&self, manifest: &Manifest, aliases: &[String]) -> Result<Basis, ResolutionError> {
        let mut classpath: Vec<ClasspathEntry> = manifest
            .paths
            .iter()
            .map(|path| ClasspathEntry::SourcePath {
                path: path.clone(),
                alias: None,
            })
            .collect();

        // (coordinate, who asked for it)
        let mut direct: Vec<(Coordinate, String)> = manifest
            .deps
            .keys()
            .map(|coord| (coord.clone(), "deps.toml".to_string()))
            .collect();

        for name in aliases {
            let alias = manifest
                .aliases
                .get(name)
                .ok_or_else(|| ResolutionError::UnknownAlias {
                    alias: name.clone(),
                    available: manifest.aliases.keys().cloned().collect(),
                })?;

            for path in &alias.extra_paths {
                classpath.push(ClasspathEntry::SourcePath {
                    path: path.clone(),
                    alias: Some(name.clone()),
                });
            }
            for coord in alias.extra_deps.keys() {
                direct.push((Coordinate::new(coord.as_str()), format!("alias `{}`", name)));
            }
        }

        let file = self.load()?;
        debug!(
            "loaded basis {} ({} libs, {} trace records)",
            self.path.display(),
            file.libs.len(),
            file.trace.len()
        );

        let mut claimed: HashMap<PathBuf, Coordinate> = HashMap::new();
        let mut resolved: BTreeSet<Coordinate> = BTreeSet::new();

        for entry in file.libs {
            let coord = Coordinate::new(entry.lib);
            let [archive] = entry.paths.as_slice() else {
                return Err(ResolutionError::ArchiveCount {
                    lib: coord.to_string(),
                    count: entry.paths.len(),
                });
            };

            let path = if archive.is_absolute() {
                archive.clone()
            } else {
                manifest.manifest_dir.join(archive)
            };

            if resolved.contains(&coord) {
                return Err(ResolutionError::DuplicateLibrary {
                    lib: coord.to_string(),
                });
            }
            if let Some(first) = claimed.get(&path) {
                return Err(ResolutionError::SharedArchive {
                    path,
                    first: first.to_string(),
                    second: coord.to_string(),
                });
            }
            claimed.insert(path.clone(), coord.clone());
            resolved.insert(coord.clone());

            classpath.push(ClasspathEntry::Archive {
                library: Library::new(coord, entry.version),
                path,
            });
        }

        for (coord, required_by) in direct {
            if !resolved.contains(&coord) {
                return Err(ResolutionError::MissingDependency {
                    lib: coord.to_string(),
                    required_by,
                });
            }
        }

        let trace = file
            .trace
            .into_iter()
            .map(|entry| TraceRecord {
                lib: Coordinate::new(entry.lib),
                version: entry.version,
                parent: entry.parent.map(Coordinate::new),
                reason: entry.reason,
            })
            .filter(|record| {
                resolved.contains(&record.lib)
                    && record.parent.as_ref().is_none_or(|p| resolved.contains(p))
            })
            .collect();

        Ok(Basis { classpath, trace })
    }
}
