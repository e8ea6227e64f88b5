//! Dependency resolution interface.
//!
//! Version resolution itself happens outside this crate. A [`Resolver`]
//! turns a manifest plus a set of requested aliases into a [`Basis`]: the
//! ordered classpath and the resolution trace. Everything downstream is a
//! pure fold over that value.

pub mod basis_file;
pub mod errors;

pub use basis_file::BasisFileResolver;
pub use errors::ResolutionError;

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::core::{Coordinate, Library, Manifest};

/// Produces a resolved basis for a manifest.
pub trait Resolver {
    fn resolve(&self, manifest: &Manifest, aliases: &[String]) -> Result<Basis, ResolutionError>;
}

/// One classpath entry, in resolver order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClasspathEntry {
    /// A source directory relative to the manifest directory.
    SourcePath {
        path: PathBuf,
        /// Alias that contributed this path, `None` for manifest `paths`.
        alias: Option<String>,
    },
    /// The single archive of a resolved library.
    Archive { library: Library, path: PathBuf },
}

/// Why the resolver included (or skipped) a library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TraceReason {
    NewTopDep,
    NewDep,
    SameVersion,
    NewerVersion,
    OlderVersion,
    UseTop,
    Superseded,
    Excluded,
    ParentOmitted,
    #[serde(other)]
    Other,
}

impl TraceReason {
    /// Whether a record with this reason is a dependency edge.
    pub fn is_edge(&self) -> bool {
        !matches!(self, TraceReason::Excluded | TraceReason::ParentOmitted)
    }
}

/// One record of the resolution trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceRecord {
    pub lib: Coordinate,
    pub version: Option<String>,
    /// `None` for top-level dependencies.
    pub parent: Option<Coordinate>,
    pub reason: TraceReason,
}

/// Output of dependency resolution. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Basis {
    pub classpath: Vec<ClasspathEntry>,
    pub trace: Vec<TraceRecord>,
}

impl Basis {
    /// Source directories in classpath order.
    pub fn source_paths(&self) -> impl Iterator<Item = &Path> {
        self.classpath.iter().filter_map(|entry| match entry {
            ClasspathEntry::SourcePath { path, .. } => Some(path.as_path()),
            ClasspathEntry::Archive { .. } => None,
        })
    }

    /// Library archives in classpath order.
    pub fn archives(&self) -> impl Iterator<Item = (&Library, &Path)> {
        self.classpath.iter().filter_map(|entry| match entry {
            ClasspathEntry::Archive { library, path } => Some((library, path.as_path())),
            ClasspathEntry::SourcePath { .. } => None,
        })
    }

    /// Parent→child edges contributed by the trace.
    pub fn edges(&self) -> impl Iterator<Item = (&Coordinate, &Coordinate)> {
        self.trace
            .iter()
            .filter(|record| record.reason.is_edge())
            .filter_map(|record| record.parent.as_ref().map(|parent| (parent, &record.lib)))
    }
}
