//! Loading a manifest and its resolved basis into a generation session.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::core::Manifest;
use crate::index::ClasspathIndex;
use crate::resolver::{Basis, BasisFileResolver, Resolver};

/// Options for [`load_session`].
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    /// Path to `deps.toml`
    pub manifest_path: PathBuf,

    /// Aliases whose extra paths and deps are merged in
    pub aliases: Vec<String>,

    /// Basis file, defaults to `basis.json` next to the manifest
    pub basis_path: Option<PathBuf>,
}

/// Everything derived once per invocation.
#[derive(Debug)]
pub struct Session {
    pub manifest: Manifest,
    pub basis: Basis,
    pub index: ClasspathIndex,
}

impl Session {
    pub fn manifest_dir(&self) -> &Path {
        &self.manifest.manifest_dir
    }
}

/// Load the manifest, resolve it, and index the result.
pub fn load_session(opts: &SessionOptions) -> Result<Session> {
    let manifest = Manifest::load(&opts.manifest_path)?;

    let resolver = match &opts.basis_path {
        Some(path) => BasisFileResolver::new(path),
        None => BasisFileResolver::for_manifest(&manifest),
    };
    tracing::debug!("reading basis from {}", resolver.path().display());
    let basis = resolver.resolve(&manifest, &opts.aliases)?;

    let index = ClasspathIndex::build(&manifest, &basis).with_context(|| {
        format!(
            "failed to index classpath of {}",
            opts.manifest_path.display()
        )
    })?;

    Ok(Session {
        manifest,
        basis,
        index,
    })
}
