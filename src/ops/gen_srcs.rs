//! Implementation of `gen-build srcs`.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;

use crate::builder::{DirectoryAggregator, GenConfig};
use crate::index::sources::{source_dirs, IgnoreSet};
use crate::ops::resolve::Session;
use crate::ops::write::{WriteMode, WriteReport};
use crate::util::fs::to_slash;

/// Every directory under the basis source paths, relative to the manifest
/// directory, mapped to its immediate children.
pub fn source_tree(session: &Session) -> Result<BTreeMap<PathBuf, Vec<PathBuf>>> {
    let ignore = IgnoreSet::new(&session.manifest.overrides.ignore);

    let mut dirs = BTreeSet::new();
    for root in session.basis.source_paths() {
        dirs.extend(source_dirs(session.manifest_dir(), root, &ignore)?);
    }

    let mut tree: BTreeMap<PathBuf, Vec<PathBuf>> =
        dirs.iter().map(|d| (d.clone(), Vec::new())).collect();
    for dir in &dirs {
        if let Some(children) = dir.parent().and_then(|p| tree.get_mut(p)) {
            children.push(dir.clone());
        }
    }
    Ok(tree)
}

/// Render one BUILD file per source directory.
pub fn generate_srcs(session: &Session, config: &GenConfig, mode: WriteMode) -> Result<WriteReport> {
    let tree = source_tree(session)?;
    let aggregator = DirectoryAggregator::new(&session.manifest, &session.index, config);

    // Leaves first; every file depends only on the global index.
    let mut order: Vec<_> = tree.iter().collect();
    order.sort_by_key(|(dir, _)| std::cmp::Reverse(dir.components().count()));

    let mut report = WriteReport::default();
    for (dir, children) in order {
        let text = aggregator
            .generate(dir, children)
            .with_context(|| format!("failed to generate BUILD file for {}", to_slash(dir)))?;
        let path = session.manifest_dir().join(dir).join(&config.build_file_name);
        report.emit(&path, &text, mode)?;
    }

    info!(
        "{} source directories ({} written, {} unchanged)",
        report.total(),
        report.written.len(),
        report.unchanged.len()
    );
    Ok(report)
}
