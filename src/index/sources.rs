//! Source tree traversal.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use walkdir::{DirEntry, WalkDir};

use crate::core::label::Label;
use crate::core::module::{is_test_file, Dialect};
use crate::util::fs::to_slash;

/// A module source file found under a source path.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SourceFile {
    /// Path relative to the manifest directory.
    pub path: PathBuf,
    /// Source path this file was found under, relative to the manifest directory.
    pub root: PathBuf,
    pub dialect: Dialect,
}

impl SourceFile {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// File name without extension; the test target name.
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Directory relative to the manifest directory, `/`-separated.
    pub fn package(&self) -> String {
        self.path.parent().map(to_slash).unwrap_or_default()
    }

    pub fn is_test(&self) -> bool {
        is_test_file(&self.path)
    }

    /// Label of this file's source-library target.
    pub fn label(&self) -> Label {
        Label::source(self.package(), self.file_name())
    }

    /// Label of this file's test target.
    pub fn test_label(&self) -> Label {
        Label::source(self.package(), self.stem())
    }
}

/// Paths excluded from traversal.
///
/// An entry matches a path when it is a prefix of it, or when it is a glob
/// pattern (e.g. `src/**/gen`) matching it.
#[derive(Debug, Clone, Default)]
pub struct IgnoreSet {
    prefixes: Vec<PathBuf>,
    patterns: Vec<glob::Pattern>,
}

impl IgnoreSet {
    pub fn new(entries: &[PathBuf]) -> Self {
        let mut set = IgnoreSet::default();
        for entry in entries {
            let text = to_slash(entry);
            if text.contains(['*', '?', '[']) {
                if let Ok(pattern) = glob::Pattern::new(&text) {
                    set.patterns.push(pattern);
                    continue;
                }
            }
            set.prefixes.push(entry.clone());
        }
        set
    }

    /// `rel` is relative to the manifest directory.
    pub fn is_ignored(&self, rel: &Path) -> bool {
        self.prefixes.iter().any(|p| rel.starts_with(p))
            || self
                .patterns
                .iter()
                .any(|p| p.matches(&to_slash(rel)))
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0 && entry.file_name().to_string_lossy().starts_with('.')
}

/// Walk a source path, yielding entries relative to the manifest directory
/// in sorted order. Hidden and ignored entries are pruned.
fn walk<'a>(
    manifest_dir: &'a Path,
    root: &Path,
    ignore: &'a IgnoreSet,
) -> impl Iterator<Item = Result<(DirEntry, PathBuf)>> + 'a {
    WalkDir::new(manifest_dir.join(root))
        .sort_by_file_name()
        .into_iter()
        .filter_entry(move |entry| {
            !is_hidden(entry)
                && !entry
                    .path()
                    .strip_prefix(manifest_dir)
                    .is_ok_and(|rel| ignore.is_ignored(rel))
        })
        .map(move |entry| {
            let entry = entry.context("failed to walk source directory")?;
            let rel = entry
                .path()
                .strip_prefix(manifest_dir)
                .map(Path::to_path_buf)
                .unwrap_or_else(|_| entry.path().to_path_buf());
            Ok((entry, rel))
        })
}

/// Every module source file under `root`, in sorted walk order.
///
/// A missing source path yields nothing.
pub fn scan_sources(manifest_dir: &Path, root: &Path, ignore: &IgnoreSet) -> Result<Vec<SourceFile>> {
    if !manifest_dir.join(root).is_dir() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for item in walk(manifest_dir, root, ignore) {
        let (entry, rel) = item?;
        if !entry.file_type().is_file() {
            continue;
        }
        if let Some(dialect) = Dialect::from_path(&rel) {
            files.push(SourceFile {
                path: rel,
                root: root.to_path_buf(),
                dialect,
            });
        }
    }
    Ok(files)
}

/// Every directory under `root` (inclusive), relative to the manifest
/// directory, children after their parent.
pub fn source_dirs(manifest_dir: &Path, root: &Path, ignore: &IgnoreSet) -> Result<Vec<PathBuf>> {
    if !manifest_dir.join(root).is_dir() {
        return Ok(Vec::new());
    }

    let mut dirs = Vec::new();
    for item in walk(manifest_dir, root, ignore) {
        let (entry, rel) = item?;
        if entry.file_type().is_dir() {
            dirs.push(rel);
        }
    }
    Ok(dirs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::fixtures::write_tree;
    use tempfile::TempDir;

    #[test]
    fn test_source_file_labels() {
        let file = SourceFile {
            path: PathBuf::from("src/app/core_test.clj"),
            root: PathBuf::from("src"),
            dialect: Dialect::Clj,
        };
        assert_eq!(file.label().to_string(), "//src/app:core_test.clj");
        assert_eq!(file.test_label().to_string(), "//src/app:core_test");
        assert!(file.is_test());
    }

    #[test]
    fn test_scan_sources_sorted_and_filtered() {
        let tmp = TempDir::new().unwrap();
        write_tree(
            tmp.path(),
            &[
                ("src/b.clj", "(ns b)"),
                ("src/a/z.cljs", "(ns a.z)"),
                ("src/a/y.cljc", "(ns a.y)"),
                ("src/readme.md", "# hi"),
                ("src/.hidden/x.clj", "(ns x)"),
                ("src/gen/g.clj", "(ns g)"),
            ],
        );

        let ignore = IgnoreSet::new(&[PathBuf::from("src/gen")]);
        let files = scan_sources(tmp.path(), Path::new("src"), &ignore).unwrap();
        let paths: Vec<_> = files.iter().map(|f| to_slash(&f.path)).collect();
        assert_eq!(paths, vec!["src/a/y.cljc", "src/a/z.cljs", "src/b.clj"]);
        assert_eq!(files[0].root, PathBuf::from("src"));
    }

    #[test]
    fn test_source_dirs_parent_first() {
        let tmp = TempDir::new().unwrap();
        write_tree(
            tmp.path(),
            &[("src/a/b/c.clj", "(ns a.b.c)"), ("src/d/e.clj", "(ns d.e)")],
        );

        let dirs = source_dirs(tmp.path(), Path::new("src"), &IgnoreSet::default()).unwrap();
        let dirs: Vec<_> = dirs.iter().map(|d| to_slash(d)).collect();
        assert_eq!(dirs, vec!["src", "src/a", "src/a/b", "src/d"]);
    }

    #[test]
    fn test_glob_ignore() {
        let ignore = IgnoreSet::new(&[PathBuf::from("src/**/generated")]);
        assert!(ignore.is_ignored(Path::new("src/app/generated")));
        assert!(!ignore.is_ignored(Path::new("src/app/core.clj")));
    }

    #[test]
    fn test_missing_root_is_empty() {
        let tmp = TempDir::new().unwrap();
        let files = scan_sources(tmp.path(), Path::new("nope"), &IgnoreSet::default()).unwrap();
        assert!(files.is_empty());
    }
}
