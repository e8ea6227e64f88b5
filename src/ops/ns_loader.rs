//! Implementation of `gen-build ns-loader`.
//!
//! Writes a module that requires every module found under a set of
//! directories, so a test runner can load them all through one name.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tracing::{debug, info};

use crate::core::module::is_valid_module_name;
use crate::index::sources::{scan_sources, IgnoreSet};
use crate::index::MalformedSourceError;
use crate::ops::write::{WriteMode, WriteReport};
use crate::reader::{parse_declaration, ParseError};
use crate::util::diagnostic::Diagnostic;

/// Options for [`generate_ns_loader`].
#[derive(Debug, Clone)]
pub struct NsLoaderOptions {
    /// Directories to scan
    pub dirs: Vec<PathBuf>,

    /// File to write
    pub output: PathBuf,

    /// Name of the generated module
    pub name: String,

    /// Only collect modules from test files
    pub tests_only: bool,
}

/// Every module declared under `dirs`, sorted and deduplicated.
pub fn collect_modules(dirs: &[PathBuf], tests_only: bool) -> Result<Vec<String>> {
    let ignore = IgnoreSet::default();
    let mut modules = BTreeSet::new();

    for dir in dirs {
        if !dir.is_dir() {
            bail!("`{}` is not a directory", dir.display());
        }

        for file in scan_sources(dir, Path::new(""), &ignore)? {
            if tests_only && !file.is_test() {
                continue;
            }
            let path = dir.join(&file.path);
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read source file: {}", path.display()))?;

            match parse_declaration(&text, file.dialect) {
                Ok(decl) => {
                    debug!("{}: {}", path.display(), decl.name);
                    modules.insert(decl.name);
                }
                Err(e) if e.is_fatal() => {
                    return Err(MalformedSourceError { path, source: e }.into());
                }
                Err(ParseError::NoModuleForm) => {
                    Diagnostic::warning("skipping file without a namespace declaration")
                        .with_location(&path)
                        .log();
                }
                Err(e) => {
                    Diagnostic::warning("skipping unreadable file")
                        .with_location(&path)
                        .with_context(e.to_string())
                        .log();
                }
            }
        }
    }

    Ok(modules.into_iter().collect())
}

/// Source text of the loader module.
pub fn render_loader(name: &str, modules: &[String]) -> String {
    let Some((first, rest)) = modules.split_first() else {
        return format!("(ns {})\n", name);
    };

    let mut out = format!("(ns {}\n  (:require [{}]", name, first);
    for module in rest {
        out.push_str(&format!("\n            [{}]", module));
    }
    out.push_str("))\n");
    out
}

/// Scan, render, and write the loader module.
pub fn generate_ns_loader(opts: &NsLoaderOptions, mode: WriteMode) -> Result<WriteReport> {
    if !is_valid_module_name(&opts.name) {
        bail!("`{}` is not a valid module name", opts.name);
    }

    let modules: Vec<String> = collect_modules(&opts.dirs, opts.tests_only)?
        .into_iter()
        .filter(|m| *m != opts.name)
        .collect();
    let text = render_loader(&opts.name, &modules);

    let mut report = WriteReport::default();
    report.emit(&opts.output, &text, mode)?;
    info!("{} requires {} modules", opts.name, modules.len());
    Ok(report)
}
