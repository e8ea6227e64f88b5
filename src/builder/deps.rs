//! Module label resolution and dependency edge extraction.

use std::collections::BTreeSet;

use tracing::trace;

use crate::builder::context::GenConfig;
use crate::core::{Label, ModuleDecl};
use crate::index::ClasspathIndex;
use crate::util::lookup::LookupError;

/// Resolves module names to target labels.
///
/// Source-defined modules shadow library-defined ones of the same name.
#[derive(Debug, Clone, Copy)]
pub struct LabelResolver<'a> {
    index: &'a ClasspathIndex,
    config: &'a GenConfig,
}

impl<'a> LabelResolver<'a> {
    pub fn new(index: &'a ClasspathIndex, config: &'a GenConfig) -> Self {
        LabelResolver { index, config }
    }

    /// Label of the target declaring `module`, or `None` when nothing on the
    /// classpath declares it.
    pub fn resolve(&self, module: &str) -> Option<Label> {
        if let Some(label) = self.index.source_module(module) {
            return Some(label.clone());
        }
        self.index
            .library_module(module)
            .map(|lib| Label::repo(&self.config.deps_repo, lib.label.as_str()))
    }
}

/// Computes the dependency labels of a module declaration.
#[derive(Debug, Clone, Copy)]
pub struct DependencyExtractor<'a> {
    index: &'a ClasspathIndex,
    config: &'a GenConfig,
    resolver: LabelResolver<'a>,
}

impl<'a> DependencyExtractor<'a> {
    pub fn new(index: &'a ClasspathIndex, config: &'a GenConfig) -> Self {
        DependencyExtractor {
            index,
            config,
            resolver: LabelResolver::new(index, config),
        }
    }

    pub fn resolver(&self) -> &LabelResolver<'a> {
        &self.resolver
    }

    /// Union of required modules, imported classes, and the generated-class
    /// superclass, each mapped to a label. Unresolved names contribute
    /// nothing; the module's own name never does.
    pub fn extract(&self, decl: &ModuleDecl) -> Result<BTreeSet<Label>, LookupError> {
        let mut labels = BTreeSet::new();

        for module in &decl.requires {
            if *module == decl.name {
                continue;
            }
            match self.resolver.resolve(module) {
                Some(label) => {
                    labels.insert(label);
                }
                None => trace!("{}: unresolved require `{}`", decl.name, module),
            }
        }

        for class in decl.imports.iter().map(String::as_str).chain(decl.superclass()) {
            if let Some(label) = self.class_label(class)? {
                labels.insert(label);
            }
        }

        Ok(labels)
    }

    fn class_label(&self, class: &str) -> Result<Option<Label>, LookupError> {
        Ok(self
            .index
            .library_for_class(class)?
            .map(|coord| self.config.library(coord)))
    }
}
