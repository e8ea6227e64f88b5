//! Module declarations and source dialects.

use std::path::Path;

use crate::core::target::ExtraConfig;

/// Modules that are never compiled ahead of time, whatever the manifest says.
pub const BOOTSTRAP_NO_COMPILE: &[&str] = &[
    "clojure.core",
    "clojure.core.specs.alpha",
    "clojure.main",
    "clojure.spec.alpha",
    "clojure.spec.gen.alpha",
];

/// Recognized source dialect, keyed by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Dialect {
    Clj,
    Cljc,
    Cljs,
}

impl Dialect {
    /// All dialects in emission order.
    pub const ALL: [Dialect; 3] = [Dialect::Clj, Dialect::Cljc, Dialect::Cljs];

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "clj" => Some(Dialect::Clj),
            "cljc" => Some(Dialect::Cljc),
            "cljs" => Some(Dialect::Cljs),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Dialect::Clj => "clj",
            Dialect::Cljc => "cljc",
            Dialect::Cljs => "cljs",
        }
    }

    /// Reader-conditional feature selected when reading this dialect.
    pub fn feature(&self) -> &'static str {
        match self {
            Dialect::Clj | Dialect::Cljc => "clj",
            Dialect::Cljs => "cljs",
        }
    }

    /// Whether files of this dialect can be compiled ahead of time on the JVM.
    pub fn is_compilable(&self) -> bool {
        !matches!(self, Dialect::Cljs)
    }

    /// Name of this dialect's aggregate library target.
    pub fn library_target(&self) -> String {
        format!("__{}_lib", self.extension())
    }

    /// Name of this dialect's aggregate filegroup target.
    pub fn files_target(&self) -> String {
        format!("__{}_files", self.extension())
    }
}

/// Whether a file name follows the test naming convention (`*_test.clj` etc).
pub fn is_test_file(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    Dialect::ALL
        .iter()
        .any(|d| name.ends_with(&format!("_test.{}", d.extension())))
}

/// `(:gen-class ...)` directive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenClass {
    /// Superclass named by `:extends`.
    pub extends: Option<String>,
}

/// A parsed `ns` declaration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModuleDecl {
    /// Module name, e.g. `app.core`.
    pub name: String,
    /// Required module names, in declaration order, deduplicated.
    pub requires: Vec<String>,
    /// Fully-qualified imported class names.
    pub imports: Vec<String>,
    pub gen_class: Option<GenClass>,
    /// Inline `:bazel/clojure_library` attributes.
    pub library_meta: ExtraConfig,
    /// Inline `:bazel/clojure_test` attributes.
    pub test_meta: ExtraConfig,
}

impl ModuleDecl {
    pub fn new(name: impl Into<String>) -> Self {
        ModuleDecl {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Superclass named by a `:gen-class :extends` directive.
    pub fn superclass(&self) -> Option<&str> {
        self.gen_class.as_ref().and_then(|g| g.extends.as_deref())
    }
}

/// Whether `name` is a plausible module name (a dotted symbol).
pub fn is_valid_module_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name.ends_with('.')
        && !name.contains("..")
        && name.chars().all(|c| {
            !c.is_whitespace() && !matches!(c, '(' | ')' | '[' | ']' | '{' | '}' | '"' | '/' | ';' | ',')
        })
        && !name.chars().next().is_some_and(|c| c.is_ascii_digit())
}
