//! Bazel labels - stable identifiers for generated targets.
//!
//! Every label is a pure function of a library coordinate, a library
//! coordinate plus a module name, or a source file path relative to the
//! manifest directory.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::core::coordinate::Coordinate;

/// Convert an arbitrary identifier into a label fragment.
///
/// `-` becomes `_`, then every character outside `[A-Za-z0-9_]` becomes `_`.
pub fn to_label_fragment(s: &str) -> String {
    s.replace('-', "_")
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

/// Target name for a library's archive import.
///
/// `"org.clojure/data.json"` becomes `"org_clojure_data_json"`.
pub fn library_label(coord: &Coordinate) -> String {
    to_label_fragment(coord.as_str())
}

/// Target name for an ahead-of-time compiled module inside a library.
pub fn compiled_module_label(coord: &Coordinate, module: &str) -> String {
    format!("ns_{}_{}", library_label(coord), to_label_fragment(module))
}

/// Error for a malformed repository tag.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid repository tag `{0}`: must start with `@` followed by a name")]
pub struct InvalidRepoTag(pub String);

/// The tag naming the external repository that holds library targets, e.g. `@deps`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RepoTag(String);

impl RepoTag {
    pub fn new(tag: impl Into<String>) -> Result<Self, InvalidRepoTag> {
        let tag = tag.into();
        let valid = tag
            .strip_prefix('@')
            .map(|name| {
                !name.is_empty()
                    && name
                        .chars()
                        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
            })
            .unwrap_or(false);

        if valid {
            Ok(RepoTag(tag))
        } else {
            Err(InvalidRepoTag(tag))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Fully qualified label for a target at the repository root.
    pub fn qualify(&self, name: &str) -> String {
        format!("{}//:{}", self.0, name)
    }

    /// Rewrite a label as seen from inside this repository: `@deps//:x`
    /// becomes `:x`. Any other label is returned unchanged.
    pub fn localize(&self, label: &str) -> String {
        match label
            .strip_prefix(self.0.as_str())
            .and_then(|rest| rest.strip_prefix("//:"))
        {
            Some(name) => format!(":{}", name),
            None => label.to_string(),
        }
    }
}

impl Default for RepoTag {
    /// `@deps`
    fn default() -> Self {
        RepoTag("@deps".to_string())
    }
}

impl FromStr for RepoTag {
    type Err = InvalidRepoTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RepoTag::new(s)
    }
}

impl fmt::Display for RepoTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A resolved target label.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Label {
    /// Target in the main workspace: `//package:name`.
    Source { package: String, name: String },
    /// Target at the root of an external repository: `@repo//:name`.
    Repo { repo: RepoTag, name: String },
}

/// Where a label is being rendered from.
#[derive(Debug, Clone, Copy)]
pub enum Scope<'a> {
    /// A BUILD file of the main workspace.
    Workspace,
    /// The BUILD file at the root of the given external repository.
    Repository(&'a RepoTag),
}

impl Label {
    pub fn source(package: impl Into<String>, name: impl Into<String>) -> Self {
        Label::Source {
            package: package.into(),
            name: name.into(),
        }
    }

    pub fn repo(repo: &RepoTag, name: impl Into<String>) -> Self {
        Label::Repo {
            repo: repo.clone(),
            name: name.into(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Label::Source { name, .. } | Label::Repo { name, .. } => name,
        }
    }

    /// Render the label as seen from `scope`.
    pub fn render(&self, scope: Scope<'_>) -> String {
        match (self, scope) {
            (Label::Source { package, name }, Scope::Workspace) => {
                format!("//{}:{}", package, name)
            }
            (Label::Source { package, name }, Scope::Repository(_)) => {
                format!("@//{}:{}", package, name)
            }
            (Label::Repo { repo, name }, Scope::Repository(current)) if repo == current => {
                format!(":{}", name)
            }
            (Label::Repo { repo, name }, _) => repo.qualify(name),
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(Scope::Workspace))
    }
}

/// Whether a string is syntactically a label.
pub fn is_well_formed(label: &str) -> bool {
    let body = if let Some(rest) = label.strip_prefix('@') {
        match rest.find("//") {
            Some(idx) => &rest[idx..],
            None => return false,
        }
    } else {
        label
    };

    let shaped = body.starts_with("//") || body.starts_with(':');
    shaped && !body.ends_with(':') && !label.chars().any(char::is_whitespace)
}
