//! Resolution error types and diagnostics.

use std::path::PathBuf;

use thiserror::Error;

use crate::util::diagnostic::Diagnostic;

/// Error while obtaining a resolved basis. Always fatal.
#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("failed to read basis file {}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode basis file {}", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("unknown alias `{alias}`")]
    UnknownAlias {
        alias: String,
        available: Vec<String>,
    },

    #[error("`{lib}` required by {required_by} is missing from the resolved basis")]
    MissingDependency { lib: String, required_by: String },

    #[error("`{lib}` resolved to {count} archives, expected exactly one")]
    ArchiveCount { lib: String, count: usize },

    #[error("`{lib}` is listed more than once in the resolved basis")]
    DuplicateLibrary { lib: String },

    #[error("archive {} is claimed by both `{first}` and `{second}`", path.display())]
    SharedArchive {
        path: PathBuf,
        first: String,
        second: String,
    },
}

impl ResolutionError {
    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            ResolutionError::Unreadable { path, source } => {
                Diagnostic::error(format!("could not read resolved basis: {}", source))
                    .with_location(path)
                    .with_suggestion("Run the dependency resolver to produce the basis file")
            }

            ResolutionError::Malformed { path, source } => {
                Diagnostic::error(format!("resolved basis is not valid: {}", source))
                    .with_location(path)
                    .with_suggestion("Regenerate the basis file with the dependency resolver")
            }

            ResolutionError::UnknownAlias { alias, available } => {
                let mut diag = Diagnostic::error(format!("alias `{}` is not defined", alias));
                if !available.is_empty() {
                    diag = diag.with_context(format!("defined aliases: {}", available.join(", ")));
                }
                diag.with_suggestion("Add the alias under [aliases] in deps.toml")
            }

            ResolutionError::MissingDependency { lib, required_by } => {
                Diagnostic::error(format!("`{}` is not in the resolved basis", lib))
                    .with_context(format!("required by {}", required_by))
                    .with_suggestion("Re-run the dependency resolver after editing deps.toml")
            }

            ResolutionError::ArchiveCount { lib, count } => Diagnostic::error(format!(
                "`{}` must resolve to exactly one archive",
                lib
            ))
            .with_context(format!("found {} paths", count)),

            ResolutionError::DuplicateLibrary { lib } => {
                Diagnostic::error(format!("`{}` appears twice in the resolved basis", lib))
                    .with_context("every library must resolve to one archive")
                    .with_suggestion("Regenerate the basis file with the dependency resolver")
            }

            ResolutionError::SharedArchive {
                path,
                first,
                second,
            } => Diagnostic::error("two libraries share one archive")
                .with_location(path)
                .with_context(format!("claimed by `{}` and `{}`", first, second)),
        }
    }
}
