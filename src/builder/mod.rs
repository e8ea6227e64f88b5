//! BUILD file generation.
//!
//! This module turns the classpath index into rendered declaration files:
//! per-file targets, per-directory aggregates, and the library repository.

pub mod context;
pub mod deps;
pub mod directory;
pub mod library;
pub mod target;

pub use context::GenConfig;
pub use deps::{DependencyExtractor, LabelResolver};
pub use directory::DirectoryAggregator;
pub use library::LibraryBuildGenerator;
pub use target::TargetSynthesizer;

use thiserror::Error;

use crate::core::target::{BuildTarget, TargetValidationError};
use crate::util::lookup::LookupError;

/// Error while synthesizing or rendering targets.
#[derive(Debug, Error)]
pub enum GenError {
    #[error("invalid target in {package}")]
    Validation {
        package: String,
        #[source]
        source: TargetValidationError,
    },

    #[error(transparent)]
    Lookup(#[from] LookupError),
}

/// Validate every target of one file when `enabled`.
pub(crate) fn validate_all(
    enabled: bool,
    package: &str,
    targets: &[BuildTarget],
) -> Result<(), GenError> {
    if !enabled {
        return Ok(());
    }
    for target in targets {
        target.validate(package).map_err(|source| GenError::Validation {
            package: package.to_string(),
            source,
        })?;
    }
    Ok(())
}
