//! Indices derived from a resolved basis.
//!
//! Archives are introspected, source paths walked, and every lookup the
//! generators need is built once, up front. Nothing here changes after
//! [`ClasspathIndex::build`] returns.

pub mod archive;
pub mod classpath;
pub mod sources;

pub use archive::{ArchiveContents, ArchiveFormatError};
pub use classpath::ClasspathIndex;
pub use sources::{IgnoreSet, SourceFile};

use std::path::PathBuf;

use thiserror::Error;

use crate::reader::ParseError;

/// A source file whose `ns` form is present but broken. Always fatal.
#[derive(Debug, Error)]
#[error("malformed namespace declaration in {}", path.display())]
pub struct MalformedSourceError {
    pub path: PathBuf,
    #[source]
    pub source: ParseError,
}
