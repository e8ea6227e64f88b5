//! Test utilities for gen-build unit tests.
//!
//! Fixtures build real project directories on disk: a manifest, source
//! files, library jars, and the basis file naming them.
//!
//! # Example
//!
//! ```rust,ignore
//! use gen_build::test_support::ProjectFixture;
//!
//! #[test]
//! fn test_example() {
//!     let project = ProjectFixture::new()
//!         .with_manifest("paths = [\"src\"]")
//!         .with_source("src/app/core.clj", "(ns app.core)")
//!         .create();
//!
//!     let index = project.index();
//!     // Use the index in tests...
//! }
//! ```

pub mod fixtures;

// Re-export fixtures for convenience
pub use fixtures::*;
