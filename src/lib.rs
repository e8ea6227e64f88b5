//! gen-build - Bazel BUILD file generation for Clojure projects
//!
//! This crate provides the library functionality behind `gen-build`:
//! reading a deps.toml manifest and its resolved basis, indexing source
//! paths and library archives, and rendering BUILD files for every source
//! directory and for the dependency repository.

pub mod builder;
pub mod core;
pub mod emit;
pub mod index;
pub mod ops;
pub mod reader;
pub mod resolver;
pub mod util;

/// Fixtures for unit tests: source trees, jar files, and whole projects
/// with a resolved basis.
#[cfg(test)]
pub mod test_support;

pub use builder::GenConfig;
pub use core::{Coordinate, Label, Manifest};
pub use index::ClasspathIndex;
pub use resolver::{Basis, Resolver};
