//! Core data structures for gen-build.
//!
//! This module contains the foundational types used throughout the generator:
//! - Library coordinates and labels
//! - Manifests and their override block
//! - Module declarations and source dialects
//! - Build targets and extra configuration

pub mod coordinate;
pub mod label;
pub mod manifest;
pub mod module;
pub mod target;

pub use coordinate::{Coordinate, Library};
pub use label::{Label, RepoTag, Scope};
pub use manifest::{find_manifest, Manifest, MANIFEST_NAME};
pub use module::{Dialect, ModuleDecl};
pub use target::{BuildTarget, ExtraConfig, TargetKind};
