//! High-level operations.
//!
//! This module contains the implementation of gen-build commands.

pub mod gen_deps;
pub mod gen_srcs;
pub mod ns_loader;
pub mod resolve;
pub mod write;

pub use gen_deps::generate_deps;
pub use gen_srcs::{generate_srcs, source_tree};
pub use ns_loader::{collect_modules, generate_ns_loader, render_loader, NsLoaderOptions};
pub use resolve::{load_session, Session, SessionOptions};
pub use write::{WriteMode, WriteReport};
