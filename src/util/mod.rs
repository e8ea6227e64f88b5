//! Shared utilities

pub mod config;
pub mod diagnostic;
pub mod fs;
pub mod lookup;

pub use config::Config;
pub use diagnostic::Diagnostic;
pub use lookup::{LookupError, Require};
