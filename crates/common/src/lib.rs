//! Cirrus Cloud Common Library
//!
//! Shared building blocks for the Cirrus Cloud Terraform provider: the
//! wire-level API messages, the error taxonomy, and small conversion
//! helpers used by expand/flatten code.

pub mod api;
pub mod datasize;
pub mod error;
pub mod timefmt;

pub use error::{Error, Result};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
