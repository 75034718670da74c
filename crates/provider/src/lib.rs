//! Terraform provider core for Cirrus Cloud.
//!
//! The crate is organized around one flow: declared schemas validate the
//! configuration tree, expand functions turn it into wire messages,
//! resource handlers drive the management API and wait on its
//! long-running operations, and flatten functions map the authoritative
//! API answer back into state.

pub mod client;
pub mod config;
pub mod diag;
pub mod id;
pub mod ops;
pub mod resources;
pub mod schema;
pub mod state;

pub use client::{CloudApi, GrpcCloudApi};
pub use config::ProviderConfig;
