//! Ongwu Core - Domain types for the Ongwu Note service
//!
//! This crate provides the foundational types shared by the storage
//! backends and the HTTP server.

pub mod markdown;
pub mod types;

pub use types::{Category, Note, User};

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
