//! Pipeline building blocks
//!
//! - [`acquire`] - resolve, download, and verify release artifacts
//! - [`build`] - extract, compile, and package verified sources
//! - `internal` - filesystem, hashing, and process helpers

pub mod acquire;
pub mod build;
pub mod internal;
