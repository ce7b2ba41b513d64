//! Core types and trait definitions for the tally obligation node.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

pub mod amount;
pub mod error;
pub mod identity;
pub mod node;
pub mod obligation;

pub use error::{Error, Result};
