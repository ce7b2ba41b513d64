//! In-process SQLite-backed ledger node for tally.
//!
//! Implements the [`tally_core::node::NodeRpc`] seam with a local vault and
//! party directory, plus a synchronous issuance flow runner that applies the
//! obligation contract rules. Wraps [`tokio_rusqlite`] so all database access
//! runs off the async runtime's worker threads.

mod encode;
mod node;
mod schema;

pub mod error;

pub use error::{Error, Result};
pub use node::SqliteNode;
