//! Error type for `tally-node-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] tally_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("cannot decode stored row: {0}")]
  Decode(String),

  /// The node has not been bootstrapped with a local identity yet.
  #[error("node identity not initialised")]
  IdentityMissing,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
