//! Failures local to opening and initialising the SQLite adapter.
//! Per-operation failures surface as `cloudkit_core::StorageError` instead.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
