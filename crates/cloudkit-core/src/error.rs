//! The shared storage-failure type.

use thiserror::Error;

/// Failures surfaced by storage backends.
///
/// Protocol outcomes (404, 410, 412, …) are never errors; the engine builds
/// them as [`Response`](crate::Response) values. `StorageError` covers the
/// cases where the backend itself could not complete an operation.
#[derive(Debug, Error)]
pub enum StorageError {
  /// A unique constraint fired, or an etag-guarded rewrite matched no row.
  /// Two writers raced on the same resource and this one lost.
  #[error("write conflict")]
  Conflict,

  /// A filter key does not name a queryable column.
  #[error("invalid filter key: {0:?}")]
  InvalidFilter(String),

  /// Any other backend failure. Transports report these as an opaque 5xx.
  #[error("storage backend error: {0}")]
  Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl StorageError {
  /// Wrap an arbitrary backend failure.
  pub fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Backend(Box::new(err))
  }
}

pub type StorageResult<T, E = StorageError> = std::result::Result<T, E>;
