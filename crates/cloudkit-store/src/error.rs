//! Error type for the store engine.
//!
//! Protocol outcomes (4xx, 410, 412) are *values* — the engine answers them
//! as [`Response`]s. `Error` is reserved for configuration mistakes and
//! storage failures, which transports collapse to an opaque 5xx via
//! [`Error::to_response`].

use cloudkit_core::{Response, StorageError};
use http::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A collection name, view name or extracted key is not a usable
  /// identifier.
  #[error("invalid identifier: {0:?}")]
  InvalidIdentifier(String),

  #[error("view {view:?} observes unknown collection {collection:?}")]
  UnknownObservedCollection { view: String, collection: String },

  #[error("duplicate collection or view name: {0:?}")]
  DuplicateName(String),

  /// A stored document failed to parse while bundling. Content is
  /// validated on write, so this indicates storage corruption.
  #[error("stored document is not valid JSON: {0}")]
  Content(#[from] serde_json::Error),

  #[error(transparent)]
  Storage(#[from] StorageError),
}

impl Error {
  /// The opaque 5xx a transport should answer with when the store itself
  /// fails. Details stay in the logs.
  pub fn to_response(&self) -> Response {
    Response::json(
      StatusCode::INTERNAL_SERVER_ERROR,
      "{\"error\":\"internal error\"}",
    )
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
