//! SQLite backend for the CloudKit document store.
//!
//! Implements the [`Adapter`](cloudkit_core::Adapter) contract over a
//! single `cloudkit_store` table plus one table per registered view. SQL
//! runs through [`tokio_rusqlite`], which keeps the blocking database work
//! off the async executor's threads.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteAdapter;
