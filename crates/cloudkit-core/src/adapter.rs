//! The storage-backend contract.
//!
//! Backends implement narrow, named operations; the engine never sees a
//! query builder. Read methods return rows ordered newest (highest `id`)
//! first — response construction is the engine's job. Write primitives are
//! only reachable through [`Adapter::transaction`], which brackets the
//! URI rewrite, the insert and all view updates of one mutation.
//!
//! Every method's future is `Send`, which keeps implementations usable
//! from work-stealing executors.

use std::future::Future;

use crate::{
  entry::{EntryMeta, NewEntry, StoreEntry},
  error::StorageResult,
  view::{View, ViewRow},
};

/// Equality filters applied to a read: (column name, required value).
pub type Filters = Vec<(String, String)>;

/// Raw-row write primitives available inside [`Adapter::transaction`].
pub trait StorageTx {
  /// Insert a row; the backend assigns `id`.
  ///
  /// A unique-`uri` violation surfaces as
  /// [`StorageError::Conflict`](crate::StorageError::Conflict).
  fn insert(&mut self, entry: NewEntry) -> StorageResult<()>;

  /// Move the live row at `from` to `to`, guarded by its expected etag.
  ///
  /// Returns `false` when no live row matched — the caller lost a race and
  /// must abort the transaction.
  fn rewrite_uri(
    &mut self,
    from: &str,
    to: &str,
    expected_etag: &str,
  ) -> StorageResult<bool>;

  fn view_insert(&mut self, view: &str, row: ViewRow) -> StorageResult<()>;

  fn view_delete(&mut self, view: &str, uri: &str) -> StorageResult<()>;
}

/// Abstraction over a CloudKit storage backend.
pub trait Adapter: Send + Sync {
  /// The row addressed by `uri`, tombstones included.
  fn entry_at(
    &self,
    uri: String,
    filters: Filters,
  ) -> impl Future<Output = StorageResult<Option<StoreEntry>>> + Send + '_;

  /// `etag`/`last_modified`/`deleted` of the row at `uri` — the HEAD fast
  /// path, which never loads `content`.
  fn peek(
    &self,
    uri: String,
    filters: Filters,
  ) -> impl Future<Output = StorageResult<Option<EntryMeta>>> + Send + '_;

  /// Live current rows of a collection, newest first.
  fn current_entries(
    &self,
    collection_reference: String,
    filters: Filters,
  ) -> impl Future<Output = StorageResult<Vec<StoreEntry>>> + Send + '_;

  /// All non-deleted rows of one logical resource, newest first.
  fn version_entries(
    &self,
    resource_reference: String,
    filters: Filters,
  ) -> impl Future<Output = StorageResult<Vec<StoreEntry>>> + Send + '_;

  /// URIs indexed by a view, newest first.
  fn view_uris(
    &self,
    view: String,
    filters: Filters,
  ) -> impl Future<Output = StorageResult<Vec<String>>> + Send + '_;

  /// Create the view's table if absent and register it for [`reset`].
  ///
  /// [`reset`]: Adapter::reset
  fn init_view(
    &self,
    view: View,
  ) -> impl Future<Output = StorageResult<()>> + Send + '_;

  /// Run `f` atomically; every write inside rolls back when `f` errors.
  fn transaction<T, F>(
    &self,
    f: F,
  ) -> impl Future<Output = StorageResult<T>> + Send + '_
  where
    F: FnOnce(&mut dyn StorageTx) -> StorageResult<T> + Send + 'static,
    T: Send + 'static;

  /// Truncate the store and every registered view table.
  fn reset(&self) -> impl Future<Output = StorageResult<()>> + Send + '_;
}
