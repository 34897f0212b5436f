//! The versioned row model.
//!
//! A logical resource is the set of rows sharing a `resource_reference`.
//! The current version lives at `uri == resource_reference`; each superseded
//! version is rewritten to `/{c}/{u}/versions/{etag}` at the moment it is
//! replaced. A tombstone is a current row with `deleted` set — the terminal
//! state of a resource.

use serde::{Deserialize, Serialize};

/// One persistent row of the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreEntry {
  /// Store-assigned; strictly increasing with write order. "Most recent"
  /// always means descending `id`.
  pub id:                   i64,
  /// Globally unique address of this row.
  pub uri:                  String,
  /// Version identifier; a fresh random value per mutation.
  pub etag:                 String,
  /// `/{collection}`; immutable after insertion.
  pub collection_reference: String,
  /// Current-version URI of the logical resource; immutable after insertion.
  pub resource_reference:   String,
  /// HTTP-date set at write time.
  pub last_modified:        String,
  /// Owning principal; `None` means unscoped.
  pub remote_user:          Option<String>,
  /// Client-provided JSON, stored verbatim.
  pub content:              String,
  /// True only on tombstone rows.
  pub deleted:              bool,
}

impl StoreEntry {
  /// Columns a caller-supplied equality filter may name.
  pub const FILTERABLE_COLUMNS: &'static [&'static str] = &[
    "uri",
    "etag",
    "collection_reference",
    "resource_reference",
    "last_modified",
    "remote_user",
    "content",
    "deleted",
  ];

  /// True when this row is the current version of its resource.
  pub fn is_current(&self) -> bool {
    self.uri == self.resource_reference
  }
}

/// A row about to be inserted; `id` is assigned by the backend.
#[derive(Debug, Clone)]
pub struct NewEntry {
  pub uri:                  String,
  pub etag:                 String,
  pub collection_reference: String,
  pub resource_reference:   String,
  pub last_modified:        String,
  pub remote_user:          Option<String>,
  pub content:              String,
  pub deleted:              bool,
}

/// The fields a HEAD request needs; everything else stays on disk.
#[derive(Debug, Clone)]
pub struct EntryMeta {
  pub etag:          String,
  pub last_modified: String,
  pub deleted:       bool,
}
