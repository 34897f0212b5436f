//! Row decoding and filter-clause helpers.

use cloudkit_core::{EntryMeta, Filters, StorageError, StorageResult, StoreEntry, uri};

/// Column list matching [`entry_from_row`] positions.
pub(crate) const ENTRY_COLUMNS: &str = "id, uri, etag, collection_reference, \
   resource_reference, last_modified, remote_user, content, deleted";

pub(crate) fn entry_from_row(
  row: &rusqlite::Row<'_>,
) -> rusqlite::Result<StoreEntry> {
  Ok(StoreEntry {
    id:                   row.get(0)?,
    uri:                  row.get(1)?,
    etag:                 row.get(2)?,
    collection_reference: row.get(3)?,
    resource_reference:   row.get(4)?,
    last_modified:        row.get(5)?,
    remote_user:          row.get(6)?,
    content:              row.get(7)?,
    deleted:              row.get(8)?,
  })
}

pub(crate) fn meta_from_row(
  row: &rusqlite::Row<'_>,
) -> rusqlite::Result<EntryMeta> {
  Ok(EntryMeta {
    etag:          row.get(0)?,
    last_modified: row.get(1)?,
    deleted:       row.get(2)?,
  })
}

/// `" AND col = ? …"` for filters against `cloudkit_store`, rejecting keys
/// that do not name a store column.
pub(crate) fn entry_filter_sql(
  filters: &Filters,
) -> StorageResult<(String, Vec<String>)> {
  build_filter_sql(filters, |column| {
    StoreEntry::FILTERABLE_COLUMNS.contains(&column)
  })
}

/// Filter clause for a view table. The engine whitelists keys against the
/// view's declared columns; this re-check only guards the SQL text itself.
pub(crate) fn view_filter_sql(
  filters: &Filters,
) -> StorageResult<(String, Vec<String>)> {
  build_filter_sql(filters, uri::valid_identifier)
}

fn build_filter_sql(
  filters: &Filters,
  allowed: impl Fn(&str) -> bool,
) -> StorageResult<(String, Vec<String>)> {
  let mut clause = String::new();
  let mut params = Vec::with_capacity(filters.len());
  for (column, value) in filters {
    if !allowed(column) {
      return Err(StorageError::InvalidFilter(column.clone()));
    }
    clause.push_str(" AND ");
    clause.push_str(column);
    clause.push_str(" = ?");
    params.push(value.clone());
  }
  Ok((clause, params))
}
