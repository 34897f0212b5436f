//! [`SqliteAdapter`], which satisfies the [`Adapter`] contract with plain
//! SQL over one connection.

use std::{
  collections::BTreeSet,
  path::Path,
  sync::{Arc, Mutex},
};

use cloudkit_core::{
  Adapter, EntryMeta, Filters, NewEntry, StorageError, StorageResult,
  StorageTx, StoreEntry, View, ViewRow, uri,
};
use rusqlite::OptionalExtension as _;

use crate::{
  Result,
  encode::{
    ENTRY_COLUMNS, entry_filter_sql, entry_from_row, meta_from_row,
    view_filter_sql,
  },
  schema::SCHEMA,
};

// ─── Adapter ─────────────────────────────────────────────────────────────────

/// A CloudKit storage backend over a single SQLite database.
///
/// Clones are shallow: they share one connection and one view registry, so
/// the adapter can be handed to as many engine clones as needed.
#[derive(Clone)]
pub struct SqliteAdapter {
  conn:  tokio_rusqlite::Connection,
  views: Arc<Mutex<BTreeSet<String>>>,
}

impl SqliteAdapter {
  /// Open the database file at `path`, creating it and the
  /// `cloudkit_store` table on first use.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref().to_path_buf();
    let conn = tokio_rusqlite::Connection::open(path.clone()).await?;
    let adapter = Self {
      conn,
      views: Arc::new(Mutex::new(BTreeSet::new())),
    };
    adapter.init_schema().await?;
    tracing::debug!(path = %path.display(), "opened sqlite store");
    Ok(adapter)
  }

  /// Back the adapter with a private in-memory database; everything
  /// vanishes when the last clone drops. Intended for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let adapter = Self {
      conn,
      views: Arc::new(Mutex::new(BTreeSet::new())),
    };
    adapter.init_schema().await?;
    Ok(adapter)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  fn registered_views(&self) -> Vec<String> {
    self.views.lock().expect("view registry poisoned").iter().cloned().collect()
  }
}

// ─── Error mapping ───────────────────────────────────────────────────────────

fn sqlite_error(err: rusqlite::Error) -> StorageError {
  if let rusqlite::Error::SqliteFailure(failure, _) = &err
    && failure.code == rusqlite::ErrorCode::ConstraintViolation
  {
    return StorageError::Conflict;
  }
  StorageError::backend(err)
}

fn db_error(err: tokio_rusqlite::Error) -> StorageError {
  match err {
    tokio_rusqlite::Error::Rusqlite(e) => sqlite_error(e),
    other => StorageError::backend(other),
  }
}

// ─── Adapter impl ────────────────────────────────────────────────────────────

impl Adapter for SqliteAdapter {
  async fn entry_at(
    &self,
    uri: String,
    filters: Filters,
  ) -> StorageResult<Option<StoreEntry>> {
    let (clause, params) = entry_filter_sql(&filters)?;
    self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {ENTRY_COLUMNS} FROM cloudkit_store WHERE uri = ?{clause}"
        );
        let row = conn
          .query_row(
            &sql,
            rusqlite::params_from_iter(
              std::iter::once(uri).chain(params),
            ),
            entry_from_row,
          )
          .optional()?;
        Ok(row)
      })
      .await
      .map_err(db_error)
  }

  async fn peek(
    &self,
    uri: String,
    filters: Filters,
  ) -> StorageResult<Option<EntryMeta>> {
    let (clause, params) = entry_filter_sql(&filters)?;
    self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT etag, last_modified, deleted FROM cloudkit_store \
           WHERE uri = ?{clause}"
        );
        let row = conn
          .query_row(
            &sql,
            rusqlite::params_from_iter(
              std::iter::once(uri).chain(params),
            ),
            meta_from_row,
          )
          .optional()?;
        Ok(row)
      })
      .await
      .map_err(db_error)
  }

  async fn current_entries(
    &self,
    collection_reference: String,
    filters: Filters,
  ) -> StorageResult<Vec<StoreEntry>> {
    let (clause, params) = entry_filter_sql(&filters)?;
    self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {ENTRY_COLUMNS} FROM cloudkit_store \
           WHERE collection_reference = ? AND deleted = 0 \
             AND uri = resource_reference{clause} \
           ORDER BY id DESC"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(
            rusqlite::params_from_iter(
              std::iter::once(collection_reference).chain(params),
            ),
            entry_from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await
      .map_err(db_error)
  }

  async fn version_entries(
    &self,
    resource_reference: String,
    filters: Filters,
  ) -> StorageResult<Vec<StoreEntry>> {
    let (clause, params) = entry_filter_sql(&filters)?;
    self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {ENTRY_COLUMNS} FROM cloudkit_store \
           WHERE resource_reference = ? AND deleted = 0{clause} \
           ORDER BY id DESC"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(
            rusqlite::params_from_iter(
              std::iter::once(resource_reference).chain(params),
            ),
            entry_from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await
      .map_err(db_error)
  }

  async fn view_uris(
    &self,
    view: String,
    filters: Filters,
  ) -> StorageResult<Vec<String>> {
    if !uri::valid_identifier(&view) {
      return Err(StorageError::InvalidFilter(view));
    }
    let (clause, params) = view_filter_sql(&filters)?;
    self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT uri FROM {view} WHERE 1 = 1{clause} ORDER BY rowid DESC"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params), |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(rows)
      })
      .await
      .map_err(db_error)
  }

  async fn init_view(&self, view: View) -> StorageResult<()> {
    if !uri::valid_identifier(&view.name)
      || view.extracted_keys.iter().any(|k| !uri::valid_identifier(k))
    {
      return Err(StorageError::InvalidFilter(view.name));
    }
    let name = view.name.clone();
    self
      .conn
      .call(move |conn| {
        let mut columns = vec![
          "uri                  TEXT NOT NULL UNIQUE".to_string(),
          "collection_reference TEXT NOT NULL".to_string(),
        ];
        columns
          .extend(view.extracted_keys.iter().map(|key| format!("{key} TEXT")));
        let sql = format!(
          "CREATE TABLE IF NOT EXISTS {} (\n    {}\n)",
          view.name,
          columns.join(",\n    ")
        );
        conn.execute(&sql, [])?;
        Ok(())
      })
      .await
      .map_err(db_error)?;
    self.views.lock().expect("view registry poisoned").insert(name);
    Ok(())
  }

  async fn transaction<T, F>(&self, f: F) -> StorageResult<T>
  where
    F: FnOnce(&mut dyn StorageTx) -> StorageResult<T> + Send + 'static,
    T: Send + 'static,
  {
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut handle = SqliteTx { tx: &tx };
        match f(&mut handle) {
          Ok(value) => {
            tx.commit()?;
            Ok(Ok(value))
          }
          // Dropping the transaction rolls every write back.
          Err(err) => Ok(Err(err)),
        }
      })
      .await
      .map_err(db_error)?
  }

  async fn reset(&self) -> StorageResult<()> {
    let views = self.registered_views();
    tracing::info!(views = views.len(), "resetting store");
    self
      .conn
      .call(move |conn| {
        conn.execute("DELETE FROM cloudkit_store", [])?;
        for view in &views {
          conn.execute(&format!("DELETE FROM {view}"), [])?;
        }
        Ok(())
      })
      .await
      .map_err(db_error)
  }
}

// ─── Transaction handle ──────────────────────────────────────────────────────

struct SqliteTx<'a> {
  tx: &'a rusqlite::Transaction<'a>,
}

impl StorageTx for SqliteTx<'_> {
  fn insert(&mut self, entry: NewEntry) -> StorageResult<()> {
    self
      .tx
      .execute(
        "INSERT INTO cloudkit_store (
           uri, etag, collection_reference, resource_reference,
           last_modified, remote_user, content, deleted
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        rusqlite::params![
          entry.uri,
          entry.etag,
          entry.collection_reference,
          entry.resource_reference,
          entry.last_modified,
          entry.remote_user,
          entry.content,
          entry.deleted,
        ],
      )
      .map_err(sqlite_error)?;
    Ok(())
  }

  fn rewrite_uri(
    &mut self,
    from: &str,
    to: &str,
    expected_etag: &str,
  ) -> StorageResult<bool> {
    let changed = self
      .tx
      .execute(
        "UPDATE cloudkit_store SET uri = ?1 \
         WHERE uri = ?2 AND etag = ?3 AND deleted = 0",
        rusqlite::params![to, from, expected_etag],
      )
      .map_err(sqlite_error)?;
    Ok(changed > 0)
  }

  fn view_insert(&mut self, view: &str, row: ViewRow) -> StorageResult<()> {
    if !uri::valid_identifier(view)
      || row.keys.iter().any(|(k, _)| !uri::valid_identifier(k))
    {
      return Err(StorageError::InvalidFilter(view.to_string()));
    }
    let mut columns = vec!["uri", "collection_reference"];
    columns.extend(row.keys.iter().map(|(k, _)| k.as_str()));
    let placeholders =
      (1..=columns.len()).map(|i| format!("?{i}")).collect::<Vec<_>>();
    let sql = format!(
      "INSERT INTO {view} ({}) VALUES ({})",
      columns.join(", "),
      placeholders.join(", ")
    );
    let params: Vec<&str> = [row.uri.as_str(), row.collection_reference.as_str()]
      .into_iter()
      .chain(row.keys.iter().map(|(_, v)| v.as_str()))
      .collect();
    self
      .tx
      .execute(&sql, rusqlite::params_from_iter(params))
      .map_err(sqlite_error)?;
    Ok(())
  }

  fn view_delete(&mut self, view: &str, uri_value: &str) -> StorageResult<()> {
    if !uri::valid_identifier(view) {
      return Err(StorageError::InvalidFilter(view.to_string()));
    }
    self
      .tx
      .execute(
        &format!("DELETE FROM {view} WHERE uri = ?1"),
        rusqlite::params![uri_value],
      )
      .map_err(sqlite_error)?;
    Ok(())
  }
}
