//! Resource lifecycle — the transactional create/update/delete paths.
//!
//! Every mutation runs inside one adapter transaction spanning the URI
//! rewrite of the superseded row, the insert of its successor, and all view
//! updates. The etag-guarded rewrite re-checks the precondition inside the
//! transaction, so two racing writers resolve into one success and one 412.

use chrono::{DateTime, Utc};
use cloudkit_core::{
  Adapter, NewEntry, RequestOptions, Response, StorageError, StoreEntry, uri,
};
use http::StatusCode;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::{
  Result, Store,
  handlers::{
    data_required, etag_required, guard_row_filters, not_found,
    precondition_failed, unprocessable,
  },
};

/// Render `t` as an RFC 7231 IMF-fixdate (`Sun, 06 Nov 1994 08:49:37 GMT`).
pub(crate) fn http_date(t: DateTime<Utc>) -> String {
  t.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// The historical address a superseded current row moves to.
pub(crate) fn version_uri(resource_uri: &str, etag: &str) -> String {
  format!("{resource_uri}/versions/{etag}")
}

fn fresh_etag() -> String {
  Uuid::new_v4().to_string()
}

/// `{uri, etag, last_modified}` metadata body with matching headers.
fn meta_response(
  status: StatusCode,
  uri: &str,
  etag: &str,
  last_modified: &str,
) -> Response {
  let body = json!({
    "uri":           uri,
    "etag":          etag,
    "last_modified": last_modified,
  })
  .to_string();
  Response::json(status, body)
    .with_etag(etag)
    .with_last_modified(last_modified)
}

// ─── Create ──────────────────────────────────────────────────────────────────

/// Insert the first (current) row of a new resource and index it.
pub(crate) async fn create_resource<A: Adapter>(
  store: &Store<A>,
  target: &str,
  options: &RequestOptions,
) -> Result<Response> {
  let Some(raw) = options.json.clone() else {
    return Ok(data_required());
  };
  let data: Value = match serde_json::from_str(&raw) {
    Ok(data) => data,
    Err(_) => return Ok(unprocessable()),
  };
  let Some(collection) = uri::collection_type(target).map(str::to_string)
  else {
    return Ok(not_found());
  };

  let etag = fresh_etag();
  let last_modified = http_date(Utc::now());
  let entry = NewEntry {
    uri:                  target.to_string(),
    etag:                 etag.clone(),
    collection_reference: format!("/{collection}"),
    resource_reference:   target.to_string(),
    last_modified:        last_modified.clone(),
    remote_user:          options.remote_user.clone(),
    content:              raw,
    deleted:              false,
  };

  let views = store.views().to_vec();
  let resource = target.to_string();
  let outcome = store
    .adapter()
    .transaction(move |tx| {
      tx.insert(entry)?;
      for view in &views {
        view.map(tx, &collection, &resource, &data)?;
      }
      Ok(())
    })
    .await;

  match outcome {
    Ok(()) => {
      tracing::debug!(uri = target, "created resource");
      Ok(meta_response(StatusCode::CREATED, target, &etag, &last_modified))
    }
    // A concurrent writer claimed the URI first.
    Err(StorageError::Conflict) => Ok(precondition_failed()),
    Err(err) => Err(err.into()),
  }
}

// ─── Update ──────────────────────────────────────────────────────────────────

/// Archive the current row to its version URI and insert the successor.
pub(crate) async fn update_resource<A: Adapter>(
  store: &Store<A>,
  target: &str,
  options: &RequestOptions,
) -> Result<Response> {
  let Some(raw) = options.json.clone() else {
    return Ok(data_required());
  };
  let data: Value = match serde_json::from_str(&raw) {
    Ok(data) => data,
    Err(_) => return Ok(unprocessable()),
  };
  if let Some(response) = guard_row_filters(options) {
    return Ok(response);
  }

  let Some(current) = store
    .adapter()
    .entry_at(target.to_string(), options.row_filters())
    .await?
  else {
    return Ok(not_found());
  };
  // Existence is hidden from non-owners.
  if current.remote_user != options.remote_user {
    return Ok(not_found());
  }
  let Some(expected) = options.etag.clone() else {
    return Ok(etag_required());
  };
  if expected != current.etag {
    return Ok(precondition_failed());
  }

  let Some(collection) = uri::collection_type(target).map(str::to_string)
  else {
    return Ok(not_found());
  };
  let etag = fresh_etag();
  let last_modified = http_date(Utc::now());
  let entry = NewEntry {
    uri:                  target.to_string(),
    etag:                 etag.clone(),
    collection_reference: current.collection_reference.clone(),
    resource_reference:   current.resource_reference.clone(),
    last_modified:        last_modified.clone(),
    remote_user:          current.remote_user.clone(),
    content:              raw,
    deleted:              false,
  };

  let views = store.views().to_vec();
  let resource = target.to_string();
  let archived = version_uri(target, &current.etag);
  let outcome = store
    .adapter()
    .transaction(move |tx| {
      if !tx.rewrite_uri(&resource, &archived, &expected)? {
        return Err(StorageError::Conflict);
      }
      tx.insert(entry)?;
      for view in &views {
        view.map(tx, &collection, &resource, &data)?;
      }
      Ok(())
    })
    .await;

  match outcome {
    Ok(()) => {
      tracing::debug!(uri = target, "updated resource");
      Ok(meta_response(StatusCode::OK, target, &etag, &last_modified))
    }
    Err(StorageError::Conflict) => Ok(precondition_failed()),
    Err(err) => Err(err.into()),
  }
}

// ─── Delete ──────────────────────────────────────────────────────────────────

/// Archive the current row and plant a tombstone in its place.
///
/// `current` is the row the caller already fetched and precondition-checked;
/// the etag guard inside the transaction re-verifies it.
pub(crate) async fn delete_resource<A: Adapter>(
  store: &Store<A>,
  target: &str,
  current: StoreEntry,
) -> Result<Response> {
  let Some(collection) = uri::collection_type(target).map(str::to_string)
  else {
    return Ok(not_found());
  };
  let archived = version_uri(target, &current.etag);
  let tombstone = NewEntry {
    uri:                  target.to_string(),
    etag:                 fresh_etag(),
    collection_reference: current.collection_reference.clone(),
    resource_reference:   current.resource_reference.clone(),
    last_modified:        http_date(Utc::now()),
    remote_user:          current.remote_user.clone(),
    content:              current.content.clone(),
    deleted:              true,
  };

  let views = store.views().to_vec();
  let resource = target.to_string();
  let archived_to = archived.clone();
  let expected = current.etag.clone();
  let outcome = store
    .adapter()
    .transaction(move |tx| {
      if !tx.rewrite_uri(&resource, &archived_to, &expected)? {
        return Err(StorageError::Conflict);
      }
      tx.insert(tombstone)?;
      for view in &views {
        view.unmap(tx, &collection, &resource)?;
      }
      Ok(())
    })
    .await;

  match outcome {
    Ok(()) => {
      tracing::debug!(uri = target, "deleted resource");
      Ok(meta_response(
        StatusCode::OK,
        &archived,
        &current.etag,
        &current.last_modified,
      ))
    }
    Err(StorageError::Conflict) => Ok(precondition_failed()),
    Err(err) => Err(err.into()),
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone as _;

  use super::*;

  #[test]
  fn http_date_is_imf_fixdate() {
    let t = Utc.with_ymd_and_hms(1994, 11, 6, 8, 49, 37).unwrap();
    assert_eq!(http_date(t), "Sun, 06 Nov 1994 08:49:37 GMT");
  }

  #[test]
  fn version_uri_appends_the_etag() {
    assert_eq!(version_uri("/foos/1", "e1"), "/foos/1/versions/e1");
  }
}
