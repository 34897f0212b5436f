//! Collection bundling and pagination.
//!
//! Every collection read answers with a bundle: `total` counted before
//! slicing, the requested page, and an ETag over the rendered body so
//! clients can cache list results.

use cloudkit_core::{RequestOptions, Response, StoreEntry};
use http::StatusCode;
use serde_json::json;
use sha2::{Digest, Sha256};

use crate::Result;

/// Hex SHA-256 of a rendered body — the ETag for bundle responses.
pub(crate) fn content_hash(body: &str) -> String {
  hex::encode(Sha256::digest(body.as_bytes()))
}

/// `{"total", "offset", "uris"}` over store rows, newest first.
pub(crate) fn uri_bundle(
  entries: &[StoreEntry],
  options: &RequestOptions,
) -> Response {
  let newest = entries.first().map(|e| e.last_modified.clone());
  let uris: Vec<&str> = entries.iter().map(|e| e.uri.as_str()).collect();
  let (offset, page) = paginate(&uris, options);
  finish(
    json!({"total": uris.len(), "offset": offset, "uris": page}).to_string(),
    newest,
  )
}

/// `{"total", "offset", "documents"}` with each stored document inlined.
pub(crate) fn document_bundle(
  entries: &[StoreEntry],
  options: &RequestOptions,
) -> Result<Response> {
  let newest = entries.first().map(|e| e.last_modified.clone());
  let (offset, page) = paginate(entries, options);
  let documents = page
    .iter()
    .map(|e| {
      Ok(json!({
        "uri":           e.uri,
        "etag":          e.etag,
        "last_modified": e.last_modified,
        "document":      serde_json::from_str::<serde_json::Value>(&e.content)?,
      }))
    })
    .collect::<Result<Vec<_>>>()?;
  Ok(finish(
    json!({"total": entries.len(), "offset": offset, "documents": documents})
      .to_string(),
    newest,
  ))
}

/// URI bundle for view lookups (view rows carry no timestamps).
pub(crate) fn view_bundle(
  uris: &[String],
  options: &RequestOptions,
) -> Response {
  let (offset, page) = paginate(uris, options);
  finish(
    json!({"total": uris.len(), "offset": offset, "uris": page}).to_string(),
    None,
  )
}

fn finish(body: String, newest: Option<String>) -> Response {
  let etag = content_hash(&body);
  Response::json(StatusCode::OK, body)
    .with_etag(&etag)
    .with_last_modified(newest.unwrap_or_default())
}

/// Slice `items[offset .. offset + limit]`, clamped to the item count.
fn paginate<'a, T>(
  items: &'a [T],
  options: &RequestOptions,
) -> (usize, &'a [T]) {
  let total = items.len();
  let offset = options.offset.unwrap_or(0);
  let end = options
    .limit
    .map(|limit| offset.saturating_add(limit))
    .unwrap_or(total)
    .min(total);
  let start = offset.min(end);
  (offset, &items[start..end])
}

#[cfg(test)]
mod tests {
  use super::*;

  fn entry(uri: &str, last_modified: &str) -> StoreEntry {
    StoreEntry {
      id:                   0,
      uri:                  uri.to_string(),
      etag:                 "e".to_string(),
      collection_reference: "/foos".to_string(),
      resource_reference:   uri.to_string(),
      last_modified:        last_modified.to_string(),
      remote_user:          None,
      content:              "{}".to_string(),
      deleted:              false,
    }
  }

  #[test]
  fn total_is_counted_before_slicing() {
    let entries = [entry("/foos/1", "a"), entry("/foos/2", "b")];
    let r = uri_bundle(&entries, &RequestOptions::new().limit(1));
    let body: serde_json::Value = serde_json::from_str(&r.content).unwrap();
    assert_eq!(body["total"], 2);
    assert_eq!(body["offset"], 0);
    assert_eq!(body["uris"], serde_json::json!(["/foos/1"]));
  }

  #[test]
  fn limit_zero_is_an_empty_page() {
    let entries = [entry("/foos/1", "a")];
    let r = uri_bundle(&entries, &RequestOptions::new().limit(0));
    let body: serde_json::Value = serde_json::from_str(&r.content).unwrap();
    assert_eq!(body["total"], 1);
    assert_eq!(body["uris"].as_array().unwrap().len(), 0);
  }

  #[test]
  fn offset_past_the_end_is_empty_not_a_panic() {
    let entries = [entry("/foos/1", "a")];
    let r = uri_bundle(&entries, &RequestOptions::new().offset(9));
    let body: serde_json::Value = serde_json::from_str(&r.content).unwrap();
    assert_eq!(body["offset"], 9);
    assert_eq!(body["uris"].as_array().unwrap().len(), 0);
  }

  #[test]
  fn last_modified_is_the_newest_row_or_empty() {
    let entries = [entry("/foos/2", "newest"), entry("/foos/1", "older")];
    let r = uri_bundle(&entries, &RequestOptions::new());
    assert_eq!(r.last_modified(), Some("newest"));

    let none = uri_bundle(&[], &RequestOptions::new());
    assert_eq!(none.last_modified(), Some(""));
  }

  #[test]
  fn etag_hashes_the_body() {
    let entries = [entry("/foos/1", "a")];
    let r = uri_bundle(&entries, &RequestOptions::new());
    assert_eq!(r.etag(), Some(content_hash(&r.content).as_str()));
  }
}
