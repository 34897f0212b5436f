//! Per-verb request handlers and shared status responses.

pub mod delete;
pub mod get;
pub mod head;
pub mod options;
pub mod post;
pub mod put;

use cloudkit_core::{RequestOptions, Response, StoreEntry, UriKind, uri};
use http::StatusCode;
use serde_json::json;

fn error_response(status: StatusCode, message: &str) -> Response {
  Response::json(status, json!({"error": message}).to_string())
}

/// 400 — the first URI segment names no collection, view or meta endpoint.
pub(crate) fn invalid_entity_type() -> Response {
  error_response(StatusCode::BAD_REQUEST, "invalid entity type")
}

/// 400 — PUT/POST without a `json` body.
pub(crate) fn data_required() -> Response {
  error_response(StatusCode::BAD_REQUEST, "data required")
}

/// 400 — update/delete without the `etag` precondition.
pub(crate) fn etag_required() -> Response {
  error_response(StatusCode::BAD_REQUEST, "etag required")
}

/// 400 — a filter key names no queryable column.
pub(crate) fn invalid_filter(key: &str) -> Response {
  error_response(StatusCode::BAD_REQUEST, &format!("invalid filter: {key}"))
}

pub(crate) fn not_found() -> Response {
  error_response(StatusCode::NOT_FOUND, "not found")
}

/// 405 carrying the `Allow` set of the URI's kind.
pub(crate) fn method_not_allowed(kind: UriKind) -> Response {
  error_response(StatusCode::METHOD_NOT_ALLOWED, "method not allowed")
    .header("Allow", uri::allow_header(kind))
}

/// 410 without a version pointer (writes against a tombstone).
pub(crate) fn gone() -> Response {
  error_response(StatusCode::GONE, "gone")
}

pub(crate) fn precondition_failed() -> Response {
  error_response(StatusCode::PRECONDITION_FAILED, "precondition failed")
}

/// 422 — the request body is not JSON.
pub(crate) fn unprocessable() -> Response {
  error_response(StatusCode::UNPROCESSABLE_ENTITY, "unable to parse json")
}

/// Whitelist caller filters against the row-store columns; `Some(400)` when
/// a key names no column.
pub(crate) fn guard_row_filters(options: &RequestOptions) -> Option<Response> {
  options
    .filters
    .keys()
    .find(|key| !StoreEntry::FILTERABLE_COLUMNS.contains(&key.as_str()))
    .map(|key| invalid_filter(key))
}
