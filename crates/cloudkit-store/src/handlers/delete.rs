//! DELETE — archive the current version and plant a tombstone.

use cloudkit_core::{Adapter, RequestOptions, Response, uri};
use http::Method;

use crate::{
  Result, Store, lifecycle,
  handlers::{
    etag_required, gone, guard_row_filters, invalid_entity_type,
    method_not_allowed, not_found, precondition_failed,
  },
};

pub(crate) async fn handler<A: Adapter>(
  store: &Store<A>,
  target: &str,
  options: &RequestOptions,
) -> Result<Response> {
  let kind = store.classify(target);
  if !uri::allowed_methods(kind).contains(&Method::DELETE) {
    return Ok(method_not_allowed(kind));
  }
  if !store.known_entity(target) {
    return Ok(invalid_entity_type());
  }
  let Some(expected) = options.etag.clone() else {
    return Ok(etag_required());
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
  if current.deleted {
    return Ok(gone());
  }
  if expected != current.etag {
    return Ok(precondition_failed());
  }

  lifecycle::delete_resource(store, target, current).await
}
