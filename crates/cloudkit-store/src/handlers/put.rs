//! PUT — create at a client-chosen URI, or update behind an etag.

use cloudkit_core::{Adapter, RequestOptions, Response, uri};
use http::Method;

use crate::{
  Result, Store, lifecycle,
  handlers::{data_required, gone, invalid_entity_type, method_not_allowed},
};

pub(crate) async fn handler<A: Adapter>(
  store: &Store<A>,
  target: &str,
  options: &RequestOptions,
) -> Result<Response> {
  let kind = store.classify(target);
  if !uri::allowed_methods(kind).contains(&Method::PUT) {
    return Ok(method_not_allowed(kind));
  }
  if !store.known_entity(target) {
    return Ok(invalid_entity_type());
  }
  if options.json.is_none() {
    return Ok(data_required());
  }

  // Peek without scoping: whether the URI is occupied decides the path;
  // ownership is enforced inside the update path.
  match store.adapter().peek(target.to_string(), Vec::new()).await? {
    Some(meta) if meta.deleted => Ok(gone()),
    Some(_) => lifecycle::update_resource(store, target, options).await,
    None => lifecycle::create_resource(store, target, options).await,
  }
}
