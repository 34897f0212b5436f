//! POST — create a resource at a store-chosen URI within a collection.

use cloudkit_core::{Adapter, RequestOptions, Response, uri};
use http::Method;
use uuid::Uuid;

use crate::{
  Result, Store, lifecycle,
  handlers::{data_required, invalid_entity_type, method_not_allowed, not_found},
};

pub(crate) async fn handler<A: Adapter>(
  store: &Store<A>,
  target: &str,
  options: &RequestOptions,
) -> Result<Response> {
  let kind = store.classify(target);
  if !uri::allowed_methods(kind).contains(&Method::POST) {
    return Ok(method_not_allowed(kind));
  }
  if !store.known_entity(target) {
    return Ok(invalid_entity_type());
  }
  if options.json.is_none() {
    return Ok(data_required());
  }

  let Some(fragment) = uri::collection_uri_fragment(target) else {
    return Ok(not_found());
  };
  let resource_uri = format!("{fragment}/{}", Uuid::new_v4());
  lifecycle::create_resource(store, &resource_uri, options).await
}
