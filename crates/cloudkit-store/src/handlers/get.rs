//! GET — single rows, version history, collection bundles, views and meta.

use cloudkit_core::{
  Adapter, Filters, RequestOptions, Response, StoreEntry, UriKind, uri,
};
use http::StatusCode;
use serde_json::json;

use crate::{
  Result, Store, bundle,
  handlers::{guard_row_filters, invalid_entity_type, invalid_filter, not_found},
};

pub(crate) async fn handler<A: Adapter>(
  store: &Store<A>,
  target: &str,
  options: &RequestOptions,
) -> Result<Response> {
  if !store.known_entity(target) {
    return Ok(invalid_entity_type());
  }
  match store.classify(target) {
    UriKind::Meta => Ok(meta(store)),
    UriKind::ResourceCollection => collection(store, target, options, false).await,
    UriKind::ResolvedResourceCollection => {
      collection(store, target, options, true).await
    }
    UriKind::Resource | UriKind::ResourceVersion => {
      single(store, target, options).await
    }
    UriKind::VersionCollection => versions(store, target, options, false).await,
    UriKind::ResolvedVersionCollection => {
      versions(store, target, options, true).await
    }
    UriKind::View => view(store, target, options).await,
    UriKind::Unknown => Ok(not_found()),
  }
}

/// `{"uris": [...]}` over the configured collections.
fn meta<A: Adapter>(store: &Store<A>) -> Response {
  let uris: Vec<String> =
    store.collections().iter().map(|c| format!("/{c}")).collect();
  let body = json!({"uris": uris}).to_string();
  let etag = bundle::content_hash(&body);
  Response::json(StatusCode::OK, body).with_etag(&etag)
}

async fn single<A: Adapter>(
  store: &Store<A>,
  target: &str,
  options: &RequestOptions,
) -> Result<Response> {
  if let Some(response) = guard_row_filters(options) {
    return Ok(response);
  }
  let Some(row) = store
    .adapter()
    .entry_at(target.to_string(), options.row_filters())
    .await?
  else {
    return Ok(not_found());
  };
  if row.deleted {
    return gone_with_pointer(store, &row, options).await;
  }
  let (etag, last_modified) = (row.etag, row.last_modified);
  Ok(
    Response::json(StatusCode::OK, row.content)
      .with_etag(&etag)
      .with_last_modified(last_modified),
  )
}

/// 410 whose body points at the newest surviving version of the resource.
async fn gone_with_pointer<A: Adapter>(
  store: &Store<A>,
  tombstone: &StoreEntry,
  options: &RequestOptions,
) -> Result<Response> {
  let versions = store
    .adapter()
    .version_entries(tombstone.resource_reference.clone(), options.row_filters())
    .await?;
  let body = versions
    .first()
    .map(|v| {
      json!({
        "uri":           v.uri,
        "etag":          v.etag,
        "last_modified": v.last_modified,
      })
      .to_string()
    })
    .unwrap_or_default();
  Ok(Response::json(StatusCode::GONE, body))
}

async fn collection<A: Adapter>(
  store: &Store<A>,
  target: &str,
  options: &RequestOptions,
  resolved: bool,
) -> Result<Response> {
  if let Some(response) = guard_row_filters(options) {
    return Ok(response);
  }
  let Some(fragment) = uri::collection_uri_fragment(target) else {
    return Ok(not_found());
  };
  let rows = store
    .adapter()
    .current_entries(fragment, options.row_filters())
    .await?;
  if resolved {
    bundle::document_bundle(&rows, options)
  } else {
    Ok(bundle::uri_bundle(&rows, options))
  }
}

async fn versions<A: Adapter>(
  store: &Store<A>,
  target: &str,
  options: &RequestOptions,
  resolved: bool,
) -> Result<Response> {
  if let Some(response) = guard_row_filters(options) {
    return Ok(response);
  }
  let Some(current) = uri::current_resource_uri(target) else {
    return Ok(not_found());
  };
  // The history of a resource that never existed (under these filters) is
  // a 404, not an empty bundle. Tombstones still anchor their history.
  if store
    .adapter()
    .entry_at(current.clone(), options.row_filters())
    .await?
    .is_none()
  {
    return Ok(not_found());
  }
  let rows = store
    .adapter()
    .version_entries(current, options.row_filters())
    .await?;
  if resolved {
    bundle::document_bundle(&rows, options)
  } else {
    Ok(bundle::uri_bundle(&rows, options))
  }
}

async fn view<A: Adapter>(
  store: &Store<A>,
  target: &str,
  options: &RequestOptions,
) -> Result<Response> {
  let Some(view) =
    uri::collection_type(target).and_then(|name| store.view(name))
  else {
    return Ok(not_found());
  };
  if let Some(bad) = options
    .filters
    .keys()
    .find(|key| !view.extracted_keys.contains(key))
  {
    return Ok(invalid_filter(bad));
  }
  // Views are unscoped: their tables carry only the extracted keys.
  let filters: Filters = options
    .filters
    .iter()
    .map(|(k, v)| (k.clone(), v.clone()))
    .collect();
  let uris = store.adapter().view_uris(view.name.clone(), filters).await?;
  Ok(bundle::view_bundle(&uris, options))
}
