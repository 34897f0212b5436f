//! HEAD — metadata-only fetch for single rows, GET projection otherwise.

use cloudkit_core::{
  Adapter, RequestOptions, Response, UriKind, response::CONTENT_TYPE_JSON,
};
use http::StatusCode;

use crate::{
  Result, Store,
  handlers::{get, guard_row_filters, not_found},
};

pub(crate) async fn handler<A: Adapter>(
  store: &Store<A>,
  target: &str,
  options: &RequestOptions,
) -> Result<Response> {
  match store.classify(target) {
    // Single rows never load `content` for a HEAD.
    UriKind::Resource | UriKind::ResourceVersion => {
      single(store, target, options).await
    }
    _ => Ok(get::handler(store, target, options).await?.head()),
  }
}

async fn single<A: Adapter>(
  store: &Store<A>,
  target: &str,
  options: &RequestOptions,
) -> Result<Response> {
  if let Some(response) = guard_row_filters(options) {
    return Ok(response.head());
  }
  match store
    .adapter()
    .peek(target.to_string(), options.row_filters())
    .await?
  {
    None => Ok(not_found().head()),
    Some(meta) if meta.deleted => Ok(Response::new(StatusCode::GONE)),
    Some(meta) => Ok(
      Response::new(StatusCode::OK)
        .header("Content-Type", CONTENT_TYPE_JSON)
        .with_etag(&meta.etag)
        .with_last_modified(meta.last_modified),
    ),
  }
}
