//! OPTIONS — advertise the methods a URI kind accepts.

use cloudkit_core::{Adapter, Response, uri};
use http::StatusCode;

use crate::Store;

pub(crate) fn handler<A: Adapter>(store: &Store<A>, target: &str) -> Response {
  let kind = store.classify(target);
  Response::new(StatusCode::OK).header("Allow", uri::allow_header(kind))
}
