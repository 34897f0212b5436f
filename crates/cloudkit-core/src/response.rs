//! The transport-neutral response value.
//!
//! The engine answers every operation with one of these; the host transport
//! maps it onto its own protocol (see [`Response::into_http`]).

use std::collections::BTreeMap;

use http::StatusCode;

pub const CONTENT_TYPE_JSON: &str = "application/json";

/// Status, headers and body of one store operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
  pub status:  StatusCode,
  pub headers: BTreeMap<String, String>,
  pub content: String,
}

impl Response {
  pub fn new(status: StatusCode) -> Self {
    Self {
      status,
      headers: BTreeMap::new(),
      content: String::new(),
    }
  }

  /// A JSON response; sets `Content-Type`.
  pub fn json(status: StatusCode, content: impl Into<String>) -> Self {
    Self::new(status)
      .header("Content-Type", CONTENT_TYPE_JSON)
      .body(content)
  }

  pub fn body(mut self, content: impl Into<String>) -> Self {
    self.content = content.into();
    self
  }

  pub fn header(
    mut self,
    name: impl Into<String>,
    value: impl Into<String>,
  ) -> Self {
    self.headers.insert(name.into(), value.into());
    self
  }

  /// Store `etag` in the RFC 7232 quoted form.
  pub fn with_etag(self, etag: &str) -> Self {
    self.header("ETag", format!("\"{etag}\""))
  }

  pub fn with_last_modified(self, value: impl Into<String>) -> Self {
    self.header("Last-Modified", value)
  }

  pub fn get(&self, name: &str) -> Option<&str> {
    self.headers.get(name).map(String::as_str)
  }

  /// The ETag header with its surrounding quotes stripped.
  pub fn etag(&self) -> Option<&str> {
    self.get("ETag").map(|v| v.trim_matches('"'))
  }

  pub fn last_modified(&self) -> Option<&str> {
    self.get("Last-Modified")
  }

  /// A copy with the same status and headers and an empty body.
  pub fn head(&self) -> Self {
    Self {
      status:  self.status,
      headers: self.headers.clone(),
      content: String::new(),
    }
  }

  /// Convert into the `http` crate's response type for transports.
  pub fn into_http(self) -> http::Response<String> {
    let mut builder = http::Response::builder().status(self.status);
    for (name, value) in &self.headers {
      builder = builder.header(name.as_str(), value.as_str());
    }
    // Header names and values originate inside the store and are valid.
    builder
      .body(self.content)
      .expect("store response is a valid http response")
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn etag_is_stored_quoted_and_read_unquoted() {
    let r = Response::new(StatusCode::OK).with_etag("abc-123");
    assert_eq!(r.get("ETag"), Some("\"abc-123\""));
    assert_eq!(r.etag(), Some("abc-123"));
  }

  #[test]
  fn head_projection_drops_body_keeps_headers() {
    let r = Response::json(StatusCode::OK, "{\"a\":1}")
      .with_etag("e1")
      .with_last_modified("Sun, 06 Nov 1994 08:49:37 GMT");
    let h = r.head();
    assert_eq!(h.status, StatusCode::OK);
    assert!(h.content.is_empty());
    assert_eq!(h.etag(), Some("e1"));
    assert_eq!(h.last_modified(), r.last_modified());
  }

  #[test]
  fn converts_into_http_response() {
    let r = Response::json(StatusCode::CREATED, "{}").with_etag("e");
    let http = r.into_http();
    assert_eq!(http.status(), StatusCode::CREATED);
    assert_eq!(http.headers().get("etag").unwrap(), "\"e\"");
    assert_eq!(http.body(), "{}");
  }
}
