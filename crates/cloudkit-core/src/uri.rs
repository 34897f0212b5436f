//! URI classification.
//!
//! The store multiplexes seven addressable shapes (plus views and a
//! catch-all) onto one row model. Classification is by segment count and
//! membership of the first segment in the configured collection and view
//! name sets; all subsequent dispatch is on the resulting [`UriKind`] tag.

use std::collections::BTreeSet;

use http::Method;

/// The discovery endpoint enumerating configured collections.
pub const META_URI: &str = "/cloudkit-meta";

/// The addressable shapes of the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UriKind {
  /// `/cloudkit-meta`
  Meta,
  /// `/{collection}`
  ResourceCollection,
  /// `/{collection}/_resolved`
  ResolvedResourceCollection,
  /// `/{collection}/{uuid}`
  Resource,
  /// `/{collection}/{uuid}/versions`
  VersionCollection,
  /// `/{collection}/{uuid}/versions/_resolved`
  ResolvedVersionCollection,
  /// `/{collection}/{uuid}/versions/{etag}`
  ResourceVersion,
  /// `/{view}`
  View,
  Unknown,
}

const READ_METHODS: &[Method] =
  &[Method::GET, Method::HEAD, Method::OPTIONS];
const COLLECTION_METHODS: &[Method] =
  &[Method::GET, Method::HEAD, Method::POST, Method::OPTIONS];
const RESOURCE_METHODS: &[Method] = &[
  Method::GET,
  Method::HEAD,
  Method::PUT,
  Method::DELETE,
  Method::OPTIONS,
];

/// Classify `uri` against the registered collection and view names.
pub fn classify(
  uri: &str,
  collections: &BTreeSet<String>,
  views: &BTreeSet<String>,
) -> UriKind {
  let segments: Vec<&str> = segments(uri).collect();
  match segments.as_slice() {
    ["cloudkit-meta"] => UriKind::Meta,
    [c] if collections.contains(*c) => UriKind::ResourceCollection,
    [v] if views.contains(*v) => UriKind::View,
    [c, "_resolved"] if collections.contains(*c) => {
      UriKind::ResolvedResourceCollection
    }
    [c, _] if collections.contains(*c) => UriKind::Resource,
    [c, _, "versions"] if collections.contains(*c) => {
      UriKind::VersionCollection
    }
    [c, _, "versions", "_resolved"] if collections.contains(*c) => {
      UriKind::ResolvedVersionCollection
    }
    [c, _, "versions", _] if collections.contains(*c) => {
      UriKind::ResourceVersion
    }
    _ => UriKind::Unknown,
  }
}

/// The methods a URI of the given kind accepts.
pub fn allowed_methods(kind: UriKind) -> &'static [Method] {
  match kind {
    UriKind::Meta
    | UriKind::ResolvedResourceCollection
    | UriKind::VersionCollection
    | UriKind::ResolvedVersionCollection
    | UriKind::ResourceVersion
    | UriKind::View
    | UriKind::Unknown => READ_METHODS,
    UriKind::ResourceCollection => COLLECTION_METHODS,
    UriKind::Resource => RESOURCE_METHODS,
  }
}

/// The `Allow` header value for a URI of the given kind.
pub fn allow_header(kind: UriKind) -> String {
  allowed_methods(kind)
    .iter()
    .map(Method::as_str)
    .collect::<Vec<_>>()
    .join(", ")
}

/// First path segment, i.e. the collection or view name.
pub fn collection_type(uri: &str) -> Option<&str> {
  segments(uri).next()
}

/// `"/{first segment}"`.
pub fn collection_uri_fragment(uri: &str) -> Option<String> {
  collection_type(uri).map(|c| format!("/{c}"))
}

/// `"/{first}/{second}"` — the current-version URI of the resource the
/// given URI belongs to.
pub fn current_resource_uri(uri: &str) -> Option<String> {
  let mut parts = segments(uri);
  match (parts.next(), parts.next()) {
    (Some(c), Some(u)) => Some(format!("/{c}/{u}")),
    _ => None,
  }
}

/// True for names usable as collection/view identifiers (and therefore as
/// SQL table or column names without quoting).
pub fn valid_identifier(name: &str) -> bool {
  let mut chars = name.chars();
  match chars.next() {
    Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
    _ => return false,
  }
  chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn segments(uri: &str) -> impl Iterator<Item = &str> {
  uri.split('/').filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
  use super::*;

  fn space() -> (BTreeSet<String>, BTreeSet<String>) {
    let collections = ["foos", "bars"].map(String::from).into();
    let views = ["foos_by_color"].map(String::from).into();
    (collections, views)
  }

  #[test]
  fn classifies_every_shape() {
    let (c, v) = space();
    let cases = [
      ("/cloudkit-meta", UriKind::Meta),
      ("/foos", UriKind::ResourceCollection),
      ("/foos/_resolved", UriKind::ResolvedResourceCollection),
      ("/foos/123", UriKind::Resource),
      ("/foos/123/versions", UriKind::VersionCollection),
      ("/foos/123/versions/_resolved", UriKind::ResolvedVersionCollection),
      ("/foos/123/versions/abc", UriKind::ResourceVersion),
      ("/foos_by_color", UriKind::View),
    ];
    for (uri, expected) in cases {
      assert_eq!(classify(uri, &c, &v), expected, "{uri}");
    }
  }

  #[test]
  fn unregistered_names_are_unknown() {
    let (c, v) = space();
    assert_eq!(classify("/nope", &c, &v), UriKind::Unknown);
    assert_eq!(classify("/nope/123", &c, &v), UriKind::Unknown);
    assert_eq!(classify("/foos/123/blah", &c, &v), UriKind::Unknown);
    assert_eq!(classify("/foos/123/versions/a/b", &c, &v), UriKind::Unknown);
    assert_eq!(classify("/", &c, &v), UriKind::Unknown);
  }

  #[test]
  fn empty_segments_are_dropped() {
    let (c, v) = space();
    assert_eq!(classify("/foos/", &c, &v), UriKind::ResourceCollection);
    assert_eq!(classify("//foos//123", &c, &v), UriKind::Resource);
  }

  #[test]
  fn helpers_extract_fragments() {
    assert_eq!(collection_type("/foos/123"), Some("foos"));
    assert_eq!(collection_uri_fragment("/foos/123").as_deref(), Some("/foos"));
    assert_eq!(
      current_resource_uri("/foos/123/versions/abc").as_deref(),
      Some("/foos/123")
    );
    assert_eq!(current_resource_uri("/foos"), None);
  }

  #[test]
  fn allow_headers_match_kind() {
    assert_eq!(
      allow_header(UriKind::Resource),
      "GET, HEAD, PUT, DELETE, OPTIONS"
    );
    assert_eq!(
      allow_header(UriKind::ResourceCollection),
      "GET, HEAD, POST, OPTIONS"
    );
    assert_eq!(allow_header(UriKind::View), "GET, HEAD, OPTIONS");
  }

  #[test]
  fn identifier_validation() {
    assert!(valid_identifier("foos"));
    assert!(valid_identifier("foos_by_color"));
    assert!(valid_identifier("_hidden"));
    assert!(!valid_identifier(""));
    assert!(!valid_identifier("9lives"));
    assert!(!valid_identifier("cloudkit-meta"));
    assert!(!valid_identifier("a;drop table"));
  }
}
