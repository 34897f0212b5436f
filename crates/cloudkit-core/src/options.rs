//! Typed per-request options.
//!
//! The recognised keys get dedicated fields; anything else is carried as an
//! equality filter and applied to the matching row or view column. Filter
//! keys are validated against column whitelists before they reach SQL.

use std::collections::BTreeMap;

use crate::adapter::Filters;

/// Options accompanying a single store operation.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
  /// Ownership scoping; matched by equality on reads and writes.
  pub remote_user: Option<String>,
  /// Maximum rows returned from a collection read.
  pub limit:       Option<usize>,
  /// Zero-based skip for collection reads.
  pub offset:      Option<usize>,
  /// Request body for PUT/POST; must parse as JSON.
  pub json:        Option<String>,
  /// Precondition value for updates and deletes.
  pub etag:        Option<String>,
  /// Any other key: exact-match filter.
  pub filters:     BTreeMap<String, String>,
}

impl RequestOptions {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn remote_user(mut self, user: impl Into<String>) -> Self {
    self.remote_user = Some(user.into());
    self
  }

  pub fn limit(mut self, limit: usize) -> Self {
    self.limit = Some(limit);
    self
  }

  pub fn offset(mut self, offset: usize) -> Self {
    self.offset = Some(offset);
    self
  }

  pub fn json(mut self, body: impl Into<String>) -> Self {
    self.json = Some(body.into());
    self
  }

  pub fn etag(mut self, etag: impl Into<String>) -> Self {
    self.etag = Some(etag.into());
    self
  }

  pub fn filter(
    mut self,
    key: impl Into<String>,
    value: impl Into<String>,
  ) -> Self {
    self.filters.insert(key.into(), value.into());
    self
  }

  /// Equality filters for row-store reads: the explicit filters plus
  /// `remote_user` scoping when present.
  pub fn row_filters(&self) -> Filters {
    let mut filters: Filters = self
      .filters
      .iter()
      .map(|(k, v)| (k.clone(), v.clone()))
      .collect();
    if let Some(user) = &self.remote_user {
      filters.push(("remote_user".to_string(), user.clone()));
    }
    filters
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn row_filters_include_remote_user_only_when_scoped() {
    let unscoped = RequestOptions::new().filter("etag", "e1");
    assert_eq!(
      unscoped.row_filters(),
      vec![("etag".to_string(), "e1".to_string())]
    );

    let scoped = RequestOptions::new().remote_user("alice");
    assert_eq!(
      scoped.row_filters(),
      vec![("remote_user".to_string(), "alice".to_string())]
    );
  }
}
