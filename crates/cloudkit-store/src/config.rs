//! Store configuration.
//!
//! Collections and views are fixed at construction time. Names are
//! validated there as well — they become URI segments and (for views) SQL
//! identifiers, so misconfiguration is a constructor error rather than a
//! runtime surprise.

use cloudkit_core::View;

/// The collections and views a [`Store`](crate::Store) serves.
#[derive(Debug, Clone, Default)]
pub struct StoreConfig {
  pub collections: Vec<String>,
  pub views:       Vec<View>,
}

impl StoreConfig {
  pub fn new(
    collections: impl IntoIterator<Item = impl Into<String>>,
  ) -> Self {
    Self {
      collections: collections.into_iter().map(Into::into).collect(),
      views:       Vec::new(),
    }
  }

  pub fn view(mut self, view: View) -> Self {
    self.views.push(view);
    self
  }
}
