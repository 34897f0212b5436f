//! The CloudKit store engine.
//!
//! Orchestrates GET/HEAD/PUT/POST/DELETE/OPTIONS over a storage
//! [`Adapter`], enforcing ETag preconditions, producing immutable versions
//! on every mutation, and keeping secondary indexes ("views") consistent
//! inside the write transaction. The engine is transport-neutral: every
//! operation answers with a [`Response`] value the host protocol maps
//! onto its own wire format.

pub mod config;
pub mod error;

mod bundle;
mod handlers;
mod lifecycle;


use std::{collections::BTreeSet, sync::Arc};

use cloudkit_core::{UriKind, uri};

pub use cloudkit_core::{Adapter, RequestOptions, Response, View};
pub use config::StoreConfig;
pub use error::{Error, Result};

/// Protocol version reported by [`Store::version`].
const STORE_VERSION: u32 = 1;

// ─── Store ───────────────────────────────────────────────────────────────────

/// The versioned document store.
///
/// Holds no per-request state; cloning is cheap and clones share the
/// adapter and configuration.
pub struct Store<A> {
  inner: Arc<Inner<A>>,
}

struct Inner<A> {
  adapter:     A,
  collections: BTreeSet<String>,
  views:       Vec<View>,
  view_names:  BTreeSet<String>,
}

impl<A> Clone for Store<A> {
  fn clone(&self) -> Self {
    Self { inner: Arc::clone(&self.inner) }
  }
}

impl<A> std::fmt::Debug for Store<A> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Store").finish_non_exhaustive()
  }
}

impl<A: Adapter> Store<A> {
  /// Validate `config` and initialise view storage.
  ///
  /// Collection and view names become URI segments and SQL identifiers, so
  /// they are checked here once rather than trusted at request time.
  pub async fn new(adapter: A, config: StoreConfig) -> Result<Self> {
    let mut names: BTreeSet<String> = BTreeSet::new();
    for collection in &config.collections {
      if !uri::valid_identifier(collection) {
        return Err(Error::InvalidIdentifier(collection.clone()));
      }
      if !names.insert(collection.clone()) {
        return Err(Error::DuplicateName(collection.clone()));
      }
    }
    let collections: BTreeSet<String> =
      config.collections.iter().cloned().collect();

    let mut view_names: BTreeSet<String> = BTreeSet::new();
    for view in &config.views {
      if !uri::valid_identifier(&view.name) {
        return Err(Error::InvalidIdentifier(view.name.clone()));
      }
      if let Some(key) = view
        .extracted_keys
        .iter()
        .find(|key| !uri::valid_identifier(key))
      {
        return Err(Error::InvalidIdentifier(key.clone()));
      }
      if !names.insert(view.name.clone()) {
        return Err(Error::DuplicateName(view.name.clone()));
      }
      if !collections.contains(&view.observed_collection) {
        return Err(Error::UnknownObservedCollection {
          view:       view.name.clone(),
          collection: view.observed_collection.clone(),
        });
      }
      view_names.insert(view.name.clone());
    }

    for view in &config.views {
      adapter.init_view(view.clone()).await?;
    }

    tracing::info!(
      collections = collections.len(),
      views = config.views.len(),
      "store initialised"
    );
    Ok(Self {
      inner: Arc::new(Inner {
        adapter,
        collections,
        views: config.views,
        view_names,
      }),
    })
  }

  // ── Operations ──────────────────────────────────────────────────────────

  pub async fn get(
    &self,
    uri: &str,
    options: RequestOptions,
  ) -> Result<Response> {
    handlers::get::handler(self, uri, &options).await
  }

  pub async fn head(
    &self,
    uri: &str,
    options: RequestOptions,
  ) -> Result<Response> {
    handlers::head::handler(self, uri, &options).await
  }

  pub async fn put(
    &self,
    uri: &str,
    options: RequestOptions,
  ) -> Result<Response> {
    handlers::put::handler(self, uri, &options).await
  }

  pub async fn post(
    &self,
    uri: &str,
    options: RequestOptions,
  ) -> Result<Response> {
    handlers::post::handler(self, uri, &options).await
  }

  pub async fn delete(
    &self,
    uri: &str,
    options: RequestOptions,
  ) -> Result<Response> {
    handlers::delete::handler(self, uri, &options).await
  }

  pub fn options(&self, uri: &str) -> Response {
    handlers::options::handler(self, uri)
  }

  /// `get` every URI in order and collect the responses.
  pub async fn resolve_uris<I, S>(&self, uris: I) -> Result<Vec<Response>>
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    let mut responses = Vec::new();
    for uri in uris {
      responses.push(self.get(uri.as_ref(), RequestOptions::new()).await?);
    }
    Ok(responses)
  }

  /// Truncate the row store and all view tables.
  pub async fn reset(&self) -> Result<()> {
    self.inner.adapter.reset().await?;
    Ok(())
  }

  pub fn version(&self) -> u32 {
    STORE_VERSION
  }

  // ── Shared internals ────────────────────────────────────────────────────

  pub(crate) fn adapter(&self) -> &A {
    &self.inner.adapter
  }

  pub(crate) fn collections(&self) -> &BTreeSet<String> {
    &self.inner.collections
  }

  pub(crate) fn views(&self) -> &[View] {
    &self.inner.views
  }

  pub(crate) fn view(&self, name: &str) -> Option<&View> {
    self.inner.views.iter().find(|view| view.name == name)
  }

  pub(crate) fn classify(&self, uri: &str) -> UriKind {
    uri::classify(uri, &self.inner.collections, &self.inner.view_names)
  }

  /// True when the first URI segment names a collection, a view or the
  /// meta endpoint.
  pub(crate) fn known_entity(&self, target: &str) -> bool {
    match uri::collection_type(target) {
      Some(name) => {
        name == "cloudkit-meta"
          || self.inner.collections.contains(name)
          || self.inner.view_names.contains(name)
      }
      None => false,
    }
  }
}
