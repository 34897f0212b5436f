//! Secondary indexes ("views").
//!
//! A view observes one collection and projects a fixed set of JSON fields
//! from each document into its own table for exact-match lookup. Views are
//! plain data consumers: `map`/`unmap` are invoked inside the store's write
//! transaction, so a failed view update aborts the write.

use serde_json::Value;

use crate::{adapter::StorageTx, error::StorageResult};

/// Declaration of a secondary index over one observed collection.
#[derive(Debug, Clone)]
pub struct View {
  /// Table name of the view; also its URI (`/{name}`).
  pub name:                String,
  /// Collection name this view observes (no leading slash).
  pub observed_collection: String,
  /// Document fields projected into view columns.
  pub extracted_keys:      Vec<String>,
}

/// One row of a view table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewRow {
  pub uri:                  String,
  pub collection_reference: String,
  /// Extracted (key, value) pairs in declaration order.
  pub keys:                 Vec<(String, String)>,
}

impl View {
  pub fn new(
    name: impl Into<String>,
    observed_collection: impl Into<String>,
    extracted_keys: impl IntoIterator<Item = impl Into<String>>,
  ) -> Self {
    Self {
      name:                name.into(),
      observed_collection: observed_collection.into(),
      extracted_keys:      extracted_keys.into_iter().map(Into::into).collect(),
    }
  }

  fn observes(&self, collection_type: &str) -> bool {
    self.observed_collection == collection_type
  }

  /// Index `uri`, replacing any previous row for the same `uri`.
  ///
  /// Documents missing an extracted key (or carrying a non-scalar value for
  /// one) are simply not indexed.
  pub fn map(
    &self,
    tx: &mut dyn StorageTx,
    collection_type: &str,
    uri: &str,
    data: &Value,
  ) -> StorageResult<()> {
    if !self.observes(collection_type) {
      return Ok(());
    }
    tx.view_delete(&self.name, uri)?;
    let Some(keys) = self.extract(data) else {
      return Ok(());
    };
    tx.view_insert(&self.name, ViewRow {
      uri:                  uri.to_string(),
      collection_reference: format!("/{}", self.observed_collection),
      keys,
    })
  }

  /// Drop `uri` from the index.
  pub fn unmap(
    &self,
    tx: &mut dyn StorageTx,
    collection_type: &str,
    uri: &str,
  ) -> StorageResult<()> {
    if !self.observes(collection_type) {
      return Ok(());
    }
    tx.view_delete(&self.name, uri)
  }

  /// Extract the configured keys as text; `None` when any key is missing
  /// or not a scalar.
  pub fn extract(&self, data: &Value) -> Option<Vec<(String, String)>> {
    self
      .extracted_keys
      .iter()
      .map(|key| {
        let text = match data.get(key)? {
          Value::String(s) => s.clone(),
          Value::Number(n) => n.to_string(),
          Value::Bool(b) => b.to_string(),
          _ => return None,
        };
        Some((key.clone(), text))
      })
      .collect()
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  fn fruits_by_color() -> View {
    View::new("fruits_by_color", "fruits", ["color"])
  }

  #[derive(Default)]
  struct RecordingTx {
    inserts: Vec<(String, ViewRow)>,
    deletes: Vec<(String, String)>,
  }

  impl StorageTx for RecordingTx {
    fn insert(&mut self, _entry: crate::NewEntry) -> StorageResult<()> {
      unreachable!("views never insert store rows")
    }

    fn rewrite_uri(
      &mut self,
      _from: &str,
      _to: &str,
      _expected_etag: &str,
    ) -> StorageResult<bool> {
      unreachable!("views never rewrite store rows")
    }

    fn view_insert(&mut self, view: &str, row: ViewRow) -> StorageResult<()> {
      self.inserts.push((view.to_string(), row));
      Ok(())
    }

    fn view_delete(&mut self, view: &str, uri: &str) -> StorageResult<()> {
      self.deletes.push((view.to_string(), uri.to_string()));
      Ok(())
    }
  }

  #[test]
  fn extract_coerces_scalars_to_text() {
    let view = View::new("v", "fruits", ["color", "count", "ripe"]);
    let keys = view
      .extract(&json!({"color": "red", "count": 3, "ripe": true}))
      .unwrap();
    assert_eq!(keys, vec![
      ("color".to_string(), "red".to_string()),
      ("count".to_string(), "3".to_string()),
      ("ripe".to_string(), "true".to_string()),
    ]);
  }

  #[test]
  fn extract_rejects_missing_and_non_scalar_keys() {
    let view = fruits_by_color();
    assert!(view.extract(&json!({"kind": "apple"})).is_none());
    assert!(view.extract(&json!({"color": ["red", "green"]})).is_none());
  }

  #[test]
  fn map_replaces_existing_row() {
    let view = fruits_by_color();
    let mut tx = RecordingTx::default();
    view
      .map(&mut tx, "fruits", "/fruits/1", &json!({"color": "red"}))
      .unwrap();

    assert_eq!(tx.deletes, vec![(
      "fruits_by_color".to_string(),
      "/fruits/1".to_string()
    )]);
    assert_eq!(tx.inserts.len(), 1);
    let (_, row) = &tx.inserts[0];
    assert_eq!(row.uri, "/fruits/1");
    assert_eq!(row.collection_reference, "/fruits");
    assert_eq!(row.keys, vec![("color".to_string(), "red".to_string())]);
  }

  #[test]
  fn map_skips_documents_missing_a_key() {
    let view = fruits_by_color();
    let mut tx = RecordingTx::default();
    view
      .map(&mut tx, "fruits", "/fruits/1", &json!({"kind": "apple"}))
      .unwrap();
    // The stale row is still cleared, but nothing is indexed.
    assert_eq!(tx.deletes.len(), 1);
    assert!(tx.inserts.is_empty());
  }

  #[test]
  fn unobserved_collections_are_ignored() {
    let view = fruits_by_color();
    let mut tx = RecordingTx::default();
    view
      .map(&mut tx, "veggies", "/veggies/1", &json!({"color": "green"}))
      .unwrap();
    view.unmap(&mut tx, "veggies", "/veggies/1").unwrap();
    assert!(tx.inserts.is_empty());
    assert!(tx.deletes.is_empty());
  }
}
