//! Local durable cache abstraction.
//!
//! The engine persists two kinds of documents through this seam: entity
//! collection snapshots (JSON arrays keyed by collection name) and per-entity
//! sync queue state. Implementations must survive process restarts to be
//! useful offline; [`MemoryStore`] deliberately does not and exists for tests
//! and ephemeral sessions.

mod memory;

pub use memory::MemoryStore;

use serde_json::Value;

use crate::errors::StoreError;

/// Synchronous key→document store shared by the cache and the sync queue.
///
/// Reads never fail: a missing key or an unreadable backend yields
/// `Value::Null` (implementations log the cause). Writes replace the whole
/// document under the key and report backend trouble as a recoverable
/// [`StoreError`] which callers absorb as a no-op.
///
/// Single in-process writer assumption: implementations guard their own
/// interior state but do not coordinate across processes.
pub trait LocalStore: Send + Sync {
    /// Read the document stored under `key`, or `Value::Null` when absent.
    fn read(&self, key: &str) -> Value;

    /// Replace the document stored under `key`.
    fn write(&self, key: &str, document: &Value) -> Result<(), StoreError>;

    /// Insert or replace a single record inside the JSON-array collection
    /// under `key`, matched by its `id` field.
    fn upsert(&self, key: &str, record: &Value) -> Result<(), StoreError> {
        let mut records = as_collection(self.read(key));
        let id = record_id(record);
        match records
            .iter_mut()
            .find(|existing| record_id(existing) == id)
        {
            Some(slot) => *slot = record.clone(),
            None => records.push(record.clone()),
        }
        self.write(key, &Value::Array(records))
    }

    /// Remove the record with the given `id` from the collection under `key`.
    /// Removing an absent id is a no-op.
    fn remove(&self, key: &str, id: &str) -> Result<(), StoreError> {
        let mut records = as_collection(self.read(key));
        let before = records.len();
        records.retain(|existing| record_id(existing) != Some(id));
        if records.len() == before {
            return Ok(());
        }
        self.write(key, &Value::Array(records))
    }
}

/// Interpret a stored document as a collection of records.
///
/// `Null` (absent key) is an empty collection. Anything else that is not an
/// array indicates a corrupt document; it is logged and treated as empty so
/// reads keep their never-fail contract.
pub fn as_collection(document: Value) -> Vec<Value> {
    match document {
        Value::Array(records) => records,
        Value::Null => Vec::new(),
        other => {
            log::warn!(
                "[LocalStore] Discarding non-collection document ({})",
                json_kind(&other)
            );
            Vec::new()
        }
    }
}

fn record_id(record: &Value) -> Option<&str> {
    record.get("id").and_then(Value::as_str)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn upsert_appends_then_replaces_by_id() {
        let store = MemoryStore::new();
        store
            .upsert("transactions", &json!({"id": "a", "amount": 1.0}))
            .unwrap();
        store
            .upsert("transactions", &json!({"id": "b", "amount": 2.0}))
            .unwrap();
        store
            .upsert("transactions", &json!({"id": "a", "amount": 9.0}))
            .unwrap();

        let records = as_collection(store.read("transactions"));
        assert_eq!(records.len(), 2);
        let a = records.iter().find(|r| r["id"] == "a").unwrap();
        assert_eq!(a["amount"], 9.0);
    }

    #[test]
    fn remove_is_noop_for_missing_id() {
        let store = MemoryStore::new();
        store.upsert("accounts", &json!({"id": "a"})).unwrap();
        store.remove("accounts", "nope").unwrap();
        assert_eq!(as_collection(store.read("accounts")).len(), 1);
    }

    #[test]
    fn read_of_absent_key_is_null() {
        let store = MemoryStore::new();
        assert_eq!(store.read("missing"), Value::Null);
        assert!(as_collection(store.read("missing")).is_empty());
    }

    #[test]
    fn corrupt_document_reads_as_empty_collection() {
        let store = MemoryStore::new();
        store.write("budgets", &json!("not a list")).unwrap();
        assert!(as_collection(store.read("budgets")).is_empty());
    }
}
