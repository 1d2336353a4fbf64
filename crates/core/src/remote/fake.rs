//! Scripted in-memory remote store for tests and local development.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::RemoteError;
use crate::remote::{RemoteFilter, RemoteStore};

/// Operation kinds recorded in the call log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteOp {
    Insert,
    Update,
    Delete,
    Query,
}

/// One attempted call against the fake, recorded before the outcome is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteCall {
    pub op: RemoteOp,
    pub collection: String,
    pub id: Option<String>,
}

/// [`RemoteStore`] backed by process-local state with scriptable failures.
///
/// Behavior mirrors the real backend narrowly: inserts mint a fresh
/// authoritative id, updates merge patch fields, deletes of unknown ids are
/// rejected. `set_available(false)` makes every call fail with
/// [`RemoteError::Unavailable`]; `script_failure` queues one-shot errors
/// consumed by subsequent calls in order.
#[derive(Default)]
pub struct FakeRemoteStore {
    collections: Mutex<HashMap<String, Vec<Value>>>,
    calls: Mutex<Vec<RemoteCall>>,
    scripted_failures: Mutex<VecDeque<RemoteError>>,
    available: AtomicBool,
    next_id: AtomicU64,
}

impl FakeRemoteStore {
    pub fn new() -> Self {
        Self {
            collections: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            scripted_failures: Mutex::new(VecDeque::new()),
            available: AtomicBool::new(true),
            next_id: AtomicU64::new(1),
        }
    }

    /// Toggle reachability. While unavailable every call fails with a
    /// transport-class error.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Queue a one-shot failure consumed by the next call (after the
    /// availability check).
    pub fn script_failure(&self, error: RemoteError) {
        self.lock_failures().push_back(error);
    }

    /// Pre-populate a collection with remote-confirmed records.
    pub fn seed(&self, collection: &str, records: Vec<Value>) {
        self.lock_collections()
            .insert(collection.to_string(), records);
    }

    /// Current remote-side contents of a collection.
    pub fn records(&self, collection: &str) -> Vec<Value> {
        self.lock_collections()
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    /// Every call attempted so far, in order.
    pub fn calls(&self) -> Vec<RemoteCall> {
        self.lock_calls().clone()
    }

    /// Number of attempts of one operation kind against a collection.
    pub fn op_count(&self, op: RemoteOp, collection: &str) -> usize {
        self.lock_calls()
            .iter()
            .filter(|call| call.op == op && call.collection == collection)
            .count()
    }

    fn record_call(&self, op: RemoteOp, collection: &str, id: Option<&str>) {
        self.lock_calls().push(RemoteCall {
            op,
            collection: collection.to_string(),
            id: id.map(str::to_string),
        });
    }

    fn check_reachable(&self) -> Result<(), RemoteError> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(RemoteError::unavailable("remote offline (scripted)"));
        }
        if let Some(error) = self.lock_failures().pop_front() {
            return Err(error);
        }
        Ok(())
    }

    fn mint_id(&self) -> String {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        format!("rec-{n:04}")
    }

    fn lock_collections(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<Value>>> {
        match self.collections.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn lock_calls(&self) -> std::sync::MutexGuard<'_, Vec<RemoteCall>> {
        match self.calls.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn lock_failures(&self) -> std::sync::MutexGuard<'_, VecDeque<RemoteError>> {
        match self.scripted_failures.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[async_trait]
impl RemoteStore for FakeRemoteStore {
    async fn insert(&self, collection: &str, record: Value) -> Result<Value, RemoteError> {
        self.record_call(RemoteOp::Insert, collection, None);
        self.check_reachable()?;

        let mut stored = match record {
            Value::Object(map) => Value::Object(map),
            other => {
                return Err(RemoteError::rejected(
                    422,
                    format!("expected an object record, got {other}"),
                ))
            }
        };
        stored["id"] = Value::String(self.mint_id());

        let mut collections = self.lock_collections();
        collections
            .entry(collection.to_string())
            .or_default()
            .push(stored.clone());
        Ok(stored)
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        patch: Value,
    ) -> Result<Value, RemoteError> {
        self.record_call(RemoteOp::Update, collection, Some(id));
        self.check_reachable()?;

        let mut collections = self.lock_collections();
        let records = collections
            .get_mut(collection)
            .ok_or_else(|| RemoteError::rejected(404, format!("no such collection {collection}")))?;
        let record = records
            .iter_mut()
            .find(|record| record.get("id").and_then(Value::as_str) == Some(id))
            .ok_or_else(|| RemoteError::rejected(404, format!("no record {id}")))?;

        if let (Value::Object(existing), Value::Object(changes)) = (&mut *record, patch) {
            for (field, value) in changes {
                existing.insert(field, value);
            }
        }
        Ok(record.clone())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), RemoteError> {
        self.record_call(RemoteOp::Delete, collection, Some(id));
        self.check_reachable()?;

        let mut collections = self.lock_collections();
        let records = collections
            .get_mut(collection)
            .ok_or_else(|| RemoteError::rejected(404, format!("no such collection {collection}")))?;
        let before = records.len();
        records.retain(|record| record.get("id").and_then(Value::as_str) != Some(id));
        if records.len() == before {
            return Err(RemoteError::rejected(404, format!("no record {id}")));
        }
        Ok(())
    }

    async fn query(
        &self,
        collection: &str,
        filter: &RemoteFilter,
    ) -> Result<Vec<Value>, RemoteError> {
        self.record_call(RemoteOp::Query, collection, None);
        self.check_reachable()?;

        Ok(self
            .records(collection)
            .into_iter()
            .filter(|record| filter.matches(record))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn insert_mints_sequential_remote_ids() {
        let remote = FakeRemoteStore::new();
        let first = remote
            .insert("transactions", json!({"description": "Coffee"}))
            .await
            .unwrap();
        let second = remote
            .insert("transactions", json!({"description": "Tea"}))
            .await
            .unwrap();
        assert_eq!(first["id"], "rec-0001");
        assert_eq!(second["id"], "rec-0002");
        assert_eq!(remote.records("transactions").len(), 2);
    }

    #[tokio::test]
    async fn unavailable_fails_every_call() {
        let remote = FakeRemoteStore::new();
        remote.set_available(false);
        let err = remote
            .insert("transactions", json!({"description": "Coffee"}))
            .await
            .unwrap_err();
        assert!(matches!(err, RemoteError::Unavailable(_)));
        assert_eq!(remote.op_count(RemoteOp::Insert, "transactions"), 1);
    }

    #[tokio::test]
    async fn scripted_failures_are_consumed_in_order() {
        let remote = FakeRemoteStore::new();
        remote.script_failure(RemoteError::rejected(500, "boom"));
        let err = remote
            .query("accounts", &RemoteFilter::all())
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), Some(500));
        // next call succeeds
        assert!(remote.query("accounts", &RemoteFilter::all()).await.is_ok());
    }

    #[tokio::test]
    async fn update_merges_patch_fields() {
        let remote = FakeRemoteStore::new();
        remote.seed(
            "accounts",
            vec![json!({"id": "rec-9", "name": "Checking", "balance": 10.0})],
        );
        let updated = remote
            .update("accounts", "rec-9", json!({"balance": 25.0}))
            .await
            .unwrap();
        assert_eq!(updated["name"], "Checking");
        assert_eq!(updated["balance"], 25.0);
    }

    #[tokio::test]
    async fn delete_of_unknown_id_is_rejected() {
        let remote = FakeRemoteStore::new();
        remote.seed("goals", vec![json!({"id": "rec-1"})]);
        let err = remote.delete("goals", "rec-2").await.unwrap_err();
        assert_eq!(err.status_code(), Some(404));
    }
}
