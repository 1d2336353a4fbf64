//! Durable queue of not-yet-confirmed mutations, one per entity type.
//!
//! Entries live in a map keyed by entity id so repeated edits of the same
//! unconfirmed record collapse into a single eventual insert, while a
//! monotonic sequence number preserves FIFO order across entities for the
//! drain. The whole state is persisted as one document in the same durable
//! medium as the cache snapshots.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::store::LocalStore;

/// Mutation kinds a queue entry can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueOperation {
    Create,
    Update,
}

impl QueueOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueueOperation::Create => "create",
            QueueOperation::Update => "update",
        }
    }
}

/// One pending mutation. `payload` is the full record (id stripped) for
/// creates and the partial patch for updates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueEntry {
    pub entity_id: String,
    pub operation: QueueOperation,
    pub payload: Value,
    pub enqueued_at: DateTime<Utc>,
    pub seq: u64,
    #[serde(default)]
    pub attempts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

/// Persisted queue document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueueState {
    next_seq: u64,
    entries: HashMap<String, QueueEntry>,
}

/// Point-in-time queue summary for status surfaces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncQueueStats {
    pub pending: usize,
    pub oldest_enqueued_at: Option<DateTime<Utc>>,
}

/// Durable cache key holding the queue for a collection.
pub fn queue_key(collection: &str) -> String {
    format!("{collection}.sync_queue")
}

/// Durable, ordered record of pending mutations for one entity type.
///
/// Persistence failures are logged and absorbed: losing the queue degrades to
/// "offline mutations are lost when the session ends", never to a crash.
pub struct SyncQueue {
    store: Arc<dyn LocalStore>,
    key: String,
    entity: &'static str,
}

impl SyncQueue {
    pub fn new(store: Arc<dyn LocalStore>, collection: &str, entity: &'static str) -> Self {
        Self {
            store,
            key: queue_key(collection),
            entity,
        }
    }

    /// Enqueue a create for an unconfirmed record, or amend the payload of
    /// the pending entry if one already exists for this id. Amending keeps
    /// the original sequence number so cross-entity FIFO order is stable, and
    /// resets failure bookkeeping since the payload changed.
    pub fn enqueue_create(&self, entity_id: &str, payload: Value) {
        let mut state = self.load();
        match state.entries.get_mut(entity_id) {
            Some(entry) => {
                entry.payload = payload;
                entry.attempts = 0;
                entry.last_error = None;
            }
            None => {
                let entry = self.fresh_entry(&mut state, entity_id, QueueOperation::Create, payload);
                state.entries.insert(entity_id.to_string(), entry);
            }
        }
        self.save(&state);
    }

    /// Enqueue a partial update. Merges into an existing pending entry when
    /// present: onto a pending create's full payload, or field-by-field onto
    /// an earlier pending patch.
    pub fn enqueue_update(&self, entity_id: &str, patch: Value) {
        let mut state = self.load();
        match state.entries.get_mut(entity_id) {
            Some(entry) => {
                merge_fields(&mut entry.payload, patch);
                entry.attempts = 0;
                entry.last_error = None;
            }
            None => {
                let entry = self.fresh_entry(&mut state, entity_id, QueueOperation::Update, patch);
                state.entries.insert(entity_id.to_string(), entry);
            }
        }
        self.save(&state);
    }

    /// Pending entries in FIFO order.
    pub fn list_pending(&self) -> Vec<QueueEntry> {
        let state = self.load();
        let mut entries: Vec<QueueEntry> = state.entries.into_values().collect();
        entries.sort_by_key(|entry| entry.seq);
        entries
    }

    /// Current payload of the pending entry for `entity_id` when it no
    /// longer matches `sent`, meaning the entry was amended after `sent` was
    /// handed to the remote. `None` when the entry is gone or unchanged.
    pub fn amended_payload(&self, entity_id: &str, sent: &Value) -> Option<Value> {
        let state = self.load();
        let entry = state.entries.get(entity_id)?;
        if entry.payload == *sent {
            None
        } else {
            Some(entry.payload.clone())
        }
    }

    /// Drop the entry for an entity id, if any.
    pub fn remove(&self, entity_id: &str) {
        let mut state = self.load();
        if state.entries.remove(entity_id).is_some() {
            self.save(&state);
        }
    }

    /// Record a failed drain attempt and return the attempt count so far.
    pub fn record_failure(&self, entity_id: &str, error: &str) -> u32 {
        let mut state = self.load();
        let attempts = match state.entries.get_mut(entity_id) {
            Some(entry) => {
                entry.attempts += 1;
                entry.last_error = Some(error.to_string());
                entry.attempts
            }
            None => 0,
        };
        self.save(&state);
        attempts
    }

    pub fn len(&self) -> usize {
        self.load().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.load().entries.is_empty()
    }

    pub fn stats(&self) -> SyncQueueStats {
        let state = self.load();
        SyncQueueStats {
            pending: state.entries.len(),
            oldest_enqueued_at: state
                .entries
                .values()
                .min_by_key(|entry| entry.seq)
                .map(|entry| entry.enqueued_at),
        }
    }

    fn fresh_entry(
        &self,
        state: &mut QueueState,
        entity_id: &str,
        operation: QueueOperation,
        payload: Value,
    ) -> QueueEntry {
        let seq = state.next_seq;
        state.next_seq += 1;
        QueueEntry {
            entity_id: entity_id.to_string(),
            operation,
            payload,
            enqueued_at: Utc::now(),
            seq,
            attempts: 0,
            last_error: None,
        }
    }

    fn load(&self) -> QueueState {
        let document = self.store.read(&self.key);
        if document.is_null() {
            return QueueState::default();
        }
        match serde_json::from_value(document) {
            Ok(state) => state,
            Err(err) => {
                log::error!(
                    "[SyncQueue] Unreadable {} queue document, starting empty: {err}",
                    self.entity
                );
                QueueState::default()
            }
        }
    }

    fn save(&self, state: &QueueState) {
        let document = match serde_json::to_value(state) {
            Ok(document) => document,
            Err(err) => {
                log::error!("[SyncQueue] Failed to serialize {} queue: {err}", self.entity);
                return;
            }
        };
        if let Err(err) = self.store.write(&self.key, &document) {
            log::error!("[SyncQueue] Failed to persist {} queue: {err}", self.entity);
        }
    }
}

fn merge_fields(payload: &mut Value, patch: Value) {
    if let (Value::Object(base), Value::Object(changes)) = (payload, patch) {
        for (field, value) in changes {
            base.insert(field, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn queue(store: &Arc<MemoryStore>) -> SyncQueue {
        SyncQueue::new(Arc::clone(store) as Arc<dyn LocalStore>, "transactions", "transaction")
    }

    #[test]
    fn fifo_order_follows_enqueue_sequence() {
        let store = Arc::new(MemoryStore::new());
        let q = queue(&store);
        q.enqueue_create("local:a", json!({"description": "Coffee"}));
        q.enqueue_create("local:b", json!({"description": "Tea"}));
        q.enqueue_create("local:c", json!({"description": "Rent"}));

        let ids: Vec<String> = q.list_pending().into_iter().map(|e| e.entity_id).collect();
        assert_eq!(ids, vec!["local:a", "local:b", "local:c"]);
    }

    #[test]
    fn amending_a_create_keeps_its_place_in_line() {
        let store = Arc::new(MemoryStore::new());
        let q = queue(&store);
        q.enqueue_create("local:a", json!({"amount": 5.0}));
        q.enqueue_create("local:b", json!({"amount": 7.0}));
        // edit the first record again while still offline
        q.enqueue_create("local:a", json!({"amount": 9.0}));

        let pending = q.list_pending();
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].entity_id, "local:a");
        assert_eq!(pending[0].payload["amount"], 9.0);
        assert_eq!(pending[0].operation, QueueOperation::Create);
    }

    #[test]
    fn update_patch_merges_onto_pending_create() {
        let store = Arc::new(MemoryStore::new());
        let q = queue(&store);
        q.enqueue_create("local:a", json!({"description": "Coffee", "amount": 5.0}));
        q.enqueue_update("local:a", json!({"amount": 6.5}));

        let pending = q.list_pending();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].operation, QueueOperation::Create);
        assert_eq!(pending[0].payload["description"], "Coffee");
        assert_eq!(pending[0].payload["amount"], 6.5);
    }

    #[test]
    fn queue_survives_reconstruction_over_same_store() {
        let store = Arc::new(MemoryStore::new());
        queue(&store).enqueue_create("local:a", json!({"amount": 1.0}));

        let reopened = queue(&store);
        assert_eq!(reopened.len(), 1);
        assert_eq!(reopened.list_pending()[0].entity_id, "local:a");
    }

    #[test]
    fn amended_payload_reports_changes_since_a_snapshot() {
        let store = Arc::new(MemoryStore::new());
        let q = queue(&store);
        q.enqueue_create("local:a", json!({"amount": 5.0}));
        let sent = q.list_pending()[0].payload.clone();

        assert!(q.amended_payload("local:a", &sent).is_none());

        q.enqueue_create("local:a", json!({"amount": 9.0}));
        assert_eq!(
            q.amended_payload("local:a", &sent),
            Some(json!({"amount": 9.0}))
        );

        q.remove("local:a");
        assert!(q.amended_payload("local:a", &sent).is_none());
    }

    #[test]
    fn failure_bookkeeping_counts_attempts() {
        let store = Arc::new(MemoryStore::new());
        let q = queue(&store);
        q.enqueue_create("local:a", json!({}));
        assert_eq!(q.record_failure("local:a", "500 boom"), 1);
        assert_eq!(q.record_failure("local:a", "500 boom"), 2);
        let entry = &q.list_pending()[0];
        assert_eq!(entry.attempts, 2);
        assert_eq!(entry.last_error.as_deref(), Some("500 boom"));
    }

    #[test]
    fn corrupt_queue_document_starts_empty() {
        let store = Arc::new(MemoryStore::new());
        store
            .write(&queue_key("transactions"), &json!({"bogus": true, "entries": 3}))
            .unwrap();
        let q = queue(&store);
        assert!(q.is_empty());
    }

    #[test]
    fn stats_report_oldest_pending_entry() {
        let store = Arc::new(MemoryStore::new());
        let q = queue(&store);
        assert_eq!(q.stats().pending, 0);
        assert!(q.stats().oldest_enqueued_at.is_none());

        q.enqueue_create("local:a", json!({}));
        q.enqueue_create("local:b", json!({}));
        let stats = q.stats();
        assert_eq!(stats.pending, 2);
        let first = q.list_pending()[0].enqueued_at;
        assert_eq!(stats.oldest_enqueued_at, Some(first));
    }
}
