//! Entity synchronizer: optimistic writes, offline fallback, queue drain.

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::Mutex;

use crate::errors::{Error, RemoteError, Result, RetryClass, WriteOp};
use crate::events::{SyncEvent, SyncEventSink};
use crate::remote::{RemoteFilter, RemoteStore};
use crate::store::{as_collection, LocalStore};
use crate::sync::connectivity::ConnectivityMonitor;
use crate::sync::queue::{QueueEntry, QueueOperation, SyncQueue, SyncQueueStats};
use crate::sync::record::{
    apply_patch, apply_value_patch, is_local_id, mint_local_id, payload_without_id,
    record_from_payload, SyncRecord,
};

/// Attempts after which a permanently-rejected queue entry is dropped.
pub const MAX_DRAIN_ATTEMPTS: u32 = 5;

/// Outcome of one drain pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrainStatus {
    /// Every pending entry was attempted.
    Completed,
    /// Another drain held the guard; nothing was attempted.
    Coalesced,
    /// The monitor reported offline; nothing was attempted.
    Offline,
}

/// Metrics for one drain pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrainReport {
    pub status: DrainStatus,
    pub processed: usize,
    pub confirmed: usize,
    pub failed: usize,
    pub dropped: usize,
    pub duration_ms: i64,
}

impl DrainReport {
    fn skipped(status: DrainStatus) -> Self {
        Self {
            status,
            processed: 0,
            confirmed: 0,
            failed: 0,
            dropped: 0,
            duration_ms: 0,
        }
    }
}

/// Object-safe drain handle, one per registered entity type.
#[async_trait]
pub trait Drainable: Send + Sync {
    fn entity(&self) -> &'static str;
    fn pending(&self) -> usize;
    async fn drain_pending(&self) -> Result<DrainReport>;
}

/// Local-first orchestrator for one entity type.
///
/// Every instantiation follows the same protocol: writes go to the remote
/// when the monitor reports online and mirror into the durable cache; while
/// offline (or when the remote call fails) creates fall back to a local-id
/// record plus a queue entry, and the queue is drained against the remote
/// once connectivity returns, rewriting local ids to the authoritative ones
/// as confirmations arrive.
pub struct EntitySynchronizer<E: SyncRecord> {
    store: Arc<dyn LocalStore>,
    remote: Arc<dyn RemoteStore>,
    connectivity: Arc<ConnectivityMonitor>,
    events: Arc<dyn SyncEventSink>,
    queue: SyncQueue,
    drain_guard: Mutex<()>,
    _entity: PhantomData<E>,
}

impl<E: SyncRecord> EntitySynchronizer<E> {
    pub fn new(
        store: Arc<dyn LocalStore>,
        remote: Arc<dyn RemoteStore>,
        connectivity: Arc<ConnectivityMonitor>,
        events: Arc<dyn SyncEventSink>,
    ) -> Self {
        let queue = SyncQueue::new(Arc::clone(&store), E::collection(), E::entity_name());
        Self {
            store,
            remote,
            connectivity,
            events,
            queue,
            drain_guard: Mutex::new(()),
            _entity: PhantomData,
        }
    }

    /// Create a record. Returns the remote-confirmed record when the write
    /// lands, or the local-id placeholder when it was queued; callers needing
    /// to distinguish the two must inspect the id namespace.
    pub async fn create(&self, draft: E::Draft) -> Result<E> {
        let record = E::from_draft(draft, mint_local_id());
        self.upsert_snapshot(&record);

        if self.connectivity.is_online() {
            match self.try_remote_insert(&record).await {
                Ok(confirmed) => return Ok(confirmed),
                Err(err) => {
                    log::warn!(
                        "[Sync] {} insert failed, keeping local copy and queueing: {err}",
                        E::entity_name()
                    );
                }
            }
        }

        self.queue
            .enqueue_create(record.id(), payload_without_id(&record)?);
        self.events
            .emit(SyncEvent::record_queued(E::entity_name(), record.id()));
        Ok(record)
    }

    /// Apply a partial update.
    ///
    /// Unconfirmed records are patched locally and their pending create entry
    /// amended in place, so any number of offline edits still yields exactly
    /// one remote insert. Confirmed records require connectivity; offline
    /// updates of them fail with [`Error::OfflineWrite`].
    pub async fn update(&self, id: &str, patch: E::Patch) -> Result<E> {
        if is_local_id(id) {
            let snapshot = self.read_snapshot();
            let record = snapshot
                .iter()
                .find(|record| record.id() == id)
                .ok_or_else(|| Error::not_found(E::entity_name(), id))?;
            let updated = apply_patch(record, &patch)?;
            self.upsert_snapshot(&updated);
            self.queue.enqueue_create(id, payload_without_id(&updated)?);
            return Ok(updated);
        }

        if !self.connectivity.is_online() {
            return Err(Error::offline_write(E::entity_name(), id, WriteOp::Update));
        }
        let response = self
            .remote
            .update(E::collection(), id, serde_json::to_value(&patch)?)
            .await?;
        let confirmed: E = serde_json::from_value(response)?;
        self.upsert_snapshot(&confirmed);
        Ok(confirmed)
    }

    /// Delete a record. Unconfirmed records disappear locally along with
    /// their pending create entry; the remote never learns they existed.
    /// Confirmed records require connectivity, as with update.
    pub async fn delete(&self, id: &str) -> Result<()> {
        if is_local_id(id) {
            self.remove_from_snapshot(id);
            self.queue.remove(id);
            return Ok(());
        }

        if !self.connectivity.is_online() {
            return Err(Error::offline_write(E::entity_name(), id, WriteOp::Delete));
        }
        self.remote.delete(E::collection(), id).await?;
        self.remove_from_snapshot(id);
        Ok(())
    }

    /// Fetch the collection, remote-fresh when possible.
    ///
    /// A successful remote query replaces the whole cache snapshot, but only
    /// after pending queue entries are re-applied on top of the fetched
    /// collection. Skipping that re-application would silently discard
    /// records created or edited offline that the remote has not seen yet.
    pub async fn get_all(&self, filter: &E::Filter) -> Result<Vec<E>> {
        if self.connectivity.is_online() {
            match self.remote.query(E::collection(), &RemoteFilter::all()).await {
                Ok(values) => {
                    let fetched = self.decode_records(values);
                    let merged = self.overlay_pending(fetched);
                    self.write_snapshot(&merged);
                    return Ok(Self::apply_filter(merged, filter));
                }
                Err(err) => {
                    log::debug!(
                        "[Sync] {} query failed, serving cached snapshot: {err}",
                        E::entity_name()
                    );
                }
            }
        }
        Ok(Self::apply_filter(self.read_snapshot(), filter))
    }

    /// Push every pending queue entry to the remote, FIFO.
    ///
    /// Re-entrant calls coalesce: if a drain is already running the new call
    /// returns immediately instead of double-submitting the same entries.
    /// A failing entry is recorded and skipped so it cannot starve the rest;
    /// entries rejected permanently are dropped after [`MAX_DRAIN_ATTEMPTS`].
    pub async fn drain(&self) -> Result<DrainReport> {
        let Ok(_guard) = self.drain_guard.try_lock() else {
            log::debug!(
                "[Sync] {} drain already in progress, coalescing",
                E::entity_name()
            );
            return Ok(DrainReport::skipped(DrainStatus::Coalesced));
        };
        if !self.connectivity.is_online() {
            return Ok(DrainReport::skipped(DrainStatus::Offline));
        }

        let started_at = std::time::Instant::now();
        let pending = self.queue.list_pending();
        let mut report = DrainReport {
            status: DrainStatus::Completed,
            processed: pending.len(),
            confirmed: 0,
            failed: 0,
            dropped: 0,
            duration_ms: 0,
        };
        if pending.is_empty() {
            log::debug!("[Sync] No pending {} entries to drain", E::entity_name());
            return Ok(report);
        }

        for entry in pending {
            let outcome = match entry.operation {
                QueueOperation::Create => self.drain_create(&entry).await,
                QueueOperation::Update => self.drain_update(&entry).await,
            };
            match outcome {
                Ok(()) => {
                    self.queue.remove(&entry.entity_id);
                    report.confirmed += 1;
                }
                Err(err) => {
                    let attempts = self.queue.record_failure(&entry.entity_id, &err.to_string());
                    if retry_class_of(&err) == RetryClass::Permanent
                        && attempts >= MAX_DRAIN_ATTEMPTS
                    {
                        log::error!(
                            "[Sync] Dropping {} entry '{}' after {attempts} permanent rejections: {err}",
                            E::entity_name(),
                            entry.entity_id
                        );
                        self.queue.remove(&entry.entity_id);
                        self.events.emit(SyncEvent::entry_dropped(
                            E::entity_name(),
                            &entry.entity_id,
                            err.to_string(),
                        ));
                        report.dropped += 1;
                    } else {
                        log::warn!(
                            "[Sync] {} {} of '{}' failed (attempt {attempts}), will retry: {err}",
                            E::entity_name(),
                            entry.operation.as_str(),
                            entry.entity_id
                        );
                        report.failed += 1;
                    }
                }
            }
        }

        report.duration_ms = started_at.elapsed().as_millis() as i64;
        log::info!(
            "[Sync] Drained {} queue: {} confirmed, {} failed, {} dropped in {}ms",
            E::entity_name(),
            report.confirmed,
            report.failed,
            report.dropped,
            report.duration_ms
        );
        self.events
            .emit(SyncEvent::drain_completed(E::entity_name(), report.clone()));
        Ok(report)
    }

    /// Queue summary for status surfaces.
    pub fn queue_stats(&self) -> SyncQueueStats {
        self.queue.stats()
    }

    // ─── drain steps ─────────────────────────────────────────────────────────

    async fn drain_create(&self, entry: &QueueEntry) -> Result<()> {
        // Decode before the insert: a payload that cannot round-trip must
        // fail while the remote still knows nothing about it.
        let local: E = record_from_payload(&entry.payload, &entry.entity_id)?;
        let response = self
            .remote
            .insert(E::collection(), entry.payload.clone())
            .await?;
        let mut confirmed = self.adopt_confirmed(&local, response)?;

        // An update may have amended this entry while the insert was in
        // flight. The insert landed with the older payload, so the amended
        // fields are carried onto the confirmed record and re-queued as an
        // update under the authoritative id; plain removal would drop them.
        if let Some(amended) = self.queue.amended_payload(&entry.entity_id, &entry.payload) {
            match apply_value_patch(&confirmed, &amended) {
                Ok(patched) => {
                    confirmed = patched;
                    self.queue.enqueue_update(confirmed.id(), amended);
                }
                Err(err) => log::warn!(
                    "[Sync] Dropping unreadable in-flight amendment of {} '{}': {err}",
                    E::entity_name(),
                    entry.entity_id
                ),
            }
        }
        self.reconcile_local_id(&entry.entity_id, &confirmed);
        self.events.emit(SyncEvent::record_confirmed(
            E::entity_name(),
            &entry.entity_id,
            confirmed.id(),
        ));
        Ok(())
    }

    async fn drain_update(&self, entry: &QueueEntry) -> Result<()> {
        let response = self
            .remote
            .update(E::collection(), &entry.entity_id, entry.payload.clone())
            .await?;
        if let Ok(confirmed) = serde_json::from_value::<E>(response) {
            self.upsert_snapshot(&confirmed);
        }
        Ok(())
    }

    /// Replace the local-id record with its confirmed form. One whole-snapshot
    /// write, so a concurrent reader sees either the old id or the new one,
    /// never both, and the local id does not survive anywhere in the snapshot.
    fn reconcile_local_id(&self, local_id: &str, confirmed: &E) {
        let mut records = self.read_snapshot();
        let mut replaced = false;
        for slot in records.iter_mut() {
            if slot.id() == local_id {
                *slot = confirmed.clone();
                replaced = true;
            }
        }
        if !replaced {
            // Snapshot was wiped or never held the record; restore it under
            // the authoritative id.
            records.push(confirmed.clone());
        }
        self.write_snapshot(&records);
    }

    // ─── remote helpers ──────────────────────────────────────────────────────

    async fn try_remote_insert(&self, record: &E) -> Result<E> {
        let response = self
            .remote
            .insert(E::collection(), payload_without_id(record)?)
            .await?;
        let confirmed = self.adopt_confirmed(record, response)?;
        self.replace_snapshot_record(record.id(), &confirmed);
        Ok(confirmed)
    }

    /// Turn an insert response into the confirmed record. A response that
    /// fails to decode but still carries an id means the insert landed; the
    /// local fields are kept and only the id adopted, because retrying the
    /// insert would duplicate the record remotely.
    fn adopt_confirmed(&self, local: &E, response: Value) -> Result<E> {
        match serde_json::from_value::<E>(response.clone()) {
            Ok(confirmed) => Ok(confirmed),
            Err(decode_err) => match response.get("id").and_then(Value::as_str) {
                Some(remote_id) => {
                    log::warn!(
                        "[Sync] Undecodable {} insert response, adopting id '{remote_id}' only: {decode_err}",
                        E::entity_name()
                    );
                    let mut adopted = local.clone();
                    adopted.set_id(remote_id.to_string());
                    Ok(adopted)
                }
                None => Err(Error::Remote(RemoteError::malformed(format!(
                    "insert response carries no id: {decode_err}"
                )))),
            },
        }
    }

    // ─── snapshot helpers ────────────────────────────────────────────────────

    fn read_snapshot(&self) -> Vec<E> {
        self.decode_records(as_collection(self.store.read(E::collection())))
    }

    fn write_snapshot(&self, records: &[E]) {
        match serde_json::to_value(records) {
            Ok(document) => {
                if let Err(err) = self.store.write(E::collection(), &document) {
                    self.note_cache_failure(err.to_string());
                }
            }
            Err(err) => self.note_cache_failure(err.to_string()),
        }
    }

    fn upsert_snapshot(&self, record: &E) {
        match serde_json::to_value(record) {
            Ok(value) => {
                if let Err(err) = self.store.upsert(E::collection(), &value) {
                    self.note_cache_failure(err.to_string());
                }
            }
            Err(err) => self.note_cache_failure(err.to_string()),
        }
    }

    fn remove_from_snapshot(&self, id: &str) {
        if let Err(err) = self.store.remove(E::collection(), id) {
            self.note_cache_failure(err.to_string());
        }
    }

    fn replace_snapshot_record(&self, old_id: &str, record: &E) {
        let mut records = self.read_snapshot();
        match records.iter_mut().find(|slot| slot.id() == old_id) {
            Some(slot) => *slot = record.clone(),
            None => records.push(record.clone()),
        }
        self.write_snapshot(&records);
    }

    /// Re-apply pending queue entries over a freshly fetched collection.
    fn overlay_pending(&self, mut records: Vec<E>) -> Vec<E> {
        for entry in self.queue.list_pending() {
            match entry.operation {
                QueueOperation::Create => {
                    match record_from_payload::<E>(&entry.payload, &entry.entity_id) {
                        Ok(pending) => {
                            match records.iter_mut().find(|slot| slot.id() == entry.entity_id) {
                                Some(slot) => *slot = pending,
                                None => records.push(pending),
                            }
                        }
                        Err(err) => log::warn!(
                            "[Sync] Unreadable pending {} create '{}' skipped: {err}",
                            E::entity_name(),
                            entry.entity_id
                        ),
                    }
                }
                QueueOperation::Update => {
                    if let Some(slot) =
                        records.iter_mut().find(|slot| slot.id() == entry.entity_id)
                    {
                        match apply_value_patch(slot, &entry.payload) {
                            Ok(patched) => *slot = patched,
                            Err(err) => log::warn!(
                                "[Sync] Unreadable pending {} patch '{}' skipped: {err}",
                                E::entity_name(),
                                entry.entity_id
                            ),
                        }
                    }
                }
            }
        }
        records
    }

    fn decode_records(&self, values: Vec<Value>) -> Vec<E> {
        values
            .into_iter()
            .filter_map(|value| match serde_json::from_value::<E>(value) {
                Ok(record) => Some(record),
                Err(err) => {
                    log::warn!(
                        "[Sync] Skipping undecodable {} record: {err}",
                        E::entity_name()
                    );
                    None
                }
            })
            .collect()
    }

    fn apply_filter(records: Vec<E>, filter: &E::Filter) -> Vec<E> {
        records
            .into_iter()
            .filter(|record| record.matches(filter))
            .collect()
    }

    fn note_cache_failure(&self, detail: String) {
        log::error!(
            "[Sync] {} cache write failed, continuing without it: {detail}",
            E::entity_name()
        );
        self.events
            .emit(SyncEvent::cache_write_failed(E::entity_name(), detail));
    }
}

#[async_trait]
impl<E: SyncRecord> Drainable for EntitySynchronizer<E> {
    fn entity(&self) -> &'static str {
        E::entity_name()
    }

    fn pending(&self) -> usize {
        self.queue.len()
    }

    async fn drain_pending(&self) -> Result<DrainReport> {
        self.drain().await
    }
}

fn retry_class_of(err: &Error) -> RetryClass {
    match err {
        Error::Remote(remote) => remote.retry_class(),
        Error::Serialization(_) => RetryClass::Permanent,
        _ => RetryClass::Retryable,
    }
}
