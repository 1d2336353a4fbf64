//! Structured events emitted by the sync engine.
//!
//! The engine never renders user-facing messaging itself. Runtime bridges
//! implement [`SyncEventSink`] to surface toasts, badges, or telemetry from
//! these events.

use serde::{Deserialize, Serialize};

use crate::sync::DrainReport;

/// Events describing sync engine activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SyncEvent {
    /// A mutation was written locally and queued for later sync.
    #[serde(rename_all = "camelCase")]
    RecordQueued { entity: String, entity_id: String },

    /// A queued record was confirmed by the remote store.
    #[serde(rename_all = "camelCase")]
    RecordConfirmed {
        entity: String,
        local_id: String,
        remote_id: String,
    },

    /// A queue entry was dropped after repeated permanent rejections.
    #[serde(rename_all = "camelCase")]
    EntryDropped {
        entity: String,
        entity_id: String,
        reason: String,
    },

    /// A drain pass over an entity queue finished.
    #[serde(rename_all = "camelCase")]
    DrainCompleted { entity: String, report: DrainReport },

    /// A durable cache write failed and was absorbed as a no-op.
    #[serde(rename_all = "camelCase")]
    CacheWriteFailed { entity: String, detail: String },
}

impl SyncEvent {
    pub fn record_queued(entity: &str, entity_id: impl Into<String>) -> Self {
        Self::RecordQueued {
            entity: entity.to_string(),
            entity_id: entity_id.into(),
        }
    }

    pub fn record_confirmed(
        entity: &str,
        local_id: impl Into<String>,
        remote_id: impl Into<String>,
    ) -> Self {
        Self::RecordConfirmed {
            entity: entity.to_string(),
            local_id: local_id.into(),
            remote_id: remote_id.into(),
        }
    }

    pub fn entry_dropped(
        entity: &str,
        entity_id: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::EntryDropped {
            entity: entity.to_string(),
            entity_id: entity_id.into(),
            reason: reason.into(),
        }
    }

    pub fn drain_completed(entity: &str, report: DrainReport) -> Self {
        Self::DrainCompleted {
            entity: entity.to_string(),
            report,
        }
    }

    pub fn cache_write_failed(entity: &str, detail: impl Into<String>) -> Self {
        Self::CacheWriteFailed {
            entity: entity.to_string(),
            detail: detail.into(),
        }
    }
}

/// Sink for sync engine events. Implementations must be cheap and
/// non-blocking; the engine emits from inside its own control flow.
pub trait SyncEventSink: Send + Sync {
    fn emit(&self, event: SyncEvent);
}

/// Sink that discards all events.
pub struct NoOpSyncEventSink;

impl SyncEventSink for NoOpSyncEventSink {
    fn emit(&self, _event: SyncEvent) {}
}
