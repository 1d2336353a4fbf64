//! Record contract and id namespace helpers.
//!
//! Every entity type handled by the engine implements [`SyncRecord`]. Ids
//! carry their confirmation state in a reserved namespace: a `local:` prefix
//! marks a record the remote store has not confirmed yet, anything else is an
//! authoritative remote id. The whole engine hangs off that one distinction.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::errors::{Error, Result};

/// Reserved namespace prefix for ids minted before remote confirmation.
pub const LOCAL_ID_PREFIX: &str = "local:";

/// Mint a fresh locally-namespaced id.
pub fn mint_local_id() -> String {
    format!("{LOCAL_ID_PREFIX}{}", Uuid::new_v4())
}

/// Whether an id belongs to the local (unconfirmed) namespace.
pub fn is_local_id(id: &str) -> bool {
    id.starts_with(LOCAL_ID_PREFIX)
}

/// Domain record synchronized through the engine.
///
/// `Draft` carries the fields of a record that does not exist yet (no id);
/// `Patch` is a partial update where unset fields are skipped during
/// serialization; `Filter` narrows collection reads in memory.
pub trait SyncRecord:
    Clone + Send + Sync + Serialize + DeserializeOwned + 'static
{
    type Draft: Serialize + Send;
    type Patch: Serialize + Send;
    type Filter: Send + Sync + Default;

    /// Remote collection name, also the durable cache key.
    fn collection() -> &'static str;

    /// Singular entity name used in errors and log lines.
    fn entity_name() -> &'static str;

    fn id(&self) -> &str;

    fn set_id(&mut self, id: String);

    /// Build the full record from a draft plus a minted id. Locally-assigned
    /// defaults (timestamps and the like) are filled in here.
    fn from_draft(draft: Self::Draft, id: String) -> Self;

    fn matches(&self, filter: &Self::Filter) -> bool;
}

/// Overlay a partial patch onto a record, field by field.
pub fn apply_patch<E: SyncRecord>(record: &E, patch: &E::Patch) -> Result<E> {
    apply_value_patch(record, &serde_json::to_value(patch)?)
}

/// Overlay an untyped patch document onto a record. Used when replaying
/// queued patches whose typed origin is no longer at hand.
pub fn apply_value_patch<E: SyncRecord>(record: &E, patch: &Value) -> Result<E> {
    let mut base = serde_json::to_value(record)?;
    if let (Value::Object(base), Value::Object(changes)) = (&mut base, patch) {
        for (field, value) in changes {
            base.insert(field.clone(), value.clone());
        }
    }
    serde_json::from_value(base).map_err(Error::from)
}

/// Serialize a record into a wire payload with the id stripped. The remote
/// mints authoritative ids; the local id travels separately as queue
/// bookkeeping.
pub fn payload_without_id<E: SyncRecord>(record: &E) -> Result<Value> {
    let mut payload = serde_json::to_value(record)?;
    if let Value::Object(fields) = &mut payload {
        fields.remove("id");
    }
    Ok(payload)
}

/// Rebuild a typed record from a stored payload and an id.
pub fn record_from_payload<E: SyncRecord>(payload: &Value, id: &str) -> Result<E> {
    let mut value = payload.clone();
    if let Value::Object(fields) = &mut value {
        fields.insert("id".to_string(), Value::String(id.to_string()));
    }
    serde_json::from_value(value).map_err(Error::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Note {
        id: String,
        title: String,
        pinned: bool,
    }

    #[derive(Serialize)]
    struct NoteDraft {
        title: String,
        pinned: bool,
    }

    #[derive(Default, Serialize)]
    #[serde(rename_all = "camelCase")]
    struct NotePatch {
        #[serde(skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pinned: Option<bool>,
    }

    impl SyncRecord for Note {
        type Draft = NoteDraft;
        type Patch = NotePatch;
        type Filter = ();

        fn collection() -> &'static str {
            "notes"
        }
        fn entity_name() -> &'static str {
            "note"
        }
        fn id(&self) -> &str {
            &self.id
        }
        fn set_id(&mut self, id: String) {
            self.id = id;
        }
        fn from_draft(draft: Self::Draft, id: String) -> Self {
            Note {
                id,
                title: draft.title,
                pinned: draft.pinned,
            }
        }
        fn matches(&self, _filter: &Self::Filter) -> bool {
            true
        }
    }

    #[test]
    fn minted_ids_are_local_and_unique() {
        let a = mint_local_id();
        let b = mint_local_id();
        assert!(is_local_id(&a));
        assert!(is_local_id(&b));
        assert_ne!(a, b);
        assert!(!is_local_id("rec-0001"));
    }

    #[test]
    fn patch_overlays_only_set_fields() {
        let note = Note {
            id: "rec-1".to_string(),
            title: "Groceries".to_string(),
            pinned: false,
        };
        let patched = apply_patch(
            &note,
            &NotePatch {
                pinned: Some(true),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(patched.title, "Groceries");
        assert!(patched.pinned);
        assert_eq!(patched.id, "rec-1");
    }

    #[test]
    fn payload_round_trip_restores_record_under_new_id() {
        let note = Note {
            id: mint_local_id(),
            title: "Rent".to_string(),
            pinned: true,
        };
        let payload = payload_without_id(&note).unwrap();
        assert!(payload.get("id").is_none());

        let restored: Note = record_from_payload(&payload, "rec-7").unwrap();
        assert_eq!(restored.id, "rec-7");
        assert_eq!(restored.title, "Rent");
    }
}
