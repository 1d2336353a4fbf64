//! [`LocalStore`] backed by a single SQLite document table.
//!
//! Each cache key maps to one row holding the serialized JSON document.
//! Writes replace the whole row, matching the engine's whole-document write
//! semantics; the table never accumulates history.

use chrono::Utc;
use diesel::prelude::*;
use pocketledger_core::errors::StoreError;
use pocketledger_core::store::LocalStore;
use serde_json::Value;

use crate::db::{create_pool, get_connection, run_migrations, DbPool};
use crate::errors::StorageError;
use crate::model::CollectionRowDB;
use crate::schema::collections;

pub struct SqliteStore {
    pool: DbPool,
}

impl SqliteStore {
    /// Open (or create) the database file at `database_url` and bring its
    /// schema up to date.
    pub fn open(database_url: &str) -> Result<Self, StorageError> {
        let pool = create_pool(database_url)?;
        let mut conn = get_connection(&pool)?;
        run_migrations(&mut conn)?;
        Ok(Self { pool })
    }

    /// Wrap an existing pool whose schema is already migrated.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn try_read(&self, key: &str) -> Result<Option<Value>, StorageError> {
        let mut conn = get_connection(&self.pool)?;
        let stored: Option<String> = collections::table
            .filter(collections::collection_key.eq(key))
            .select(collections::payload)
            .first::<String>(&mut conn)
            .optional()?;
        match stored {
            None => Ok(None),
            Some(text) => serde_json::from_str(&text)
                .map(Some)
                .map_err(|err| StorageError::Serialization(err.to_string())),
        }
    }

    fn try_write(&self, key: &str, document: &Value) -> Result<(), StorageError> {
        let row = CollectionRowDB {
            collection_key: key.to_string(),
            payload: serde_json::to_string(document)
                .map_err(|err| StorageError::Serialization(err.to_string()))?,
            updated_at: Utc::now().to_rfc3339(),
        };
        let mut conn = get_connection(&self.pool)?;
        diesel::insert_into(collections::table)
            .values(&row)
            .on_conflict(collections::collection_key)
            .do_update()
            .set(&row)
            .execute(&mut conn)?;
        Ok(())
    }
}

impl LocalStore for SqliteStore {
    fn read(&self, key: &str) -> Value {
        match self.try_read(key) {
            Ok(Some(document)) => document,
            Ok(None) => Value::Null,
            Err(err) => {
                log::error!("[SqliteStore] Failed to read '{key}', treating as empty: {err}");
                Value::Null
            }
        }
    }

    fn write(&self, key: &str, document: &Value) -> Result<(), StoreError> {
        self.try_write(key, document).map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn open_store(dir: &TempDir) -> SqliteStore {
        let path = dir.path().join("ledger.db");
        SqliteStore::open(path.to_str().unwrap()).unwrap()
    }

    #[test]
    fn read_of_missing_key_is_null() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        assert!(store.read("transactions").is_null());
    }

    #[test]
    fn write_then_read_round_trips() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        let document = json!([{"id": "rec-1", "description": "Coffee", "amount": 5.0}]);

        store.write("transactions", &document).unwrap();
        assert_eq!(store.read("transactions"), document);
    }

    #[test]
    fn write_replaces_the_previous_document() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        store.write("goals", &json!([{"id": "a"}])).unwrap();
        store
            .write("goals", &json!([{"id": "a"}, {"id": "b"}]))
            .unwrap();

        let stored = store.read("goals");
        assert_eq!(stored.as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn keys_are_independent() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        store.write("transactions", &json!([1, 2])).unwrap();
        store.write("transactions.sync_queue", &json!({"nextSeq": 3})).unwrap();

        assert_eq!(store.read("transactions"), json!([1, 2]));
        assert_eq!(store.read("transactions.sync_queue")["nextSeq"], 3);
    }

    #[test]
    fn documents_survive_reopening_the_database() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.db");
        {
            let store = SqliteStore::open(path.to_str().unwrap()).unwrap();
            store.write("budgets", &json!([{"id": "rec-1"}])).unwrap();
        }

        let reopened = SqliteStore::open(path.to_str().unwrap()).unwrap();
        assert_eq!(reopened.read("budgets")[0]["id"], "rec-1");
    }

    #[test]
    fn corrupt_payload_reads_as_null() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        let row = CollectionRowDB {
            collection_key: "accounts".to_string(),
            payload: "not json at all".to_string(),
            updated_at: Utc::now().to_rfc3339(),
        };
        let mut conn = get_connection(&store.pool).unwrap();
        diesel::insert_into(collections::table)
            .values(&row)
            .execute(&mut conn)
            .unwrap();

        assert!(store.read("accounts").is_null());
    }
}
