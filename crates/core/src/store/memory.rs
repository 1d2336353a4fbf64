//! In-memory store for tests and ephemeral sessions.

use std::collections::HashMap;
use std::sync::RwLock;

use serde_json::Value;

use crate::errors::StoreError;
use crate::store::LocalStore;

/// [`LocalStore`] backed by a process-local map. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryStore {
    documents: RwLock<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently holding a document.
    pub fn key_count(&self) -> usize {
        match self.documents.read() {
            Ok(documents) => documents.len(),
            Err(_) => 0,
        }
    }
}

impl LocalStore for MemoryStore {
    fn read(&self, key: &str) -> Value {
        match self.documents.read() {
            Ok(documents) => documents.get(key).cloned().unwrap_or(Value::Null),
            Err(poisoned) => {
                log::error!("[MemoryStore] Lock poisoned on read of '{key}'");
                poisoned
                    .into_inner()
                    .get(key)
                    .cloned()
                    .unwrap_or(Value::Null)
            }
        }
    }

    fn write(&self, key: &str, document: &Value) -> Result<(), StoreError> {
        let mut documents = self
            .documents
            .write()
            .map_err(|_| StoreError::backend("lock poisoned"))?;
        documents.insert(key.to_string(), document.clone());
        Ok(())
    }
}
