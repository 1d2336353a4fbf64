//! Remote store client abstraction.
//!
//! The authoritative backend is reached through this narrow seam. The engine
//! treats every call as fallible and possibly slow; timeouts and transport
//! details belong to the implementation. Records cross the boundary as plain
//! JSON objects with a string `id` field.

mod fake;

pub use fake::{FakeRemoteStore, RemoteCall, RemoteOp};

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::RemoteError;

/// Field-equality constraints for remote queries.
///
/// An empty filter selects the caller's whole collection. Row ownership is
/// enforced by the remote's ambient identity, not by these constraints.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemoteFilter {
    constraints: Vec<(String, Value)>,
}

impl RemoteFilter {
    /// Filter selecting every record in the collection.
    pub fn all() -> Self {
        Self::default()
    }

    /// Add a field-equality constraint.
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.constraints.push((field.into(), value.into()));
        self
    }

    pub fn constraints(&self) -> &[(String, Value)] {
        &self.constraints
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    /// Evaluate the constraints against a record. Used by in-memory
    /// implementations; HTTP implementations translate constraints into
    /// query parameters instead.
    pub fn matches(&self, record: &Value) -> bool {
        self.constraints
            .iter()
            .all(|(field, expected)| record.get(field) == Some(expected))
    }
}

/// Narrow interface against the authoritative backend.
///
/// All calls authenticate with an ambient identity configured on the
/// implementation; the engine never manages credentials.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Insert a record. The remote mints the authoritative id and returns
    /// the stored record.
    async fn insert(&self, collection: &str, record: Value) -> Result<Value, RemoteError>;

    /// Apply a partial update to the record with the given id and return the
    /// updated record.
    async fn update(&self, collection: &str, id: &str, patch: Value)
        -> Result<Value, RemoteError>;

    /// Delete the record with the given id.
    async fn delete(&self, collection: &str, id: &str) -> Result<(), RemoteError>;

    /// Fetch the records matching `filter`.
    async fn query(&self, collection: &str, filter: &RemoteFilter)
        -> Result<Vec<Value>, RemoteError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_filter_matches_everything() {
        let filter = RemoteFilter::all();
        assert!(filter.is_empty());
        assert!(filter.matches(&json!({"id": "a"})));
    }

    #[test]
    fn constraints_all_must_hold() {
        let filter = RemoteFilter::all()
            .eq("category", "groceries")
            .eq("accountId", "acc-1");
        assert!(filter.matches(&json!({
            "id": "a", "category": "groceries", "accountId": "acc-1"
        })));
        assert!(!filter.matches(&json!({
            "id": "b", "category": "groceries", "accountId": "acc-2"
        })));
    }
}
