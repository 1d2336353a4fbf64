//! Transaction service exposed to the presentation layer.

use std::sync::Arc;

use async_trait::async_trait;

use crate::errors::Result;
use crate::sync::{DrainReport, EntitySynchronizer, SyncQueueStats};
use crate::transactions::{
    summarize_transactions, NewTransaction, Transaction, TransactionFilter, TransactionSummary,
    TransactionUpdate,
};

#[async_trait]
pub trait TransactionServiceTrait: Send + Sync {
    /// Record a transaction. Works offline; the returned record carries a
    /// locally-namespaced id until the remote confirms it.
    async fn create_transaction(&self, draft: NewTransaction) -> Result<Transaction>;

    /// Fetch transactions matching the filter, remote-fresh when reachable
    /// and from the local snapshot otherwise. Callers are not told which.
    async fn get_transactions(&self, filter: &TransactionFilter) -> Result<Vec<Transaction>>;

    /// Apply a partial update to one transaction.
    async fn update_transaction(&self, id: &str, update: TransactionUpdate)
        -> Result<Transaction>;

    /// Delete one transaction.
    async fn delete_transaction(&self, id: &str) -> Result<()>;

    /// Totals over the currently materialized collection, after filtering.
    async fn get_summary(&self, filter: &TransactionFilter) -> Result<TransactionSummary>;

    /// Push queued offline writes to the remote now, instead of waiting for
    /// the next connectivity edge.
    async fn drain(&self) -> Result<DrainReport>;

    /// Pending offline work for status badges.
    fn queue_stats(&self) -> SyncQueueStats;
}

pub struct TransactionService {
    synchronizer: Arc<EntitySynchronizer<Transaction>>,
}

impl TransactionService {
    pub fn new(synchronizer: Arc<EntitySynchronizer<Transaction>>) -> Self {
        Self { synchronizer }
    }
}

#[async_trait]
impl TransactionServiceTrait for TransactionService {
    async fn create_transaction(&self, draft: NewTransaction) -> Result<Transaction> {
        self.synchronizer.create(draft).await
    }

    async fn get_transactions(&self, filter: &TransactionFilter) -> Result<Vec<Transaction>> {
        self.synchronizer.get_all(filter).await
    }

    async fn update_transaction(
        &self,
        id: &str,
        update: TransactionUpdate,
    ) -> Result<Transaction> {
        self.synchronizer.update(id, update).await
    }

    async fn delete_transaction(&self, id: &str) -> Result<()> {
        self.synchronizer.delete(id).await
    }

    async fn get_summary(&self, filter: &TransactionFilter) -> Result<TransactionSummary> {
        let records = self.synchronizer.get_all(filter).await?;
        Ok(summarize_transactions(&records))
    }

    async fn drain(&self) -> Result<DrainReport> {
        self.synchronizer.drain().await
    }

    fn queue_stats(&self) -> SyncQueueStats {
        self.synchronizer.queue_stats()
    }
}
