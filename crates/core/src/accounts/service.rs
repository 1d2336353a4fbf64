use std::sync::Arc;

use async_trait::async_trait;

use crate::accounts::{
    summarize_accounts, Account, AccountFilter, AccountSummary, AccountUpdate, NewAccount,
};
use crate::errors::Result;
use crate::sync::{DrainReport, EntitySynchronizer, SyncQueueStats};

/// Account operations exposed to the application layer.
#[async_trait]
pub trait AccountServiceTrait: Send + Sync {
    async fn create_account(&self, draft: NewAccount) -> Result<Account>;
    async fn get_accounts(&self, filter: &AccountFilter) -> Result<Vec<Account>>;
    async fn update_account(&self, id: &str, update: AccountUpdate) -> Result<Account>;
    async fn delete_account(&self, id: &str) -> Result<()>;
    async fn get_summary(&self, filter: &AccountFilter) -> Result<AccountSummary>;
    async fn drain(&self) -> Result<DrainReport>;
    fn queue_stats(&self) -> SyncQueueStats;
}

pub struct AccountService {
    synchronizer: Arc<EntitySynchronizer<Account>>,
}

impl AccountService {
    pub fn new(synchronizer: Arc<EntitySynchronizer<Account>>) -> Self {
        Self { synchronizer }
    }
}

#[async_trait]
impl AccountServiceTrait for AccountService {
    async fn create_account(&self, draft: NewAccount) -> Result<Account> {
        self.synchronizer.create(draft).await
    }

    async fn get_accounts(&self, filter: &AccountFilter) -> Result<Vec<Account>> {
        self.synchronizer.get_all(filter).await
    }

    async fn update_account(&self, id: &str, update: AccountUpdate) -> Result<Account> {
        self.synchronizer.update(id, update).await
    }

    async fn delete_account(&self, id: &str) -> Result<()> {
        self.synchronizer.delete(id).await
    }

    async fn get_summary(&self, filter: &AccountFilter) -> Result<AccountSummary> {
        let records = self.synchronizer.get_all(filter).await?;
        Ok(summarize_accounts(&records))
    }

    async fn drain(&self) -> Result<DrainReport> {
        self.synchronizer.drain().await
    }

    fn queue_stats(&self) -> SyncQueueStats {
        self.synchronizer.queue_stats()
    }
}
