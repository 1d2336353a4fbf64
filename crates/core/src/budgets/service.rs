use std::sync::Arc;

use async_trait::async_trait;

use crate::budgets::{
    summarize_budgets, Budget, BudgetFilter, BudgetSummary, BudgetUpdate, NewBudget,
};
use crate::errors::Result;
use crate::sync::{DrainReport, EntitySynchronizer, SyncQueueStats};

#[async_trait]
pub trait BudgetServiceTrait: Send + Sync {
    async fn create_budget(&self, draft: NewBudget) -> Result<Budget>;
    async fn get_budgets(&self, filter: &BudgetFilter) -> Result<Vec<Budget>>;
    async fn update_budget(&self, id: &str, update: BudgetUpdate) -> Result<Budget>;
    async fn delete_budget(&self, id: &str) -> Result<()>;
    async fn get_summary(&self, filter: &BudgetFilter) -> Result<BudgetSummary>;
    async fn drain(&self) -> Result<DrainReport>;
    fn queue_stats(&self) -> SyncQueueStats;
}

pub struct BudgetService {
    synchronizer: Arc<EntitySynchronizer<Budget>>,
}

impl BudgetService {
    pub fn new(synchronizer: Arc<EntitySynchronizer<Budget>>) -> Self {
        Self { synchronizer }
    }
}

#[async_trait]
impl BudgetServiceTrait for BudgetService {
    async fn create_budget(&self, draft: NewBudget) -> Result<Budget> {
        self.synchronizer.create(draft).await
    }

    async fn get_budgets(&self, filter: &BudgetFilter) -> Result<Vec<Budget>> {
        self.synchronizer.get_all(filter).await
    }

    async fn update_budget(&self, id: &str, update: BudgetUpdate) -> Result<Budget> {
        self.synchronizer.update(id, update).await
    }

    async fn delete_budget(&self, id: &str) -> Result<()> {
        self.synchronizer.delete(id).await
    }

    async fn get_summary(&self, filter: &BudgetFilter) -> Result<BudgetSummary> {
        let records = self.synchronizer.get_all(filter).await?;
        Ok(summarize_budgets(&records))
    }

    async fn drain(&self) -> Result<DrainReport> {
        self.synchronizer.drain().await
    }

    fn queue_stats(&self) -> SyncQueueStats {
        self.synchronizer.queue_stats()
    }
}
