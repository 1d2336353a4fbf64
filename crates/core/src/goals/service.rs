use std::sync::Arc;

use async_trait::async_trait;

use crate::errors::Result;
use crate::goals::{summarize_goals, Goal, GoalFilter, GoalSummary, GoalUpdate, NewGoal};
use crate::sync::{DrainReport, EntitySynchronizer, SyncQueueStats};

#[async_trait]
pub trait GoalServiceTrait: Send + Sync {
    async fn create_goal(&self, draft: NewGoal) -> Result<Goal>;
    async fn get_goals(&self, filter: &GoalFilter) -> Result<Vec<Goal>>;
    async fn update_goal(&self, id: &str, update: GoalUpdate) -> Result<Goal>;
    async fn delete_goal(&self, id: &str) -> Result<()>;
    async fn get_summary(&self, filter: &GoalFilter) -> Result<GoalSummary>;
    async fn drain(&self) -> Result<DrainReport>;
    fn queue_stats(&self) -> SyncQueueStats;
}

pub struct GoalService {
    synchronizer: Arc<EntitySynchronizer<Goal>>,
}

impl GoalService {
    pub fn new(synchronizer: Arc<EntitySynchronizer<Goal>>) -> Self {
        Self { synchronizer }
    }
}

#[async_trait]
impl GoalServiceTrait for GoalService {
    async fn create_goal(&self, draft: NewGoal) -> Result<Goal> {
        self.synchronizer.create(draft).await
    }

    async fn get_goals(&self, filter: &GoalFilter) -> Result<Vec<Goal>> {
        self.synchronizer.get_all(filter).await
    }

    async fn update_goal(&self, id: &str, update: GoalUpdate) -> Result<Goal> {
        self.synchronizer.update(id, update).await
    }

    async fn delete_goal(&self, id: &str) -> Result<()> {
        self.synchronizer.delete(id).await
    }

    async fn get_summary(&self, filter: &GoalFilter) -> Result<GoalSummary> {
        let records = self.synchronizer.get_all(filter).await?;
        Ok(summarize_goals(&records))
    }

    async fn drain(&self) -> Result<DrainReport> {
        self.synchronizer.drain().await
    }

    fn queue_stats(&self) -> SyncQueueStats {
        self.synchronizer.queue_stats()
    }
}
