//! Composition root wiring stores, synchronizers and services together.

use std::sync::Arc;

use crate::accounts::{Account, AccountService, AccountServiceTrait};
use crate::budgets::{Budget, BudgetService, BudgetServiceTrait};
use crate::events::SyncEventSink;
use crate::goals::{Goal, GoalService, GoalServiceTrait};
use crate::remote::RemoteStore;
use crate::store::LocalStore;
use crate::sync::{
    ensure_drain_task_started, ensure_drain_task_stopped, ConnectivityMonitor, Drainable,
    EntitySynchronizer, SyncQueueStats, SyncRuntimeState,
};
use crate::transactions::{Transaction, TransactionService, TransactionServiceTrait};

/// Holds every service the application layer talks to.
///
/// Built once at startup from a local store, a remote store and a
/// connectivity monitor. All services share the same monitor, so flipping
/// it offline affects every entity at once.
pub struct ServiceContext {
    connectivity: Arc<ConnectivityMonitor>,
    runtime: Arc<SyncRuntimeState>,
    drainables: Vec<Arc<dyn Drainable>>,

    // Services
    pub transaction_service: Arc<dyn TransactionServiceTrait>,
    pub account_service: Arc<dyn AccountServiceTrait>,
    pub budget_service: Arc<dyn BudgetServiceTrait>,
    pub goal_service: Arc<dyn GoalServiceTrait>,
}

impl ServiceContext {
    pub fn new(
        store: Arc<dyn LocalStore>,
        remote: Arc<dyn RemoteStore>,
        connectivity: Arc<ConnectivityMonitor>,
        events: Arc<dyn SyncEventSink>,
    ) -> Self {
        let transactions = Arc::new(EntitySynchronizer::<Transaction>::new(
            Arc::clone(&store),
            Arc::clone(&remote),
            Arc::clone(&connectivity),
            Arc::clone(&events),
        ));
        let accounts = Arc::new(EntitySynchronizer::<Account>::new(
            Arc::clone(&store),
            Arc::clone(&remote),
            Arc::clone(&connectivity),
            Arc::clone(&events),
        ));
        let budgets = Arc::new(EntitySynchronizer::<Budget>::new(
            Arc::clone(&store),
            Arc::clone(&remote),
            Arc::clone(&connectivity),
            Arc::clone(&events),
        ));
        let goals = Arc::new(EntitySynchronizer::<Goal>::new(
            Arc::clone(&store),
            Arc::clone(&remote),
            Arc::clone(&connectivity),
            Arc::clone(&events),
        ));

        let drainables: Vec<Arc<dyn Drainable>> = vec![
            Arc::clone(&transactions) as Arc<dyn Drainable>,
            Arc::clone(&accounts) as Arc<dyn Drainable>,
            Arc::clone(&budgets) as Arc<dyn Drainable>,
            Arc::clone(&goals) as Arc<dyn Drainable>,
        ];

        Self {
            connectivity,
            runtime: Arc::new(SyncRuntimeState::new()),
            drainables,
            transaction_service: Arc::new(TransactionService::new(transactions)),
            account_service: Arc::new(AccountService::new(accounts)),
            budget_service: Arc::new(BudgetService::new(budgets)),
            goal_service: Arc::new(GoalService::new(goals)),
        }
    }

    pub fn transaction_service(&self) -> Arc<dyn TransactionServiceTrait> {
        Arc::clone(&self.transaction_service)
    }

    pub fn account_service(&self) -> Arc<dyn AccountServiceTrait> {
        Arc::clone(&self.account_service)
    }

    pub fn budget_service(&self) -> Arc<dyn BudgetServiceTrait> {
        Arc::clone(&self.budget_service)
    }

    pub fn goal_service(&self) -> Arc<dyn GoalServiceTrait> {
        Arc::clone(&self.goal_service)
    }

    pub fn connectivity(&self) -> Arc<ConnectivityMonitor> {
        Arc::clone(&self.connectivity)
    }

    /// Start the background drain task. Safe to call more than once.
    pub async fn start_background_sync(&self) {
        ensure_drain_task_started(&self.runtime, &self.connectivity, self.drainables.clone())
            .await;
    }

    pub async fn stop_background_sync(&self) {
        ensure_drain_task_stopped(&self.runtime).await;
    }

    /// Queue depth across every entity, for a status indicator.
    pub fn pending_total(&self) -> usize {
        self.drainables.iter().map(|d| d.pending()).sum()
    }

    /// Per-entity queue statistics keyed by entity name.
    pub fn queue_stats(&self) -> Vec<(&'static str, SyncQueueStats)> {
        vec![
            (
                "transaction",
                self.transaction_service.queue_stats(),
            ),
            ("account", self.account_service.queue_stats()),
            ("budget", self.budget_service.queue_stats()),
            ("goal", self.goal_service.queue_stats()),
        ]
    }
}
