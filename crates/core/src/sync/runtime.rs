//! Background drain task driven by connectivity edges.

use std::sync::Arc;

use log::{debug, warn};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::sync::connectivity::ConnectivityMonitor;
use crate::sync::synchronizer::Drainable;

/// Holds the background task handle so the composition root can start and
/// stop the drain loop idempotently.
#[derive(Default)]
pub struct SyncRuntimeState {
    background_task: Mutex<Option<JoinHandle<()>>>,
}

impl SyncRuntimeState {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Spawn the drain task if it is not already running.
///
/// The task drains every registered synchronizer once at startup when the
/// session begins online (a previous session may have left queued work), then
/// again on every became-online edge. It ends when the monitor is dropped.
pub async fn ensure_drain_task_started(
    runtime: &SyncRuntimeState,
    connectivity: &ConnectivityMonitor,
    drainables: Vec<Arc<dyn Drainable>>,
) {
    let mut guard = runtime.background_task.lock().await;
    if let Some(handle) = guard.as_ref() {
        if !handle.is_finished() {
            return;
        }
        // Task ended, likely because the monitor was dropped. Respawn.
        guard.take();
    }

    let mut receiver = connectivity.subscribe();
    let handle = tokio::spawn(async move {
        if *receiver.borrow_and_update() {
            drain_all(&drainables).await;
        }
        loop {
            if receiver.changed().await.is_err() {
                debug!("[SyncRuntime] Connectivity channel closed, stopping drain task");
                break;
            }
            if *receiver.borrow_and_update() {
                drain_all(&drainables).await;
            }
        }
    });
    *guard = Some(handle);
}

/// Abort the drain task if one is running.
pub async fn ensure_drain_task_stopped(runtime: &SyncRuntimeState) {
    let mut guard = runtime.background_task.lock().await;
    if let Some(handle) = guard.take() {
        handle.abort();
    }
}

async fn drain_all(drainables: &[Arc<dyn Drainable>]) {
    for drainable in drainables {
        if drainable.pending() == 0 {
            continue;
        }
        match drainable.drain_pending().await {
            Ok(report) => debug!(
                "[SyncRuntime] {} drain: {:?} ({} confirmed, {} failed, {} dropped)",
                drainable.entity(),
                report.status,
                report.confirmed,
                report.failed,
                report.dropped
            ),
            Err(err) => warn!("[SyncRuntime] {} drain failed: {err}", drainable.entity()),
        }
    }
}
