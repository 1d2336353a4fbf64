//! Online/offline state with edge-triggered notification.

use tokio::sync::watch;

/// Tracks whether the remote store is reachable.
///
/// Platform glue owns the transitions: it calls [`set_online`](Self::set_online)
/// and [`set_offline`](Self::set_offline) from whatever environment signal it
/// has. Notification is edge-triggered; setting the current state again wakes
/// nobody. Subscribers watch the channel, the became-online edge is what
/// triggers queue draining.
pub struct ConnectivityMonitor {
    state: watch::Sender<bool>,
}

impl ConnectivityMonitor {
    /// Create a monitor with the initial reachability read from the
    /// environment by the caller.
    pub fn new(initially_online: bool) -> Self {
        let (state, _) = watch::channel(initially_online);
        Self { state }
    }

    pub fn is_online(&self) -> bool {
        *self.state.borrow()
    }

    pub fn set_online(&self) {
        let changed = self.state.send_if_modified(|online| {
            if *online {
                false
            } else {
                *online = true;
                true
            }
        });
        if changed {
            log::info!("[Connectivity] Remote reachable again");
        }
    }

    pub fn set_offline(&self) {
        let changed = self.state.send_if_modified(|online| {
            if *online {
                *online = false;
                true
            } else {
                false
            }
        });
        if changed {
            log::info!("[Connectivity] Remote unreachable, entering offline mode");
        }
    }

    /// Receiver observing every state transition.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.state.subscribe()
    }
}
