//! Network reachability signal.
//!
//! The platform layer reports reachability with [`ConnectivityMonitor::set_online`];
//! the engine subscribes once and drains the queue on every offline→online
//! transition.

use std::sync::Arc;
use tokio::sync::watch;

/// Shared reachability flag backed by a `watch` channel.
#[derive(Debug, Clone)]
pub struct ConnectivityMonitor {
    tx: Arc<watch::Sender<bool>>,
}

impl ConnectivityMonitor {
    /// Create a monitor with the given initial reachability.
    pub fn new(online: bool) -> Self {
        let (tx, _rx) = watch::channel(online);
        Self { tx: Arc::new(tx) }
    }

    /// Report a reachability change. Repeated values are not re-broadcast.
    pub fn set_online(&self, online: bool) {
        self.tx.send_if_modified(|current| {
            if *current == online {
                false
            } else {
                tracing::debug!("Connectivity changed: online={}", online);
                *current = online;
                true
            }
        });
    }

    /// Current reachability.
    pub fn is_online(&self) -> bool {
        *self.tx.borrow()
    }

    /// Receiver observing reachability changes.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

impl Default for ConnectivityMonitor {
    fn default() -> Self {
        Self::new(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_see_changes() {
        let monitor = ConnectivityMonitor::new(false);
        let mut rx = monitor.subscribe();
        assert!(!*rx.borrow());

        monitor.set_online(true);
        rx.changed().await.unwrap();
        assert!(*rx.borrow_and_update());
        assert!(monitor.is_online());
    }

    #[tokio::test]
    async fn repeated_value_is_not_a_change() {
        let monitor = ConnectivityMonitor::new(true);
        let rx = monitor.subscribe();

        monitor.set_online(true);
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn clones_share_the_flag() {
        let a = ConnectivityMonitor::new(true);
        let b = a.clone();
        b.set_online(false);
        assert!(!a.is_online());
    }
}
