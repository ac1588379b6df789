//! Host Lifecycle - Phase Holder and Shutdown Notifier
//!
//! Concrete `LifecycleHost` for applications embedding stores. The host
//! calls `stop()` when shutdown begins and `final_write()` when it is
//! ready to grant one last flush; both fan out to every registered
//! store that is still alive.

use std::sync::{Arc, Mutex, PoisonError, Weak};

use futures_util::future::join_all;
use tokio::sync::watch;
use tracing::{error, info, instrument};

use crate::domain::{LifecyclePhase, StoreError};
use crate::ports::lifecycle::{LifecycleHost, LifecycleListener};

pub struct HostLifecycle {
    /// Current phase; receivers observe transitions.
    phase_tx: watch::Sender<LifecyclePhase>,
    /// Registered stores, held weakly.
    listeners: Mutex<Vec<Weak<dyn LifecycleListener>>>,
}

impl HostLifecycle {
    pub fn new() -> Self {
        let (phase_tx, _) = watch::channel(LifecyclePhase::Running);
        Self {
            phase_tx,
            listeners: Mutex::new(Vec::new()),
        }
    }

    /// Watch phase transitions.
    pub fn subscribe(&self) -> watch::Receiver<LifecyclePhase> {
        self.phase_tx.subscribe()
    }

    /// Change the phase without notifying listeners.
    pub fn set_phase(&self, phase: LifecyclePhase) {
        self.phase_tx.send_replace(phase);
    }

    /// Enter `Stopping` and disarm every store's pending timer.
    #[instrument(skip(self))]
    pub fn stop(&self) {
        self.set_phase(LifecyclePhase::Stopping);
        let listeners = self.live_listeners();
        for listener in &listeners {
            listener.on_stop();
        }
        info!(stores = listeners.len(), "Stop notification delivered");
    }

    /// Enter `FinalWrite` and flush every store's pending write.
    ///
    /// All stores are flushed even if some fail; the failures are
    /// returned (and logged).
    #[instrument(skip(self))]
    pub async fn final_write(&self) -> Vec<StoreError> {
        self.set_phase(LifecyclePhase::FinalWrite);
        let listeners = self.live_listeners();
        let results = join_all(listeners.iter().map(|l| l.on_final_write())).await;

        let failures: Vec<StoreError> = results.into_iter().filter_map(Result::err).collect();
        for failure in &failures {
            error!(error = %failure, "Final write failed");
        }
        info!(
            stores = listeners.len(),
            failed = failures.len(),
            "Final write notification delivered"
        );
        failures
    }

    /// Number of registered stores still alive.
    pub fn listener_count(&self) -> usize {
        self.live_listeners().len()
    }

    /// Upgrade live listeners, pruning dropped ones.
    fn live_listeners(&self) -> Vec<Arc<dyn LifecycleListener>> {
        let mut listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        let mut live = Vec::with_capacity(listeners.len());
        listeners.retain(|weak| match weak.upgrade() {
            Some(listener) => {
                live.push(listener);
                true
            }
            None => false,
        });
        live
    }
}

impl Default for HostLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl LifecycleHost for HostLifecycle {
    fn phase(&self) -> LifecyclePhase {
        *self.phase_tx.borrow()
    }

    fn register(&self, listener: Weak<dyn LifecycleListener>) {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(listener);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::domain::StoreResult;

    #[derive(Default)]
    struct Counting {
        stops: AtomicUsize,
        flushes: AtomicUsize,
    }

    #[async_trait]
    impl LifecycleListener for Counting {
        fn on_stop(&self) {
            self.stops.fetch_add(1, Ordering::SeqCst);
        }

        async fn on_final_write(&self) -> StoreResult<()> {
            self.flushes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_notifies_live_listeners_and_tracks_phase() {
        let host = HostLifecycle::new();
        let listener = Arc::new(Counting::default());
        let weak = Arc::downgrade(&listener);
        host.register(weak);
        let rx = host.subscribe();

        assert_eq!(host.phase(), LifecyclePhase::Running);
        host.stop();
        assert_eq!(host.phase(), LifecyclePhase::Stopping);
        assert_eq!(*rx.borrow(), LifecyclePhase::Stopping);

        assert!(host.final_write().await.is_empty());
        assert_eq!(host.phase(), LifecyclePhase::FinalWrite);
        assert_eq!(listener.stops.load(Ordering::SeqCst), 1);
        assert_eq!(listener.flushes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_dropped_listeners_are_pruned() {
        let host = HostLifecycle::new();
        let listener = Arc::new(Counting::default());
        let weak = Arc::downgrade(&listener);
        host.register(weak);
        assert_eq!(host.listener_count(), 1);

        drop(listener);
        assert_eq!(host.listener_count(), 0);
    }
}
