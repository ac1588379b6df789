//! Lifecycle Port - Host Shutdown Notifications
//!
//! Injected into every store at construction instead of a global event
//! bus. The host exposes its current phase and calls back registered
//! listeners when shutdown begins (`on_stop`) and when it grants a last
//! flush (`on_final_write`).

use std::sync::Weak;

use async_trait::async_trait;

use crate::domain::{LifecyclePhase, StoreResult};

/// Receives shutdown notifications from the host.
#[async_trait]
pub trait LifecycleListener: Send + Sync {
  /// Shutdown started: pending timers must no longer fire.
  fn on_stop(&self);

  /// Last chance to persist: flush whatever is still pending.
  async fn on_final_write(&self) -> StoreResult<()>;
}

/// The host side: phase query plus listener registration.
pub trait LifecycleHost: Send + Sync + 'static {
  fn phase(&self) -> LifecyclePhase;

  /// Register a listener. The host holds it weakly, so dropping a store
  /// unregisters it implicitly.
  fn register(&self, listener: Weak<dyn LifecycleListener>);
}
