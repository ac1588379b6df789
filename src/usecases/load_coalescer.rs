//! Load Coalescer - Single-Flight Reads
//!
//! Concurrent loads of one store share a single physical read: the
//! first caller starts it, later callers await the same shared future,
//! and all of them receive the same `Arc`. The slot is cleared once the
//! read completes, so a later load after a miss reads again.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::future::{BoxFuture, FutureExt, Shared};

use crate::domain::StoreResult;

/// Result of one load.
pub type LoadOutcome<T> = StoreResult<Option<Arc<T>>>;

type InFlight<T> = Shared<BoxFuture<'static, LoadOutcome<T>>>;

pub struct LoadCoalescer<T> {
    in_flight: Mutex<Option<InFlight<T>>>,
}

impl<T: Send + Sync + 'static> LoadCoalescer<T> {
    pub const fn new() -> Self {
        Self {
            in_flight: Mutex::new(None),
        }
    }

    /// Join the in-flight load, or start one with `start`.
    ///
    /// `start` is only invoked when no load is in flight.
    pub async fn load_with<F>(&self, start: F) -> LoadOutcome<T>
    where
        F: FnOnce() -> BoxFuture<'static, LoadOutcome<T>>,
    {
        let flight = {
            let mut slot = self.lock();
            match slot.as_ref() {
                Some(flight) => flight.clone(),
                None => {
                    let flight = start().shared();
                    *slot = Some(flight.clone());
                    flight
                }
            }
        };

        let outcome = flight.clone().await;

        let mut slot = self.lock();
        if slot.as_ref().is_some_and(|current| current.ptr_eq(&flight)) {
            *slot = None;
        }
        outcome
    }

    /// Whether a physical load is currently in flight.
    pub fn is_loading(&self) -> bool {
        self.lock().is_some()
    }

    fn lock(&self) -> MutexGuard<'_, Option<InFlight<T>>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Send + Sync + 'static> Default for LoadCoalescer<T> {
    fn default() -> Self {
        Self::new()
    }
}
