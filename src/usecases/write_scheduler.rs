//! Write Scheduler - Debounced Deferred Writes
//!
//! Holds at most one pending write per store. Scheduling again replaces
//! the pending write and cancels its timer; an immediate save cancels it
//! too. Each pending write carries a generation number so a timer that
//! already woke up can tell whether it was superseded.
//!
//! The scheduler only owns the slot. Arming timers and performing the
//! write are the store's job.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Produces the data to write, invoked at most once.
pub type DataFactory<T> = Box<dyn FnOnce() -> T + Send>;

enum State<T> {
    Factory(DataFactory<T>),
    Ready(Arc<T>),
    /// The factory panicked.
    Spent,
}

/// What a pending write will persist.
///
/// The factory runs on first access, under this cell's own lock and
/// never under the scheduler's slot lock. It may query the store but
/// must not `load()` it.
pub struct PendingData<T> {
    state: Mutex<State<T>>,
}

impl<T> PendingData<T> {
    fn factory(factory: DataFactory<T>) -> Self {
        Self {
            state: Mutex::new(State::Factory(factory)),
        }
    }

    fn ready(data: Arc<T>) -> Self {
        Self {
            state: Mutex::new(State::Ready(data)),
        }
    }

    /// The data to write, invoking the factory if it has not run yet.
    ///
    /// `None` only if an earlier invocation of the factory panicked.
    pub fn get(&self) -> Option<Arc<T>> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let data = match std::mem::replace(&mut *state, State::Spent) {
            State::Factory(factory) => Arc::new(factory()),
            State::Ready(data) => data,
            State::Spent => return None,
        };
        *state = State::Ready(Arc::clone(&data));
        Some(data)
    }
}

struct PendingWrite<T> {
    payload: Arc<PendingData<T>>,
    due_at: Instant,
    generation: u64,
    /// `None` while disarmed (host stopping).
    timer: Option<JoinHandle<()>>,
}

struct Slot<T> {
    pending: Option<PendingWrite<T>>,
    generation: u64,
}

pub struct WriteScheduler<T> {
    slot: Mutex<Slot<T>>,
}

impl<T> WriteScheduler<T> {
    pub const fn new() -> Self {
        Self {
            slot: Mutex::new(Slot {
                pending: None,
                generation: 0,
            }),
        }
    }

    /// Replace the pending write with `factory`, due after `delay`.
    ///
    /// `arm` receives the new generation and deadline and may spawn the
    /// timer; returning `None` leaves the write disarmed. The previous
    /// timer, if any, is aborted before `arm` runs. Returns whether a
    /// pending write was replaced.
    pub fn schedule(
        &self,
        factory: DataFactory<T>,
        delay: Duration,
        arm: impl FnOnce(u64, Instant) -> Option<JoinHandle<()>>,
    ) -> bool {
        let mut slot = self.lock();
        let replaced = Self::clear(&mut slot).is_some();

        slot.generation += 1;
        let generation = slot.generation;
        let due_at = Instant::now() + delay;
        let timer = arm(generation, due_at);

        slot.pending = Some(PendingWrite {
            payload: Arc::new(PendingData::factory(factory)),
            due_at,
            generation,
            timer,
        });
        replaced
    }

    /// Replace the pending write with ready `data`, disarmed.
    ///
    /// Only a final write persists it. Returns whether a pending write
    /// was replaced.
    pub fn stash(&self, data: Arc<T>) -> bool {
        let mut slot = self.lock();
        let replaced = Self::clear(&mut slot).is_some();

        slot.generation += 1;
        let generation = slot.generation;
        slot.pending = Some(PendingWrite {
            payload: Arc::new(PendingData::ready(data)),
            due_at: Instant::now(),
            generation,
            timer: None,
        });
        replaced
    }

    /// Drop the pending write and abort its timer.
    pub fn cancel(&self) -> bool {
        Self::clear(&mut self.lock()).is_some()
    }

    /// Abort the timer but keep the payload for a later flush.
    pub fn disarm(&self) -> bool {
        let mut slot = self.lock();
        match slot.pending.as_mut().and_then(|p| p.timer.take()) {
            Some(timer) => {
                timer.abort();
                true
            }
            None => false,
        }
    }

    /// Forget the timer handle of `generation` without aborting it.
    ///
    /// Called by the timer task itself when it declines to write.
    pub fn release_timer(&self, generation: u64) {
        let mut slot = self.lock();
        if let Some(pending) = slot.pending.as_mut().filter(|p| p.generation == generation) {
            pending.timer = None;
        }
    }

    /// Take the payload if `generation` is still the pending one.
    ///
    /// Called by the timer task; its own handle is detached, not aborted.
    pub fn take_due(&self, generation: u64) -> Option<Arc<PendingData<T>>> {
        let mut slot = self.lock();
        if slot.pending.as_ref()?.generation != generation {
            return None;
        }
        slot.pending.take().map(|p| p.payload)
    }

    /// Take whatever is pending, aborting its timer.
    pub fn take(&self) -> Option<Arc<PendingData<T>>> {
        Self::clear(&mut self.lock())
    }

    /// The data the pending write will persist, without taking it.
    ///
    /// A factory that has not run yet is invoked now, outside the slot
    /// lock, and its result is what the write persists later.
    pub fn peek(&self) -> Option<Arc<T>> {
        let payload = Arc::clone(&self.lock().pending.as_ref()?.payload);
        payload.get()
    }

    pub fn is_pending(&self) -> bool {
        self.lock().pending.is_some()
    }

    /// Whether a timer is armed for the pending write.
    pub fn is_armed(&self) -> bool {
        self.lock().pending.as_ref().is_some_and(|p| p.timer.is_some())
    }

    pub fn due_at(&self) -> Option<Instant> {
        self.lock().pending.as_ref().map(|p| p.due_at)
    }

    fn clear(slot: &mut Slot<T>) -> Option<Arc<PendingData<T>>> {
        let pending = slot.pending.take()?;
        slot.generation += 1;
        if let Some(timer) = pending.timer {
            timer.abort();
        }
        Some(pending.payload)
    }

    fn lock(&self) -> MutexGuard<'_, Slot<T>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> Default for WriteScheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}
