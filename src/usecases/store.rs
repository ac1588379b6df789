//! Store - Versioned Persistent Data Façade
//!
//! A `Store<T>` persists one value under one key, tagged with the
//! store's declared schema version. It combines:
//! - an in-memory cache of the last saved or loaded value
//! - a `WriteScheduler` for debounced `delay_save` calls
//! - a `LoadCoalescer` so concurrent loads share one read
//! - the `MigrationEngine` for data persisted under older versions
//!
//! Stores registered with a lifecycle host drop saves while the host is
//! stopping, and flush their pending deferred write on final write.
//!
//! All writes of one store (immediate, timer-driven or final) are
//! serialized by a single async write lock. A timer only takes the
//! pending slot while holding that lock, so a superseded deferred write
//! can never land after a newer `save()`.

use std::marker::PhantomData;
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::future::FutureExt;
use prometheus::IntCounterVec;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::time::Instant;
use tracing::{debug, error, info, instrument, warn};

use super::load_coalescer::{LoadCoalescer, LoadOutcome};
use super::migration_engine::MigrationEngine;
use super::write_scheduler::WriteScheduler;
use crate::adapters::metrics::StoreMetrics;
use crate::adapters::persistence::JsonCodec;
use crate::domain::{Envelope, LifecyclePhase, StoreError, StoreResult, VersionTag};
use crate::ports::codec::Codec;
use crate::ports::lifecycle::{LifecycleHost, LifecycleListener};
use crate::ports::migration::{Legacy, LegacyMigrate, Migrate, NoMigration};
use crate::ports::storage::StorageBackend;

/// Delay used by `Store::schedule_save` unless configured otherwise.
pub const DEFAULT_SAVE_DELAY: Duration = Duration::from_secs(1);

/// Bounds for data a store can hold.
pub trait StoreData: Serialize + DeserializeOwned + Send + Sync + 'static {}

impl<T> StoreData for T where T: Serialize + DeserializeOwned + Send + Sync + 'static {}

/// Handle to a versioned store. Clones share the same store.
pub struct Store<T: StoreData> {
    inner: Arc<StoreInner<T>>,
}

struct StoreInner<T: StoreData> {
    key: String,
    version: VersionTag,
    backend: Arc<dyn StorageBackend>,
    codec: Arc<dyn Codec>,
    migrator: Arc<dyn Migrate>,
    lifecycle: Option<Arc<dyn LifecycleHost>>,
    metrics: Option<Arc<StoreMetrics>>,
    default_delay: Duration,
    /// Last value saved, flushed or loaded.
    cache: Mutex<Option<Arc<T>>>,
    scheduler: WriteScheduler<T>,
    loads: LoadCoalescer<T>,
    write_lock: tokio::sync::Mutex<()>,
}

/// Configures and builds a `Store`.
pub struct StoreBuilder<T> {
    key: String,
    version: VersionTag,
    backend: Arc<dyn StorageBackend>,
    codec: Arc<dyn Codec>,
    migrator: Arc<dyn Migrate>,
    lifecycle: Option<Arc<dyn LifecycleHost>>,
    metrics: Option<Arc<StoreMetrics>>,
    default_delay: Duration,
    _data: PhantomData<fn() -> T>,
}

impl<T: StoreData> StoreBuilder<T> {
    /// Store `key` at major version `major`, minor version 1.
    pub fn new(key: impl Into<String>, major: u32, backend: Arc<dyn StorageBackend>) -> Self {
        Self {
            key: key.into(),
            version: VersionTag::major(major),
            backend,
            codec: Arc::new(JsonCodec::default()),
            migrator: Arc::new(NoMigration),
            lifecycle: None,
            metrics: None,
            default_delay: DEFAULT_SAVE_DELAY,
            _data: PhantomData,
        }
    }

    #[must_use]
    pub const fn minor_version(mut self, minor: u32) -> Self {
        self.version.minor = minor;
        self
    }

    #[must_use]
    pub fn codec(mut self, codec: impl Codec) -> Self {
        self.codec = Arc::new(codec);
        self
    }

    /// Install a canonical `(old_major, old_minor, old_data)` hook.
    #[must_use]
    pub fn migrator(mut self, migrator: impl Migrate) -> Self {
        self.migrator = Arc::new(migrator);
        self
    }

    /// Install a legacy `(old_version, old_data)` hook.
    #[must_use]
    pub fn legacy_migrator(mut self, migrator: impl LegacyMigrate) -> Self {
        self.migrator = Arc::new(Legacy(migrator));
        self
    }

    #[must_use]
    pub fn lifecycle(mut self, host: Arc<dyn LifecycleHost>) -> Self {
        self.lifecycle = Some(host);
        self
    }

    #[must_use]
    pub fn metrics(mut self, metrics: Arc<StoreMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Delay used by `Store::schedule_save`.
    #[must_use]
    pub const fn default_delay(mut self, delay: Duration) -> Self {
        self.default_delay = delay;
        self
    }

    /// Build the store and register it with the lifecycle host.
    pub fn build(self) -> Store<T> {
        let inner = Arc::new(StoreInner {
            key: self.key,
            version: self.version,
            backend: self.backend,
            codec: self.codec,
            migrator: self.migrator,
            lifecycle: self.lifecycle,
            metrics: self.metrics,
            default_delay: self.default_delay,
            cache: Mutex::new(None),
            scheduler: WriteScheduler::new(),
            loads: LoadCoalescer::new(),
            write_lock: tokio::sync::Mutex::new(()),
        });

        if let Some(host) = &inner.lifecycle {
            let weak = Arc::downgrade(&inner);
            let listener: Weak<dyn LifecycleListener> = weak;
            host.register(listener);
        }

        Store { inner }
    }
}

impl<T: StoreData> Store<T> {
    pub fn builder(
        key: impl Into<String>,
        major: u32,
        backend: Arc<dyn StorageBackend>,
    ) -> StoreBuilder<T> {
        StoreBuilder::new(key, major, backend)
    }

    pub fn key(&self) -> &str {
        &self.inner.key
    }

    /// Declared schema version.
    pub fn version(&self) -> VersionTag {
        self.inner.version
    }

    pub fn has_pending_write(&self) -> bool {
        self.inner.scheduler.is_pending()
    }

    /// When the pending deferred write is due, if one is pending.
    pub fn pending_due_at(&self) -> Option<Instant> {
        self.inner.scheduler.due_at()
    }

    /// Persist `data` now, cancelling any pending deferred write.
    ///
    /// While the host is stopping nothing is written: `data` replaces
    /// the pending deferred write instead and is persisted on final
    /// write. Backend failures propagate and are not retried.
    pub async fn save(&self, data: T) -> StoreResult<()> {
        self.save_shared(Arc::new(data)).await.map(|_| ())
    }

    /// `save` for data already behind an `Arc`; returns whether the data
    /// was written now (`false` when held for final write).
    #[instrument(skip(self, data), fields(key = %self.inner.key))]
    pub(crate) async fn save_shared(&self, data: Arc<T>) -> StoreResult<bool> {
        let inner = &self.inner;
        if inner.phase().suppresses_writes() {
            let replaced = inner.scheduler.stash(data);
            debug!(replaced, "Host is stopping, save held for final write");
            inner.record(|m| &m.dropped_writes);
            return Ok(false);
        }

        if inner.scheduler.cancel() {
            debug!("Pending delayed write superseded by save");
        }
        inner.set_cache(Some(Arc::clone(&data)));

        let _guard = inner.write_lock.lock().await;
        inner.write_envelope(&data).await?;
        Ok(true)
    }

    /// Persist `factory()` after `delay`, replacing any pending write.
    ///
    /// Only the latest call is honored and its delay restarts from now.
    /// `factory` runs once, when the write happens (or when a `load()`
    /// needs the pending data first). While the host is stopping no
    /// timer is armed: the write happens only on final write.
    ///
    /// The pending write lives as long as the store does. Dropping the
    /// last handle discards it, even if a final write follows.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn delay_save<F>(&self, factory: F, delay: Duration)
    where
        F: FnOnce() -> T + Send + 'static,
    {
        let inner = &self.inner;
        let armed = !inner.phase().suppresses_writes();
        let store = Arc::downgrade(inner);

        let replaced = inner.scheduler.schedule(Box::new(factory), delay, |generation, due_at| {
            armed.then(|| tokio::spawn(StoreInner::run_timer(store, generation, due_at)))
        });

        debug!(
            key = %inner.key,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            replaced,
            armed,
            "Delayed save scheduled"
        );
    }

    /// `delay_save` with the store's configured default delay.
    pub fn schedule_save<F>(&self, factory: F)
    where
        F: FnOnce() -> T + Send + 'static,
    {
        self.delay_save(factory, self.inner.default_delay);
    }

    /// Current data, or `None` if nothing is stored under the key.
    ///
    /// Served from the pending deferred write or the cache when
    /// possible. Otherwise concurrent callers share one physical read
    /// and receive the same `Arc`. Data persisted under another version
    /// is migrated first; the migrated value is cached, not re-written.
    pub async fn load(&self) -> StoreResult<Option<Arc<T>>> {
        let inner = &self.inner;
        inner.record(|m| &m.loads);

        if let Some(pending) = inner.scheduler.peek() {
            return Ok(Some(pending));
        }
        if let Some(cached) = inner.cached() {
            return Ok(Some(cached));
        }

        let store = Arc::clone(inner);
        inner
            .loads
            .load_with(move || store.load_from_storage().boxed())
            .await
    }

    /// Delete the persisted data, the cache and any pending write.
    #[instrument(skip(self), fields(key = %self.inner.key))]
    pub async fn remove(&self) -> StoreResult<()> {
        let inner = &self.inner;
        inner.scheduler.cancel();
        inner.set_cache(None);

        let _guard = inner.write_lock.lock().await;
        inner
            .backend
            .delete(&inner.key)
            .await
            .map_err(|e| StoreError::io(&inner.key, e))?;
        info!("Store removed");
        Ok(())
    }
}

impl<T: StoreData> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: StoreData> std::fmt::Debug for Store<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("key", &self.inner.key)
            .field("version", &self.inner.version)
            .field("pending_write", &self.inner.scheduler.is_pending())
            .finish_non_exhaustive()
    }
}

impl<T: StoreData> StoreInner<T> {
    fn phase(&self) -> LifecyclePhase {
        self.lifecycle
            .as_ref()
            .map_or(LifecyclePhase::Running, |host| host.phase())
    }

    fn cached(&self) -> Option<Arc<T>> {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_cache(&self, data: Option<Arc<T>>) {
        *self.cache.lock().unwrap_or_else(PoisonError::into_inner) = data;
    }

    /// Cache `data` unless something newer got there first; returns the
    /// value that ends up cached.
    fn cache_if_empty(&self, data: T) -> Arc<T> {
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(cache.get_or_insert_with(|| Arc::new(data)))
    }

    fn record(&self, counter: impl FnOnce(&StoreMetrics) -> &IntCounterVec) {
        if let Some(metrics) = &self.metrics {
            counter(metrics).with_label_values(&[self.key.as_str()]).inc();
        }
    }

    /// Encode `data` in an envelope at the declared version and write it.
    /// Callers hold the write lock.
    async fn write_envelope(&self, data: &T) -> StoreResult<()> {
        let value = serde_json::to_value(data).map_err(|e| StoreError::encode(&self.key, e))?;
        let envelope = Envelope::new(&self.key, self.version, value);
        let bytes = self
            .codec
            .encode(&envelope)
            .map_err(|e| StoreError::encode(&self.key, e))?;

        self.backend
            .write(&self.key, &bytes)
            .await
            .map_err(|e| StoreError::io(&self.key, e))?;

        self.record(|m| &m.writes);
        debug!(key = %self.key, version = %self.version, bytes = bytes.len(), "Store data written");
        Ok(())
    }

    /// The physical load shared by concurrent `load()` callers.
    async fn load_from_storage(self: Arc<Self>) -> LoadOutcome<T> {
        info!(key = %self.key, "Loading data");
        self.record(|m| &m.physical_reads);

        let Some(bytes) = self
            .backend
            .read(&self.key)
            .await
            .map_err(|e| StoreError::io(&self.key, e))?
        else {
            debug!(key = %self.key, "No stored data");
            return Ok(None);
        };

        let envelope = self
            .codec
            .decode(&bytes)
            .map_err(|e| StoreError::decode(&self.key, e))?;
        let persisted = envelope.version_tag();

        let migrated = MigrationEngine::new(&self.key, self.version)
            .run(persisted, envelope.data, self.migrator.as_ref())
            .await?;
        if migrated.hook_invoked {
            self.record(|m| &m.migrations);
        }

        let data: T =
            serde_json::from_value(migrated.data).map_err(|e| StoreError::decode(&self.key, e))?;
        Ok(Some(self.cache_if_empty(data)))
    }

    /// Timer task of one pending write generation.
    async fn run_timer(store: Weak<Self>, generation: u64, due_at: Instant) {
        tokio::time::sleep_until(due_at).await;
        if let Some(store) = store.upgrade() {
            store.flush_due(generation).await;
        }
    }

    async fn flush_due(&self, generation: u64) {
        if self.phase().suppresses_writes() {
            debug!(key = %self.key, "Host is stopping, delayed write held for final write");
            self.scheduler.release_timer(generation);
            return;
        }

        let _guard = self.write_lock.lock().await;
        let Some(data) = self.scheduler.take_due(generation).and_then(|p| p.get()) else {
            return;
        };

        self.set_cache(Some(Arc::clone(&data)));
        self.record(|m| &m.delayed_flushes);
        if let Err(e) = self.write_envelope(&data).await {
            error!(key = %self.key, error = %e, "Delayed write failed");
        }
    }
}

impl<T: StoreData> Drop for StoreInner<T> {
    fn drop(&mut self) {
        if self.scheduler.is_pending() {
            warn!(key = %self.key, "Store dropped with a pending write, write discarded");
        }
    }
}

#[async_trait]
impl<T: StoreData> LifecycleListener for StoreInner<T> {
    fn on_stop(&self) {
        if self.scheduler.disarm() {
            debug!(key = %self.key, "Delayed write disarmed until final write");
        }
    }

    async fn on_final_write(&self) -> StoreResult<()> {
        let _guard = self.write_lock.lock().await;
        let Some(data) = self.scheduler.take().and_then(|p| p.get()) else {
            return Ok(());
        };

        info!(key = %self.key, "Flushing pending write on final write");
        self.set_cache(Some(Arc::clone(&data)));
        self.record(|m| &m.delayed_flushes);
        self.write_envelope(&data).await
    }
}
