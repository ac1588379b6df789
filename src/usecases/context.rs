//! Store Context - Shared Wiring for Many Stores
//!
//! Subsystems rarely build stores from scratch. A `StoreContext` holds
//! the backend, lifecycle host, codec and metrics once, and hands out
//! builders pre-wired with them.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;

use super::store::{StoreBuilder, StoreData};
use crate::adapters::lifecycle::HostLifecycle;
use crate::adapters::metrics::StoreMetrics;
use crate::adapters::persistence::{FileBackend, JsonCodec};
use crate::config::StoreConfig;
use crate::ports::storage::StorageBackend;

pub struct StoreContext {
    backend: Arc<dyn StorageBackend>,
    lifecycle: Arc<HostLifecycle>,
    codec: JsonCodec,
    metrics: Option<Arc<StoreMetrics>>,
    default_delay: Duration,
}

impl StoreContext {
    /// Context over `backend` with a fresh lifecycle host and defaults.
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self {
            backend,
            lifecycle: Arc::new(HostLifecycle::new()),
            codec: JsonCodec::default(),
            metrics: None,
            default_delay: super::store::DEFAULT_SAVE_DELAY,
        }
    }

    /// Context over a `FileBackend` configured from `config`.
    pub async fn from_config(config: &StoreConfig) -> Result<Self> {
        let backend = FileBackend::from_config(&config.storage)
            .await
            .with_context(|| format!("Failed to open data dir {}", config.storage.data_dir))?;

        let metrics = if config.metrics.enabled {
            Some(Arc::new(
                StoreMetrics::new(&config.metrics).context("Failed to register store metrics")?,
            ))
        } else {
            None
        };

        info!(
            data_dir = %config.storage.data_dir,
            atomic_writes = config.storage.atomic_writes,
            metrics = metrics.is_some(),
            "Store context ready"
        );

        Ok(Self {
            backend: Arc::new(backend),
            lifecycle: Arc::new(HostLifecycle::new()),
            codec: if config.storage.pretty_json {
                JsonCodec::pretty()
            } else {
                JsonCodec::compact()
            },
            metrics,
            default_delay: Duration::from_millis(config.scheduler.default_delay_ms),
        })
    }

    /// Builder for store `key` at major version `major`, wired to this
    /// context.
    pub fn store<T: StoreData>(&self, key: impl Into<String>, major: u32) -> StoreBuilder<T> {
        let builder = StoreBuilder::new(key, major, Arc::clone(&self.backend))
            .codec(self.codec)
            .lifecycle(Arc::clone(&self.lifecycle) as _)
            .default_delay(self.default_delay);
        match &self.metrics {
            Some(metrics) => builder.metrics(Arc::clone(metrics)),
            None => builder,
        }
    }

    pub fn lifecycle(&self) -> &Arc<HostLifecycle> {
        &self.lifecycle
    }

    pub fn metrics(&self) -> Option<&Arc<StoreMetrics>> {
        self.metrics.as_ref()
    }

    pub fn backend(&self) -> &Arc<dyn StorageBackend> {
        &self.backend
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::persistence::MemoryBackend;
    use serde_json::{Value, json};

    #[tokio::test]
    async fn test_from_config_opens_data_dir_and_metrics() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = StoreConfig::default();
        config.storage.data_dir = dir.path().join("stores").display().to_string();

        let ctx = StoreContext::from_config(&config).await.unwrap();
        assert!(dir.path().join("stores").is_dir());

        let store = ctx.store::<Value>("prefs", 1).build();
        store.save(json!({"a": 1})).await.unwrap();
        assert!(dir.path().join("stores").join("prefs").is_file());

        let metrics = ctx.metrics().unwrap();
        assert_eq!(StoreMetrics::count(&metrics.writes, "prefs"), 1);
    }

    #[tokio::test]
    async fn test_stores_share_the_context_lifecycle() {
        let backend = Arc::new(MemoryBackend::new());
        let ctx = StoreContext::new(backend.clone());
        assert!(ctx.metrics().is_none());
        ctx.backend().write("raw", b"{}").await.unwrap();
        assert!(backend.contains("raw"));

        let first = ctx.store::<Value>("first", 1).build();
        let second = ctx.store::<Value>("second", 1).build();
        assert_eq!(ctx.lifecycle().listener_count(), 2);

        ctx.lifecycle().stop();
        first.save(json!(1)).await.unwrap();
        second.save(json!(2)).await.unwrap();
        assert_eq!(backend.write_count(), 0);
    }
}
