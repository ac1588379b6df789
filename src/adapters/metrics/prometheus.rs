//! Prometheus Metrics Registry - Store Observability
//!
//! Counts loads, physical reads, writes, dropped writes, migrations and
//! delayed flushes per store key. Stores only increment; exporting the
//! text exposition is left to the embedding application.

use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

use crate::config::MetricsConfig;

/// Per-key store counters.
///
/// All metrics are named `<namespace>_*` and carry a `key` label.
pub struct StoreMetrics {
    /// Prometheus registry.
    registry: Registry,
    /// `load()` calls, whatever served them.
    pub loads: IntCounterVec,
    /// Reads that reached the backend.
    pub physical_reads: IntCounterVec,
    /// Envelopes written to the backend.
    pub writes: IntCounterVec,
    /// Saves not written at once because the host was stopping; they
    /// wait for final write.
    pub dropped_writes: IntCounterVec,
    /// Migration hook invocations.
    pub migrations: IntCounterVec,
    /// Deferred writes flushed by a timer or a final write.
    pub delayed_flushes: IntCounterVec,
}

impl StoreMetrics {
    /// Create and register all counters under `config.namespace`.
    pub fn new(config: &MetricsConfig) -> anyhow::Result<Self> {
        let registry = Registry::new();
        let ns = config.namespace.as_str();

        let counter = |name: &str, help: &str| -> anyhow::Result<IntCounterVec> {
            let vec = IntCounterVec::new(Opts::new(format!("{ns}_{name}"), help), &["key"])?;
            registry.register(Box::new(vec.clone()))?;
            Ok(vec)
        };

        let loads = counter("loads_total", "Store load calls")?;
        let physical_reads = counter("physical_reads_total", "Reads that reached storage")?;
        let writes = counter("writes_total", "Envelopes written to storage")?;
        let dropped_writes = counter(
            "dropped_writes_total",
            "Saves held for final write while the host was stopping",
        )?;
        let migrations = counter("migrations_total", "Migration hook invocations")?;
        let delayed_flushes = counter("delayed_flushes_total", "Deferred writes flushed")?;

        Ok(Self {
            registry,
            loads,
            physical_reads,
            writes,
            dropped_writes,
            migrations,
            delayed_flushes,
        })
    }

    /// Current value of `counter` for `key`.
    pub fn count(counter: &IntCounterVec, key: &str) -> u64 {
        counter.with_label_values(&[key]).get()
    }

    /// Render all metrics in Prometheus text format.
    pub fn render(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> MetricsConfig {
        MetricsConfig {
            enabled: true,
            namespace: "test_store".to_string(),
        }
    }

    #[test]
    fn test_counters_are_labelled_by_key() {
        let metrics = StoreMetrics::new(&config()).unwrap();
        metrics.writes.with_label_values(&["a"]).inc();
        metrics.writes.with_label_values(&["a"]).inc();
        metrics.writes.with_label_values(&["b"]).inc();

        assert_eq!(StoreMetrics::count(&metrics.writes, "a"), 2);
        assert_eq!(StoreMetrics::count(&metrics.writes, "b"), 1);
    }

    #[test]
    fn test_render_uses_namespace() {
        let metrics = StoreMetrics::new(&config()).unwrap();
        metrics.loads.with_label_values(&["core.config"]).inc();
        let text = metrics.render().unwrap();
        assert!(text.contains("test_store_loads_total{key=\"core.config\"} 1"));
    }
}
