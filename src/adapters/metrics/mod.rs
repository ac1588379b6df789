//! Metrics Adapters - Prometheus Counters

pub mod prometheus;

pub use self::prometheus::StoreMetrics;
