//! Versioned Store - Library Root
//!
//! Durable, versioned storage of one value per key, with debounced
//! writes, single-flight loads and schema migration. Re-exports all
//! modules for integration tests and benchmarks.

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod telemetry;
pub mod usecases;

pub use domain::{LifecyclePhase, StoreError, StoreResult, VersionTag};
pub use usecases::{LegacyImport, Store, StoreBuilder, StoreContext, migrate_from_legacy};
