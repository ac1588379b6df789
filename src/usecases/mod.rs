//! Use Cases Layer - The Store Core
//!
//! Orchestrates ports into the versioned store:
//! - `store`: the `Store` façade and its builder
//! - `write_scheduler`: debounced deferred writes
//! - `load_coalescer`: single-flight loads
//! - `migration_engine`: version comparison and hook dispatch
//! - `legacy_import`: one-shot import of pre-store files
//! - `context`: shared wiring for many stores

pub mod context;
pub mod legacy_import;
pub mod load_coalescer;
pub mod migration_engine;
pub mod store;
pub mod write_scheduler;

pub use context::StoreContext;
pub use legacy_import::{LegacyImport, migrate_from_legacy};
pub use store::{Store, StoreBuilder, StoreData};
