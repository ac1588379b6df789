//! Ports Layer - Hexagonal Architecture Boundaries
//!
//! Defines the interfaces (traits) that the store core requires from
//! the outside world. Adapters implement these traits.
//!
//! Port categories:
//! - `StorageBackend` / `LegacyFs`: byte persistence
//! - `Codec`: envelope serialization
//! - `Migrate` / `LegacyMigrate`: schema upgrade hooks
//! - `LifecycleHost` / `LifecycleListener`: shutdown notifications

pub mod codec;
pub mod lifecycle;
pub mod migration;
pub mod storage;
