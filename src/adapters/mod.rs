//! Adapters Layer - Hexagonal Architecture Outer Ring
//!
//! Implements the port traits defined in `crate::ports` with concrete
//! infrastructure. Each sub-module groups adapters by concern.
//!
//! Adapter categories:
//! - `persistence`: file and memory backends, JSON codec
//! - `lifecycle`: host phase holder and shutdown notifier
//! - `metrics`: Prometheus counters

pub mod lifecycle;
pub mod metrics;
pub mod persistence;
