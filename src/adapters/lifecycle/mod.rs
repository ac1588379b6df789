//! Lifecycle Adapters - Host Shutdown Coordination

pub mod host;

pub use host::HostLifecycle;
