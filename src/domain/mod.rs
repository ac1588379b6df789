//! Domain Layer - Store Data Model
//!
//! Plain types shared by ports, adapters and use cases:
//! - `VersionTag`: (major, minor) schema version
//! - `Envelope`: the persisted unit
//! - `LifecyclePhase`: host shutdown progress
//! - `StoreError`: the single error type

pub mod envelope;
pub mod error;
pub mod lifecycle;
pub mod version;

pub use envelope::Envelope;
pub use error::{StoreError, StoreResult};
pub use lifecycle::LifecyclePhase;
pub use version::{VersionDelta, VersionTag};
