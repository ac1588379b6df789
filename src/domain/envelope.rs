//! Persisted Envelope - The Unit Written to Storage
//!
//! Every store writes one envelope per key:
//! `{ "version", "minor_version", "key", "data" }`. The version fields
//! describe the shape of `data`, which is kept as a raw JSON value so
//! migrations can reshape it before it is deserialized.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::version::{DEFAULT_MINOR_VERSION, VersionTag};

/// Versioned wrapper around a store's payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Major version of `data`.
    pub version: u32,
    /// Minor version of `data`. Older files may omit it.
    #[serde(default = "default_minor_version")]
    pub minor_version: u32,
    /// Key of the store that wrote this envelope.
    pub key: String,
    /// The payload itself.
    pub data: Value,
}

impl Envelope {
    pub fn new(key: impl Into<String>, version: VersionTag, data: Value) -> Self {
        Self {
            version: version.major,
            minor_version: version.minor,
            key: key.into(),
            data,
        }
    }

    /// Version the payload was written under.
    pub const fn version_tag(&self) -> VersionTag {
        VersionTag::new(self.version, self.minor_version)
    }
}

const fn default_minor_version() -> u32 {
    DEFAULT_MINOR_VERSION
}
