//! Store Errors
//!
//! One error type for every store operation. It is `Clone` because a
//! single physical load may be awaited by many callers, each of which
//! receives its own copy of the outcome.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use super::version::VersionTag;

/// Convenience alias for `Result<T, StoreError>`.
pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Error, Debug, Clone)]
pub enum StoreError {
    /// The backend failed to read, write or delete. Never retried.
    #[error("storage I/O failed for `{key}`: {source}")]
    Io {
        key: String,
        #[source]
        source: Arc<std::io::Error>,
    },

    #[error("failed to encode data for `{key}`: {reason}")]
    Encode { key: String, reason: String },

    #[error("failed to decode data for `{key}`: {reason}")]
    Decode { key: String, reason: String },

    /// Persisted data has a major version the store cannot migrate.
    #[error("store `{key}` has no migration from version {found} to {expected}")]
    SchemaVersionUnsupported {
        key: String,
        found: VersionTag,
        expected: VersionTag,
    },

    /// A migration hook ran and reported a failure.
    #[error("migration of `{key}` from version {found} failed: {reason}")]
    Migration {
        key: String,
        found: VersionTag,
        reason: String,
    },

    #[error("legacy import from {} failed: {reason}", path.display())]
    LegacyImport { path: PathBuf, reason: String },
}

impl StoreError {
    pub fn io(key: &str, source: std::io::Error) -> Self {
        Self::Io {
            key: key.to_string(),
            source: Arc::new(source),
        }
    }

    pub fn encode(key: &str, reason: impl std::fmt::Display) -> Self {
        Self::Encode {
            key: key.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn decode(key: &str, reason: impl std::fmt::Display) -> Self {
        Self::Decode {
            key: key.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Whether this is a schema-version rejection.
    pub const fn is_schema_unsupported(&self) -> bool {
        matches!(self, Self::SchemaVersionUnsupported { .. })
    }
}
