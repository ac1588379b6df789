//! Migration Engine - Version Comparison and Hook Dispatch
//!
//! Runs on every physical load. Compares the persisted version with the
//! store's declared one and decides what happens to the payload:
//! - same version: passes through, hook not called
//! - minor change: hook called; "not implemented" passes through
//! - major change: hook called; "not implemented" is fatal

use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::domain::{StoreError, StoreResult, VersionDelta, VersionTag};
use crate::ports::migration::{Migrate, MigrateError};

/// Payload after migration.
#[derive(Debug, Clone, PartialEq)]
pub struct Migrated {
    pub data: Value,
    /// Whether the hook ran (successfully or not).
    pub hook_invoked: bool,
}

/// Migration dispatcher for one store.
pub struct MigrationEngine<'a> {
    key: &'a str,
    declared: VersionTag,
}

impl<'a> MigrationEngine<'a> {
    pub const fn new(key: &'a str, declared: VersionTag) -> Self {
        Self { key, declared }
    }

    /// Bring `data`, persisted under `persisted`, to the declared version.
    ///
    /// The hook is invoked at most once.
    #[instrument(skip(self, data, hook), fields(key = %self.key, declared = %self.declared))]
    pub async fn run(
        &self,
        persisted: VersionTag,
        data: Value,
        hook: &dyn Migrate,
    ) -> StoreResult<Migrated> {
        let delta = self.declared.delta_from(&persisted);
        if delta == VersionDelta::Same {
            return Ok(Migrated {
                data,
                hook_invoked: false,
            });
        }

        info!(%persisted, ?delta, "Migrating stored data");
        // Kept for the minor pass-through, the hook consumes its copy.
        let original = (delta == VersionDelta::MinorChanged).then(|| data.clone());

        match hook.migrate(persisted.major, persisted.minor, data).await {
            Ok(data) => Ok(Migrated {
                data,
                hook_invoked: true,
            }),
            Err(MigrateError::NotImplemented) => match original {
                Some(data) => {
                    debug!(%persisted, "No minor migration, data passed through");
                    Ok(Migrated {
                        data,
                        hook_invoked: true,
                    })
                }
                None => Err(StoreError::SchemaVersionUnsupported {
                    key: self.key.to_string(),
                    found: persisted,
                    expected: self.declared,
                }),
            },
            Err(MigrateError::Failed(reason)) => Err(StoreError::Migration {
                key: self.key.to_string(),
                found: persisted,
                reason,
            }),
        }
    }
}
