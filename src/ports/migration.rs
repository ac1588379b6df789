//! Migration Port - Schema Upgrade Hooks
//!
//! A store owner overrides `Migrate::migrate` to reshape data persisted
//! under an older version. Two historical hook shapes exist:
//! - canonical: `(old_major, old_minor, old_data)`
//! - legacy: `(old_version, old_data)`, wrapped by `Legacy`
//!
//! Returning `MigrateError::NotImplemented` means "no migration for this
//! version": tolerated for minor changes, fatal for major ones.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Outcome of a hook that did not produce migrated data.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MigrateError {
  /// The hook has no migration for the persisted version.
  #[error("migration not implemented")]
  NotImplemented,
  /// The hook tried and failed.
  #[error("{0}")]
  Failed(String),
}

/// Canonical migration hook.
#[async_trait]
pub trait Migrate: Send + Sync + 'static {
  /// Transform `old_data` persisted under `(old_major, old_minor)` into
  /// the store's declared shape.
  async fn migrate(
    &self,
    _old_major: u32,
    _old_minor: u32,
    _old_data: Value,
  ) -> Result<Value, MigrateError> {
    Err(MigrateError::NotImplemented)
  }
}

/// Legacy two-argument migration hook, keyed by major version only.
#[async_trait]
pub trait LegacyMigrate: Send + Sync + 'static {
  async fn migrate(&self, old_version: u32, old_data: Value) -> Result<Value, MigrateError>;
}

/// Store without any migration hook.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMigration;

#[async_trait]
impl Migrate for NoMigration {}

/// Adapts a `LegacyMigrate` hook to the canonical `Migrate` shape.
///
/// The minor version is not forwarded: legacy hooks only ever see the
/// persisted major version.
#[derive(Debug, Clone)]
pub struct Legacy<M>(pub M);

#[async_trait]
impl<M: LegacyMigrate> Migrate for Legacy<M> {
  async fn migrate(
    &self,
    old_major: u32,
    _old_minor: u32,
    old_data: Value,
  ) -> Result<Value, MigrateError> {
    self.0.migrate(old_major, old_data).await
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  struct Renamer;

  #[async_trait]
  impl LegacyMigrate for Renamer {
    async fn migrate(&self, old_version: u32, old_data: Value) -> Result<Value, MigrateError> {
      Ok(json!({"from": old_version, "data": old_data}))
    }
  }

  #[tokio::test]
  async fn test_no_migration_reports_not_implemented() {
    let result = NoMigration.migrate(1, 1, json!(null)).await;
    assert_eq!(result, Err(MigrateError::NotImplemented));
  }

  #[tokio::test]
  async fn test_legacy_adapter_forwards_major_only() {
    let migrated = Legacy(Renamer).migrate(4, 9, json!("x")).await.unwrap();
    assert_eq!(migrated, json!({"from": 4, "data": "x"}));
  }
}
