//! Storage Port - Keyed Blob Persistence
//!
//! The store never touches files directly. It reads and writes opaque
//! bytes under its key through `StorageBackend`, and the one-shot legacy
//! import reaches pre-store files through `LegacyFs`.

use std::path::Path;

use async_trait::async_trait;

/// Keyed byte storage consumed by every store.
///
/// A missing resource is `Ok(None)`, never an error. Implementations
/// should make `write` atomic: a reader sees either the old or the new
/// bytes, never a partial write.
#[async_trait]
pub trait StorageBackend: Send + Sync + 'static {
  /// Read the bytes stored under `key`.
  async fn read(&self, key: &str) -> std::io::Result<Option<Vec<u8>>>;

  /// Replace the bytes stored under `key`.
  async fn write(&self, key: &str, bytes: &[u8]) -> std::io::Result<()>;

  /// Delete the resource under `key`. Deleting a missing key succeeds.
  async fn delete(&self, key: &str) -> std::io::Result<()>;
}

/// Path-addressed access to legacy files that predate the store.
#[async_trait]
pub trait LegacyFs: Send + Sync {
  /// Whether a regular file exists at `path`.
  async fn exists(&self, path: &Path) -> bool;

  /// Read the whole file at `path`.
  async fn read(&self, path: &Path) -> std::io::Result<Vec<u8>>;

  /// Remove the file at `path`.
  async fn remove(&self, path: &Path) -> std::io::Result<()>;
}
