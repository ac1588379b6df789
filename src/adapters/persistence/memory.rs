//! Memory Backend - In-Process Storage for Tests and Embedders
//!
//! Keeps bytes in a `HashMap` and counts every operation so callers can
//! assert how many physical reads or writes a store performed. An
//! optional read delay widens the window in which concurrent loads
//! overlap, a write delay keeps the write lock busy, and write failures
//! can be injected.

use std::collections::HashMap;
use std::io::Error;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::ports::storage::StorageBackend;

#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: Mutex<HashMap<String, Vec<u8>>>,
    reads: AtomicUsize,
    writes: AtomicUsize,
    deletes: AtomicUsize,
    read_delay: Option<Duration>,
    write_delay: Option<Duration>,
    fail_writes: AtomicBool,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep for `delay` inside every read before returning.
    #[must_use]
    pub const fn with_read_delay(mut self, delay: Duration) -> Self {
        self.read_delay = Some(delay);
        self
    }

    /// Sleep for `delay` inside every write before storing the bytes.
    #[must_use]
    pub const fn with_write_delay(mut self, delay: Duration) -> Self {
        self.write_delay = Some(delay);
        self
    }

    /// Make subsequent writes fail with an I/O error.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Store raw bytes under `key` without counting a write.
    pub fn insert_raw(&self, key: &str, bytes: Vec<u8>) {
        self.lock().insert(key.to_string(), bytes);
    }

    /// Store `value` as JSON under `key` without counting a write.
    pub fn insert_json(&self, key: &str, value: &Value) {
        self.insert_raw(key, value.to_string().into_bytes());
    }

    /// The JSON currently stored under `key`, if any.
    pub fn json(&self, key: &str) -> Option<Value> {
        self.lock()
            .get(key)
            .and_then(|bytes| serde_json::from_slice(bytes).ok())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.lock().contains_key(key)
    }

    /// Physical reads so far, including reads of missing keys.
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn delete_count(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn read(&self, key: &str) -> std::io::Result<Option<Vec<u8>>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.read_delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.lock().get(key).cloned())
    }

    async fn write(&self, key: &str, bytes: &[u8]) -> std::io::Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::other("injected write failure"));
        }
        if let Some(delay) = self.write_delay {
            tokio::time::sleep(delay).await;
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.lock().insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    async fn delete(&self, key: &str) -> std::io::Result<()> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.lock().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn test_counts_operations() {
        let backend = MemoryBackend::new();
        backend.write("k", b"1").await.unwrap();
        assert_eq!(backend.read("k").await.unwrap().as_deref(), Some(&b"1"[..]));
        assert!(backend.read("missing").await.unwrap().is_none());
        backend.delete("k").await.unwrap();

        assert_eq!(backend.write_count(), 1);
        assert_eq!(backend.read_count(), 2);
        assert_eq!(backend.delete_count(), 1);
        assert!(!backend.contains("k"));
    }

    #[tokio::test]
    async fn test_injected_write_failure() {
        let backend = MemoryBackend::new();
        backend.fail_writes(true);
        assert!(backend.write("k", b"1").await.is_err());
        assert_eq!(backend.write_count(), 0);
    }

    #[test]
    fn test_json_helpers() {
        let backend = MemoryBackend::new();
        backend.insert_json("k", &json!({"a": 1}));
        assert_eq!(backend.json("k"), Some(json!({"a": 1})));
    }
}
