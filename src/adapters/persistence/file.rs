//! File Backend - One JSON File per Store Key
//!
//! Stores each key as `<data_dir>/<key>`. Writes go to `<key>.tmp` first
//! and are then renamed over the final path, so a crash mid-write leaves
//! either the old or the new file, never a partial one.

use std::io::{Error, ErrorKind};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, instrument};

use crate::config::StorageConfig;
use crate::ports::storage::{LegacyFs, StorageBackend};

/// Directory-backed `StorageBackend`.
#[derive(Debug, Clone)]
pub struct FileBackend {
    /// Directory holding one file per key.
    data_dir: PathBuf,
    /// Write through a temp file + rename.
    atomic_writes: bool,
}

impl FileBackend {
    /// Create a backend rooted at `data_dir`, creating it if needed.
    pub async fn new(data_dir: impl AsRef<Path>, atomic_writes: bool) -> std::io::Result<Self> {
        let data_dir = data_dir.as_ref().to_path_buf();
        fs::create_dir_all(&data_dir).await?;
        Ok(Self {
            data_dir,
            atomic_writes,
        })
    }

    pub async fn from_config(config: &StorageConfig) -> std::io::Result<Self> {
        Self::new(&config.data_dir, config.atomic_writes).await
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Path of the file holding `key`.
    ///
    /// Keys are flat names; anything that could escape `data_dir` is
    /// rejected.
    pub fn path_for(&self, key: &str) -> std::io::Result<PathBuf> {
        let invalid = key.is_empty()
            || key == "."
            || key == ".."
            || key.contains(['/', '\\'])
            || key.ends_with(".tmp");
        if invalid {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                format!("invalid store key: {key:?}"),
            ));
        }
        Ok(self.data_dir.join(key))
    }
}

#[async_trait]
impl StorageBackend for FileBackend {
    #[instrument(skip(self))]
    async fn read(&self, key: &str) -> std::io::Result<Option<Vec<u8>>> {
        let path = self.path_for(key)?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "No file for key");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    #[instrument(skip(self, bytes), fields(len = bytes.len()))]
    async fn write(&self, key: &str, bytes: &[u8]) -> std::io::Result<()> {
        let path = self.path_for(key)?;
        if !self.atomic_writes {
            return fs::write(&path, bytes).await;
        }

        let tmp_path = self.data_dir.join(format!("{key}.tmp"));
        fs::write(&tmp_path, bytes).await?;
        fs::rename(&tmp_path, &path).await
    }

    #[instrument(skip(self))]
    async fn delete(&self, key: &str) -> std::io::Result<()> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path).await {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl LegacyFs for FileBackend {
    async fn exists(&self, path: &Path) -> bool {
        fs::metadata(path).await.is_ok_and(|m| m.is_file())
    }

    async fn read(&self, path: &Path) -> std::io::Result<Vec<u8>> {
        fs::read(path).await
    }

    async fn remove(&self, path: &Path) -> std::io::Result<()> {
        fs::remove_file(path).await
    }
}
