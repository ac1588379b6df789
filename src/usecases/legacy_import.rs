//! Legacy Import - One-Shot Migration from Pre-Store Files
//!
//! Moves data from a file that predates the store into it:
//! 1. no legacy file: return the store's current data, touch nothing
//! 2. otherwise load the file, transform it, save it into the store and
//!    delete the file, so the next run takes branch 1

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures_util::future::{BoxFuture, FutureExt};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use super::store::{Store, StoreData};
use crate::domain::{StoreError, StoreResult};
use crate::ports::storage::LegacyFs;

type Loader = Box<dyn FnOnce(&Path) -> StoreResult<Value> + Send>;
type Transform = Box<dyn FnOnce(Value) -> BoxFuture<'static, StoreResult<Value>> + Send>;

/// A configured legacy import.
pub struct LegacyImport {
    path: PathBuf,
    loader: Option<Loader>,
    transform: Option<Transform>,
}

impl LegacyImport {
    /// Import from `path`, parsed as JSON, without transformation.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            loader: None,
            transform: None,
        }
    }

    /// Replace the default JSON loader.
    ///
    /// The loader runs on Tokio's blocking pool and may do blocking I/O.
    #[must_use]
    pub fn with_loader<F>(mut self, loader: F) -> Self
    where
        F: FnOnce(&Path) -> StoreResult<Value> + Send + 'static,
    {
        self.loader = Some(Box::new(loader));
        self
    }

    /// Reshape the legacy data before it is saved.
    #[must_use]
    pub fn with_transform<F, Fut>(mut self, transform: F) -> Self
    where
        F: FnOnce(Value) -> Fut + Send + 'static,
        Fut: Future<Output = StoreResult<Value>> + Send + 'static,
    {
        self.transform = Some(Box::new(move |old| transform(old).boxed()));
        self
    }

    /// Run the import against `store`.
    ///
    /// The legacy file is deleted only after the data was written; if
    /// the host is stopping the data waits for final write and the file
    /// is kept for the next run.
    #[instrument(skip_all, fields(path = %self.path.display(), key = store.key()))]
    pub async fn run<T: StoreData>(
        self,
        fs: &dyn LegacyFs,
        store: &Store<T>,
    ) -> StoreResult<Option<Arc<T>>> {
        if !fs.exists(&self.path).await {
            debug!("No legacy file, using store data");
            return store.load().await;
        }

        let old = match self.loader {
            Some(loader) => {
                let path = self.path.clone();
                tokio::task::spawn_blocking(move || loader(&path))
                    .await
                    .map_err(|e| legacy_error(&self.path, e))??
            }
            None => {
                let bytes = fs
                    .read(&self.path)
                    .await
                    .map_err(|e| legacy_error(&self.path, e))?;
                serde_json::from_slice(&bytes).map_err(|e| legacy_error(&self.path, e))?
            }
        };

        let new = match self.transform {
            Some(transform) => transform(old).await?,
            None => old,
        };
        let data: T = serde_json::from_value(new).map_err(|e| legacy_error(&self.path, e))?;
        let data = Arc::new(data);

        if !store.save_shared(Arc::clone(&data)).await? {
            warn!("Host is stopping, legacy data held for final write, legacy file kept");
            return Ok(Some(data));
        }

        fs.remove(&self.path)
            .await
            .map_err(|e| legacy_error(&self.path, e))?;
        info!("Legacy file imported into store");
        Ok(Some(data))
    }
}

/// Import `legacy_path` into `store` with the default loader and no
/// transformation.
pub async fn migrate_from_legacy<T: StoreData>(
    fs: &dyn LegacyFs,
    legacy_path: impl Into<PathBuf>,
    store: &Store<T>,
) -> StoreResult<Option<Arc<T>>> {
    LegacyImport::new(legacy_path).run(fs, store).await
}

fn legacy_error(path: &Path, reason: impl std::fmt::Display) -> StoreError {
    StoreError::LegacyImport {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}
