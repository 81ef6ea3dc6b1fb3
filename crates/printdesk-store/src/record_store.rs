//! Generic single-document record store.
//!
//! A [`RecordStore`] owns one JSON document on disk and an in-memory copy of
//! its current state. All mutation goes through [`RecordStore::update`],
//! which holds a single-writer async mutex for the whole read-modify-write
//! cycle, so two concurrent mutations can never interleave and lose an
//! update. Writes go to a `.tmp` sibling and are renamed over the previous
//! copy, so a crash mid-write cannot leave a truncated document behind.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{Result, StoreError};

/// Durable key-ordered collection backed by a single serialized document.
pub struct RecordStore<T> {
    path: PathBuf,
    /// Current document state. The mutex doubles as the single-writer lock
    /// and as a read cache refreshed on every successful write.
    state: Mutex<T>,
}

impl<T> RecordStore<T>
where
    T: Serialize + DeserializeOwned + Clone,
{
    /// Open the document at `path`, seeding it with `seed` if it does not
    /// exist yet. The parent directory is created if missing.
    pub async fn open(path: impl Into<PathBuf>, seed: T) -> Result<Self> {
        let path = path.into();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let state = if fs::try_exists(&path).await? {
            let bytes = fs::read(&path).await?;
            serde_json::from_slice(&bytes)?
        } else {
            write_atomic(&path, &seed).await?;
            info!(path = %path.display(), "seeded new record store document");
            seed
        };

        debug!(path = %path.display(), "record store opened");

        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    /// Return a copy of the current document.
    pub async fn snapshot(&self) -> T {
        self.state.lock().await.clone()
    }

    /// Run a read-modify-write cycle under the single-writer lock.
    ///
    /// The closure mutates a working copy; the new state is persisted and
    /// only then committed to the in-memory cache. If the closure or the
    /// write fails, both the cache and the durable document are left exactly
    /// as they were.
    pub async fn update<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut T) -> Result<R>,
    {
        let mut guard = self.state.lock().await;
        let mut working = guard.clone();
        let out = f(&mut working)?;
        write_atomic(&self.path, &working).await?;
        *guard = working;
        Ok(out)
    }

    /// Replace the whole document with `value`.
    pub async fn replace(&self, value: T) -> Result<()> {
        let mut guard = self.state.lock().await;
        write_atomic(&self.path, &value).await?;
        *guard = value;
        Ok(())
    }

    /// Filesystem path of the backing document.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Serialize `value` and atomically replace the document at `path`.
///
/// The temp file lives next to the target so the rename never crosses a
/// filesystem boundary.
async fn write_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(value)?;

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    fs::write(&tmp, &bytes).await.map_err(|e| {
        StoreError::Io(std::io::Error::new(
            e.kind(),
            format!("failed to write '{}': {}", tmp.display(), e),
        ))
    })?;
    fs::rename(&tmp, path).await.map_err(|e| {
        StoreError::Io(std::io::Error::new(
            e.kind(),
            format!("failed to replace '{}': {}", path.display(), e),
        ))
    })?;

    Ok(())
}
