//! Filesystem byte store.
//!
//! Each key maps to a directory under the store root; the bytes live in a
//! fixed-name file inside it. That lets `p/m` and `p/m/arg` coexist, which
//! a plain file-per-key layout cannot (`p/m` would have to be both a file
//! and a directory).
//!
//! ```text
//! <root>/<seg1>/<seg2>/.../<segN>/@data
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;

use super::{validate_key, ByteStore, StoreError};

/// Name of the file holding a key's bytes. Key segments may not start
/// with `@`, so it can never collide with a key.
const DATA_FILE: &str = "@data";

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Byte store rooted at a directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    /// Create a store rooted at `root`. The directory is created lazily on
    /// first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn key_dir(&self, key: &str) -> Result<PathBuf, StoreError> {
        validate_key(key)?;
        if key.split('/').any(|segment| segment.starts_with('@')) {
            return Err(StoreError::InvalidKey {
                key: key.to_string(),
                reason: "segments starting with '@' are reserved".to_string(),
            });
        }
        Ok(key.split('/').fold(self.root.clone(), |path, segment| path.join(segment)))
    }
}

#[async_trait]
impl ByteStore for FsStore {
    async fn get(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        let path = self.key_dir(key)?.join(DATA_FILE);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(key.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError> {
        let dir = self.key_dir(key)?;
        let path = dir.join(DATA_FILE);

        if let Ok(existing) = tokio::fs::read(&path).await {
            if existing == bytes {
                log::debug!("FsStore: {} already holds identical bytes", key);
                return Ok(());
            }
        }

        tokio::fs::create_dir_all(&dir).await?;

        // Write beside the target and rename so readers never see a torn file.
        let tmp = dir.join(format!(
            "{}.tmp.{}.{}",
            DATA_FILE,
            std::process::id(),
            TMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        tokio::fs::write(&tmp, bytes).await?;
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        log::debug!("FsStore: stored {} bytes under {}", bytes.len(), key);
        Ok(())
    }
}
