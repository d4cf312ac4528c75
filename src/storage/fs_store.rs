//! Local directory tree standing in for an object store.
//!
//! Layout is `root/{bucket}/{key}` where `/` in a key maps to nested
//! directories. Handy for backups synced to a mounted volume and for
//! rehearsing a rotation against a copy of a bucket.

use super::{ObjectStore, StorageError, StorageResult, ensure_key_safe};
use async_trait::async_trait;
use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};
use tokio::fs;
use tracing::debug;

#[derive(Clone, Debug)]
pub struct FsStore {
    /// Directory holding one sub-directory per bucket.
    pub base_path: PathBuf,
}

impl FsStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Compute the physical folder for a bucket. Does not check existence.
    fn bucket_root(&self, bucket: &str) -> PathBuf {
        self.base_path.join(bucket)
    }

    async fn existing_bucket_root(&self, bucket: &str) -> StorageResult<PathBuf> {
        let root = self.bucket_root(bucket);
        match fs::metadata(&root).await {
            Ok(meta) if meta.is_dir() => Ok(root),
            Ok(_) => Err(StorageError::BucketNotFound(bucket.to_string())),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                Err(StorageError::BucketNotFound(bucket.to_string()))
            }
            Err(err) => Err(StorageError::Io(err)),
        }
    }

    /// Recursively remove empty directories up to (not including) `stop`.
    async fn prune_empty_dirs(&self, start: &Path, stop: &Path) {
        let mut current = start.to_path_buf();
        while current.starts_with(stop) && current != stop {
            match fs::remove_dir(&current).await {
                Ok(_) => {
                    if let Some(parent) = current.parent() {
                        current = parent.to_path_buf();
                    } else {
                        break;
                    }
                }
                Err(err) if err.kind() == ErrorKind::NotFound => break,
                Err(err) if err.kind() == ErrorKind::DirectoryNotEmpty => break,
                Err(err) => {
                    debug!("failed to prune directory {}: {}", current.display(), err);
                    break;
                }
            }
        }
    }
}

#[async_trait]
impl ObjectStore for FsStore {
    async fn list_objects(&self, bucket: &str, prefix: &str) -> StorageResult<Vec<String>> {
        let root = self.existing_bucket_root(bucket).await?;
        let mut keys = Vec::new();
        let mut pending = vec![root.clone()];

        while let Some(dir) = pending.pop() {
            let mut entries = fs::read_dir(&dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let file_type = entry.file_type().await?;
                let path = entry.path();
                if file_type.is_dir() {
                    pending.push(path);
                    continue;
                }
                if !file_type.is_file() {
                    continue;
                }
                match object_key(&root, &path) {
                    Some(key) if key.starts_with(prefix) => keys.push(key),
                    Some(_) => {}
                    None => debug!("skipping non UTF-8 path {}", path.display()),
                }
            }
        }

        keys.sort();
        Ok(keys)
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> StorageResult<()> {
        ensure_key_safe(key)?;
        let root = self.existing_bucket_root(bucket).await?;
        let file_path = root.join(key);

        match fs::remove_file(&file_path).await {
            Ok(_) => debug!("removed physical file {}", file_path.display()),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(StorageError::ObjectNotFound {
                    bucket: bucket.to_string(),
                    key: key.to_string(),
                });
            }
            Err(err) => return Err(StorageError::Io(err)),
        }

        if let Some(parent) = file_path.parent() {
            self.prune_empty_dirs(parent, &root).await;
        }
        Ok(())
    }

    fn describe(&self) -> String {
        format!("fs:{}", self.base_path.display())
    }
}

/// Object key for `path` relative to the bucket root, `/`-separated.
fn object_key(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts = relative
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<Vec<_>>>()?;
    Some(parts.join("/"))
}
