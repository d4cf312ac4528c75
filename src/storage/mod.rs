//! Storage collaborators the rotation runs against.
//!
//! The rotation core only ever needs two calls: list every key under a
//! prefix and delete a single key. Pagination, transport, and timeouts stay
//! inside each backend.

pub mod fs_store;
#[cfg(test)]
pub mod memory_store;
pub mod s3_store;

use async_trait::async_trait;
use std::io;
use thiserror::Error;

const MAX_OBJECT_KEY_LEN: usize = 1024;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("bucket `{0}` not found")]
    BucketNotFound(String),
    #[error("object `{key}` not found in bucket `{bucket}`")]
    ObjectNotFound { bucket: String, key: String },
    #[error("invalid object key `{0}`")]
    InvalidObjectKey(String),
    #[error(transparent)]
    Backend(#[from] object_store::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Minimal object-store surface used by the rotation.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Every key in `bucket` starting with `prefix`, fully paginated.
    async fn list_objects(&self, bucket: &str, prefix: &str) -> StorageResult<Vec<String>>;

    /// Remove a single object. Missing objects are an error.
    async fn delete_object(&self, bucket: &str, key: &str) -> StorageResult<()>;

    /// Short human-readable location, used in logs.
    fn describe(&self) -> String;
}

/// Basic key validation to avoid trivial path traversal vectors.
///
/// Rejects empty or oversized keys, keys that begin with `/`, contain `..`,
/// backslashes, or control characters.
pub fn ensure_key_safe(key: &str) -> StorageResult<()> {
    let invalid = || Err(StorageError::InvalidObjectKey(key.to_string()));
    if key.is_empty() || key.len() > MAX_OBJECT_KEY_LEN {
        return invalid();
    }
    if key.starts_with('/') || key.contains("..") {
        return invalid();
    }
    if key.bytes().any(|b| b.is_ascii_control() || b == b'\\') {
        return invalid();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_nested_keys() {
        assert!(ensure_key_safe("jenkins-backup-20230101-0100.tar.gz").is_ok());
        assert!(ensure_key_safe("nightly/jenkins-backup-20230101-x.tar.gz").is_ok());
    }

    #[test]
    fn rejects_traversal_and_control_bytes() {
        for key in ["", "/etc/passwd", "a/../b", "a\\b", "a\0b", "tab\there"] {
            assert!(
                matches!(ensure_key_safe(key), Err(StorageError::InvalidObjectKey(_))),
                "{key:?} should be rejected"
            );
        }
        assert!(ensure_key_safe(&"k".repeat(MAX_OBJECT_KEY_LEN + 1)).is_err());
    }
}
