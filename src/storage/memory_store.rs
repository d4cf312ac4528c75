//! In-memory bucket map for exercising the rotation without I/O.

use super::{ObjectStore, StorageError, StorageResult};
use async_trait::async_trait;
use std::{
    collections::{BTreeMap, BTreeSet},
    io,
    sync::Mutex,
};

#[derive(Default)]
pub struct MemoryStore {
    buckets: Mutex<BTreeMap<String, BTreeSet<String>>>,
    deletes: Mutex<Vec<String>>,
    fail_deletes: bool,
}

impl MemoryStore {
    pub fn with_objects<I, S>(bucket: &str, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let store = Self::default();
        store.buckets.lock().unwrap().insert(
            bucket.to_string(),
            keys.into_iter().map(Into::into).collect(),
        );
        store
    }

    /// Make every delete fail as if the backend were unreachable.
    pub fn failing_deletes(mut self) -> Self {
        self.fail_deletes = true;
        self
    }

    pub fn keys(&self, bucket: &str) -> BTreeSet<String> {
        self.buckets
            .lock()
            .unwrap()
            .get(bucket)
            .cloned()
            .unwrap_or_default()
    }

    /// Keys passed to `delete_object`, in call order.
    pub fn delete_calls(&self) -> Vec<String> {
        self.deletes.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn list_objects(&self, bucket: &str, prefix: &str) -> StorageResult<Vec<String>> {
        let buckets = self.buckets.lock().unwrap();
        let keys = buckets
            .get(bucket)
            .ok_or_else(|| StorageError::BucketNotFound(bucket.to_string()))?;
        Ok(keys
            .iter()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> StorageResult<()> {
        self.deletes.lock().unwrap().push(key.to_string());
        if self.fail_deletes {
            return Err(StorageError::Io(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                "backend unavailable",
            )));
        }
        let mut buckets = self.buckets.lock().unwrap();
        let keys = buckets
            .get_mut(bucket)
            .ok_or_else(|| StorageError::BucketNotFound(bucket.to_string()))?;
        if keys.remove(key) {
            Ok(())
        } else {
            Err(StorageError::ObjectNotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })
        }
    }

    fn describe(&self) -> String {
        "memory".into()
    }
}
