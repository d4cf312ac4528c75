//! S3 backend built on the `object_store` crate.
//!
//! Credentials come from the `AWS_*` environment (and the provider default
//! chain `object_store` falls back to), with explicit key/secret, region and
//! endpoint overrides on top. A store is bound to the bucket it was built for.

use super::{ObjectStore, StorageError, StorageResult};
use async_trait::async_trait;
use futures::TryStreamExt;
use object_store::{
    ClientOptions, ObjectStore as ObjectStoreBackend, aws::AmazonS3Builder, path::Path,
};
use std::{fmt, sync::Arc, time::Duration};
use tracing::{debug, trace};

/// Connection settings for an S3 or S3-compatible service.
#[derive(Clone)]
pub struct S3Config {
    pub bucket: String,
    pub region: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub endpoint: Option<String>,
    pub timeout: Duration,
}

impl fmt::Debug for S3Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3Config")
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("access_key", &self.access_key)
            .field("secret_key", &self.secret_key.as_ref().map(|_| "<redacted>"))
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Clone, Debug)]
pub struct S3Store {
    bucket: String,
    location: String,
    inner: Arc<dyn ObjectStoreBackend>,
}

impl S3Store {
    /// Build an S3 client from the environment plus explicit overrides.
    pub fn connect(config: &S3Config) -> StorageResult<Self> {
        let mut builder = AmazonS3Builder::from_env()
            .with_bucket_name(&config.bucket)
            .with_client_options(ClientOptions::new().with_timeout(config.timeout));

        if let Some(region) = &config.region {
            builder = builder.with_region(region);
        }
        if let Some(access_key) = &config.access_key {
            builder = builder.with_access_key_id(access_key);
        }
        if let Some(secret_key) = &config.secret_key {
            builder = builder.with_secret_access_key(secret_key);
        }
        if let Some(endpoint) = &config.endpoint {
            builder = builder
                .with_endpoint(endpoint)
                .with_allow_http(endpoint.starts_with("http://"));
        }

        let store = builder.build()?;
        let location = match &config.endpoint {
            Some(endpoint) => format!("{}/{}", endpoint.trim_end_matches('/'), config.bucket),
            None => format!("s3://{}", config.bucket),
        };
        Ok(Self::from_backend(&config.bucket, location, Arc::new(store)))
    }

    /// Wrap an already-built `object_store` backend for `bucket`.
    pub fn from_backend(
        bucket: impl Into<String>,
        location: impl Into<String>,
        inner: Arc<dyn ObjectStoreBackend>,
    ) -> Self {
        Self {
            bucket: bucket.into(),
            location: location.into(),
            inner,
        }
    }

    fn ensure_bucket(&self, bucket: &str) -> StorageResult<()> {
        if bucket == self.bucket {
            Ok(())
        } else {
            Err(StorageError::BucketNotFound(bucket.to_string()))
        }
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn list_objects(&self, bucket: &str, prefix: &str) -> StorageResult<Vec<String>> {
        self.ensure_bucket(bucket)?;

        // Listing prefixes are whole path segments, so list the directory
        // part and filter on the full string prefix.
        let directory = prefix.rsplit_once('/').map(|(dir, _)| Path::from(dir));
        let objects: Vec<_> = self.inner.list(directory.as_ref()).try_collect().await?;

        let keys: Vec<String> = objects
            .into_iter()
            .map(|meta| meta.location.to_string())
            .filter(|key| key.starts_with(prefix))
            .collect();
        debug!("listed {} matching keys from {}", keys.len(), self.location);
        Ok(keys)
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> StorageResult<()> {
        self.ensure_bucket(bucket)?;
        let path =
            Path::parse(key).map_err(|_| StorageError::InvalidObjectKey(key.to_string()))?;

        // S3 deletes are idempotent; check first so a vanished object is
        // reported instead of silently succeeding.
        self.inner.head(&path).await.map_err(|err| match err {
            object_store::Error::NotFound { .. } => StorageError::ObjectNotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            },
            other => StorageError::Backend(other),
        })?;

        trace!("DELETE {}/{}", self.location, key);
        self.inner.delete(&path).await?;
        Ok(())
    }

    fn describe(&self) -> String {
        self.location.clone()
    }
}
