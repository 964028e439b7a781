//! S3-compatible bucket backend
//!
//! Prefixes don't exist in S3 on their own, so "ensuring the destination"
//! writes an empty `<prefix>/` marker object the first time. Links are
//! pre-signed GET URLs that expire after one hour; there is no publish step.

use std::path::Path;

use async_trait::async_trait;
use bytes::Bytes;
use http::Method;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path as ObjectPath;
use object_store::signer::Signer;
use object_store::Error as ObjectStoreError;
use object_store::{ObjectStoreExt, PutPayload};

use super::{DestinationStatus, StorageClient, StorageFailure, StorageResult, UploadReceipt};
use crate::core::config::{self, BucketConfig};
use crate::core::{format_size, AppError, AppResult};

/// S3 bucket client
pub struct BucketClient {
    store: AmazonS3,
    bucket: String,
}

impl BucketClient {
    /// Builds the client. Credentials come from the usual `AWS_*` environment
    /// variables; `endpoint` switches to an S3-compatible provider.
    pub fn new(settings: &BucketConfig) -> AppResult<Self> {
        let mut builder = AmazonS3Builder::from_env()
            .with_region(settings.region.clone())
            .with_bucket_name(settings.bucket.clone());

        if let Some(ref endpoint) = settings.endpoint {
            let allow_http = endpoint.starts_with("http://");
            builder = builder.with_endpoint(endpoint.clone()).with_allow_http(allow_http);
        }

        let store = builder
            .build()
            .map_err(|e| AppError::Config(format!("S3 bucket: {}", e)))?;

        Ok(Self {
            store,
            bucket: settings.bucket.clone(),
        })
    }
}

/// Key of the empty object that marks a prefix as present
pub(crate) fn marker_key(prefix: &str) -> String {
    format!("{}/", prefix.trim_matches('/'))
}

#[async_trait]
impl StorageClient for BucketClient {
    fn backend_name(&self) -> &'static str {
        "s3-bucket"
    }

    async fn ensure_destination_ready(&self, prefix: &str) -> StorageResult<DestinationStatus> {
        let marker = ObjectPath::from(marker_key(prefix));

        match self.store.head(&marker).await {
            Ok(_) => {
                log::debug!("Bucket prefix {} already exists in {}", prefix, self.bucket);
                return Ok(DestinationStatus::AlreadyExists);
            }
            Err(ObjectStoreError::NotFound { .. }) => {}
            Err(e) => {
                log::error!("Bucket prefix check for {} failed: {}", prefix, e);
                return Err(StorageFailure::Backend(e.to_string()));
            }
        }

        self.store
            .put(&marker, PutPayload::from(Bytes::new()))
            .await
            .map_err(|e| {
                log::error!("Bucket prefix creation for {} failed: {}", prefix, e);
                StorageFailure::Backend(e.to_string())
            })?;

        log::info!("Created bucket prefix {} in {}", prefix, self.bucket);
        Ok(DestinationStatus::Created)
    }

    async fn upload(&self, local_path: &Path, remote_path: &str) -> StorageResult<UploadReceipt> {
        let data = tokio::fs::read(local_path)
            .await
            .map_err(|e| StorageFailure::LocalFile(format!("{}: {}", local_path.display(), e)))?;
        let size = data.len() as u64;
        let location = ObjectPath::from(remote_path.to_string());
        let start = std::time::Instant::now();

        self.store
            .put(&location, PutPayload::from(Bytes::from(data)))
            .await
            .map_err(|e| {
                log::error!(
                    "Bucket upload of {} to {} failed after {:.2}s: {}",
                    local_path.display(),
                    remote_path,
                    start.elapsed().as_secs_f64(),
                    e
                );
                StorageFailure::Backend(e.to_string())
            })?;

        log::info!(
            "Uploaded {} to bucket {} as {} in {:.2}s",
            format_size(size),
            self.bucket,
            remote_path,
            start.elapsed().as_secs_f64()
        );

        Ok(UploadReceipt {
            remote_path: remote_path.to_string(),
            bytes: size,
        })
    }

    async fn resolve_shareable_link(&self, remote_path: &str) -> StorageResult<String> {
        let location = ObjectPath::from(remote_path.to_string());

        let url = self
            .store
            .signed_url(Method::GET, &location, config::bucket::presigned_url_ttl())
            .await
            .map_err(|e| {
                log::error!("Pre-signing {} failed: {}", remote_path, e);
                StorageFailure::Backend(e.to_string())
            })?;

        Ok(url.to_string())
    }
}
