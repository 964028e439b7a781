//! Remote storage backends
//!
//! Two flavours exist behind one [`StorageClient`] trait:
//! - [`disk::DiskClient`]: folder-style cloud disk (Yandex Disk REST API). The
//!   destination folder must exist, uploads go to a one-time upload URL and a
//!   resource has to be published before it has a public link.
//! - [`bucket::BucketClient`]: S3-compatible bucket. Objects are written in a
//!   single call and links are pre-signed for one hour.
//!
//! Remote calls never raise on a bad status. They return [`StorageFailure`],
//! which the caller has to branch on.

pub mod bucket;
pub mod disk;

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::core::config::{Config, StorageBackend};
use crate::core::AppResult;

/// Soft failure of a remote storage call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageFailure {
    /// The backend answered with a status we don't treat as success
    #[error("{operation} failed with status {status}: {body}")]
    Status {
        operation: &'static str,
        status: u16,
        body: String,
    },

    /// The upload URL request failed or returned no target
    #[error("upload target unavailable: {0}")]
    UploadTargetUnavailable(String),

    /// The backend answered 2xx but the link was missing
    #[error("no public link in response")]
    LinkMissing,

    /// Network/transport level failure
    #[error("{operation} transport error: {message}")]
    Transport { operation: &'static str, message: String },

    /// Local file could not be read for upload
    #[error("local file error: {0}")]
    LocalFile(String),

    /// Backend-specific error (object store, signer)
    #[error("backend error: {0}")]
    Backend(String),
}

impl StorageFailure {
    /// True when the backend had already handed out an upload target before
    /// failing. Local read errors and refused targets happen before that.
    pub fn after_upload_target(&self) -> bool {
        match self {
            Self::Status { operation, .. } | Self::Transport { operation, .. } => *operation == "upload",
            Self::Backend(_) => true,
            Self::UploadTargetUnavailable(_) | Self::LinkMissing | Self::LocalFile(_) => false,
        }
    }

    pub(crate) fn transport(operation: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Transport {
            operation,
            message: err.to_string(),
        }
    }
}

/// Result of a remote storage call
pub type StorageResult<T> = Result<T, StorageFailure>;

/// What `ensure_destination_ready` found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestinationStatus {
    Created,
    AlreadyExists,
}

/// Confirmation that bytes reached the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    pub remote_path: String,
    pub bytes: u64,
}

/// Where a file lands on the remote storage: `prefix/name`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteDestination {
    prefix: String,
    name: String,
}

impl RemoteDestination {
    pub fn new(prefix: &str, name: &str) -> Self {
        Self {
            prefix: prefix.trim_matches('/').to_string(),
            name: name.to_string(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Full target path. Same name means same path: uploads overwrite.
    pub fn path(&self) -> String {
        if self.prefix.is_empty() {
            self.name.clone()
        } else {
            format!("{}/{}", self.prefix, self.name)
        }
    }
}

/// One remote storage backend
#[async_trait]
pub trait StorageClient: Send + Sync {
    /// Short backend name for logs
    fn backend_name(&self) -> &'static str;

    /// Makes sure the destination folder/prefix exists. Idempotent: an
    /// existing destination is success, not an error.
    async fn ensure_destination_ready(&self, prefix: &str) -> StorageResult<DestinationStatus>;

    /// Transfers a local file to `remote_path`, overwriting anything there
    async fn upload(&self, local_path: &Path, remote_path: &str) -> StorageResult<UploadReceipt>;

    /// Produces a link the user can download the file from
    async fn resolve_shareable_link(&self, remote_path: &str) -> StorageResult<String>;
}

/// Builds the storage client selected in the configuration
pub fn create_storage_client(config: &Config) -> AppResult<Arc<dyn StorageClient>> {
    let client: Arc<dyn StorageClient> = match config.storage_backend {
        StorageBackend::Disk => Arc::new(disk::DiskClient::new(&config.disk_api_url, &config.disk_token)?),
        StorageBackend::Bucket => Arc::new(bucket::BucketClient::new(&config.bucket)?),
    };
    log::info!("Storage backend: {}", client.backend_name());
    Ok(client)
}
