//! Folder-style cloud disk backend (Yandex Disk REST API v1)
//!
//! Every call is made against `{base}/resources...` with an `OAuth` token:
//! - `PUT  /resources?path=..`            create folder (201 created, 409 exists)
//! - `GET  /resources/upload?path=..`     one-time upload URL (`href`)
//! - `PUT  <href>`                        the bytes themselves (201/202)
//! - `PUT  /resources/publish?path=..`    publish the resource
//! - `GET  /resources?path=..`            read back `public_url`

use std::path::Path;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_LENGTH};
use reqwest::{Client, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tokio_util::io::ReaderStream;

use super::{DestinationStatus, StorageClient, StorageFailure, StorageResult, UploadReceipt};
use crate::core::config;
use crate::core::{format_size, AppResult};

/// Upload target returned by `/resources/upload`
#[derive(Debug, Deserialize)]
struct UploadLink {
    href: Option<String>,
}

/// Subset of the resource metadata we read back after publishing
#[derive(Debug, Deserialize)]
struct ResourceMeta {
    public_url: Option<String>,
}

/// Yandex Disk client
pub struct DiskClient {
    http: Client,
    base_url: String,
    token: SecretString,
}

impl DiskClient {
    /// Creates a client for the API rooted at `base_url`
    /// (normally [`config::YANDEX_DISK_API_URL`])
    pub fn new(base_url: &str, token: &SecretString) -> AppResult<Self> {
        let http = Client::builder().timeout(config::network::timeout()).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: SecretString::from(token.expose_secret().to_string()),
        })
    }

    fn resources_url(&self, suffix: &str) -> String {
        format!("{}/resources{}", self.base_url, suffix)
    }

    fn auth_header(&self) -> String {
        format!("OAuth {}", self.token.expose_secret())
    }

    /// Requests a one-time upload URL for `remote_path`
    async fn request_upload_target(&self, remote_path: &str) -> StorageResult<String> {
        let resp = self
            .http
            .get(self.resources_url("/upload"))
            .header(AUTHORIZATION, self.auth_header())
            .query(&[("path", remote_path), ("overwrite", "true")])
            .send()
            .await
            .map_err(|e| StorageFailure::UploadTargetUnavailable(e.to_string()))?;

        if !resp.status().is_success() {
            let failure = status_failure("upload target", resp).await;
            return Err(StorageFailure::UploadTargetUnavailable(failure.to_string()));
        }

        let link: UploadLink = resp
            .json()
            .await
            .map_err(|e| StorageFailure::UploadTargetUnavailable(e.to_string()))?;

        match link.href.filter(|href| !href.is_empty()) {
            Some(href) => Ok(href),
            None => {
                log::error!("Upload target response for {} has no href", remote_path);
                Err(StorageFailure::UploadTargetUnavailable(
                    "response has no href".to_string(),
                ))
            }
        }
    }

    /// Streams the local file to a previously obtained upload target
    async fn put_bytes(&self, href: &str, local_path: &Path) -> StorageResult<u64> {
        let file = tokio::fs::File::open(local_path)
            .await
            .map_err(|e| StorageFailure::LocalFile(format!("{}: {}", local_path.display(), e)))?;
        let size = file
            .metadata()
            .await
            .map_err(|e| StorageFailure::LocalFile(format!("{}: {}", local_path.display(), e)))?
            .len();

        log::info!("Uploading {} ({}) to disk", local_path.display(), format_size(size));

        let body = reqwest::Body::wrap_stream(ReaderStream::new(file));
        let resp = self
            .http
            .put(href)
            .header(CONTENT_LENGTH, size)
            .body(body)
            .send()
            .await
            .map_err(|e| StorageFailure::transport("upload", e))?;

        if resp.status().is_success() {
            Ok(size)
        } else {
            Err(status_failure("upload", resp).await)
        }
    }

    /// Marks the resource public. Required before `public_url` is set.
    async fn publish(&self, remote_path: &str) -> StorageResult<()> {
        let resp = self
            .http
            .put(self.resources_url("/publish"))
            .header(AUTHORIZATION, self.auth_header())
            .query(&[("path", remote_path)])
            .send()
            .await
            .map_err(|e| StorageFailure::transport("publish", e))?;

        if resp.status().is_success() {
            Ok(())
        } else {
            Err(status_failure("publish", resp).await)
        }
    }

    async fn read_public_url(&self, remote_path: &str) -> StorageResult<String> {
        let resp = self
            .http
            .get(self.resources_url(""))
            .header(AUTHORIZATION, self.auth_header())
            .query(&[("path", remote_path), ("fields", "public_url")])
            .send()
            .await
            .map_err(|e| StorageFailure::transport("resource meta", e))?;

        if !resp.status().is_success() {
            return Err(status_failure("resource meta", resp).await);
        }

        let meta: ResourceMeta = resp
            .json()
            .await
            .map_err(|e| StorageFailure::transport("resource meta", e))?;

        meta.public_url
            .filter(|url| !url.is_empty())
            .ok_or(StorageFailure::LinkMissing)
    }
}

/// Logs the response body and turns it into a soft failure
async fn status_failure(operation: &'static str, resp: Response) -> StorageFailure {
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    log::error!("Disk {} failed (status {}): {}", operation, status, body);
    StorageFailure::Status {
        operation,
        status,
        body,
    }
}

#[async_trait]
impl StorageClient for DiskClient {
    fn backend_name(&self) -> &'static str {
        "yandex-disk"
    }

    async fn ensure_destination_ready(&self, prefix: &str) -> StorageResult<DestinationStatus> {
        let resp = self
            .http
            .put(self.resources_url(""))
            .header(AUTHORIZATION, self.auth_header())
            .query(&[("path", prefix)])
            .send()
            .await
            .map_err(|e| {
                log::error!("Disk folder creation for {} failed: {}", prefix, e);
                StorageFailure::transport("create folder", e)
            })?;

        match resp.status() {
            StatusCode::CREATED => {
                log::info!("Created disk folder {}", prefix);
                Ok(DestinationStatus::Created)
            }
            StatusCode::CONFLICT | StatusCode::OK => {
                log::debug!("Disk folder {} already exists", prefix);
                Ok(DestinationStatus::AlreadyExists)
            }
            _ => Err(status_failure("create folder", resp).await),
        }
    }

    async fn upload(&self, local_path: &Path, remote_path: &str) -> StorageResult<UploadReceipt> {
        let href = self.request_upload_target(remote_path).await?;
        log::debug!("Upload target obtained for {}", remote_path);

        let bytes = self.put_bytes(&href, local_path).await?;
        Ok(UploadReceipt {
            remote_path: remote_path.to_string(),
            bytes,
        })
    }

    async fn resolve_shareable_link(&self, remote_path: &str) -> StorageResult<String> {
        self.publish(remote_path).await?;
        self.read_public_url(remote_path).await
    }
}
