//! The relay workflow: stage → (direct re-send) → ensure destination → upload → link

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use teloxide::types::ChatId;

use super::outcome::{DeliveryConfirmation, TransferFailure, TransferOutcome};
use super::staging::{InboundFile, StagedCopy};
use crate::core::config::transfer::DIRECT_RELAY_LIMIT_BYTES;
use crate::core::config::RelayMode;
use crate::core::{format_size, AppResult};
use crate::storage::{RemoteDestination, StorageClient, StorageFailure};

/// The messaging side of a transfer: fetching inbound bytes and re-sending them
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Downloads the file behind `file_id` to `destination`
    async fn download_to(&self, file_id: &str, destination: &Path) -> AppResult<()>;

    /// Sends a local file back to the chat as a document
    async fn send_document(&self, chat_id: ChatId, local_path: &Path, file_name: &str) -> AppResult<()>;
}

/// How far a storage transfer got
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferStage {
    Idle,
    DestinationEnsured,
    UploadTargetObtained,
    Uploaded,
    LinkResolved,
}

impl fmt::Display for TransferStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::DestinationEnsured => "destination-ensured",
            Self::UploadTargetObtained => "upload-target-obtained",
            Self::Uploaded => "uploaded",
            Self::LinkResolved => "link-resolved",
        };
        f.write_str(name)
    }
}

fn soft_fail(stage: TransferStage, destination: &RemoteDestination, failure: &StorageFailure) {
    log::warn!(
        "Transfer to {} soft-failed after stage {}: {}",
        destination.path(),
        stage,
        failure
    );
}

fn stage_after_upload_failure(stage: TransferStage, failure: &StorageFailure) -> TransferStage {
    if failure.after_upload_target() {
        TransferStage::UploadTargetObtained
    } else {
        stage
    }
}

/// Ensures the destination, uploads `local_path` and resolves a link.
///
/// Soft failures never escape: a failed destination check is logged and the
/// upload is attempted anyway, a failed upload or link becomes a failure
/// outcome.
pub async fn store_and_link(
    storage: &dyn StorageClient,
    local_path: &Path,
    destination: &RemoteDestination,
) -> TransferOutcome {
    let mut stage = TransferStage::Idle;

    match storage.ensure_destination_ready(destination.prefix()).await {
        Ok(status) => {
            log::debug!("Destination {} ready: {:?}", destination.prefix(), status);
            stage = TransferStage::DestinationEnsured;
        }
        Err(failure) => soft_fail(stage, destination, &failure),
    }

    match storage.upload(local_path, &destination.path()).await {
        Ok(receipt) => {
            stage = TransferStage::Uploaded;
            log::info!("Uploaded {} ({})", receipt.remote_path, format_size(receipt.bytes));
        }
        Err(failure) => {
            let stage = stage_after_upload_failure(stage, &failure);
            soft_fail(stage, destination, &failure);
            return TransferOutcome::Failure(TransferFailure::UploadFailed);
        }
    }

    match storage.resolve_shareable_link(&destination.path()).await {
        Ok(url) => {
            stage = TransferStage::LinkResolved;
            log::info!("Transfer of {} reached {}: {}", destination.path(), stage, url);
            TransferOutcome::PublicLink(url)
        }
        Err(failure) => {
            soft_fail(stage, destination, &failure);
            TransferOutcome::Failure(TransferFailure::LinkUnavailable)
        }
    }
}

/// Relays one inbound document per call. Holds no per-transfer state, so a
/// single instance serves every chat concurrently.
pub struct TransferWorkflow {
    storage: Arc<dyn StorageClient>,
    transport: Arc<dyn ChatTransport>,
    destination_prefix: String,
    temp_dir: PathBuf,
    mode: RelayMode,
}

impl TransferWorkflow {
    pub fn new(
        storage: Arc<dyn StorageClient>,
        transport: Arc<dyn ChatTransport>,
        destination_prefix: impl Into<String>,
        temp_dir: impl Into<PathBuf>,
        mode: RelayMode,
    ) -> Self {
        Self {
            storage,
            transport,
            destination_prefix: destination_prefix.into(),
            temp_dir: temp_dir.into(),
            mode,
        }
    }

    pub fn mode(&self) -> RelayMode {
        self.mode
    }

    pub fn destination_prefix(&self) -> &str {
        &self.destination_prefix
    }

    /// Where a file with this name ends up on the storage
    pub fn destination_for(&self, name: &str) -> RemoteDestination {
        RemoteDestination::new(&self.destination_prefix, name)
    }

    /// Handles one inbound document end to end. Never returns an error: every
    /// failure is logged and becomes a [`TransferOutcome::Failure`]. The staged
    /// copy is gone by the time this returns.
    pub async fn handle_inbound_file(&self, chat_id: ChatId, file: InboundFile) -> TransferOutcome {
        let name = file.chosen_name();
        let staged = StagedCopy::new(&self.temp_dir, &file.unique_id, &name);

        let outcome = match self.relay(chat_id, &file, &name, &staged).await {
            Ok(outcome) => outcome,
            Err(e) => {
                log::error!(
                    "Transfer of {} ({}) for chat {} failed: {}",
                    name,
                    format_size(file.size),
                    chat_id,
                    e
                );
                TransferOutcome::Failure(TransferFailure::Processing(e.to_string()))
            }
        };

        staged.remove().await;
        log::info!("Transfer of {} for chat {} finished: {}", name, chat_id, outcome);
        outcome
    }

    async fn relay(
        &self,
        chat_id: ChatId,
        file: &InboundFile,
        name: &str,
        staged: &StagedCopy,
    ) -> AppResult<TransferOutcome> {
        log::info!(
            "Staging {} ({}) for chat {} at {}",
            name,
            format_size(file.size),
            chat_id,
            staged.path().display()
        );
        self.transport.download_to(&file.file_id, staged.path()).await?;

        if self.mode == RelayMode::Direct {
            if file.size <= DIRECT_RELAY_LIMIT_BYTES {
                match self.transport.send_document(chat_id, staged.path(), name).await {
                    Ok(()) => {
                        return Ok(TransferOutcome::DirectDelivery(DeliveryConfirmation {
                            file_name: name.to_string(),
                            bytes: file.size,
                        }))
                    }
                    Err(e) => log::warn!("Direct re-send of {} failed, falling back to storage: {}", name, e),
                }
            } else {
                log::info!(
                    "{} is {} (over the direct relay limit), uploading to storage",
                    name,
                    format_size(file.size)
                );
            }
        }

        let destination = self.destination_for(name);
        Ok(store_and_link(self.storage.as_ref(), staged.path(), &destination).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{DestinationStatus, StorageResult, UploadReceipt};
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    /// Records every call and answers from preset results
    struct ScriptedStorage {
        ensure: StorageResult<DestinationStatus>,
        upload_ok: bool,
        link: StorageResult<String>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedStorage {
        fn ok(link: &str) -> Self {
            Self {
                ensure: Ok(DestinationStatus::AlreadyExists),
                upload_ok: true,
                link: Ok(link.to_string()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl StorageClient for ScriptedStorage {
        fn backend_name(&self) -> &'static str {
            "scripted"
        }

        async fn ensure_destination_ready(&self, prefix: &str) -> StorageResult<DestinationStatus> {
            self.calls.lock().unwrap().push(format!("ensure {}", prefix));
            self.ensure.clone()
        }

        async fn upload(&self, local_path: &Path, remote_path: &str) -> StorageResult<UploadReceipt> {
            assert!(local_path.exists(), "staged copy must exist during upload");
            self.calls.lock().unwrap().push(format!("upload {}", remote_path));
            if self.upload_ok {
                Ok(UploadReceipt {
                    remote_path: remote_path.to_string(),
                    bytes: std::fs::metadata(local_path).unwrap().len(),
                })
            } else {
                Err(StorageFailure::UploadTargetUnavailable("507".to_string()))
            }
        }

        async fn resolve_shareable_link(&self, remote_path: &str) -> StorageResult<String> {
            self.calls.lock().unwrap().push(format!("link {}", remote_path));
            self.link.clone()
        }
    }

    struct FakeTransport {
        fail_download: bool,
        fail_send: bool,
        sent: Mutex<Vec<String>>,
    }

    impl FakeTransport {
        fn new() -> Self {
            Self {
                fail_download: false,
                fail_send: false,
                sent: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ChatTransport for FakeTransport {
        async fn download_to(&self, _file_id: &str, destination: &Path) -> AppResult<()> {
            if self.fail_download {
                return Err(std::io::Error::new(std::io::ErrorKind::Other, "network down").into());
            }
            tokio::fs::write(destination, b"file-bytes").await?;
            Ok(())
        }

        async fn send_document(&self, _chat_id: ChatId, local_path: &Path, file_name: &str) -> AppResult<()> {
            assert!(local_path.exists());
            if self.fail_send {
                return Err(std::io::Error::new(std::io::ErrorKind::Other, "too big").into());
            }
            self.sent.lock().unwrap().push(file_name.to_string());
            Ok(())
        }
    }

    fn document(name: Option<&str>, size: u64) -> InboundFile {
        InboundFile {
            file_id: "file-id".to_string(),
            unique_id: "uniq".to_string(),
            declared_name: name.map(str::to_string),
            mime_type: None,
            size,
        }
    }

    fn workflow(
        storage: Arc<ScriptedStorage>,
        transport: Arc<FakeTransport>,
        dir: &Path,
        mode: RelayMode,
    ) -> TransferWorkflow {
        TransferWorkflow::new(storage, transport, "telegram_uploads", dir, mode)
    }

    fn staged_files(dir: &Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    #[tokio::test]
    async fn test_disk_relay_happy_path() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(ScriptedStorage::ok("https://yadi.sk/d/xyz"));
        let wf = workflow(storage.clone(), Arc::new(FakeTransport::new()), dir.path(), RelayMode::Disk);

        let outcome = wf
            .handle_inbound_file(ChatId(1), document(Some("report.pdf"), 10 * 1024 * 1024))
            .await;

        assert_eq!(outcome, TransferOutcome::PublicLink("https://yadi.sk/d/xyz".to_string()));
        assert_eq!(
            storage.calls(),
            vec![
                "ensure telegram_uploads",
                "upload telegram_uploads/report.pdf",
                "link telegram_uploads/report.pdf",
            ]
        );
        assert_eq!(staged_files(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_ensure_failure_does_not_stop_upload() {
        let dir = tempfile::tempdir().unwrap();
        let mut scripted = ScriptedStorage::ok("https://yadi.sk/d/xyz");
        scripted.ensure = Err(StorageFailure::Status {
            operation: "create folder",
            status: 500,
            body: String::new(),
        });
        let storage = Arc::new(scripted);
        let wf = workflow(storage.clone(), Arc::new(FakeTransport::new()), dir.path(), RelayMode::Disk);

        let outcome = wf.handle_inbound_file(ChatId(1), document(Some("a.txt"), 3)).await;

        assert!(matches!(outcome, TransferOutcome::PublicLink(_)));
        assert_eq!(storage.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_missing_link_gives_link_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let mut scripted = ScriptedStorage::ok("");
        scripted.link = Err(StorageFailure::LinkMissing);
        let wf = workflow(Arc::new(scripted), Arc::new(FakeTransport::new()), dir.path(), RelayMode::Disk);

        let outcome = wf.handle_inbound_file(ChatId(1), document(Some("a.txt"), 3)).await;

        assert_eq!(outcome, TransferOutcome::Failure(TransferFailure::LinkUnavailable));
        assert_eq!(staged_files(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_upload_failure_skips_link() {
        let dir = tempfile::tempdir().unwrap();
        let mut scripted = ScriptedStorage::ok("https://unused");
        scripted.upload_ok = false;
        let storage = Arc::new(scripted);
        let wf = workflow(storage.clone(), Arc::new(FakeTransport::new()), dir.path(), RelayMode::Disk);

        let outcome = wf.handle_inbound_file(ChatId(1), document(Some("a.txt"), 3)).await;

        assert_eq!(outcome, TransferOutcome::Failure(TransferFailure::UploadFailed));
        assert!(!storage.calls().iter().any(|c| c.starts_with("link")));
    }

    #[tokio::test]
    async fn test_staging_failure_is_processing_failure() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(ScriptedStorage::ok("https://unused"));
        let mut transport = FakeTransport::new();
        transport.fail_download = true;
        let wf = workflow(storage.clone(), Arc::new(transport), dir.path(), RelayMode::Disk);

        let outcome = wf.handle_inbound_file(ChatId(1), document(Some("a.txt"), 3)).await;

        assert!(matches!(outcome, TransferOutcome::Failure(TransferFailure::Processing(_))));
        assert!(storage.calls().is_empty());
        assert_eq!(staged_files(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_direct_relay_resends_small_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(ScriptedStorage::ok("https://unused"));
        let transport = Arc::new(FakeTransport::new());
        let wf = workflow(storage.clone(), transport.clone(), dir.path(), RelayMode::Direct);

        let outcome = wf.handle_inbound_file(ChatId(1), document(Some("clip.mp4"), 1024)).await;

        assert_eq!(
            outcome,
            TransferOutcome::DirectDelivery(DeliveryConfirmation {
                file_name: "clip.mp4".to_string(),
                bytes: 1024,
            })
        );
        assert_eq!(*transport.sent.lock().unwrap(), vec!["clip.mp4".to_string()]);
        assert!(storage.calls().is_empty());
        assert_eq!(staged_files(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_direct_relay_skips_resend_over_limit() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(ScriptedStorage::ok("https://link"));
        let transport = Arc::new(FakeTransport::new());
        let wf = workflow(storage.clone(), transport.clone(), dir.path(), RelayMode::Direct);

        let outcome = wf
            .handle_inbound_file(ChatId(1), document(Some("huge.iso"), DIRECT_RELAY_LIMIT_BYTES + 1))
            .await;

        assert_eq!(outcome, TransferOutcome::PublicLink("https://link".to_string()));
        assert!(transport.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_direct_relay_falls_back_when_send_fails() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(ScriptedStorage::ok("https://link"));
        let mut transport = FakeTransport::new();
        transport.fail_send = true;
        let wf = workflow(storage.clone(), Arc::new(transport), dir.path(), RelayMode::Direct);

        let outcome = wf.handle_inbound_file(ChatId(1), document(Some("a.txt"), 3)).await;

        assert_eq!(outcome, TransferOutcome::PublicLink("https://link".to_string()));
        assert_eq!(storage.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_unnamed_documents_get_distinct_destinations() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(ScriptedStorage::ok("https://link"));
        let wf = workflow(storage.clone(), Arc::new(FakeTransport::new()), dir.path(), RelayMode::Disk);

        wf.handle_inbound_file(ChatId(1), document(None, 3)).await;
        wf.handle_inbound_file(ChatId(1), document(None, 3)).await;

        let uploads: Vec<String> = storage
            .calls()
            .into_iter()
            .filter(|c| c.starts_with("upload telegram_uploads/"))
            .collect();
        assert_eq!(uploads.len(), 2);
        assert_ne!(uploads[0], uploads[1]);
    }

    /// Storage whose uploads all wait for each other, then finish one after
    /// the other. Fails an upload whose local file is gone by then.
    struct OverlappingStorage {
        barrier: tokio::sync::Barrier,
        uploads: std::sync::atomic::AtomicUsize,
    }

    #[async_trait]
    impl StorageClient for OverlappingStorage {
        fn backend_name(&self) -> &'static str {
            "overlapping"
        }

        async fn ensure_destination_ready(&self, _prefix: &str) -> StorageResult<DestinationStatus> {
            Ok(DestinationStatus::AlreadyExists)
        }

        async fn upload(&self, local_path: &Path, remote_path: &str) -> StorageResult<UploadReceipt> {
            self.barrier.wait().await;
            if self.uploads.fetch_add(1, std::sync::atomic::Ordering::SeqCst) == 1 {
                tokio::time::sleep(std::time::Duration::from_millis(100)).await;
            }
            let bytes = tokio::fs::read(local_path)
                .await
                .map_err(|e| StorageFailure::LocalFile(e.to_string()))?;
            Ok(UploadReceipt {
                remote_path: remote_path.to_string(),
                bytes: bytes.len() as u64,
            })
        }

        async fn resolve_shareable_link(&self, remote_path: &str) -> StorageResult<String> {
            Ok(format!("https://link/{}", remote_path))
        }
    }

    #[tokio::test]
    async fn test_same_document_in_two_chats_concurrently() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(OverlappingStorage {
            barrier: tokio::sync::Barrier::new(2),
            uploads: std::sync::atomic::AtomicUsize::new(0),
        });
        let wf = TransferWorkflow::new(
            storage,
            Arc::new(FakeTransport::new()),
            "telegram_uploads",
            dir.path(),
            RelayMode::Disk,
        );

        let (first, second) = tokio::join!(
            wf.handle_inbound_file(ChatId(1), document(Some("r.pdf"), 10)),
            wf.handle_inbound_file(ChatId(2), document(Some("r.pdf"), 10)),
        );

        let expected = TransferOutcome::PublicLink("https://link/telegram_uploads/r.pdf".to_string());
        assert_eq!(first, expected);
        assert_eq!(second, expected);
        assert_eq!(staged_files(dir.path()), 0);
    }

    #[test]
    fn test_local_read_failure_is_not_past_upload_target() {
        let failure = StorageFailure::LocalFile("gone".to_string());
        assert_eq!(
            stage_after_upload_failure(TransferStage::DestinationEnsured, &failure),
            TransferStage::DestinationEnsured
        );
    }

    #[test]
    fn test_rejected_bytes_are_past_upload_target() {
        let failure = StorageFailure::Status {
            operation: "upload",
            status: 507,
            body: "InsufficientStorage".to_string(),
        };
        assert_eq!(
            stage_after_upload_failure(TransferStage::DestinationEnsured, &failure),
            TransferStage::UploadTargetObtained
        );
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(TransferStage::UploadTargetObtained.to_string(), "upload-target-obtained");
    }
}
