//! Telegram side of a transfer: downloading inbound files and re-sending them

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use teloxide::net::Download;
use teloxide::prelude::*;
use teloxide::types::{FileId, InputFile};
use tokio::io::AsyncWriteExt;

use crate::core::{format_size, AppResult};
use crate::transfer::ChatTransport;

/// Where a local Bot API server (`--local`) already keeps the file, if it does.
///
/// Such servers report absolute paths from `getFile`; the hosted API reports
/// paths relative to its file endpoint.
fn local_server_path(file_path: &str) -> Option<&Path> {
    let path = Path::new(file_path);
    path.is_absolute().then_some(path)
}

/// Sibling path the download is streamed into before it is renamed into place
fn partial_path(destination: &Path) -> PathBuf {
    let name = destination
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("download");
    destination.with_file_name(format!("{}.part", name))
}

#[async_trait]
impl ChatTransport for Bot {
    async fn download_to(&self, file_id: &str, destination: &Path) -> AppResult<()> {
        let file = self.get_file(FileId(file_id.to_string())).await?;
        log::info!("File info retrieved: path = {}, size = {}", file.path, format_size(u64::from(file.size)));

        if let Some(source) = local_server_path(&file.path) {
            if tokio::fs::try_exists(source).await.unwrap_or(false) {
                tokio::fs::copy(source, destination).await?;
                log::info!("Copied {} from the local Bot API server", destination.display());
                return Ok(());
            }
            log::warn!("Local Bot API file {} not found, downloading over HTTP", source.display());
        }

        let tmp_path = partial_path(destination);
        let mut dst = tokio::fs::File::create(&tmp_path).await?;
        if let Err(e) = self.download_file(&file.path, &mut dst).await {
            drop(dst);
            tokio::fs::remove_file(&tmp_path).await.ok();
            return Err(e.into());
        }
        dst.flush().await?;
        drop(dst);
        tokio::fs::rename(&tmp_path, destination).await?;

        log::info!("Downloaded {} to {}", file_id, destination.display());
        Ok(())
    }

    async fn send_document(&self, chat_id: ChatId, local_path: &Path, file_name: &str) -> AppResult<()> {
        let document = InputFile::file(local_path.to_path_buf()).file_name(file_name.to_string());
        <Bot as Requester>::send_document(self, chat_id, document).await?;
        log::info!("Re-sent {} to chat {}", file_name, chat_id);
        Ok(())
    }
}
