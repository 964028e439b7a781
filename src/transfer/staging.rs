//! Inbound file description, name selection and the staged local copy

use std::path::{Path, PathBuf};

use mime::Mime;
use rand::distributions::Alphanumeric;
use rand::Rng;
use teloxide::types::Document;

use crate::core::config::transfer::{DEFAULT_EXTENSION, STAGING_TOKEN_LEN, SYNTHESIZED_NAME_LEN};

/// A document received from a chat, before anything has been downloaded
#[derive(Debug, Clone, PartialEq)]
pub struct InboundFile {
    /// Opaque Telegram handle used to download the file
    pub file_id: String,
    /// Stable per-file id; keeps concurrent staging paths apart
    pub unique_id: String,
    pub declared_name: Option<String>,
    pub mime_type: Option<Mime>,
    pub size: u64,
}

impl From<&Document> for InboundFile {
    fn from(doc: &Document) -> Self {
        Self {
            file_id: doc.file.id.0.clone(),
            unique_id: doc.file.unique_id.0.clone(),
            declared_name: doc.file_name.clone(),
            mime_type: doc.mime_type.clone(),
            size: u64::from(doc.file.size),
        }
    }
}

impl InboundFile {
    /// Name used both locally and on the remote storage: the declared name
    /// when there is a usable one, a random one otherwise.
    pub fn chosen_name(&self) -> String {
        self.declared_name
            .as_deref()
            .and_then(sanitize_name)
            .unwrap_or_else(|| synthesize_name(self.mime_type.as_ref()))
    }
}

/// Makes a declared name safe to join onto a directory. Returns `None` when
/// nothing usable is left.
fn sanitize_name(name: &str) -> Option<String> {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| if c == '/' || c == '\\' || c.is_control() { '_' } else { c })
        .collect();

    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        None
    } else {
        Some(cleaned)
    }
}

/// Random alphanumeric body plus an extension inferred from the MIME type
pub fn synthesize_name(mime_type: Option<&Mime>) -> String {
    format!("{}.{}", random_alphanumeric(SYNTHESIZED_NAME_LEN), infer_extension(mime_type))
}

fn random_alphanumeric(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

fn infer_extension(mime_type: Option<&Mime>) -> String {
    let Some(mime_type) = mime_type else {
        return DEFAULT_EXTENSION.to_string();
    };

    let known = match mime_type.essence_str() {
        "application/pdf" => Some("pdf"),
        "application/zip" | "application/x-zip-compressed" => Some("zip"),
        "application/x-rar-compressed" | "application/vnd.rar" => Some("rar"),
        "application/x-7z-compressed" => Some("7z"),
        "application/msword" => Some("doc"),
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => Some("docx"),
        "application/vnd.ms-excel" => Some("xls"),
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet" => Some("xlsx"),
        "application/vnd.android.package-archive" => Some("apk"),
        "application/octet-stream" => Some(DEFAULT_EXTENSION),
        "text/plain" => Some("txt"),
        "image/jpeg" => Some("jpg"),
        "audio/mpeg" => Some("mp3"),
        "video/quicktime" => Some("mov"),
        _ => None,
    };
    if let Some(ext) = known {
        return ext.to_string();
    }

    let subtype = mime_type.subtype().as_str();
    if !subtype.is_empty() && subtype.len() <= 8 && subtype.chars().all(|c| c.is_ascii_alphanumeric()) {
        subtype.to_ascii_lowercase()
    } else {
        DEFAULT_EXTENSION.to_string()
    }
}

/// Transient local copy of an inbound file.
///
/// Removed by [`StagedCopy::remove`] on every normal path; `Drop` removes it
/// too if the owner bailed out early or panicked.
#[derive(Debug)]
pub struct StagedCopy {
    path: PathBuf,
    removed: bool,
}

impl StagedCopy {
    /// Reserves `<temp_dir>/<unique_id>_<token>_<name>`. Nothing is created yet.
    ///
    /// `unique_id` is the same for every forward of one Telegram file, so the
    /// random token keeps concurrent transfers of that file apart.
    pub fn new(temp_dir: &Path, unique_id: &str, name: &str) -> Self {
        let token = random_alphanumeric(STAGING_TOKEN_LEN);
        Self {
            path: temp_dir.join(format!("{}_{}_{}", unique_id, token, name)),
            removed: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Deletes the local file. Failures are logged, never returned.
    pub async fn remove(mut self) {
        self.removed = true;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => log::debug!("Removed staged copy {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => log::warn!("Failed to remove staged copy {}: {}", self.path.display(), e),
        }
    }
}

impl Drop for StagedCopy {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => log::debug!("Removed staged copy {} on drop", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => log::warn!("Failed to remove staged copy {}: {}", self.path.display(), e),
        }
    }
}
