//! What a transfer ended with, and the text the user sees for it

use std::fmt;

/// Reply prefix for a successful upload
pub const LINK_READY_PREFIX: &str = "Файл загружен: ";
/// Reply when the file is stored but no link could be produced
pub const LINK_UNAVAILABLE_TEXT: &str = "Не удалось получить ссылку. Попробуйте позже.";
/// Reply when the storage refused the bytes
pub const UPLOAD_FAILED_TEXT: &str = "Не удалось загрузить файл в хранилище. Попробуйте позже.";
/// Reply for everything else that went wrong
pub const PROCESSING_FAILED_TEXT: &str = "Произошла ошибка при обработке файла. Попробуйте позже.";
/// Label of the inline button carrying the link
pub const LINK_BUTTON_LABEL: &str = "Открыть ссылку";

/// The file went back to the chat through Telegram itself
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryConfirmation {
    pub file_name: String,
    pub bytes: u64,
}

/// Why a transfer produced no link
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferFailure {
    /// Upload went through (or was attempted) but link resolution returned nothing
    LinkUnavailable,
    /// The storage never accepted the bytes
    UploadFailed,
    /// Staging or another local step failed
    Processing(String),
}

/// Exactly one of these per handled document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOutcome {
    PublicLink(String),
    DirectDelivery(DeliveryConfirmation),
    Failure(TransferFailure),
}

impl TransferOutcome {
    /// Text reply for the chat. `None` for direct delivery: the re-sent
    /// document is the reply.
    pub fn reply_text(&self) -> Option<String> {
        match self {
            Self::PublicLink(url) => Some(format!("{}{}", LINK_READY_PREFIX, url)),
            Self::DirectDelivery(_) => None,
            Self::Failure(TransferFailure::LinkUnavailable) => Some(LINK_UNAVAILABLE_TEXT.to_string()),
            Self::Failure(TransferFailure::UploadFailed) => Some(UPLOAD_FAILED_TEXT.to_string()),
            Self::Failure(TransferFailure::Processing(_)) => Some(PROCESSING_FAILED_TEXT.to_string()),
        }
    }

    /// Link for an inline URL button, when there is one and it parses
    pub fn link_url(&self) -> Option<url::Url> {
        match self {
            Self::PublicLink(link) => url::Url::parse(link).ok(),
            _ => None,
        }
    }

    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failure(_))
    }
}

impl fmt::Display for TransferOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PublicLink(url) => write!(f, "link {}", url),
            Self::DirectDelivery(c) => write!(f, "delivered {} ({} bytes)", c.file_name, c.bytes),
            Self::Failure(TransferFailure::LinkUnavailable) => write!(f, "link unavailable"),
            Self::Failure(TransferFailure::UploadFailed) => write!(f, "upload failed"),
            Self::Failure(TransferFailure::Processing(reason)) => write!(f, "processing failed: {}", reason),
        }
    }
}
