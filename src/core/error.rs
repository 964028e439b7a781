use thiserror::Error;

use crate::storage::StorageFailure;

/// Centralized error types for the application
///
/// Anything that can go wrong inside a transfer ends up here. The workflow
/// converts these into a user-facing failure reply, so none of them reach the
/// dispatcher.
#[derive(Error, Debug)]
pub enum AppError {
    /// Telegram API errors
    #[error("Telegram error: {0}")]
    Telegram(#[from] teloxide::RequestError),

    /// Telegram file download errors
    #[error("Telegram download error: {0}")]
    TelegramDownload(#[from] teloxide::DownloadError),

    /// HTTP errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// URL parsing errors
    #[error("URL parsing error: {0}")]
    Url(#[from] url::ParseError),

    /// Remote storage errors that a caller chose to escalate
    #[error("Storage error: {0}")]
    Storage(#[from] StorageFailure),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;
