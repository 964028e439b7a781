use secrecy::SecretString;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::core::error::{AppError, AppResult};

/// Default Yandex Disk REST endpoint
pub const YANDEX_DISK_API_URL: &str = "https://cloud-api.yandex.net/v1/disk";

/// Folder on the remote storage that receives every upload
pub const DEFAULT_DESTINATION_PREFIX: &str = "telegram_uploads";

/// Which remote storage the bot uploads into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// Folder-style cloud disk with an explicit publish step (Yandex Disk)
    Disk,
    /// S3-compatible bucket with pre-signed links
    Bucket,
}

impl FromStr for StorageBackend {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "disk" | "yandex" | "yadisk" => Ok(Self::Disk),
            "bucket" | "s3" => Ok(Self::Bucket),
            other => Err(AppError::Config(format!("unknown STORAGE_BACKEND: {}", other))),
        }
    }
}

/// How a received document is returned to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayMode {
    /// Always upload to storage and reply with a link
    Disk,
    /// Re-send the file through Telegram, falling back to storage on failure
    Direct,
}

impl FromStr for RelayMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "disk" | "link" => Ok(Self::Disk),
            "direct" | "resend" => Ok(Self::Direct),
            other => Err(AppError::Config(format!("unknown RELAY_MODE: {}", other))),
        }
    }
}

/// S3-compatible bucket settings
#[derive(Debug, Clone)]
pub struct BucketConfig {
    pub bucket: String,
    pub region: String,
    /// Custom endpoint for S3-compatible providers (MinIO, Yandex Object Storage, ...)
    pub endpoint: Option<String>,
}

/// Runtime configuration, read once at startup and passed to constructors.
///
/// Credentials are not validated here: a missing token surfaces as the first
/// failing remote call.
#[derive(Debug)]
pub struct Config {
    pub bot_token: SecretString,
    /// Custom Bot API server (a local server lifts the 20 MB download limit)
    pub bot_api_url: Option<String>,
    pub storage_backend: StorageBackend,
    pub relay_mode: RelayMode,
    pub disk_token: SecretString,
    pub disk_api_url: String,
    pub bucket: BucketConfig,
    pub destination_prefix: String,
    pub temp_dir: PathBuf,
    pub log_file_path: String,
}

impl Config {
    /// Builds the configuration from process environment variables
    pub fn from_env() -> AppResult<Self> {
        let storage_backend = match non_empty_var("STORAGE_BACKEND") {
            Some(value) => value.parse()?,
            None => StorageBackend::Disk,
        };
        let relay_mode = match non_empty_var("RELAY_MODE") {
            Some(value) => value.parse()?,
            None => RelayMode::Disk,
        };

        Ok(Self {
            bot_token: SecretString::from(
                env::var("BOT_TOKEN")
                    .or_else(|_| env::var("TELOXIDE_TOKEN"))
                    .unwrap_or_default(),
            ),
            bot_api_url: non_empty_var("BOT_API_URL"),
            storage_backend,
            relay_mode,
            disk_token: SecretString::from(env::var("YANDEX_DISK_TOKEN").unwrap_or_default()),
            disk_api_url: non_empty_var("YANDEX_DISK_API_URL").unwrap_or_else(|| YANDEX_DISK_API_URL.to_string()),
            bucket: BucketConfig {
                bucket: env::var("S3_BUCKET").unwrap_or_default(),
                region: non_empty_var("S3_REGION").unwrap_or_else(|| "us-east-1".to_string()),
                endpoint: non_empty_var("S3_ENDPOINT"),
            },
            destination_prefix: non_empty_var("DESTINATION_PREFIX")
                .unwrap_or_else(|| DEFAULT_DESTINATION_PREFIX.to_string()),
            temp_dir: PathBuf::from(non_empty_var("TEMP_FILES_DIR").unwrap_or_else(|| "/tmp".to_string())),
            log_file_path: non_empty_var("LOG_FILE_PATH").unwrap_or_else(|| "app.log".to_string()),
        })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Transfer limits
pub mod transfer {
    /// Largest file the bot re-sends through Telegram directly (2 GiB)
    pub const DIRECT_RELAY_LIMIT_BYTES: u64 = 2 * 1024 * 1024 * 1024;

    /// Length of the random body of a synthesized file name
    pub const SYNTHESIZED_NAME_LEN: usize = 12;

    /// Length of the random token in a staging file name
    pub const STAGING_TOKEN_LEN: usize = 8;

    /// Extension used when nothing better can be inferred
    pub const DEFAULT_EXTENSION: &str = "bin";
}

/// Bucket link configuration
pub mod bucket {
    use super::Duration;

    /// Lifetime of a pre-signed download link (in seconds)
    pub const PRESIGNED_URL_TTL_SECS: u64 = 3600;

    /// Pre-signed link lifetime
    pub fn presigned_url_ttl() -> Duration {
        Duration::from_secs(PRESIGNED_URL_TTL_SECS)
    }
}

/// Network configuration
pub mod network {
    use super::Duration;

    /// Request timeout for HTTP requests (in seconds)
    /// Large enough for 2 GB uploads over a slow link
    pub const REQUEST_TIMEOUT_SECS: u64 = 900; // 15 minutes

    /// Request timeout duration
    pub fn timeout() -> Duration {
        Duration::from_secs(REQUEST_TIMEOUT_SECS)
    }
}
