//! relaybot - Telegram bot that relays documents to cloud storage
//!
//! A received document is staged to a temp directory, uploaded to a Yandex
//! Disk folder or an S3 bucket, and answered with a shareable link. In direct
//! mode the bot re-sends the file through Telegram instead, falling back to
//! storage when that fails.
//!
//! # Module Structure
//!
//! - `core`: configuration, errors, logging
//! - `storage`: remote storage backends behind `StorageClient`
//! - `transfer`: staging and the relay workflow
//! - `telegram`: bot setup, routing and handlers
//! - `cli`: command-line interface

pub mod cli;
pub mod core;
pub mod storage;
pub mod telegram;
pub mod transfer;

pub use crate::core::{config, AppError, AppResult, Config};
pub use storage::{create_storage_client, StorageClient};
pub use transfer::{TransferOutcome, TransferWorkflow};
