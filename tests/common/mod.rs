//! Common test utilities
//!
//! This module is shared across all integration tests

pub mod fixtures;
pub mod helpers;

#[allow(unused_imports)]
pub use fixtures::{command_message, document_message, media_message, message_from_json, text_message};
#[allow(unused_imports)]
pub use helpers::{create_test_chat_id, mount_disk_api, mount_telegram_file, mount_telegram_send, DiskApiMock};
