//! Mock servers standing in for the Telegram Bot API and the disk API

#![allow(dead_code)]

use serde_json::json;
use teloxide::prelude::*;
use wiremock::matchers::{header, method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TEST_BOT_TOKEN: &str = "test_token_12345:ABCDEF";
pub const TELEGRAM_FILE_PATH: &str = "documents/file_1.pdf";
pub const DISK_TOKEN: &str = "disk-token";

pub fn create_test_chat_id() -> ChatId {
    ChatId(123456789)
}

/// Bot talking to `server` instead of api.telegram.org
pub fn create_test_bot(server: &MockServer) -> Bot {
    let url = server.uri().parse().expect("mock server uri");
    Bot::new(TEST_BOT_TOKEN).set_api_url(url)
}

/// Serves `getFile` and the file download for `content`
pub async fn mount_telegram_file(server: &MockServer, content: Vec<u8>) {
    Mock::given(path_regex(r"(?i)^/bot[^/]+/getfile$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "result": {
                "file_id": "BQACAgIAAxkBAAIBCGXfile",
                "file_unique_id": "AgADBAADdoc",
                "file_size": content.len(),
                "file_path": TELEGRAM_FILE_PATH
            }
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/file/bot[^/]+/documents(/|%2F)file_1\.pdf$"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(content))
        .mount(server)
        .await;
}

/// Answers `sendMessage` with a plain text message
pub async fn mount_telegram_send(server: &MockServer) {
    Mock::given(path_regex(r"(?i)^/bot[^/]+/sendmessage$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "result": {
                "message_id": 2,
                "date": 1234567891,
                "chat": { "id": 123456789, "type": "private", "first_name": "Test" },
                "text": "ok"
            }
        })))
        .mount(server)
        .await;
}

/// Responses the disk API mock gives for each call
pub struct DiskApiMock {
    pub create_folder_status: u16,
    pub publish_status: u16,
    pub public_url: &'static str,
}

impl Default for DiskApiMock {
    fn default() -> Self {
        Self {
            create_folder_status: 201,
            publish_status: 200,
            public_url: "https://yadi.sk/d/report123",
        }
    }
}

/// Mounts the disk API under `/v1/disk` and returns the base URL to give the client
pub async fn mount_disk_api(server: &MockServer, remote_path: &str, mock: DiskApiMock) -> String {
    let base = format!("{}/v1/disk", server.uri());

    Mock::given(method("PUT"))
        .and(path("/v1/disk/resources"))
        .respond_with(ResponseTemplate::new(mock.create_folder_status))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/disk/resources/upload"))
        .and(header("authorization", format!("OAuth {}", DISK_TOKEN).as_str()))
        .and(query_param("path", remote_path))
        .and(query_param("overwrite", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "href": format!("{}/upload-target/op-1", server.uri()),
            "method": "PUT",
            "templated": false
        })))
        .mount(server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/upload-target/op-1"))
        .respond_with(ResponseTemplate::new(201))
        .mount(server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/v1/disk/resources/publish"))
        .and(query_param("path", remote_path))
        .respond_with(ResponseTemplate::new(mock.publish_status).set_body_json(json!({
            "href": format!("{}/v1/disk/resources?path={}", server.uri(), remote_path)
        })))
        .mount(server)
        .await;

    let meta = Mock::given(method("GET"))
        .and(path("/v1/disk/resources"))
        .and(query_param("path", remote_path))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "path": format!("disk:/{}", remote_path),
            "public_url": mock.public_url
        })));
    // Nothing reads the link back when publishing failed
    if (200..300).contains(&mock.publish_status) {
        meta.mount(server).await;
    } else {
        meta.expect(0).mount(server).await;
    }

    base
}
