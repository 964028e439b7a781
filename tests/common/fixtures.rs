//! Telegram message fixtures built from Bot API JSON

#![allow(dead_code)]

use serde_json::{json, Value};
use teloxide::types::Message;

/// Minimal private-chat message; `extra` fields are merged on top
fn message_json(chat_id: i64, extra: Value) -> Value {
    let mut message = json!({
        "message_id": 1,
        "date": 1234567890,
        "chat": {
            "id": chat_id,
            "type": "private",
            "first_name": "Test"
        },
        "from": {
            "id": chat_id,
            "is_bot": false,
            "first_name": "Test",
            "username": "testuser"
        }
    });
    if let (Some(base), Some(extra)) = (message.as_object_mut(), extra.as_object()) {
        for (key, value) in extra {
            base.insert(key.clone(), value.clone());
        }
    }
    message
}

pub fn message_from_json(value: Value) -> Message {
    serde_json::from_value(value).expect("fixture must be a valid Message")
}

pub fn text_message(chat_id: i64, text: &str) -> Message {
    message_from_json(message_json(chat_id, json!({ "text": text })))
}

pub fn command_message(chat_id: i64, command: &str) -> Message {
    message_from_json(message_json(
        chat_id,
        json!({
            "text": command,
            "entities": [{ "type": "bot_command", "offset": 0, "length": command.chars().count() }]
        }),
    ))
}

/// Document message. `name` and `mime_type` are omitted from the JSON when `None`.
pub fn document_message(chat_id: i64, name: Option<&str>, mime_type: Option<&str>, size: u64) -> Message {
    let mut document = json!({
        "file_id": "BQACAgIAAxkBAAIBCGXfile",
        "file_unique_id": "AgADBAADdoc",
        "file_size": size
    });
    if let Some(name) = name {
        document["file_name"] = json!(name);
    }
    if let Some(mime_type) = mime_type {
        document["mime_type"] = json!(mime_type);
    }
    message_from_json(message_json(chat_id, json!({ "document": document })))
}

/// Photo, audio or video message
pub fn media_message(chat_id: i64, kind: &str) -> Message {
    let media = match kind {
        "photo" => json!([{
            "file_id": "AgACphoto",
            "file_unique_id": "AQADphoto",
            "width": 800,
            "height": 600,
            "file_size": 40960
        }]),
        "audio" => json!({
            "file_id": "CQACaudio",
            "file_unique_id": "AgADaudio",
            "duration": 180,
            "mime_type": "audio/mpeg"
        }),
        "video" => json!({
            "file_id": "BAACvideo",
            "file_unique_id": "AgADvideo",
            "width": 1280,
            "height": 720,
            "duration": 60,
            "mime_type": "video/mp4"
        }),
        other => panic!("unknown media kind {}", other),
    };
    message_from_json(message_json(chat_id, json!({ kind: media })))
}
