//! Maps inbound messages to a canned reply or a transfer

use teloxide::types::Message;
use teloxide::utils::command::BotCommands;

use super::bot::Command;

/// Usage reply for /start and /help
pub const USAGE_TEXT: &str = "Привет! Отправь мне файл документом (до 2 ГБ), \
я загружу его в облачное хранилище и пришлю ссылку.";

/// Reply for photos, audio and video sent as media
pub const UNSUPPORTED_MEDIA_TEXT: &str =
    "Этот тип файлов не поддерживается как медиа. Отправь его как документ (скрепка → Файл).";

/// Reply for anything else
pub const FALLBACK_TEXT: &str = "Я работаю только с документами. Отправь файл или набери /help.";

/// What an inbound message is, as far as routing cares
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    Command(Command),
    Document,
    UnsupportedMedia,
    Other,
}

/// What to do with an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteAction {
    Reply(&'static str),
    Transfer,
}

/// Classifies a message. `bot_username` lets `/help@name` through.
pub fn classify(msg: &Message, bot_username: &str) -> EventKind {
    if msg.document().is_some() {
        return EventKind::Document;
    }
    if msg.photo().is_some() || msg.audio().is_some() || msg.video().is_some() {
        return EventKind::UnsupportedMedia;
    }
    match msg.text().map(|text| Command::parse(text, bot_username)) {
        Some(Ok(cmd)) => EventKind::Command(cmd),
        _ => EventKind::Other,
    }
}

pub fn route(kind: &EventKind) -> RouteAction {
    match kind {
        EventKind::Command(Command::Start | Command::Help) => RouteAction::Reply(USAGE_TEXT),
        EventKind::Document => RouteAction::Transfer,
        EventKind::UnsupportedMedia => RouteAction::Reply(UNSUPPORTED_MEDIA_TEXT),
        EventKind::Other => RouteAction::Reply(FALLBACK_TEXT),
    }
}
