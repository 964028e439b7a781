//! /start and /help

use teloxide::prelude::*;
use teloxide::types::Message;

use super::types::HandlerError;
use crate::telegram::bot::Command;
use crate::telegram::routing::{route, EventKind, RouteAction};

/// Answers a bot command with its canned reply
pub(super) async fn handle_command(bot: &Bot, msg: &Message, cmd: Command) -> Result<(), HandlerError> {
    log::info!("Received command {:?} from chat {}", cmd, msg.chat.id);

    if let RouteAction::Reply(text) = route(&EventKind::Command(cmd)) {
        bot.send_message(msg.chat.id, text).await?;
    }
    Ok(())
}
