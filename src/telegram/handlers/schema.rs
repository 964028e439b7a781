//! Dispatcher schema and handler chain builders

use teloxide::dispatching::{HandlerExt, UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;
use teloxide::types::{Me, Message};

use super::commands::handle_command;
use super::documents::document_handler;
use super::types::{HandlerDeps, HandlerError};
use crate::telegram::bot::Command;
use crate::telegram::routing::{classify, route, RouteAction};

/// Creates the main dispatcher schema for the Telegram bot.
///
/// Order matters: commands first, then documents, then everything else gets
/// a canned reply.
pub fn schema(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    dptree::entry()
        .branch(command_handler())
        .branch(document_handler(deps))
        .branch(static_reply_handler())
}

fn command_handler() -> UpdateHandler<HandlerError> {
    Update::filter_message().branch(
        dptree::entry()
            .filter_command::<Command>()
            .endpoint(|bot: Bot, msg: Message, cmd: Command| async move { handle_command(&bot, &msg, cmd).await }),
    )
}

/// Media and text that is neither a command nor a document
fn static_reply_handler() -> UpdateHandler<HandlerError> {
    Update::filter_message().endpoint(|bot: Bot, msg: Message, me: Me| async move {
        let kind = classify(&msg, me.username());
        match route(&kind) {
            RouteAction::Reply(text) => {
                log::debug!("Static reply for {:?} in chat {}", kind, msg.chat.id);
                bot.send_message(msg.chat.id, text).await?;
            }
            RouteAction::Transfer => {
                log::warn!("Document in chat {} reached the static reply branch", msg.chat.id);
            }
        }
        Ok(())
    })
}
