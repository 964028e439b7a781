//! Document handler: relays the file and replies with the outcome

use teloxide::dispatching::{UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, Message};

use super::types::{HandlerDeps, HandlerError};
use crate::core::format_size;
use crate::transfer::outcome::LINK_BUTTON_LABEL;
use crate::transfer::{InboundFile, TransferOutcome};

/// Single-button keyboard opening the uploaded file
pub fn link_keyboard(url: url::Url) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::url(LINK_BUTTON_LABEL, url)]])
}

/// Sends the reply for an outcome. Direct deliveries already answered with
/// the document, so nothing is sent for them.
pub async fn send_outcome(bot: &Bot, chat_id: ChatId, outcome: &TransferOutcome) -> Result<(), teloxide::RequestError> {
    let Some(text) = outcome.reply_text() else {
        return Ok(());
    };

    match outcome.link_url() {
        Some(url) => bot.send_message(chat_id, text).reply_markup(link_keyboard(url)).await?,
        None => bot.send_message(chat_id, text).await?,
    };
    Ok(())
}

/// Handler for messages carrying a document
pub(super) fn document_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter(|msg: Message| msg.document().is_some())
        .endpoint(move |bot: Bot, msg: Message| {
            let deps = deps.clone();
            async move {
                let Some(document) = msg.document() else {
                    return Ok(());
                };
                let file = InboundFile::from(document);
                log::info!(
                    "Document {:?} ({}) from chat {}",
                    file.declared_name,
                    format_size(file.size),
                    msg.chat.id
                );

                let outcome = deps.workflow.handle_inbound_file(msg.chat.id, file).await;
                if let Err(e) = send_outcome(&bot, msg.chat.id, &outcome).await {
                    log::error!("Failed to send transfer reply to chat {}: {}", msg.chat.id, e);
                }
                Ok(())
            }
        })
}
