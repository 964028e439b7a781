//! Bot construction and the command list

use reqwest::ClientBuilder;
use secrecy::ExposeSecret;
use teloxide::prelude::*;
use teloxide::types::BotCommand;
use teloxide::utils::command::BotCommands;

use crate::core::config::{self, Config};
use crate::core::{AppError, AppResult};

/// Bot commands enum with descriptions
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Я умею:")]
pub enum Command {
    #[command(description = "как пользоваться ботом")]
    Start,
    #[command(description = "как пользоваться ботом")]
    Help,
}

/// Creates the Bot, pointing it at a custom Bot API server when one is
/// configured
pub fn create_bot(config: &Config) -> AppResult<Bot> {
    let client = ClientBuilder::new().timeout(config::network::timeout()).build()?;
    let bot = Bot::with_client(config.bot_token.expose_secret(), client);

    match config.bot_api_url {
        Some(ref bot_api_url) => {
            log::info!("Using custom Bot API URL: {}", bot_api_url);
            let url = url::Url::parse(bot_api_url)
                .map_err(|e| AppError::Config(format!("invalid BOT_API_URL: {}", e)))?;
            Ok(bot.set_api_url(url))
        }
        None => Ok(bot),
    }
}

/// Registers the command list shown in the Telegram UI
pub async fn setup_bot_commands(bot: &Bot) -> Result<(), teloxide::RequestError> {
    bot.set_my_commands(vec![
        BotCommand::new("start", "как пользоваться ботом"),
        BotCommand::new("help", "как пользоваться ботом"),
    ])
    .await?;

    Ok(())
}
