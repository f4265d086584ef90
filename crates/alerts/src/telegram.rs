//! Telegram bot handlers.

use crate::notifier::Notifier;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::{LinkPreviewOptions, ParseMode};
use teloxide::utils::command::BotCommands;
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Error, Debug)]
pub enum TelegramError {
    #[error("Telegram API error: {0}")]
    Api(#[from] teloxide::RequestError),
}

/// Outbound message channel.
#[async_trait]
pub trait MessageSink: Send + Sync {
    /// Send an HTML formatted message to one chat.
    async fn send_html(&self, chat_id: ChatId, text: &str) -> Result<(), TelegramError>;
}

/// Contest messages carry several links; no preview card for the first one.
fn disabled_link_preview() -> LinkPreviewOptions {
    LinkPreviewOptions {
        is_disabled: true,
        url: None,
        prefer_small_media: false,
        prefer_large_media: false,
        show_above_text: false,
    }
}

#[async_trait]
impl MessageSink for Bot {
    async fn send_html(&self, chat_id: ChatId, text: &str) -> Result<(), TelegramError> {
        self.send_message(chat_id, text)
            .parse_mode(ParseMode::Html)
            .link_preview_options(disabled_link_preview())
            .await?;
        Ok(())
    }
}

/// Bot commands.
#[derive(BotCommands, Clone, Debug, PartialEq)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    #[command(description = "Subscribe this chat to contest reminders")]
    Start,
    #[command(description = "Show the next upcoming contests")]
    List,
    #[command(description = "Stop receiving contest reminders")]
    Unsubscribe,
    #[command(description = "Show help")]
    Help,
}

/// Telegram command dispatcher.
pub struct TelegramBot {
    bot: Bot,
    notifier: Arc<Notifier>,
}

impl TelegramBot {
    pub fn new(bot: Bot, notifier: Arc<Notifier>) -> Self {
        Self { bot, notifier }
    }

    /// Run the bot command handler until Ctrl+C.
    pub async fn run(self: Arc<Self>) {
        let bot = self.bot.clone();

        if let Err(e) = bot.set_my_commands(Command::bot_commands()).await {
            warn!("Failed to register bot commands: {}", e);
        }

        let handler = Update::filter_message().filter_command::<Command>().endpoint(
            move |bot: Bot, msg: Message, cmd: Command| {
                let this = Arc::clone(&self);
                async move { this.handle_command(bot, msg, cmd).await }
            },
        );

        Dispatcher::builder(bot, handler)
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;
    }

    async fn handle_command(
        &self,
        bot: Bot,
        msg: Message,
        cmd: Command,
    ) -> Result<(), TelegramError> {
        let chat_id = msg.chat.id;

        match cmd {
            Command::Start => {
                if self.notifier.subscribe(chat_id) {
                    info!(chat_id = chat_id.0, "Added subscriber");
                }
                info!(subscribers = ?self.notifier.subscribers().list(), "Current subscribers");
                bot.send_message(chat_id, "Subscribed to contest updates!")
                    .await?;
            }

            Command::Unsubscribe => {
                let text = if self.notifier.unsubscribe(chat_id) {
                    info!(chat_id = chat_id.0, "Removed subscriber");
                    "Unsubscribed from contest reminders."
                } else {
                    "This chat is not subscribed."
                };
                info!(subscribers = ?self.notifier.subscribers().list(), "Current subscribers");
                bot.send_message(chat_id, text).await?;
            }

            Command::List => match self.notifier.list_message(Utc::now()).await {
                Ok(text) => {
                    bot.send_html(chat_id, &text).await?;
                    info!(chat_id = chat_id.0, "Sent upcoming contest list");
                }
                Err(e) => {
                    error!(chat_id = chat_id.0, error = %e, "Failed to build contest list");
                    bot.send_message(chat_id, "Could not fetch contests, please try again later.")
                        .await?;
                }
            },

            Command::Help => {
                bot.send_message(chat_id, Command::descriptions().to_string())
                    .await?;
            }
        }

        Ok(())
    }
}
