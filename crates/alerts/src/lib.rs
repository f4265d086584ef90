//! Telegram side of the contest reminder bot.
//!
//! This crate provides:
//! - In-memory subscriber registry
//! - HTML message formatting for contest lists and reminders
//! - The notifier that fetches contests and relays them to subscribers
//! - The Telegram command dispatcher

pub mod format;
pub mod notifier;
pub mod subscribers;
pub mod telegram;

pub use format::MessageFormatter;
pub use notifier::{Notifier, NotifierConfig, NotifierError};
pub use subscribers::Subscribers;
pub use telegram::{Command, MessageSink, TelegramBot, TelegramError};
