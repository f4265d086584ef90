//! Core data types for the contest reminder bot.

pub mod contest;
pub mod error;
pub mod reminder;
pub mod time;

pub use contest::*;
pub use error::*;
pub use reminder::*;
pub use time::*;
