//! Error types for core parsing.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid contest time '{value}': {reason}")]
    InvalidTime { value: String, reason: String },
}
