//! Error types for contest feed operations.

use thiserror::Error;

/// Errors that can occur while querying the contest API.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Request failed: {0}")]
    Request(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Contest API returned HTTP {0}")]
    Http(u16),

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Invalid API url: {0}")]
    InvalidUrl(String),

    #[error("Authentication failed")]
    Unauthorized,

    #[error("Rate limit exceeded")]
    RateLimitExceeded,
}

impl From<reqwest::Error> for FeedError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FeedError::Timeout(err.to_string())
        } else if err.is_decode() {
            FeedError::Parse(err.to_string())
        } else {
            FeedError::Request(err.to_string())
        }
    }
}

impl From<serde_json::Error> for FeedError {
    fn from(err: serde_json::Error) -> Self {
        FeedError::Parse(err.to_string())
    }
}

impl FeedError {
    /// Map a non-success HTTP status to an error.
    pub fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => FeedError::Unauthorized,
            429 => FeedError::RateLimitExceeded,
            other => FeedError::Http(other),
        }
    }

    /// Returns true if the next poll is likely to succeed without intervention.
    pub fn is_transient(&self) -> bool {
        match self {
            FeedError::Request(_) | FeedError::Timeout(_) | FeedError::RateLimitExceeded => true,
            FeedError::Http(status) => *status >= 500,
            FeedError::Parse(_) | FeedError::InvalidUrl(_) | FeedError::Unauthorized => false,
        }
    }
}
