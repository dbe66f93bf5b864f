//! # Error Types
//!
//! Error taxonomy shared by the word store, settings store and scheduler.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.2.0

use thiserror::Error;

/// Errors surfaced by vocabulary and reminder operations
#[derive(Debug, Error)]
pub enum VocabError {
    /// Bad user id, empty word fields, malformed time
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Review or delete target does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Database unreachable, timed out or returned an unexpected error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Notifier failed to deliver a message; a later attempt may succeed
    #[error("Delivery error: {0}")]
    Delivery(String),

    /// Chat API refused the message for good (blocked bot, bad markup)
    #[error("Delivery rejected: {0}")]
    Rejected(String),
}

impl VocabError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        VocabError::InvalidArgument(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        VocabError::NotFound(msg.into())
    }
}

impl From<sqlite::Error> for VocabError {
    fn from(error: sqlite::Error) -> Self {
        VocabError::Storage(error.to_string())
    }
}

impl From<chrono::ParseError> for VocabError {
    fn from(error: chrono::ParseError) -> Self {
        VocabError::Storage(format!("bad timestamp in database: {error}"))
    }
}

impl From<reqwest::Error> for VocabError {
    fn from(error: reqwest::Error) -> Self {
        // The request URL carries the bot token
        VocabError::Delivery(error.without_url().to_string())
    }
}

pub type VocabResult<T> = std::result::Result<T, VocabError>;

/// Reject non-positive user ids before touching storage
pub fn ensure_user_id(user_id: i64) -> VocabResult<()> {
    if user_id <= 0 {
        return Err(VocabError::invalid(format!("user_id must be positive, got {user_id}")));
    }
    Ok(())
}
