//! Messaging error types.

use thiserror::Error;

/// Errors raised by queues, topics and the publisher.
#[derive(Debug, Error)]
pub enum MessagingError {
    /// The broker rejected or failed the call.
    #[error("Transport error: {0}")]
    Transport(String),

    /// A message body could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// No topic matches the configured name.
    #[error("Topic not found: {0}")]
    TopicNotFound(String),
}

/// Result type for messaging operations.
pub type Result<T> = std::result::Result<T, MessagingError>;
