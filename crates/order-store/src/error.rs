use common::OrderId;
use thiserror::Error;

/// Errors that can occur when interacting with the order store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No order row matches the requested id.
    #[error("Order not found: {0}")]
    NotFound(OrderId),

    /// An order row with this id already exists.
    #[error("Order already exists: {0}")]
    AlreadyExists(OrderId),

    /// A persisted row could not be mapped back onto the domain model.
    #[error("Corrupt row: {0}")]
    CorruptRow(String),

    /// The store cannot serve requests right now.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for order store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
