//! Service error types.

use common::{ItemId, OrderId};
use domain::{OrderError, OrderState};
use order_store::StoreError;
use thiserror::Error;

/// Errors returned by the order production use cases.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Caller input is malformed. Never worth retrying.
    #[error("Request not valid: {0}")]
    Validation(String),

    /// No order matches the requested id.
    #[error("Order not found: {0}")]
    NotFound(OrderId),

    /// An order with this id was already created.
    #[error("Order already exists: {0}")]
    AlreadyExists(OrderId),

    /// The request listed the same item twice.
    #[error("Order item already exists: {0}")]
    DuplicateItem(ItemId),

    /// The requested state change is not an edge of the transition graph.
    #[error("Invalid state transition: {from} -> {to}")]
    InvalidTransition { from: OrderState, to: OrderState },

    /// The order store failed.
    #[error("Storage error: {0}")]
    Storage(StoreError),
}

impl ServiceError {
    /// Returns true for business-rule and input failures, false for
    /// infrastructure failures.
    pub fn is_business(&self) -> bool {
        !matches!(self, ServiceError::Storage(_))
    }
}

impl From<StoreError> for ServiceError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(id) => ServiceError::NotFound(id),
            StoreError::AlreadyExists(id) => ServiceError::AlreadyExists(id),
            other => ServiceError::Storage(other),
        }
    }
}

impl From<OrderError> for ServiceError {
    fn from(e: OrderError) -> Self {
        match e {
            OrderError::DuplicateItem { item_id } => ServiceError::DuplicateItem(item_id),
            OrderError::InvalidTransition { from, to } => {
                ServiceError::InvalidTransition { from, to }
            }
            OrderError::UnknownState(name) => {
                ServiceError::Validation(format!("unknown state {name:?}"))
            }
        }
    }
}

/// Result type for service operations.
pub type Result<T> = std::result::Result<T, ServiceError>;
