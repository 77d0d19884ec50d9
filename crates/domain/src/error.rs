//! Domain error types.

use common::OrderStatus;
use store::StoreError;
use thiserror::Error;

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Missing or malformed input. Detected before anything is written.
    #[error("{0}")]
    Validation(String),

    /// The resource does not exist, or exists but belongs to another user.
    #[error("{resource} not found")]
    NotFound { resource: &'static str, id: i64 },

    /// A unique key could not be satisfied, even after retrying.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The order's current status does not allow the requested one.
    #[error("Cannot change order status from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// The store failed; any transaction in flight has been rolled back.
    #[error("Persistence error: {0}")]
    Persistence(StoreError),
}

impl DomainError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        DomainError::Validation(message.into())
    }

    pub(crate) fn not_found(resource: &'static str, id: impl Into<i64>) -> Self {
        DomainError::NotFound {
            resource,
            id: id.into(),
        }
    }
}

impl From<StoreError> for DomainError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => DomainError::NotFound {
                resource: entity,
                id,
            },
            StoreError::InvalidTransition { from, to } => {
                DomainError::InvalidTransition { from, to }
            }
            StoreError::InvalidReference { entity } => {
                DomainError::Validation(format!("Unknown {entity}"))
            }
            StoreError::OutOfRange(detail) => {
                DomainError::Validation(format!("Value out of range: {detail}"))
            }
            StoreError::Conflict { constraint } => DomainError::Conflict(constraint),
            other => DomainError::Persistence(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, DomainError>;
