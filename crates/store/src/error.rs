use common::{OrderStatus, UnknownVariant};
use thiserror::Error;

/// Name of the unique constraint on `orders.order_number`.
pub const ORDER_NUMBER_CONSTRAINT: &str = "orders_order_number_key";

/// Name of the partial unique index allowing one default address per user.
pub const ADDRESS_DEFAULT_CONSTRAINT: &str = "addresses_one_default_per_user";

/// SQLSTATE raised when an integer column overflows.
const NUMERIC_OUT_OF_RANGE: &str = "22003";

/// Errors that can occur when reading or writing the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A row required by the operation does not exist or is not owned by the caller.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    /// A unique constraint rejected the write.
    #[error("unique constraint violated: {constraint}")]
    Conflict { constraint: String },

    /// A foreign key pointed at a missing row.
    #[error("referenced {entity} does not exist")]
    InvalidReference { entity: &'static str },

    /// The order is not in a status from which the requested one may follow.
    #[error("cannot move order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// A numeric value exceeded what the column can hold.
    #[error("value out of range: {0}")]
    OutOfRange(String),

    /// A stored value could not be mapped back into a domain type.
    #[error("corrupt row: {0}")]
    Corrupt(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl StoreError {
    /// Returns true if this is a collision on the given unique constraint.
    pub fn is_conflict_on(&self, name: &str) -> bool {
        matches!(self, StoreError::Conflict { constraint } if constraint == name)
    }

    /// Classifies a sqlx error, lifting constraint violations into
    /// [`StoreError::Conflict`] and [`StoreError::InvalidReference`].
    pub(crate) fn from_write(err: sqlx::Error, referenced: &'static str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.is_unique_violation() {
                return StoreError::Conflict {
                    constraint: db_err.constraint().unwrap_or_default().to_string(),
                };
            }
            if db_err.is_foreign_key_violation() {
                return StoreError::InvalidReference { entity: referenced };
            }
            if db_err.code().as_deref() == Some(NUMERIC_OUT_OF_RANGE) {
                return StoreError::OutOfRange(db_err.message().to_string());
            }
        }
        StoreError::Database(err)
    }
}

impl From<UnknownVariant> for StoreError {
    fn from(err: UnknownVariant) -> Self {
        StoreError::Corrupt(err.to_string())
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
