use common::OrderNumber;
use thiserror::Error;

/// Errors that can occur when talking to the stock and order stores.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing store cannot be reached or refused the operation.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// An order with this number already exists.
    #[error("Duplicate order number: {0}")]
    DuplicateOrderNumber(OrderNumber),

    /// A stored value does not fit the record type.
    #[error("Corrupt record: {0}")]
    Corrupt(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
