//! Domain error types.

use common::{AddressError, ProductId, UnknownShippingMethod};
use store::StoreError;
use thiserror::Error;

/// Errors surfaced by order creation.
///
/// Each kind maps to a distinct caller response, so callers match on the
/// variant rather than the message.
#[derive(Debug, Error)]
pub enum OrderError {
    /// The request is malformed: no items, a zero quantity, or a bad address.
    #[error("Invalid order request: {0}")]
    Validation(String),

    /// A requested product has no stock record.
    #[error("Product not found: {product_id}")]
    ProductNotFound { product_id: ProductId },

    /// A requested product has fewer units than asked for.
    #[error("Insufficient stock for product {product_id} (have {available}, need {requested})")]
    InsufficientStock {
        product_id: ProductId,
        available: u32,
        requested: u32,
    },

    /// The conditional decrement matched no row; a concurrent order won.
    #[error("Stock update conflict for product {product_id}")]
    StockUpdateConflict { product_id: ProductId },

    /// No shipping price is configured for the requested method.
    #[error("Invalid shipping method: {0}")]
    InvalidShippingMethod(String),

    /// The store could not be read or written.
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(#[from] StoreError),

    /// The transaction could not be committed.
    #[error("Transaction aborted: {0}")]
    TransactionAborted(#[source] StoreError),
}

impl OrderError {
    /// Short label for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            OrderError::Validation(_) => "validation",
            OrderError::ProductNotFound { .. } => "product_not_found",
            OrderError::InsufficientStock { .. } => "insufficient_stock",
            OrderError::StockUpdateConflict { .. } => "stock_update_conflict",
            OrderError::InvalidShippingMethod(_) => "invalid_shipping_method",
            OrderError::StorageUnavailable(_) => "storage_unavailable",
            OrderError::TransactionAborted(_) => "transaction_aborted",
        }
    }
}

impl From<AddressError> for OrderError {
    fn from(e: AddressError) -> Self {
        OrderError::Validation(e.to_string())
    }
}

impl From<UnknownShippingMethod> for OrderError {
    fn from(e: UnknownShippingMethod) -> Self {
        OrderError::InvalidShippingMethod(e.0)
    }
}
