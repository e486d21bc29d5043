use async_trait::async_trait;
use common::{Order, ProductId, StockRecord};

use crate::Result;

/// Marker returned when a conditional stock decrement touched its row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockUpdated;

/// The conditional decrement matched no row: the product vanished or a
/// concurrent order took the stock first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockConflict;

/// Outcome of [`UnitOfWork::decrement_stock`].
pub type DecrementOutcome = std::result::Result<StockUpdated, StockConflict>;

/// A transaction against the stock and order stores.
///
/// Every read and write made through a unit of work either becomes visible
/// together on [`commit`](UnitOfWork::commit) or not at all. Dropping a unit
/// of work without committing rolls it back.
#[async_trait]
pub trait UnitOfWork: Send {
    /// Loads the stock record for a product.
    async fn get_stock(&mut self, product_id: &ProductId) -> Result<Option<StockRecord>>;

    /// Takes `quantity` units off `count_in_stock` and adds them to `units_sold`.
    ///
    /// Only applies while `count_in_stock >= quantity`; otherwise nothing
    /// changes and `Ok(Err(StockConflict))` is returned.
    async fn decrement_stock(
        &mut self,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<DecrementOutcome>;

    /// Returns the most recently created order, if any.
    async fn find_most_recent_order(&mut self) -> Result<Option<Order>>;

    /// Persists a new order.
    async fn insert_order(&mut self, order: Order) -> Result<Order>;

    /// Makes all changes durable.
    async fn commit(self) -> Result<()>
    where
        Self: Sized;

    /// Discards all changes.
    async fn rollback(self) -> Result<()>
    where
        Self: Sized;
}

/// Source of units of work.
///
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait Storage: Send + Sync {
    type Unit: UnitOfWork;

    /// Opens a new unit of work.
    async fn begin(&self) -> Result<Self::Unit>;
}
