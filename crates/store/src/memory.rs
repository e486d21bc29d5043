use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use common::{Order, ProductId, StockRecord};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::{
    Result, StoreError,
    store::{DecrementOutcome, StockConflict, StockUpdated, Storage, UnitOfWork},
};

#[derive(Debug, Clone, Default)]
struct Tables {
    products: BTreeMap<ProductId, StockRecord>,
    orders: Vec<Order>,
}

/// Injected failures, used by tests to drive error paths.
#[derive(Debug, Default)]
struct Faults {
    unavailable: bool,
    fail_order_lookup: bool,
    fail_next_insert: bool,
    fail_next_commit: bool,
    conflicts: HashSet<ProductId>,
}

#[derive(Debug, Default)]
struct Inner {
    tables: Tables,
    faults: Faults,
}

/// In-memory storage implementation for testing.
///
/// Units of work are serialized: [`Storage::begin`] waits until the previous
/// unit has committed or rolled back. Each unit works on a private copy of
/// the tables, which replaces the shared tables only on commit.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStorage {
    inner: Arc<Mutex<Inner>>,
}

impl InMemoryStorage {
    /// Creates a new empty in-memory storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a product's stock record.
    pub async fn put_stock(&self, record: StockRecord) {
        let mut inner = self.inner.lock().await;
        inner
            .tables
            .products
            .insert(record.product_id.clone(), record);
    }

    /// Returns the committed stock record for a product.
    pub async fn stock(&self, product_id: &ProductId) -> Option<StockRecord> {
        self.inner
            .lock()
            .await
            .tables
            .products
            .get(product_id)
            .cloned()
    }

    /// Returns all committed orders in insertion order.
    pub async fn orders(&self) -> Vec<Order> {
        self.inner.lock().await.tables.orders.clone()
    }

    /// Returns the number of committed orders.
    pub async fn order_count(&self) -> usize {
        self.inner.lock().await.tables.orders.len()
    }

    /// Makes every subsequent `begin` fail until reset.
    pub async fn set_unavailable(&self, unavailable: bool) {
        self.inner.lock().await.faults.unavailable = unavailable;
    }

    /// Makes `find_most_recent_order` fail until reset.
    pub async fn set_fail_order_lookup(&self, fail: bool) {
        self.inner.lock().await.faults.fail_order_lookup = fail;
    }

    /// Fails the next `insert_order` call.
    pub async fn fail_next_insert(&self) {
        self.inner.lock().await.faults.fail_next_insert = true;
    }

    /// Fails the next `commit` call.
    pub async fn fail_next_commit(&self) {
        self.inner.lock().await.faults.fail_next_commit = true;
    }

    /// Makes decrements of `product_id` report a conflict, as if a concurrent
    /// writer had drained it between the read and the update.
    pub async fn conflict_on(&self, product_id: impl Into<ProductId>) {
        self.inner
            .lock()
            .await
            .faults
            .conflicts
            .insert(product_id.into());
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    type Unit = InMemoryUnitOfWork;

    async fn begin(&self) -> Result<Self::Unit> {
        let guard = self.inner.clone().lock_owned().await;
        if guard.faults.unavailable {
            return Err(StoreError::Unavailable(
                "in-memory storage marked unavailable".to_string(),
            ));
        }

        let working = guard.tables.clone();
        Ok(InMemoryUnitOfWork { guard, working })
    }
}

/// Unit of work over [`InMemoryStorage`].
pub struct InMemoryUnitOfWork {
    guard: OwnedMutexGuard<Inner>,
    working: Tables,
}

#[async_trait]
impl UnitOfWork for InMemoryUnitOfWork {
    async fn get_stock(&mut self, product_id: &ProductId) -> Result<Option<StockRecord>> {
        Ok(self.working.products.get(product_id).cloned())
    }

    async fn decrement_stock(
        &mut self,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<DecrementOutcome> {
        if self.guard.faults.conflicts.contains(product_id) {
            return Ok(Err(StockConflict));
        }

        match self.working.products.get_mut(product_id) {
            Some(record) if record.count_in_stock >= quantity => {
                record.count_in_stock -= quantity;
                record.units_sold = record.units_sold.saturating_add(quantity);
                Ok(Ok(StockUpdated))
            }
            _ => Ok(Err(StockConflict)),
        }
    }

    async fn find_most_recent_order(&mut self) -> Result<Option<Order>> {
        if self.guard.faults.fail_order_lookup {
            return Err(StoreError::Unavailable(
                "order lookup failed".to_string(),
            ));
        }

        // max_by_key keeps the last of equal keys, i.e. the latest insert.
        Ok(self
            .working
            .orders
            .iter()
            .max_by_key(|o| o.created_at)
            .cloned())
    }

    async fn insert_order(&mut self, order: Order) -> Result<Order> {
        if std::mem::take(&mut self.guard.faults.fail_next_insert) {
            return Err(StoreError::Unavailable(
                "order insert failed".to_string(),
            ));
        }

        if self
            .working
            .orders
            .iter()
            .any(|o| o.order_number == order.order_number)
        {
            return Err(StoreError::DuplicateOrderNumber(order.order_number));
        }

        self.working.orders.push(order.clone());
        Ok(order)
    }

    async fn commit(mut self) -> Result<()> {
        if std::mem::take(&mut self.guard.faults.fail_next_commit) {
            return Err(StoreError::Unavailable("commit failed".to_string()));
        }

        self.guard.tables = self.working;
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use common::{
        Money, OrderId, OrderNumber, OrderStatus, ShippingAddress, ShippingMethod, UserId,
    };

    use super::*;

    fn order(number: u64) -> Order {
        let now = Utc::now();
        Order {
            id: OrderId::new(),
            order_number: OrderNumber::from_raw(number),
            owner: UserId::new(),
            line_items: vec![],
            shipping_address: ShippingAddress {
                name: "N".to_string(),
                street: "S".to_string(),
                city: "C".to_string(),
                postal_code: "12345".to_string(),
                country: "US".to_string(),
            },
            shipping_method: ShippingMethod::Standard,
            contact_phone: None,
            items_price: Money::zero(),
            shipping_price: Money::zero(),
            total_price: Money::zero(),
            status: OrderStatus::Pending,
            is_paid: false,
            paid_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    async fn seeded() -> InMemoryStorage {
        let storage = InMemoryStorage::new();
        storage
            .put_stock(StockRecord::new("p-1", "Dune", Money::from_cents(1299), 5))
            .await;
        storage
    }

    #[tokio::test]
    async fn test_commit_publishes_changes() {
        let storage = seeded().await;
        let id = ProductId::new("p-1");

        let mut uow = storage.begin().await.unwrap();
        assert_eq!(uow.decrement_stock(&id, 2).await.unwrap(), Ok(StockUpdated));
        uow.insert_order(order(25_041_700_001)).await.unwrap();
        uow.commit().await.unwrap();

        let stock = storage.stock(&id).await.unwrap();
        assert_eq!(stock.count_in_stock, 3);
        assert_eq!(stock.units_sold, 2);
        assert_eq!(storage.order_count().await, 1);
    }

    #[tokio::test]
    async fn test_rollback_and_drop_discard_changes() {
        let storage = seeded().await;
        let id = ProductId::new("p-1");

        let mut uow = storage.begin().await.unwrap();
        uow.decrement_stock(&id, 2).await.unwrap().unwrap();
        uow.rollback().await.unwrap();

        {
            let mut uow = storage.begin().await.unwrap();
            uow.decrement_stock(&id, 1).await.unwrap().unwrap();
            uow.insert_order(order(1)).await.unwrap();
        }

        assert_eq!(storage.stock(&id).await.unwrap().count_in_stock, 5);
        assert_eq!(storage.order_count().await, 0);
    }

    #[tokio::test]
    async fn test_decrement_never_goes_negative() {
        let storage = seeded().await;
        let id = ProductId::new("p-1");

        let mut uow = storage.begin().await.unwrap();
        assert_eq!(uow.decrement_stock(&id, 6).await.unwrap(), Err(StockConflict));
        assert_eq!(
            uow.decrement_stock(&ProductId::new("missing"), 1)
                .await
                .unwrap(),
            Err(StockConflict)
        );
        assert_eq!(uow.get_stock(&id).await.unwrap().unwrap().count_in_stock, 5);
    }

    #[tokio::test]
    async fn test_uncommitted_reads_see_own_writes() {
        let storage = seeded().await;
        let id = ProductId::new("p-1");

        let mut uow = storage.begin().await.unwrap();
        uow.decrement_stock(&id, 4).await.unwrap().unwrap();
        assert_eq!(uow.get_stock(&id).await.unwrap().unwrap().count_in_stock, 1);
        uow.insert_order(order(7)).await.unwrap();
        let recent = uow.find_most_recent_order().await.unwrap().unwrap();
        assert_eq!(recent.order_number.as_u64(), 7);
    }

    #[tokio::test]
    async fn test_duplicate_order_number_rejected() {
        let storage = InMemoryStorage::new();
        let mut uow = storage.begin().await.unwrap();
        uow.insert_order(order(42)).await.unwrap();
        let err = uow.insert_order(order(42)).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateOrderNumber(n) if n.as_u64() == 42));
    }

    #[tokio::test]
    async fn test_injected_faults() {
        let storage = seeded().await;

        storage.set_unavailable(true).await;
        assert!(matches!(
            storage.begin().await,
            Err(StoreError::Unavailable(_))
        ));
        storage.set_unavailable(false).await;

        storage.conflict_on("p-1").await;
        storage.fail_next_commit().await;
        let mut uow = storage.begin().await.unwrap();
        assert_eq!(
            uow.decrement_stock(&ProductId::new("p-1"), 1).await.unwrap(),
            Err(StockConflict)
        );
        assert!(uow.commit().await.is_err());

        // One-shot faults are cleared once consumed.
        let uow = storage.begin().await.unwrap();
        assert!(uow.commit().await.is_ok());
    }
}
