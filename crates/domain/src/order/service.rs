//! Order service: the order-creation transaction.

use std::sync::Arc;
use std::time::Instant;

use common::{Order, OrderId, OrderLineItem, OrderStatus};
use store::{Storage, StoreError, UnitOfWork};

use crate::clock::{Clock, SystemClock};
use crate::error::OrderError;

use super::pricing::{ShippingRates, items_price, total_price};
use super::{OrderNumberSequencer, PlaceOrder};

/// Creates orders, debiting inventory in the same transaction.
///
/// Either the order is stored and every requested line's stock is
/// decremented, or nothing changes.
pub struct OrderService<S: Storage> {
    storage: S,
    sequencer: OrderNumberSequencer,
    rates: ShippingRates,
    clock: Arc<dyn Clock>,
}

impl<S: Storage> OrderService<S> {
    /// Creates a new order service with default shipping rates and the system clock.
    pub fn new(storage: S) -> Self {
        Self::with_parts(storage, ShippingRates::default(), Arc::new(SystemClock))
    }

    pub fn with_parts(storage: S, rates: ShippingRates, clock: Arc<dyn Clock>) -> Self {
        Self {
            storage,
            sequencer: OrderNumberSequencer::with_clock(clock.clone()),
            rates,
            clock,
        }
    }

    /// Returns a reference to the underlying storage.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Places an order.
    ///
    /// Lines are checked and decremented one at a time in the order given.
    /// Any failure rolls back every decrement made so far.
    #[tracing::instrument(skip(self, cmd), fields(owner = %cmd.owner, lines = cmd.items.len()))]
    pub async fn create_order(&self, cmd: PlaceOrder) -> Result<Order, OrderError> {
        let started = Instant::now();
        let result = self.try_create_order(cmd).await;

        metrics::histogram!("order_creation_duration_seconds")
            .record(started.elapsed().as_secs_f64());
        match &result {
            Ok(order) => {
                metrics::counter!("orders_created_total").increment(1);
                tracing::info!(
                    order_id = %order.id,
                    order_number = %order.order_number,
                    total = %order.total_price,
                    "order created"
                );
            }
            Err(e) => {
                metrics::counter!("orders_failed_total", "reason" => e.kind()).increment(1);
                tracing::warn!(error = %e, kind = e.kind(), "order creation failed");
            }
        }

        result
    }

    async fn try_create_order(&self, cmd: PlaceOrder) -> Result<Order, OrderError> {
        cmd.validate()?;
        // Resolve the price before any stock moves.
        let shipping_price = self.rates.price_for(cmd.shipping_method)?;

        let mut uow = self.storage.begin().await?;
        match self.run(&mut uow, cmd, shipping_price).await {
            Ok(order) => {
                uow.commit().await.map_err(OrderError::TransactionAborted)?;
                Ok(order)
            }
            Err(e) => {
                if let Err(rollback_err) = uow.rollback().await {
                    tracing::error!(error = %rollback_err, "rollback failed");
                }
                Err(e)
            }
        }
    }

    async fn run(
        &self,
        uow: &mut S::Unit,
        cmd: PlaceOrder,
        shipping_price: common::Money,
    ) -> Result<Order, OrderError> {
        let order_number = self.sequencer.next_order_number(uow).await?;

        let mut line_items = Vec::with_capacity(cmd.items.len());
        for line in cmd.items {
            let stock = uow.get_stock(&line.product_id).await?.ok_or_else(|| {
                OrderError::ProductNotFound {
                    product_id: line.product_id.clone(),
                }
            })?;

            if !stock.can_fulfil(line.quantity) {
                return Err(OrderError::InsufficientStock {
                    product_id: line.product_id,
                    available: stock.count_in_stock,
                    requested: line.quantity,
                });
            }

            if uow
                .decrement_stock(&line.product_id, line.quantity)
                .await?
                .is_err()
            {
                return Err(OrderError::StockUpdateConflict {
                    product_id: line.product_id,
                });
            }

            line_items.push(OrderLineItem {
                product_id: line.product_id,
                product_name: stock.name,
                quantity: line.quantity,
                unit_price: stock.price,
            });
        }

        let items_price = items_price(&line_items)?;
        let total_price = total_price(items_price, shipping_price)?;
        let now = self.clock.now();
        let order = Order {
            id: OrderId::new(),
            order_number,
            owner: cmd.owner,
            line_items,
            shipping_address: cmd.shipping_address,
            shipping_method: cmd.shipping_method,
            contact_phone: cmd.contact_phone,
            items_price,
            shipping_price,
            total_price,
            status: OrderStatus::Pending,
            is_paid: false,
            paid_at: None,
            created_at: now,
            updated_at: now,
        };

        uow.insert_order(order).await.map_err(|e| match e {
            StoreError::DuplicateOrderNumber(_) => OrderError::TransactionAborted(e),
            other => OrderError::StorageUnavailable(other),
        })
    }
}
