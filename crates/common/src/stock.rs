//! Inventory records.

use serde::{Deserialize, Serialize};

use crate::{Money, ProductId};

/// Inventory entry for a product: units on hand, units sold, current price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockRecord {
    pub product_id: ProductId,
    pub name: String,
    pub price: Money,
    pub count_in_stock: u32,
    pub units_sold: u32,
}

impl StockRecord {
    pub fn new(
        product_id: impl Into<ProductId>,
        name: impl Into<String>,
        price: Money,
        count_in_stock: u32,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            name: name.into(),
            price,
            count_in_stock,
            units_sold: 0,
        }
    }

    /// Returns true if `quantity` units can be taken without going negative.
    pub fn can_fulfil(&self, quantity: u32) -> bool {
        self.count_in_stock >= quantity
    }
}
