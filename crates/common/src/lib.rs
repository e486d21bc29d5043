//! Shared types for the storefront order core.

pub mod money;
pub mod order;
pub mod stock;
pub mod types;

pub use money::Money;
pub use order::{
    AddressError, Order, OrderLineItem, OrderNumber, OrderStatus, ShippingAddress, ShippingMethod,
    UnknownShippingMethod,
};
pub use stock::StockRecord;
pub use types::{OrderId, ProductId, UserId};
