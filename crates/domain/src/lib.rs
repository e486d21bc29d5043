//! Domain layer for the storefront order core.
//!
//! This crate provides:
//! - `OrderNumberSequencer`, the in-process `YYMMDD` + sequence generator
//! - pricing helpers and the configurable shipping price table
//! - `OrderService::create_order`, which debits stock and stores the order
//!   in one unit of work

pub mod clock;
pub mod error;
pub mod order;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::OrderError;
pub use order::{
    LineRequest, OrderNumberSequencer, OrderService, PlaceOrder, ShippingRates, items_price,
};
