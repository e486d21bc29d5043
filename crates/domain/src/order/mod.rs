//! Order creation: commands, pricing, numbering and the transactor.

mod commands;
mod pricing;
mod sequencer;
mod service;

pub use commands::{LineRequest, PlaceOrder};
pub use pricing::{ShippingRates, items_price};
pub use sequencer::OrderNumberSequencer;
pub use service::OrderService;
