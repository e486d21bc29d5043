//! Stock and order persistence behind an explicit unit of work.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::{InMemoryStorage, InMemoryUnitOfWork};
pub use postgres::{PostgresStorage, PostgresUnitOfWork};
pub use store::{DecrementOutcome, Storage, StockConflict, StockUpdated, UnitOfWork};
