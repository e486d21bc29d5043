//! PostgreSQL integration tests
//!
//! These tests use a shared PostgreSQL container for efficiency.
//! Run with:
//!
//! ```bash
//! cargo test -p store --test postgres_integration -- --test-threads=1
//! ```

use std::sync::Arc;

use chrono::{Duration, Utc};
use common::{
    Money, Order, OrderId, OrderLineItem, OrderNumber, OrderStatus, ProductId, ShippingAddress,
    ShippingMethod, StockRecord, UserId,
};
use store::{PostgresStorage, StockConflict, StockUpdated, Storage, StoreError, UnitOfWork};
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

/// Global shared container
static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let storage = PostgresStorage::connect(&connection_string).await.unwrap();
            storage.run_migrations().await.unwrap();

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh storage with its own pool and cleared tables
async fn get_test_storage() -> PostgresStorage {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(10)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query("TRUNCATE TABLE products, orders")
        .execute(&pool)
        .await
        .unwrap();

    PostgresStorage::new(pool)
}

fn test_order(number: u64) -> Order {
    let now = Utc::now();
    Order {
        id: OrderId::new(),
        order_number: OrderNumber::from_raw(number),
        owner: UserId::new(),
        line_items: vec![OrderLineItem {
            product_id: ProductId::new("p-1"),
            product_name: "Dune".to_string(),
            quantity: 2,
            unit_price: Money::from_cents(350),
        }],
        shipping_address: ShippingAddress {
            name: "Ada Lovelace".to_string(),
            street: "12 St James's Square".to_string(),
            city: "London".to_string(),
            postal_code: "SW1Y 4JH".to_string(),
            country: "GB".to_string(),
        },
        shipping_method: ShippingMethod::Express,
        contact_phone: Some("+44 20 7946 0000".to_string()),
        items_price: Money::from_cents(700),
        shipping_price: Money::from_cents(1500),
        total_price: Money::from_cents(2200),
        status: OrderStatus::Pending,
        is_paid: false,
        paid_at: None,
        created_at: now,
        updated_at: now,
    }
}

async fn committed_stock(storage: &PostgresStorage, id: &str) -> StockRecord {
    let mut uow = storage.begin().await.unwrap();
    let stock = uow.get_stock(&ProductId::new(id)).await.unwrap().unwrap();
    uow.rollback().await.unwrap();
    stock
}

#[tokio::test]
async fn conditional_decrement_updates_both_counters() {
    let storage = get_test_storage().await;
    storage
        .upsert_stock(&StockRecord::new("p-1", "Dune", Money::from_cents(350), 10))
        .await
        .unwrap();

    let mut uow = storage.begin().await.unwrap();
    let id = ProductId::new("p-1");
    assert_eq!(uow.decrement_stock(&id, 2).await.unwrap(), Ok(StockUpdated));
    assert_eq!(uow.decrement_stock(&id, 9).await.unwrap(), Err(StockConflict));
    uow.commit().await.unwrap();

    let stock = committed_stock(&storage, "p-1").await;
    assert_eq!(stock.count_in_stock, 8);
    assert_eq!(stock.units_sold, 2);
    assert_eq!(stock.price.cents(), 350);
}

#[tokio::test]
async fn rollback_discards_decrements_and_orders() {
    let storage = get_test_storage().await;
    storage
        .upsert_stock(&StockRecord::new("p-1", "Dune", Money::from_cents(350), 5))
        .await
        .unwrap();

    let mut uow = storage.begin().await.unwrap();
    uow.decrement_stock(&ProductId::new("p-1"), 3)
        .await
        .unwrap()
        .unwrap();
    uow.insert_order(test_order(25_041_700_001)).await.unwrap();
    uow.rollback().await.unwrap();

    assert_eq!(committed_stock(&storage, "p-1").await.count_in_stock, 5);
    let mut uow = storage.begin().await.unwrap();
    assert!(uow.find_most_recent_order().await.unwrap().is_none());
}

#[tokio::test]
async fn orders_round_trip_and_most_recent_wins() {
    let storage = get_test_storage().await;

    let mut older = test_order(25_041_700_001);
    older.created_at = Utc::now() - Duration::minutes(5);
    let newer = test_order(25_041_700_002);

    let mut uow = storage.begin().await.unwrap();
    uow.insert_order(newer.clone()).await.unwrap();
    uow.insert_order(older).await.unwrap();
    uow.commit().await.unwrap();

    let mut uow = storage.begin().await.unwrap();
    let recent = uow.find_most_recent_order().await.unwrap().unwrap();
    assert_eq!(recent.id, newer.id);
    assert_eq!(recent.order_number, newer.order_number);
    assert_eq!(recent.line_items, newer.line_items);
    assert_eq!(recent.shipping_address, newer.shipping_address);
    assert_eq!(recent.shipping_method, ShippingMethod::Express);
    assert_eq!(recent.total_price.cents(), 2200);
    assert_eq!(recent.contact_phone, newer.contact_phone);
}

#[tokio::test]
async fn duplicate_order_number_is_reported() {
    let storage = get_test_storage().await;

    let mut uow = storage.begin().await.unwrap();
    uow.insert_order(test_order(42)).await.unwrap();
    uow.commit().await.unwrap();

    let mut uow = storage.begin().await.unwrap();
    let err = uow.insert_order(test_order(42)).await.unwrap_err();
    assert!(matches!(err, StoreError::DuplicateOrderNumber(n) if n.as_u64() == 42));
}

#[tokio::test]
async fn concurrent_decrements_never_overdraw() {
    let storage = get_test_storage().await;
    storage
        .upsert_stock(&StockRecord::new("p-1", "Dune", Money::from_cents(350), 5))
        .await
        .unwrap();

    let attempts = (0..8).map(|_| {
        let storage = storage.clone();
        tokio::spawn(async move {
            let mut uow = storage.begin().await.unwrap();
            let outcome = uow
                .decrement_stock(&ProductId::new("p-1"), 1)
                .await
                .unwrap();
            uow.commit().await.unwrap();
            outcome
        })
    });

    let outcomes: Vec<_> = futures_util::future::join_all(attempts)
        .await
        .into_iter()
        .map(|r| r.unwrap())
        .collect();

    let succeeded = outcomes.iter().filter(|o| o.is_ok()).count();
    assert_eq!(succeeded, 5);

    let stock = committed_stock(&storage, "p-1").await;
    assert_eq!(stock.count_in_stock, 0);
    assert_eq!(stock.units_sold, 5);
}
