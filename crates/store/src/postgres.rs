use async_trait::async_trait;
use common::{
    Money, Order, OrderId, OrderLineItem, OrderNumber, ProductId, ShippingAddress, StockRecord,
    UserId,
};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};
use uuid::Uuid;

use crate::{
    Result, StoreError,
    store::{DecrementOutcome, StockConflict, StockUpdated, Storage, UnitOfWork},
};

const ORDER_COLUMNS: &str = "id, order_number, owner_id, line_items, shipping_address, \
     shipping_method, contact_phone, items_price_cents, shipping_price_cents, total_price_cents, \
     status, is_paid, paid_at, created_at, updated_at";

/// PostgreSQL-backed storage implementation.
#[derive(Clone)]
pub struct PostgresStorage {
    pool: PgPool,
}

impl PostgresStorage {
    /// Creates a new PostgreSQL storage.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects to `database_url` with a default pool.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Inserts or replaces a product's stock record.
    ///
    /// Catalog maintenance lives elsewhere; this exists for seeding.
    pub async fn upsert_stock(&self, record: &StockRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO products (id, name, price_cents, count_in_stock, units_sold)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                price_cents = EXCLUDED.price_cents,
                count_in_stock = EXCLUDED.count_in_stock,
                units_sold = EXCLUDED.units_sold
            "#,
        )
        .bind(record.product_id.as_str())
        .bind(&record.name)
        .bind(record.price.cents())
        .bind(to_i32(record.count_in_stock)?)
        .bind(to_i32(record.units_sold)?)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    fn row_to_stock(row: PgRow) -> Result<StockRecord> {
        Ok(StockRecord {
            product_id: ProductId::new(row.try_get::<String, _>("id")?),
            name: row.try_get("name")?,
            price: Money::from_cents(row.try_get("price_cents")?),
            count_in_stock: from_i32(row.try_get("count_in_stock")?)?,
            units_sold: from_i32(row.try_get("units_sold")?)?,
        })
    }

    fn row_to_order(row: PgRow) -> Result<Order> {
        let order_number: i64 = row.try_get("order_number")?;
        let order_number = u64::try_from(order_number)
            .map_err(|_| StoreError::Corrupt(format!("negative order number {order_number}")))?;
        let method: String = row.try_get("shipping_method")?;
        let status: String = row.try_get("status")?;

        Ok(Order {
            id: OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
            order_number: OrderNumber::from_raw(order_number),
            owner: UserId::from_uuid(row.try_get::<Uuid, _>("owner_id")?),
            line_items: row
                .try_get::<Json<Vec<OrderLineItem>>, _>("line_items")?
                .0,
            shipping_address: row
                .try_get::<Json<ShippingAddress>, _>("shipping_address")?
                .0,
            shipping_method: method
                .parse()
                .map_err(|e| StoreError::Corrupt(format!("{e}")))?,
            contact_phone: row.try_get("contact_phone")?,
            items_price: Money::from_cents(row.try_get("items_price_cents")?),
            shipping_price: Money::from_cents(row.try_get("shipping_price_cents")?),
            total_price: Money::from_cents(row.try_get("total_price_cents")?),
            status: status.parse().map_err(StoreError::Corrupt)?,
            is_paid: row.try_get("is_paid")?,
            paid_at: row.try_get("paid_at")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[async_trait]
impl Storage for PostgresStorage {
    type Unit = PostgresUnitOfWork;

    async fn begin(&self) -> Result<Self::Unit> {
        let tx = self.pool.begin().await.map_err(|e| match e {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                StoreError::Unavailable(e.to_string())
            }
            other => StoreError::Database(other),
        })?;
        Ok(PostgresUnitOfWork { tx })
    }
}

/// Unit of work backed by a PostgreSQL transaction.
pub struct PostgresUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl UnitOfWork for PostgresUnitOfWork {
    async fn get_stock(&mut self, product_id: &ProductId) -> Result<Option<StockRecord>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, price_cents, count_in_stock, units_sold
            FROM products
            WHERE id = $1
            "#,
        )
        .bind(product_id.as_str())
        .fetch_optional(&mut *self.tx)
        .await?;

        row.map(PostgresStorage::row_to_stock).transpose()
    }

    async fn decrement_stock(
        &mut self,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<DecrementOutcome> {
        let quantity = to_i32(quantity)?;
        let result = sqlx::query(
            r#"
            UPDATE products
            SET count_in_stock = count_in_stock - $2,
                units_sold = units_sold + $2
            WHERE id = $1 AND count_in_stock >= $2
            "#,
        )
        .bind(product_id.as_str())
        .bind(quantity)
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 1 {
            Ok(Ok(StockUpdated))
        } else {
            tracing::debug!(%product_id, quantity, "conditional stock decrement matched no row");
            Ok(Err(StockConflict))
        }
    }

    async fn find_most_recent_order(&mut self) -> Result<Option<Order>> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC, insertion_seq DESC LIMIT 1"
        );
        let row = sqlx::query(&sql).fetch_optional(&mut *self.tx).await?;

        row.map(PostgresStorage::row_to_order).transpose()
    }

    async fn insert_order(&mut self, order: Order) -> Result<Order> {
        let order_number = i64::try_from(order.order_number.as_u64()).map_err(|_| {
            StoreError::Corrupt(format!("order number {} out of range", order.order_number))
        })?;

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, order_number, owner_id, line_items, shipping_address, shipping_method,
                contact_phone, items_price_cents, shipping_price_cents, total_price_cents,
                status, is_paid, paid_at, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order_number)
        .bind(order.owner.as_uuid())
        .bind(Json(&order.line_items))
        .bind(Json(&order.shipping_address))
        .bind(order.shipping_method.as_str())
        .bind(order.contact_phone.as_deref())
        .bind(order.items_price.cents())
        .bind(order.shipping_price.cents())
        .bind(order.total_price.cents())
        .bind(order.status.as_str())
        .bind(order.is_paid)
        .bind(order.paid_at)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.constraint() == Some("unique_order_number")
            {
                tracing::warn!(order_number = %order.order_number, "order number already taken");
                return StoreError::DuplicateOrderNumber(order.order_number);
            }
            StoreError::Database(e)
        })?;

        Ok(order)
    }

    async fn commit(self) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}

fn to_i32(value: u32) -> Result<i32> {
    i32::try_from(value).map_err(|_| StoreError::Corrupt(format!("{value} exceeds INTEGER range")))
}

fn from_i32(value: i32) -> Result<u32> {
    u32::try_from(value).map_err(|_| StoreError::Corrupt(format!("negative counter {value}")))
}
