use async_trait::async_trait;
use common::{CustomerId, Money, OrderId, ProductId};
use domain::{FulfillmentStatus, Order};
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::{
    Product, Result, StoreError,
    store::{OrderNumberAllocator, OrderStore, ProductStore},
};

/// PostgreSQL-backed store implementation.
///
/// Stock reservation and order-number allocation lean on the database's
/// own atomicity: a conditional `UPDATE` with a stock floor and a
/// single-row counter `UPDATE .. RETURNING`. No value is ever read,
/// modified in the application, and written back.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_product(row: PgRow) -> Result<Product> {
        let stock: i64 = row.try_get("stock")?;
        Ok(Product {
            id: ProductId::new(row.try_get::<String, _>("id")?),
            name: row.try_get("name")?,
            unit_price: Money::from_cents(row.try_get("unit_price_cents")?),
            stock: u32::try_from(stock).map_err(|_| StoreError::OutOfRange {
                column: "products.stock",
                value: stock,
            })?,
        })
    }

    fn row_to_order(row: PgRow) -> Result<Order> {
        let document: serde_json::Value = row.try_get("document")?;
        Ok(serde_json::from_value(document)?)
    }
}

#[async_trait]
impl ProductStore for PostgresStore {
    async fn get_product(&self, product_id: &ProductId) -> Result<Option<Product>> {
        let row = sqlx::query(
            "SELECT id, name, unit_price_cents, stock FROM products WHERE id = $1",
        )
        .bind(product_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_product).transpose()
    }

    async fn reserve_stock(&self, product_id: &ProductId, quantity: u32) -> Result<()> {
        // The stock floor lives in the WHERE clause, so check and decrement
        // are one statement and never go below zero.
        let result = sqlx::query(
            "UPDATE products SET stock = stock - $2 WHERE id = $1 AND stock >= $2",
        )
        .bind(product_id.as_str())
        .bind(i64::from(quantity))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            return Ok(());
        }

        // Zero rows: either the product is missing or stock was short.
        let exists: Option<i64> = sqlx::query_scalar("SELECT stock FROM products WHERE id = $1")
            .bind(product_id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        match exists {
            Some(available) => {
                tracing::debug!(%product_id, requested = quantity, available, "stock reservation refused");
                Err(StoreError::InsufficientStock {
                    product_id: product_id.to_string(),
                    requested: quantity,
                })
            }
            None => Err(StoreError::ProductNotFound {
                product_id: product_id.to_string(),
            }),
        }
    }

    async fn release_stock(&self, product_id: &ProductId, quantity: u32) -> Result<()> {
        let result = sqlx::query("UPDATE products SET stock = stock + $2 WHERE id = $1")
            .bind(product_id.as_str())
            .bind(i64::from(quantity))
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::ProductNotFound {
                product_id: product_id.to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl OrderStore for PostgresStore {
    async fn insert_order(&self, order: &Order) -> Result<()> {
        let document = serde_json::to_value(order)?;

        sqlx::query(
            r#"
            INSERT INTO orders (id, order_number, customer_id, fulfillment_status, payment_status, active, created_at, updated_at, document)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(order.id().as_uuid())
        .bind(order.order_number().as_str())
        .bind(order.customer_id().as_uuid())
        .bind(order.fulfillment_status().as_str())
        .bind(order.payment_status().as_str())
        .bind(order.is_active())
        .bind(order.created_at())
        .bind(order.updated_at())
        .bind(document)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query("SELECT document FROM orders WHERE id = $1")
            .bind(order_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_order).transpose()
    }

    async fn orders_for_customer(&self, customer_id: CustomerId) -> Result<Vec<Order>> {
        let rows = sqlx::query(
            "SELECT document FROM orders WHERE customer_id = $1 ORDER BY created_at ASC",
        )
        .bind(customer_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_order).collect()
    }

    async fn update_order(&self, order: &Order, expected_status: FulfillmentStatus) -> Result<()> {
        let document = serde_json::to_value(order)?;

        // The status guard in the WHERE clause makes this a compare-and-set:
        // of two racing writers, one matches zero rows.
        let result = sqlx::query(
            r#"
            UPDATE orders
            SET fulfillment_status = $2, payment_status = $3, active = $4, updated_at = $5, document = $6
            WHERE id = $1 AND fulfillment_status = $7
            "#,
        )
        .bind(order.id().as_uuid())
        .bind(order.fulfillment_status().as_str())
        .bind(order.payment_status().as_str())
        .bind(order.is_active())
        .bind(order.updated_at())
        .bind(document)
        .bind(expected_status.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            return Ok(());
        }

        // Zero rows: either the order is gone or another writer got there
        // first.
        let exists: Option<bool> = sqlx::query_scalar("SELECT TRUE FROM orders WHERE id = $1")
            .bind(order.id().as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        match exists {
            Some(_) => Err(StoreError::ConcurrencyConflict(order.id())),
            None => Err(StoreError::OrderNotFound(order.id())),
        }
    }

    async fn delete_order(&self, order_id: OrderId) -> Result<()> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(order_id.as_uuid())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::OrderNotFound(order_id));
        }
        Ok(())
    }
}

#[async_trait]
impl OrderNumberAllocator for PostgresStore {
    async fn next_order_number(&self) -> Result<u64> {
        // Single-row counter; the row lock serializes concurrent callers.
        let value: i64 =
            sqlx::query_scalar("UPDATE order_number_seq SET value = value + 1 RETURNING value")
                .fetch_one(&self.pool)
                .await?;

        u64::try_from(value).map_err(|_| StoreError::OutOfRange {
            column: "order_number_seq.value",
            value,
        })
    }
}

/// Seeds or replaces a catalog product. Test and demo helper; the catalog
/// service owns product writes in production.
pub async fn upsert_product(pool: &PgPool, product: &Product) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO products (id, name, unit_price_cents, stock)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (id) DO UPDATE
        SET name = EXCLUDED.name, unit_price_cents = EXCLUDED.unit_price_cents, stock = EXCLUDED.stock
        "#,
    )
    .bind(product.id.as_str())
    .bind(&product.name)
    .bind(product.unit_price.cents())
    .bind(i64::from(product.stock))
    .execute(pool)
    .await?;

    Ok(())
}
