use std::collections::HashMap;

use async_trait::async_trait;
use common::{
    Buyer, BuyerId, Money, NewOrder, Order, OrderId, OrderLine, OrderStatus, Product, ProductId,
    UnknownStatus,
};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Row, postgres::PgRow};

use crate::{
    Result, StoreError,
    store::{DecrementOutcome, InventoryStore, StoreTransaction},
};

/// Advisory lock key serialising order-number allocation.
const ORDER_NUMBER_LOCK_KEY: i64 = 0x5045_445f_4e55_4d;

const ORDER_COLUMNS: &str = "id, buyer_id, order_number, created_at, status, total, comment, delivery_address, active";

/// PostgreSQL-backed inventory store implementation.
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
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Registers a buyer and returns it with its assigned id.
    pub async fn insert_buyer(&self, name: &str, email: &str, active: bool) -> Result<Buyer> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO buyers (name, email, active) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(name)
        .bind(email)
        .bind(active)
        .fetch_one(&self.pool)
        .await?;

        Ok(Buyer {
            id: BuyerId::new(id),
            name: name.to_string(),
            email: email.to_string(),
            active,
        })
    }

    /// Adds an active product to the catalog and returns it with its assigned id.
    pub async fn insert_product(&self, name: &str, price: Money, stock: u32) -> Result<Product> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO products (name, price, stock) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(name)
        .bind(price.to_decimal())
        .bind(to_db_count(stock)?)
        .fetch_one(&self.pool)
        .await?;

        Ok(Product {
            id: ProductId::new(id),
            name: name.to_string(),
            price,
            stock,
            active: true,
        })
    }

    fn row_to_product(row: PgRow) -> Result<Product> {
        Ok(Product {
            id: ProductId::new(row.try_get("id")?),
            name: row.try_get("name")?,
            price: money_column(&row, "price")?,
            stock: count_column(&row, "stock")?,
            active: row.try_get("active")?,
        })
    }

    fn row_to_order(row: PgRow) -> Result<Order> {
        let status: String = row.try_get("status")?;
        let status: OrderStatus = status.parse().map_err(|e: UnknownStatus| {
            StoreError::InvalidData {
                reason: e.to_string(),
            }
        })?;

        Ok(Order {
            id: OrderId::new(row.try_get("id")?),
            buyer_id: BuyerId::new(row.try_get("buyer_id")?),
            order_number: row.try_get("order_number")?,
            created_at: row.try_get("created_at")?,
            status,
            total: money_column(&row, "total")?,
            comment: row.try_get("comment")?,
            delivery_address: row.try_get("delivery_address")?,
            active: row.try_get("active")?,
            lines: Vec::new(),
        })
    }

    fn row_to_line(row: PgRow) -> Result<OrderLine> {
        Ok(OrderLine {
            id: row.try_get("id")?,
            order_id: OrderId::new(row.try_get("order_id")?),
            product_id: ProductId::new(row.try_get("product_id")?),
            quantity: count_column(&row, "quantity")?,
            unit_price: money_column(&row, "unit_price")?,
            subtotal: money_column(&row, "subtotal")?,
        })
    }

    /// Maps order rows and attaches their lines in position order.
    async fn load_orders(&self, rows: Vec<PgRow>) -> Result<Vec<Order>> {
        let mut orders = rows
            .into_iter()
            .map(Self::row_to_order)
            .collect::<Result<Vec<_>>>()?;
        if orders.is_empty() {
            return Ok(orders);
        }

        let ids: Vec<i64> = orders.iter().map(|o| o.id.as_i64()).collect();
        let line_rows = sqlx::query(
            r#"
            SELECT id, order_id, product_id, quantity, unit_price, subtotal
            FROM order_lines
            WHERE order_id = ANY($1)
            ORDER BY order_id ASC, position ASC
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_order: HashMap<OrderId, Vec<OrderLine>> = HashMap::new();
        for row in line_rows {
            let line = Self::row_to_line(row)?;
            by_order.entry(line.order_id).or_default().push(line);
        }
        for order in &mut orders {
            order.lines = by_order.remove(&order.id).unwrap_or_default();
        }

        Ok(orders)
    }
}

#[async_trait]
impl InventoryStore for PostgresStore {
    async fn get_buyer(&self, id: BuyerId) -> Result<Option<Buyer>> {
        let row: Option<PgRow> =
            sqlx::query("SELECT id, name, email, active FROM buyers WHERE id = $1")
                .bind(id.as_i64())
                .fetch_optional(&self.pool)
                .await?;

        match row {
            Some(row) => Ok(Some(Buyer {
                id: BuyerId::new(row.try_get("id")?),
                name: row.try_get("name")?,
                email: row.try_get("email")?,
                active: row.try_get("active")?,
            })),
            None => Ok(None),
        }
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        sqlx::query("SELECT id, name, price, stock, active FROM products WHERE id = $1")
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await?
            .map(Self::row_to_product)
            .transpose()
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        let rows = sqlx::query(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
            .bind(id.as_i64())
            .fetch_all(&self.pool)
            .await?;

        Ok(self.load_orders(rows).await?.pop())
    }

    async fn get_order_by_number(&self, order_number: &str) -> Result<Option<Order>> {
        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE order_number = $1"
        ))
        .bind(order_number)
        .fetch_all(&self.pool)
        .await?;

        Ok(self.load_orders(rows).await?.pop())
    }

    async fn orders_for_buyer(&self, buyer_id: BuyerId) -> Result<Vec<Order>> {
        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE buyer_id = $1 AND active ORDER BY id ASC"
        ))
        .bind(buyer_id.as_i64())
        .fetch_all(&self.pool)
        .await?;

        self.load_orders(rows).await
    }

    async fn deactivate_order(&self, id: OrderId) -> Result<bool> {
        let result = sqlx::query("UPDATE orders SET active = FALSE WHERE id = $1")
            .bind(id.as_i64())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn begin(&self) -> Result<Box<dyn StoreTransaction>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PostgresTransaction { tx }))
    }
}

/// Unit of work backed by a database transaction.
///
/// Dropping it without committing rolls the transaction back.
pub struct PostgresTransaction {
    tx: sqlx::Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTransaction for PostgresTransaction {
    async fn get_product(&mut self, id: ProductId) -> Result<Option<Product>> {
        sqlx::query("SELECT id, name, price, stock, active FROM products WHERE id = $1")
            .bind(id.as_i64())
            .fetch_optional(&mut *self.tx)
            .await?
            .map(PostgresStore::row_to_product)
            .transpose()
    }

    async fn last_order_number(&mut self) -> Result<Option<String>> {
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(ORDER_NUMBER_LOCK_KEY)
            .execute(&mut *self.tx)
            .await
            .map_err(classify)?;

        let number: Option<String> = sqlx::query_scalar(
            r#"
            SELECT order_number
            FROM orders
            ORDER BY LENGTH(order_number) DESC, order_number DESC
            LIMIT 1
            "#,
        )
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(number)
    }

    async fn save_order(&mut self, order: NewOrder) -> Result<Order> {
        let order_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO orders (buyer_id, order_number, created_at, status, total, comment, delivery_address)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(order.buyer_id.as_i64())
        .bind(&order.order_number)
        .bind(order.created_at)
        .bind(order.status.as_str())
        .bind(order.total.to_decimal())
        .bind(&order.comment)
        .bind(&order.delivery_address)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(classify)?;

        let mut line_ids = Vec::with_capacity(order.lines.len());
        for (position, line) in order.lines.iter().enumerate() {
            let line_id: i64 = sqlx::query_scalar(
                r#"
                INSERT INTO order_lines (order_id, position, product_id, quantity, unit_price, subtotal)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING id
                "#,
            )
            .bind(order_id)
            .bind(position as i32)
            .bind(line.product_id.as_i64())
            .bind(to_db_count(line.quantity)?)
            .bind(line.unit_price.to_decimal())
            .bind(line.subtotal.to_decimal())
            .fetch_one(&mut *self.tx)
            .await
            .map_err(classify)?;
            line_ids.push(line_id);
        }

        Ok(order.into_order(OrderId::new(order_id), line_ids))
    }

    async fn decrement_stock(&mut self, id: ProductId, amount: u32) -> Result<DecrementOutcome> {
        let amount = to_db_count(amount)?;

        let remaining: Option<i32> = sqlx::query_scalar(
            r#"
            UPDATE products
            SET stock = stock - $2
            WHERE id = $1 AND stock >= $2
            RETURNING stock
            "#,
        )
        .bind(id.as_i64())
        .bind(amount)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(classify)?;

        if let Some(remaining) = remaining {
            return Ok(DecrementOutcome::Applied {
                remaining: from_db_count(remaining)?,
            });
        }

        let available: Option<i32> = sqlx::query_scalar("SELECT stock FROM products WHERE id = $1")
            .bind(id.as_i64())
            .fetch_optional(&mut *self.tx)
            .await?;

        let available = available.map(from_db_count).transpose()?.unwrap_or(0);
        tracing::debug!(%id, requested = amount, available, "conditional decrement refused");
        Ok(DecrementOutcome::Insufficient { available })
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit().await.map_err(classify)
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}

/// Maps unique violations, serialization failures and deadlocks to `Conflict`.
fn classify(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = e
        && matches!(db_err.code().as_deref(), Some("23505" | "40001" | "40P01"))
    {
        tracing::debug!(code = ?db_err.code(), "database conflict");
        return StoreError::Conflict {
            reason: db_err.message().to_string(),
        };
    }
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.code().as_deref() == Some("23514")
    {
        return StoreError::InvalidData {
            reason: db_err.message().to_string(),
        };
    }
    StoreError::Database(e)
}

fn money_column(row: &PgRow, column: &str) -> Result<Money> {
    let amount: Decimal = row.try_get(column)?;
    Money::try_from_decimal(amount).map_err(|e| StoreError::InvalidData {
        reason: format!("{column}: {e}"),
    })
}

fn count_column(row: &PgRow, column: &str) -> Result<u32> {
    from_db_count(row.try_get(column)?)
}

fn from_db_count(value: i32) -> Result<u32> {
    u32::try_from(value).map_err(|_| StoreError::InvalidData {
        reason: format!("negative count {value}"),
    })
}

fn to_db_count(value: u32) -> Result<i32> {
    i32::try_from(value).map_err(|_| StoreError::InvalidData {
        reason: format!("count {value} exceeds column range"),
    })
}
