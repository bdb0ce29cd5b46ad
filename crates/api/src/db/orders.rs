//! Order repository and the transactional checkout store.
//!
//! [`PgCheckoutStore`] is the production implementation of the checkout
//! ports: one `sqlx` transaction per checkout, row locks taken with
//! `SELECT ... FOR UPDATE`, and a guarded decrement so committed stock can
//! never go negative. Dropping the transaction without committing rolls
//! every staged write back.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use bazaar_core::{AddressId, OrderId, ProductId, UserId};

use super::RepositoryError;
use crate::models::order::{
    OrderDetail, OrderHeader, OrderItemDetail, OrderItemSummary, OrderSummary,
};
use crate::services::checkout::{CheckoutStore, CheckoutTx, StockLine};

/// Internal row type for order header queries.
#[derive(Debug, sqlx::FromRow)]
struct OrderHeaderRow {
    id: i32,
    uuid: Uuid,
    user_id: i32,
    address_id: i32,
    total: Decimal,
    tax: Decimal,
    created_at: DateTime<Utc>,
}

impl From<OrderHeaderRow> for OrderHeader {
    fn from(row: OrderHeaderRow) -> Self {
        Self {
            id: OrderId::new(row.id),
            uuid: row.uuid,
            user_id: UserId::new(row.user_id),
            address_id: AddressId::new(row.address_id),
            total: row.total,
            tax: row.tax,
            created_at: row.created_at,
        }
    }
}

/// Internal row type for history list items.
#[derive(Debug, sqlx::FromRow)]
struct ItemSummaryRow {
    product_id: i32,
    name: String,
    featured_image: Option<String>,
}

/// Internal row type for detail items.
#[derive(Debug, sqlx::FromRow)]
struct ItemDetailRow {
    product_id: i32,
    name: String,
    featured_image: Option<String>,
    stock: i32,
    price: Decimal,
    qty: i32,
    line_item_total: Decimal,
}

impl From<ItemDetailRow> for OrderItemDetail {
    fn from(row: ItemDetailRow) -> Self {
        Self {
            product_id: ProductId::new(row.product_id),
            name: row.name,
            featured_image: row.featured_image,
            is_available: row.stock > 0,
            price: row.price,
            qty: row.qty,
            line_item_total: row.line_item_total,
        }
    }
}

const ORDER_COLUMNS: &str = "id, uuid, user_id, address_id, total, tax, created_at";

// =============================================================================
// Order history reads
// =============================================================================

/// Repository for reading committed orders.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List a user's orders, newest first, with summary line items.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<OrderSummary>, RepositoryError> {
        let headers: Vec<OrderHeaderRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC, id DESC"
        ))
        .bind(user_id.as_i32())
        .fetch_all(self.pool)
        .await?;

        let mut summaries = Vec::with_capacity(headers.len());
        for header in headers {
            let items = self.items_summary(OrderId::new(header.id)).await?;
            summaries.push(OrderSummary {
                uuid: header.uuid,
                total: header.total,
                tax: header.tax,
                created_at: header.created_at,
                address_id: AddressId::new(header.address_id),
                items,
            });
        }

        Ok(summaries)
    }

    /// Get one of a user's orders by its public UUID, with detailed items.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_for_user(
        &self,
        user_id: UserId,
        order_uuid: Uuid,
    ) -> Result<Option<OrderDetail>, RepositoryError> {
        let header: Option<OrderHeaderRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE uuid = $1 AND user_id = $2"
        ))
        .bind(order_uuid)
        .bind(user_id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        let Some(header) = header else {
            return Ok(None);
        };

        let rows: Vec<ItemDetailRow> = sqlx::query_as(
            r"
            SELECT DISTINCT ON (oi.id)
                   oi.product_id, p.name, i.url AS featured_image,
                   p.stock, p.price, oi.qty, oi.line_item_total
            FROM order_items oi
            JOIN products p ON p.id = oi.product_id
            LEFT JOIN images i ON i.product_id = p.id AND i.is_featured
            WHERE oi.order_id = $1
            ORDER BY oi.id, i.id
            ",
        )
        .bind(header.id)
        .fetch_all(self.pool)
        .await?;

        Ok(Some(OrderDetail {
            uuid: header.uuid,
            total: header.total,
            tax: header.tax,
            created_at: header.created_at,
            address_id: AddressId::new(header.address_id),
            items: rows.into_iter().map(OrderItemDetail::from).collect(),
        }))
    }

    /// Summary line items for one order.
    async fn items_summary(
        &self,
        order_id: OrderId,
    ) -> Result<Vec<OrderItemSummary>, RepositoryError> {
        let rows: Vec<ItemSummaryRow> = sqlx::query_as(
            r"
            SELECT DISTINCT ON (oi.id)
                   oi.product_id, p.name, i.url AS featured_image
            FROM order_items oi
            JOIN products p ON p.id = oi.product_id
            LEFT JOIN images i ON i.product_id = p.id AND i.is_featured
            WHERE oi.order_id = $1
            ORDER BY oi.id, i.id
            ",
        )
        .bind(order_id.as_i32())
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| OrderItemSummary {
                product_id: ProductId::new(row.product_id),
                name: row.name,
                featured_image: row.featured_image,
            })
            .collect())
    }
}

// =============================================================================
// Transactional checkout store
// =============================================================================

/// `PostgreSQL`-backed implementation of the checkout ports.
#[derive(Clone)]
pub struct PgCheckoutStore {
    pool: PgPool,
}

impl PgCheckoutStore {
    /// Create a new checkout store over the given pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl CheckoutStore for PgCheckoutStore {
    type Tx = PgCheckoutTx;

    async fn begin(&self) -> Result<PgCheckoutTx, RepositoryError> {
        Ok(PgCheckoutTx {
            tx: self.pool.begin().await?,
        })
    }
}

/// One in-flight checkout transaction.
///
/// `sqlx` rolls the transaction back when this is dropped without an
/// explicit commit.
pub struct PgCheckoutTx {
    tx: Transaction<'static, Postgres>,
}

impl CheckoutTx for PgCheckoutTx {
    async fn insert_order(
        &mut self,
        user_id: UserId,
        address_id: AddressId,
        total: Decimal,
        tax: Decimal,
    ) -> Result<OrderHeader, RepositoryError> {
        let row: OrderHeaderRow = sqlx::query_as(&format!(
            "INSERT INTO orders (user_id, address_id, total, tax) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(user_id.as_i32())
        .bind(address_id.as_i32())
        .bind(total)
        .bind(tax)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(OrderHeader::from(row))
    }

    async fn lock_stock(
        &mut self,
        product_id: ProductId,
    ) -> Result<Option<StockLine>, RepositoryError> {
        #[derive(sqlx::FromRow)]
        struct StockRow {
            price: Decimal,
            stock: i32,
        }

        // FOR UPDATE holds the row lock until commit or rollback, so the
        // check-and-decrement below is atomic per product row across
        // concurrent checkouts.
        let row: Option<StockRow> =
            sqlx::query_as("SELECT price, stock FROM products WHERE id = $1 FOR UPDATE")
                .bind(product_id.as_i32())
                .fetch_optional(&mut *self.tx)
                .await?;

        Ok(row.map(|row| StockLine {
            unit_price: row.price,
            stock: row.stock,
        }))
    }

    async fn insert_line_item(
        &mut self,
        order_id: OrderId,
        product_id: ProductId,
        qty: i32,
        line_total: Decimal,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO order_items (order_id, product_id, qty, line_item_total) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(order_id.as_i32())
        .bind(product_id.as_i32())
        .bind(qty)
        .bind(line_total)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn decrement_stock(
        &mut self,
        product_id: ProductId,
        qty: i32,
    ) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("UPDATE products SET stock = stock - $2 WHERE id = $1 AND stock >= $2")
                .bind(product_id.as_i32())
                .bind(qty)
                .execute(&mut *self.tx)
                .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::Conflict(format!(
                "stock underflow for product {product_id}"
            )));
        }

        Ok(())
    }

    async fn commit(self) -> Result<(), RepositoryError> {
        self.tx.commit().await?;
        Ok(())
    }
}
