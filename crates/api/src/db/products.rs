//! Product catalog repository.

use rust_decimal::Decimal;
use sqlx::PgPool;

use bazaar_core::ProductId;

use super::RepositoryError;
use crate::models::product::{Product, ProductSummary};

/// Internal row type for listing queries.
#[derive(Debug, sqlx::FromRow)]
struct ProductSummaryRow {
    id: i32,
    name: String,
    price: Decimal,
    image: Option<String>,
}

impl From<ProductSummaryRow> for ProductSummary {
    fn from(row: ProductSummaryRow) -> Self {
        Self {
            id: ProductId::new(row.id),
            name: row.name,
            price: row.price,
            image: row.image,
        }
    }
}

/// Internal row type for the detail query.
#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i32,
    name: String,
    description: String,
    price: Decimal,
    stock: i32,
}

/// Repository for product catalog reads.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all products with their featured image URL.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<ProductSummary>, RepositoryError> {
        let rows: Vec<ProductSummaryRow> = sqlx::query_as(
            r"
            SELECT DISTINCT ON (p.id) p.id, p.name, p.price, i.url AS image
            FROM products p
            LEFT JOIN images i ON i.product_id = p.id AND i.is_featured
            ORDER BY p.id, i.id
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(ProductSummary::from).collect())
    }

    /// Get a product with all of its image URLs, featured first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row: Option<ProductRow> = sqlx::query_as(
            r"
            SELECT id, name, description, price, stock
            FROM products
            WHERE id = $1
            ",
        )
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let images: Vec<String> = sqlx::query_scalar(
            r"
            SELECT url
            FROM images
            WHERE product_id = $1
            ORDER BY is_featured DESC, id
            ",
        )
        .bind(id.as_i32())
        .fetch_all(self.pool)
        .await?;

        Ok(Some(Product {
            id: ProductId::new(row.id),
            name: row.name,
            description: row.description,
            price: row.price,
            stock: row.stock,
            images,
        }))
    }
}
