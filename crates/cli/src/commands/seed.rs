//! Seed the database with sample data for local development.
//!
//! Inserts a handful of countries, products, and product images. The command
//! is idempotent: it does nothing if the catalog already has products.
//!
//! # Usage
//!
//! ```bash
//! bazaar-cli seed
//! ```

use sqlx::PgPool;
use tracing::info;

/// Errors that can occur while seeding.
#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Seed countries, products, and images.
///
/// # Errors
///
/// Returns `SeedError` if the database URL is missing or a query fails.
pub async fn run() -> Result<(), SeedError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("BAZAAR_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map_err(|_| SeedError::MissingEnvVar("BAZAAR_DATABASE_URL"))?;

    let pool = PgPool::connect(&database_url).await?;

    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
        .fetch_one(&pool)
        .await?;
    if existing > 0 {
        info!(products = existing, "catalog already seeded, nothing to do");
        return Ok(());
    }

    sqlx::query(
        "INSERT INTO countries (name) VALUES
            ('United States'),
            ('Canada'),
            ('United Kingdom'),
            ('Germany'),
            ('Japan')",
    )
    .execute(&pool)
    .await?;
    info!("seeded countries");

    sqlx::query(
        "INSERT INTO products (name, description, price, stock) VALUES
            ('Walnut Desk Organizer', 'Five-compartment organizer milled from solid walnut.', 48.00, 25),
            ('Ceramic Pour-Over Set', 'Dripper and carafe in matte stoneware, for two cups.', 36.50, 40),
            ('Linen Throw Blanket', 'Stonewashed linen, 130x170cm.', 89.00, 12),
            ('Brass Pocket Knife', 'Slim single-blade knife with brass scales.', 62.00, 18),
            ('Canvas Weekender Bag', 'Waxed canvas with leather handles and a brass zip.', 120.00, 8)",
    )
    .execute(&pool)
    .await?;
    info!("seeded products");

    sqlx::query(
        "INSERT INTO images (product_id, url, is_featured)
         SELECT p.id, 'https://cdn.bazaar.test/products/' || p.id || '/main.jpg', TRUE
         FROM products p",
    )
    .execute(&pool)
    .await?;
    sqlx::query(
        "INSERT INTO images (product_id, url, is_featured)
         SELECT p.id, 'https://cdn.bazaar.test/products/' || p.id || '/alt-1.jpg', FALSE
         FROM products p",
    )
    .execute(&pool)
    .await?;
    info!("seeded product images");

    Ok(())
}
