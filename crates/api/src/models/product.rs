//! Product catalog domain types.

use rust_decimal::Decimal;
use serde::Serialize;

use bazaar_core::ProductId;

/// One product listing entry: the fields shown on the catalog page.
///
/// `image` is the URL of the featured image, when the product has one.
#[derive(Debug, Clone, Serialize)]
pub struct ProductSummary {
    pub id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub image: Option<String>,
}

/// A full product record as shown on the detail page.
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    /// Sellable units currently available.
    pub stock: i32,
    /// All image URLs for the product, featured first.
    pub images: Vec<String>,
}
