//! Order domain types.
//!
//! An [`Order`] and its [`LineItem`]s are created together by the checkout
//! processor and are immutable once committed. The summary/detail view types
//! back the order history endpoints.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use bazaar_core::{AddressId, OrderId, ProductId, UserId};

/// The order header row, without its line items.
#[derive(Debug, Clone, Serialize)]
pub struct OrderHeader {
    /// Internal row ID.
    pub id: OrderId,
    /// Opaque public identifier, exposed in API responses.
    pub uuid: Uuid,
    pub user_id: UserId,
    pub address_id: AddressId,
    /// Order total as submitted at checkout.
    pub total: Decimal,
    pub tax: Decimal,
    pub created_at: DateTime<Utc>,
}

/// One product+quantity entry within an order.
#[derive(Debug, Clone, Serialize)]
pub struct LineItem {
    pub product_id: ProductId,
    pub qty: i32,
    /// Unit price at order time multiplied by `qty`.
    pub line_item_total: Decimal,
}

/// A committed order aggregate: header plus all line items.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    #[serde(flatten)]
    pub header: OrderHeader,
    pub items: Vec<LineItem>,
}

/// Line item fields shown on the order history list.
#[derive(Debug, Clone, Serialize)]
pub struct OrderItemSummary {
    pub product_id: ProductId,
    pub name: String,
    pub featured_image: Option<String>,
}

/// Line item fields shown on the order detail page.
///
/// `is_available` and `price` reflect the product's *current* catalog state;
/// `line_item_total` is the amount captured at order time.
#[derive(Debug, Clone, Serialize)]
pub struct OrderItemDetail {
    pub product_id: ProductId,
    pub name: String,
    pub featured_image: Option<String>,
    pub is_available: bool,
    pub price: Decimal,
    pub qty: i32,
    pub line_item_total: Decimal,
}

/// An order as shown on the history list.
#[derive(Debug, Clone, Serialize)]
pub struct OrderSummary {
    pub uuid: Uuid,
    pub total: Decimal,
    pub tax: Decimal,
    pub created_at: DateTime<Utc>,
    pub address_id: AddressId,
    pub items: Vec<OrderItemSummary>,
}

/// An order as shown on the detail page.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetail {
    pub uuid: Uuid,
    pub total: Decimal,
    pub tax: Decimal,
    pub created_at: DateTime<Utc>,
    pub address_id: AddressId,
    pub items: Vec<OrderItemDetail>,
}
