//! Order route handlers: checkout and order history.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use bazaar_core::{AddressId, ProductId};

use crate::db::{AddressRepository, OrderRepository};
use crate::error::{AppError, Result};
use crate::middleware::CurrentUser;
use crate::models::order::{Order, OrderDetail, OrderSummary};
use crate::services::checkout::RequestedItem;
use crate::state::AppState;

/// One requested line in the checkout body.
#[derive(Debug, Deserialize)]
pub struct CheckoutItem {
    pub product_id: ProductId,
    pub qty: i32,
}

/// Checkout request body.
///
/// `total` and `tax` are the amounts the client displayed at checkout; they
/// are recorded on the order header. Line item totals are always computed
/// server-side from catalog prices.
#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub address_id: AddressId,
    pub total: Decimal,
    pub tax: Decimal,
    pub items: Vec<CheckoutItem>,
}

/// Handle checkout.
///
/// Creates the order aggregate and decrements stock, all-or-nothing. The
/// shipping address must belong to the authenticated user; that ownership
/// check happens here, before the checkout processor runs.
pub async fn checkout(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(body): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<Order>)> {
    AddressRepository::new(state.pool())
        .get_owned(user.id, body.address_id)
        .await?
        .ok_or_else(|| AppError::BadRequest(format!("unknown address {}", body.address_id)))?;

    let items: Vec<RequestedItem> = body
        .items
        .iter()
        .map(|item| RequestedItem {
            product_id: item.product_id,
            qty: item.qty,
        })
        .collect();

    let order = state
        .checkout()
        .checkout(user.id, body.address_id, body.total, body.tax, &items)
        .await?;

    tracing::info!(
        user_id = %user.id,
        order_uuid = %order.header.uuid,
        items = order.items.len(),
        "order placed"
    );

    Ok((StatusCode::CREATED, Json(order)))
}

/// List the authenticated user's orders, newest first.
pub async fn index(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<OrderSummary>>> {
    let orders = OrderRepository::new(state.pool())
        .list_for_user(user.id)
        .await?;

    Ok(Json(orders))
}

/// Show one of the authenticated user's orders.
pub async fn show(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(uuid): Path<Uuid>,
) -> Result<Json<OrderDetail>> {
    let order = OrderRepository::new(state.pool())
        .get_for_user(user.id, uuid)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {uuid}")))?;

    Ok(Json(order))
}
