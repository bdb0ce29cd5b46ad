//! HTTP route handlers for the API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                  - Liveness check
//! GET  /health/ready            - Readiness check (verifies database)
//!
//! # Auth
//! POST /signup                  - Create an account, returns a bearer token
//! POST /login                   - Exchange credentials for a bearer token
//!
//! # Products
//! GET  /products                - Product listing (name, price, featured image)
//! GET  /products/{id}           - Product detail (images, description, stock)
//!
//! # Countries
//! GET  /countries               - Shipping countries for the address form
//!
//! # Addresses (requires auth)
//! GET  /addresses               - List own addresses
//! POST /addresses               - Add an address
//! PUT  /addresses/{id}          - Update an address
//! DELETE /addresses/{id}        - Delete an address
//!
//! # Orders (requires auth)
//! POST /orders/checkout         - Create an order, reserving stock
//! GET  /orders                  - Order history
//! GET  /orders/{uuid}           - Order detail
//! ```

pub mod addresses;
pub mod auth;
pub mod countries;
pub mod orders;
pub mod products;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
}

/// Create the address routes router.
pub fn address_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(addresses::index).post(addresses::create))
        .route(
            "/{id}",
            axum::routing::put(addresses::update).delete(addresses::delete),
        )
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index))
        .route("/checkout", post(orders::checkout))
        .route("/{uuid}", get(orders::show))
}

/// Create all routes for the API.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Auth
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        // Catalog
        .nest("/products", product_routes())
        .route("/countries", get(countries::index))
        // Address book
        .nest("/addresses", address_routes())
        // Orders
        .nest("/orders", order_routes())
}
