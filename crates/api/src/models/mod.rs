//! Domain models for the Bazaar backend.
//!
//! These types represent validated domain objects separate from database
//! row types. Repositories convert rows into these before handing them to
//! services and route handlers.

pub mod address;
pub mod order;
pub mod product;
pub mod user;

pub use address::{Address, Country, NewAddress};
pub use order::{LineItem, Order, OrderDetail, OrderHeader, OrderItemDetail, OrderItemSummary, OrderSummary};
pub use product::{Product, ProductSummary};
pub use user::User;
