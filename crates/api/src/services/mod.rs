//! Business logic services.
//!
//! - [`auth`] - signup/login with password hashing and bearer tokens
//! - [`checkout`] - the order checkout and stock-reservation flow

pub mod auth;
pub mod checkout;
