//! Address book domain types.

use serde::{Deserialize, Serialize};

use bazaar_core::{AddressId, CountryId, UserId};

/// A shipping country.
#[derive(Debug, Clone, Serialize)]
pub struct Country {
    pub id: CountryId,
    pub name: String,
}

/// A user's shipping or billing address.
#[derive(Debug, Clone, Serialize)]
pub struct Address {
    pub id: AddressId,
    pub user_id: UserId,
    pub country_id: CountryId,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub city: String,
    pub address_line_1: String,
    pub address_line_2: Option<String>,
    /// Free-form label, e.g. "home" or "work".
    pub address_type: String,
}

/// Fields accepted when creating or updating an address.
#[derive(Debug, Clone, Deserialize)]
pub struct NewAddress {
    pub country_id: CountryId,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub city: String,
    pub address_line_1: String,
    pub address_line_2: Option<String>,
    pub address_type: String,
}
