//! Address book repository.
//!
//! Every query filters on `user_id`, so ownership is enforced at the SQL
//! level: a user can only ever see or touch their own rows.

use sqlx::PgPool;

use bazaar_core::{AddressId, CountryId, UserId};

use super::RepositoryError;
use crate::models::address::{Address, NewAddress};

/// Internal row type for address queries.
#[derive(Debug, sqlx::FromRow)]
struct AddressRow {
    id: i32,
    user_id: i32,
    country_id: i32,
    first_name: String,
    last_name: String,
    phone: String,
    city: String,
    address_line_1: String,
    address_line_2: Option<String>,
    address_type: String,
}

impl From<AddressRow> for Address {
    fn from(row: AddressRow) -> Self {
        Self {
            id: AddressId::new(row.id),
            user_id: UserId::new(row.user_id),
            country_id: CountryId::new(row.country_id),
            first_name: row.first_name,
            last_name: row.last_name,
            phone: row.phone,
            city: row.city,
            address_line_1: row.address_line_1,
            address_line_2: row.address_line_2,
            address_type: row.address_type,
        }
    }
}

const ADDRESS_COLUMNS: &str = "id, user_id, country_id, first_name, last_name, phone, city, \
                               address_line_1, address_line_2, address_type";

/// Repository for address database operations.
pub struct AddressRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AddressRepository<'a> {
    /// Create a new address repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all addresses owned by a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Address>, RepositoryError> {
        let rows: Vec<AddressRow> = sqlx::query_as(&format!(
            "SELECT {ADDRESS_COLUMNS} FROM addresses WHERE user_id = $1 ORDER BY id"
        ))
        .bind(user_id.as_i32())
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Address::from).collect())
    }

    /// Get an address only if it is owned by the given user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_owned(
        &self,
        user_id: UserId,
        address_id: AddressId,
    ) -> Result<Option<Address>, RepositoryError> {
        let row: Option<AddressRow> = sqlx::query_as(&format!(
            "SELECT {ADDRESS_COLUMNS} FROM addresses WHERE id = $1 AND user_id = $2"
        ))
        .bind(address_id.as_i32())
        .bind(user_id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Address::from))
    }

    /// Create a new address for a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the country reference is unknown.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        user_id: UserId,
        input: &NewAddress,
    ) -> Result<Address, RepositoryError> {
        let row: AddressRow = sqlx::query_as(&format!(
            "INSERT INTO addresses \
                 (user_id, country_id, first_name, last_name, phone, city, \
                  address_line_1, address_line_2, address_type) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {ADDRESS_COLUMNS}"
        ))
        .bind(user_id.as_i32())
        .bind(input.country_id.as_i32())
        .bind(&input.first_name)
        .bind(&input.last_name)
        .bind(&input.phone)
        .bind(&input.city)
        .bind(&input.address_line_1)
        .bind(&input.address_line_2)
        .bind(&input.address_type)
        .fetch_one(self.pool)
        .await
        .map_err(map_country_fk)?;

        Ok(Address::from(row))
    }

    /// Update an address owned by the given user.
    ///
    /// Returns `None` if the address doesn't exist or belongs to someone else.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the country reference is unknown.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update(
        &self,
        user_id: UserId,
        address_id: AddressId,
        input: &NewAddress,
    ) -> Result<Option<Address>, RepositoryError> {
        let row: Option<AddressRow> = sqlx::query_as(&format!(
            "UPDATE addresses \
             SET country_id = $3, first_name = $4, last_name = $5, phone = $6, \
                 city = $7, address_line_1 = $8, address_line_2 = $9, address_type = $10 \
             WHERE id = $1 AND user_id = $2 \
             RETURNING {ADDRESS_COLUMNS}"
        ))
        .bind(address_id.as_i32())
        .bind(user_id.as_i32())
        .bind(input.country_id.as_i32())
        .bind(&input.first_name)
        .bind(&input.last_name)
        .bind(&input.phone)
        .bind(&input.city)
        .bind(&input.address_line_1)
        .bind(&input.address_line_2)
        .bind(&input.address_type)
        .fetch_optional(self.pool)
        .await
        .map_err(map_country_fk)?;

        Ok(row.map(Address::from))
    }

    /// Delete an address owned by the given user.
    ///
    /// # Returns
    ///
    /// Returns `true` if the address was deleted, `false` if it didn't exist
    /// or belongs to someone else.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(
        &self,
        user_id: UserId,
        address_id: AddressId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM addresses WHERE id = $1 AND user_id = $2")
            .bind(address_id.as_i32())
            .bind(user_id.as_i32())
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Map a foreign-key violation on `country_id` to a `Conflict`.
fn map_country_fk(e: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_foreign_key_violation()
    {
        return RepositoryError::Conflict("unknown country".to_owned());
    }
    RepositoryError::Database(e)
}
