//! Country repository backing the address form.

use sqlx::PgPool;

use bazaar_core::CountryId;

use super::RepositoryError;
use crate::models::address::Country;

#[derive(Debug, sqlx::FromRow)]
struct CountryRow {
    id: i32,
    name: String,
}

/// Repository for country reads.
pub struct CountryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CountryRepository<'a> {
    /// Create a new country repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all shipping countries, alphabetically.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Country>, RepositoryError> {
        let rows: Vec<CountryRow> = sqlx::query_as(
            r"
            SELECT id, name
            FROM countries
            ORDER BY name
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| Country {
                id: CountryId::new(row.id),
                name: row.name,
            })
            .collect())
    }
}
