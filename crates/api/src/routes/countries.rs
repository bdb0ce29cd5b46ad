//! Country list route handler.

use axum::{Json, extract::State};

use crate::db::CountryRepository;
use crate::error::Result;
use crate::models::address::Country;
use crate::state::AppState;

/// List all shipping countries.
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Country>>> {
    let countries = CountryRepository::new(state.pool()).list().await?;
    Ok(Json(countries))
}
