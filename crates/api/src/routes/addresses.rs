//! Address book route handlers.
//!
//! All handlers require authentication; repository queries filter on the
//! authenticated user's ID, so a user can only ever touch their own rows.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use bazaar_core::AddressId;

use crate::db::AddressRepository;
use crate::error::{AppError, Result};
use crate::middleware::CurrentUser;
use crate::models::address::{Address, NewAddress};
use crate::state::AppState;

/// List the authenticated user's addresses.
pub async fn index(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<Address>>> {
    let addresses = AddressRepository::new(state.pool())
        .list_for_user(user.id)
        .await?;

    Ok(Json(addresses))
}

/// Add an address.
pub async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(body): Json<NewAddress>,
) -> Result<(StatusCode, Json<Address>)> {
    let address = AddressRepository::new(state.pool())
        .create(user.id, &body)
        .await
        .map_err(map_unknown_country)?;

    Ok((StatusCode::CREATED, Json(address)))
}

/// Update one of the authenticated user's addresses.
pub async fn update(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<AddressId>,
    Json(body): Json<NewAddress>,
) -> Result<Json<Address>> {
    let address = AddressRepository::new(state.pool())
        .update(user.id, id, &body)
        .await
        .map_err(map_unknown_country)?
        .ok_or_else(|| AppError::NotFound(format!("address {id}")))?;

    Ok(Json(address))
}

/// Delete one of the authenticated user's addresses.
pub async fn delete(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<AddressId>,
) -> Result<StatusCode> {
    let deleted = AddressRepository::new(state.pool())
        .delete(user.id, id)
        .await?;

    if !deleted {
        return Err(AppError::NotFound(format!("address {id}")));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// An unknown `country_id` is a client mistake, not a server conflict.
fn map_unknown_country(e: crate::db::RepositoryError) -> AppError {
    match e {
        crate::db::RepositoryError::Conflict(msg) => AppError::BadRequest(msg),
        other => AppError::Database(other),
    }
}
