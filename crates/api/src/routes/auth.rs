//! Authentication route handlers.
//!
//! Handles signup and login. Both return a bearer token alongside the user
//! representation; the client sends the token back in the `Authorization`
//! header on subsequent requests.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::user::User;
use crate::services::auth::{AuthService, SignupInput};
use crate::state::AppState;

/// Signup request body.
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub username: String,
    pub password: String,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Response body for both signup and login.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

/// Handle signup.
///
/// Creates the account and issues the first access token.
pub async fn signup(
    State(state): State<AppState>,
    Json(body): Json<SignupRequest>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    let service = AuthService::new(state.pool(), state.tokens());

    let (user, token) = service
        .signup(&SignupInput {
            username: &body.username,
            password: &body.password,
            email: &body.email,
            first_name: &body.first_name,
            last_name: &body.last_name,
        })
        .await?;

    tracing::info!(user_id = %user.id, "user signed up");

    Ok((StatusCode::CREATED, Json(AuthResponse { token, user })))
}

/// Handle login.
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    let service = AuthService::new(state.pool(), state.tokens());

    let (user, token) = service.login(&body.username, &body.password).await?;

    tracing::debug!(user_id = %user.id, "user logged in");

    Ok(Json(AuthResponse { token, user }))
}
