//! Token issuance

use axum::{body::Bytes, extract::State, Json};
use serde::{Deserialize, Serialize};

use super::parse_json;
use crate::AppState;
use roastingreels_common::{
    auth::verify_password,
    db::{models::User, Store},
    errors::{AppError, Result},
};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Look a user up by email and check their password
pub(crate) async fn authenticate(store: &dyn Store, email: &str, password: &str) -> Result<User> {
    let invalid = || AppError::Unauthorized {
        message: "Invalid credentials.".to_string(),
    };

    let user = store
        .find_user_by_email(&email.trim().to_lowercase())
        .await?
        .ok_or_else(invalid)?;

    if !verify_password(password, &user.password) {
        return Err(invalid());
    }

    Ok(user)
}

/// Exchange email and password for a JWT
pub async fn login_check(State(state): State<AppState>, body: Bytes) -> Result<Json<TokenResponse>> {
    let request: LoginRequest = parse_json(&body)?;

    let user = authenticate(state.store.as_ref(), &request.username, &request.password)
        .await
        .inspect_err(|_| tracing::warn!(username = %request.username, "Login failed"))?;

    let token = state.jwt.generate_token(&user)?;
    tracing::info!(user_id = user.id, "Token issued");

    Ok(Json(TokenResponse { token }))
}
