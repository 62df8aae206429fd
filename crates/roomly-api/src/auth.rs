use std::sync::Arc;

use anyhow::anyhow;
use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Json, extract::State, response::IntoResponse};
use chrono::Utc;
use jsonwebtoken::{EncodingKey, Header, encode};

use roomly_db::Database;
use roomly_types::api::{Claims, LoginRequest, LoginResponse};
use roomly_types::models::User;

use crate::convert::user_to_api;
use crate::error::ApiError;
use crate::run_blocking;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
}

/// Session lifetime, fixed at issuance.
const TOKEN_TTL_HOURS: i64 = 24;

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse + std::fmt::Debug, ApiError> {
    let db = state.clone();
    let username = req.username.clone();
    let row = run_blocking(move || db.db.get_user_by_username(&username)).await?;

    // Unknown user and wrong password must be indistinguishable.
    let row = row.ok_or_else(ApiError::invalid_credentials)?;

    let parsed_hash = PasswordHash::new(&row.password_hash)
        .map_err(|e| ApiError::Internal(anyhow!("stored password hash unreadable: {}", e)))?;
    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| ApiError::invalid_credentials())?;

    let user = user_to_api(row);
    let token = create_token(&state.jwt_secret, &user).map_err(ApiError::Internal)?;

    Ok(Json(LoginResponse { token, user }))
}

pub fn create_token(secret: &str, user: &User) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user.id,
        username: user.username.clone(),
        is_admin: user.is_admin,
        exp: (Utc::now() + chrono::Duration::hours(TOKEN_TTL_HOURS)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

/// Hash a password with Argon2id and a fresh random salt.
pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow!("password hashing failed: {}", e))?
        .to_string();
    Ok(hash)
}
