use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use roomly_types::api::{Claims, DeleteResponse, RegisterRequest, RegisterResponse};
use roomly_types::models::User;

use crate::auth::{AppState, hash_password};
use crate::convert::user_to_api;
use crate::error::ApiError;
use crate::policy::require_admin;
use crate::run_blocking;

/// Create a user account. Registration is an admin action; there is no
/// self-service signup.
pub async fn register(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse + std::fmt::Debug, ApiError> {
    require_admin(&claims)?;
    validate_register_request(&req)?;

    let db = state.clone();
    let username = req.username.clone();
    let email = req.email.clone();
    let taken = run_blocking(move || {
        Ok((
            db.db.get_user_by_username(&username)?.is_some(),
            db.db.get_user_by_email(&email)?.is_some(),
        ))
    })
    .await?;
    match taken {
        (true, _) => return Err(ApiError::conflict("username already taken")),
        (_, true) => return Err(ApiError::conflict("email already registered")),
        _ => {}
    }

    let password_hash = hash_password(&req.password).map_err(ApiError::Internal)?;
    let id = Uuid::new_v4();

    let db = state.clone();
    let uid = id.to_string();
    let username = req.username.clone();
    let email = req.email.clone();
    let is_admin = req.is_admin;
    run_blocking(move || db.db.create_user(&uid, &username, &password_hash, &email, is_admin))
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user: User {
                id,
                username: req.username,
                email: req.email,
                is_admin: req.is_admin,
                created_at: chrono::Utc::now(),
            },
        }),
    ))
}

pub async fn list_users(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse + std::fmt::Debug, ApiError> {
    require_admin(&claims)?;

    let db = state.clone();
    let rows = run_blocking(move || db.db.list_users()).await?;

    // Password hashes never leave the db layer's row type.
    let users: Vec<User> = rows.into_iter().map(user_to_api).collect();
    Ok(Json(users))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse + std::fmt::Debug, ApiError> {
    require_admin(&claims)?;
    if claims.sub == id {
        return Err(ApiError::Validation(
            "cannot delete your own account".to_string(),
        ));
    }

    let db = state.clone();
    let uid = id.to_string();
    let affected = run_blocking(move || db.db.delete_user(&uid)).await?;
    if affected == 0 {
        return Err(ApiError::NotFound("user not found".to_string()));
    }

    Ok(Json(DeleteResponse { deleted: affected }))
}

fn validate_register_request(req: &RegisterRequest) -> Result<(), ApiError> {
    if req.username.len() < 3 || req.username.len() > 32 {
        return Err(ApiError::Validation(
            "username must be between 3 and 32 characters".to_string(),
        ));
    }
    if req.password.len() < 8 {
        return Err(ApiError::Validation(
            "password must be at least 8 characters".to_string(),
        ));
    }
    if !req.email.contains('@') {
        return Err(ApiError::Validation("email is not valid".to_string()));
    }
    Ok(())
}
