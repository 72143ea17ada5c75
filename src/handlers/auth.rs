use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

use crate::auth::{generate_jwt, verify_password, Claims};
use crate::config;
use crate::database::manager;
use crate::database::models::User;
use crate::error::{ApiError, ApiResult};
use crate::vm::UserVm;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "User name is required"))]
    pub user_name: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// POST /auth/login - verify credentials and issue a JWT carrying the
/// caller's role ids
pub async fn login(Json(request): Json<LoginRequest>) -> ApiResult<Response> {
    request.validate()?;
    let pool = manager::pool()?;

    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE user_name = $1")
        .bind(&request.user_name)
        .fetch_optional(pool)
        .await?;

    // Same response for unknown user and wrong password
    let Some(user) = user else {
        return Err(ApiError::unauthorized("Invalid user name or password"));
    };
    if !verify_password(&request.password, &user.password_hash) {
        return Err(ApiError::unauthorized("Invalid user name or password"));
    }

    let roles: Vec<String> = sqlx::query_scalar("SELECT role_id FROM user_roles WHERE user_id = $1")
        .bind(user.id)
        .fetch_all(pool)
        .await?;

    let security = &config::config().security;
    let claims = Claims::new(user.id, user.user_name.clone(), roles);
    let token = generate_jwt(&claims, &security.jwt_secret)?;

    tracing::info!(user = %user.user_name, "user logged in");

    Ok(Json(json!({
        "token": token,
        "expiresIn": security.jwt_expiry_hours * 3600,
        "user": UserVm::from(user),
    }))
    .into_response())
}
