// Authentication endpoints: login, logout, register, me.

use axum::{http::StatusCode, response::Json, Extension};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::services::{AuthService, NewUser, UserService};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// POST /api/auth/login
pub async fn login(Json(body): Json<LoginRequest>) -> Result<Json<Value>, ApiError> {
    let auth = AuthService::new().await?;
    let user = auth.authenticate(&body.username, &body.password).await?;
    let token = auth.issue_token(&user)?;

    Ok(Json(json!({
        "id": user.id,
        "username": user.username,
        "name": user.name,
        "email": user.email,
        "phone": user.phone,
        "role": user.role,
        "token": token,
    })))
}

/// POST /api/auth/logout - stateless tokens, nothing to revoke server-side
pub async fn logout() -> Json<Value> {
    Json(json!({ "message": "Logged out" }))
}

/// POST /api/auth/register
pub async fn register(Json(body): Json<NewUser>) -> Result<(StatusCode, Json<Value>), ApiError> {
    let users = UserService::new().await?;
    let user = users.create(body).await?;

    let auth = AuthService::new().await?;
    let row = users
        .find_row(user.id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    let token = auth.issue_token(&row)?;

    let mut response = serde_json::to_value(&user)
        .map_err(|e| ApiError::internal_server_error(e.to_string()))?;
    response["token"] = json!(token);

    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /api/auth/me
pub async fn me(Extension(user): Extension<AuthUser>) -> Result<Json<Value>, ApiError> {
    let users = UserService::new().await?;
    let view = users
        .get(user.id)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid token"))?;
    Ok(Json(serde_json::to_value(&view).map_err(|e| {
        ApiError::internal_server_error(e.to_string())
    })?))
}
