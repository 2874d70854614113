// Own-profile endpoints. The target user always comes from the token.

use axum::{response::Json, Extension};
use serde_json::Value;

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::services::{UpdateUser, UserService};

/// GET /api/profile
pub async fn get(Extension(user): Extension<AuthUser>) -> Result<Json<Value>, ApiError> {
    let users = UserService::new().await?;
    let view = users
        .get(user.id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(Json(
        serde_json::to_value(&view).map_err(|e| ApiError::internal_server_error(e.to_string()))?,
    ))
}

/// PUT /api/profile
pub async fn update(
    Extension(user): Extension<AuthUser>,
    Json(body): Json<UpdateUser>,
) -> Result<Json<Value>, ApiError> {
    let users = UserService::new().await?;
    let view = users
        .update(user.id, body)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(Json(
        serde_json::to_value(&view).map_err(|e| ApiError::internal_server_error(e.to_string()))?,
    ))
}
