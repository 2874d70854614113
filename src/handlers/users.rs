// User management endpoints. Everything here is manager-gated except
// the managers listing, which any authenticated user may read.

use axum::{extract::Path, http::StatusCode, response::Json, Extension};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::database::models::user::Role;
use crate::error::ApiError;
use crate::middleware::{require_role, AuthUser};
use crate::services::{NewUser, UpdateUser, UserService};

/// GET /api/users
pub async fn list(Extension(user): Extension<AuthUser>) -> Result<Json<Value>, ApiError> {
    require_role(&user, &[Role::Manager])?;
    let users = UserService::new().await?;
    let views = users.list_active().await?;
    to_json(&views)
}

/// POST /api/users
pub async fn create(
    Extension(user): Extension<AuthUser>,
    Json(body): Json<NewUser>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    require_role(&user, &[Role::Manager])?;
    let users = UserService::new().await?;
    let view = users.create(body).await?;
    Ok((StatusCode::CREATED, Json(value(&view)?)))
}

/// GET /api/users/managers
pub async fn managers(Extension(_user): Extension<AuthUser>) -> Result<Json<Value>, ApiError> {
    let users = UserService::new().await?;
    let views = users.managers().await?;
    to_json(&views)
}

/// GET /api/users/managers/:managerId/staff
pub async fn staff_by_manager(
    Extension(user): Extension<AuthUser>,
    Path(manager_id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    require_role(&user, &[Role::Manager])?;
    let users = UserService::new().await?;
    let views = users.staff_of(manager_id).await?;
    to_json(&views)
}

/// GET /api/users/:id
pub async fn get(
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    require_role(&user, &[Role::Manager])?;
    let users = UserService::new().await?;
    let view = users
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(Json(value(&view)?))
}

/// PUT /api/users/:id
pub async fn update(
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateUser>,
) -> Result<Json<Value>, ApiError> {
    require_role(&user, &[Role::Manager])?;
    let users = UserService::new().await?;
    let view = users
        .update(id, body)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(Json(value(&view)?))
}

/// DELETE /api/users/:id - soft delete
pub async fn deactivate(
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    require_role(&user, &[Role::Manager])?;
    let users = UserService::new().await?;
    if !users.deactivate(id).await? {
        return Err(ApiError::not_found("User not found"));
    }
    Ok(Json(json!({ "message": "User deleted" })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignRequest {
    pub staff_id: Option<Uuid>,
    pub manager_id: Option<Uuid>,
}

/// POST /api/users/assign - both ids in the body
pub async fn assign(
    Extension(user): Extension<AuthUser>,
    Json(body): Json<AssignRequest>,
) -> Result<Json<Value>, ApiError> {
    require_role(&user, &[Role::Manager])?;
    let (staff_id, manager_id) = match (body.staff_id, body.manager_id) {
        (Some(s), Some(m)) => (s, m),
        _ => return Err(ApiError::bad_request("Staff ID and Manager ID are required")),
    };

    let users = UserService::new().await?;
    let view = users.assign_staff(staff_id, manager_id).await?;
    Ok(Json(value(&view)?))
}

/// PUT /api/users/:staffId/assign-manager - staff id in the path
pub async fn assign_manager(
    Extension(user): Extension<AuthUser>,
    Path(staff_id): Path<Uuid>,
    Json(body): Json<AssignRequest>,
) -> Result<Json<Value>, ApiError> {
    require_role(&user, &[Role::Manager])?;
    let manager_id = body
        .manager_id
        .ok_or_else(|| ApiError::bad_request("Staff ID and Manager ID are required"))?;

    let users = UserService::new().await?;
    let view = users.assign_staff(staff_id, manager_id).await?;
    Ok(Json(value(&view)?))
}

/// DELETE /api/users/:staffId/manager
pub async fn remove_manager(
    Extension(user): Extension<AuthUser>,
    Path(staff_id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    require_role(&user, &[Role::Manager])?;
    let users = UserService::new().await?;
    let view = users.unassign_staff(staff_id).await?;
    Ok(Json(value(&view)?))
}

fn value<T: serde::Serialize>(v: &T) -> Result<Value, ApiError> {
    serde_json::to_value(v).map_err(|e| ApiError::internal_server_error(e.to_string()))
}

fn to_json<T: serde::Serialize>(v: &T) -> Result<Json<Value>, ApiError> {
    Ok(Json(value(v)?))
}
