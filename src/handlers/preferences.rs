// Work preference endpoints. A user reads and writes their own record;
// a manager may do the same for staff on their roster.

use axum::{extract::Path, response::Json, Extension};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::database::models::preference::{WeekCounts, WeekSlots};
use crate::database::models::user::Role;
use crate::error::ApiError;
use crate::middleware::{require_role, AuthUser};
use crate::services::{PreferenceService, UserService};

/// Self, or a manager touching their own staff's record.
async fn check_access(user: &AuthUser, target_id: Uuid) -> Result<(), ApiError> {
    if user.id == target_id {
        return Ok(());
    }
    if user.is_manager() {
        let users = UserService::new().await?;
        let target = users.find_row(target_id).await?;
        if target.map(|t| t.manager_id == Some(user.id)).unwrap_or(false) {
            return Ok(());
        }
    }
    Err(ApiError::forbidden("Access denied"))
}

/// GET /api/preferences/:userId
pub async fn get(
    Extension(user): Extension<AuthUser>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    check_access(&user, user_id).await?;

    let prefs = PreferenceService::new().await?;
    let view = prefs.get_or_create(user_id).await?;
    Ok(Json(
        serde_json::to_value(&view).map_err(|e| ApiError::internal_server_error(e.to_string()))?,
    ))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePreferences {
    pub preferences: Option<WeekSlots>,
    pub staff_requirements: Option<WeekCounts>,
}

/// PUT /api/preferences/:userId
pub async fn update(
    Extension(user): Extension<AuthUser>,
    Path(user_id): Path<Uuid>,
    Json(body): Json<UpdatePreferences>,
) -> Result<Json<Value>, ApiError> {
    check_access(&user, user_id).await?;

    let prefs = PreferenceService::new().await?;
    let view = prefs
        .update(user_id, body.preferences, body.staff_requirements)
        .await?;
    Ok(Json(
        serde_json::to_value(&view).map_err(|e| ApiError::internal_server_error(e.to_string()))?,
    ))
}

/// GET /api/preferences/staff - every roster member's record, manager only
pub async fn staff(Extension(user): Extension<AuthUser>) -> Result<Json<Value>, ApiError> {
    require_role(&user, &[Role::Manager])
        .map_err(|_| ApiError::forbidden("Access denied"))?;

    let prefs = PreferenceService::new().await?;
    let views = prefs.for_staff_of(user.id).await?;
    Ok(Json(
        serde_json::to_value(&views).map_err(|e| ApiError::internal_server_error(e.to_string()))?,
    ))
}
