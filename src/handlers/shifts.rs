// Shift endpoints. Creation runs through placement rules and every
// status or assignee mutation goes through the lifecycle engine.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    Extension,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::database::models::shift::ShiftView;
use crate::database::models::user::Role;
use crate::error::ApiError;
use crate::lifecycle::{self, Decision, ShiftEvent, ShiftStatus, Transition};
use crate::middleware::{require_role, AuthUser};
use crate::schedule::{parse_iso, CandidateShift};
use crate::services::{NewShiftRecord, ShiftService, UpdateShift, UserService};

use super::AppState;

/// GET /api/shifts - managers see their roster's shifts, staff the board
pub async fn list(Extension(user): Extension<AuthUser>) -> Result<Json<Value>, ApiError> {
    let shifts = ShiftService::new().await?;
    let views = if user.is_manager() {
        let users = UserService::new().await?;
        let roster = users.roster_ids(user.id).await?;
        shifts.list_for_roster(&roster).await?
    } else {
        shifts.list_all().await?
    };
    to_json(&views)
}

/// GET /api/shifts/my-shifts
pub async fn my_shifts(Extension(user): Extension<AuthUser>) -> Result<Json<Value>, ApiError> {
    let shifts = ShiftService::new().await?;
    let views = shifts.list_for_user(user.id).await?;
    to_json(&views)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewShift {
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub assigned_to: Option<Uuid>,
    pub role: String,
    pub description: Option<String>,
}

/// POST /api/shifts
pub async fn create(
    Extension(user): Extension<AuthUser>,
    Json(body): Json<NewShift>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    require_role(&user, &[Role::Manager, Role::Staff])?;

    if body.title.trim().is_empty() || body.role.trim().is_empty() {
        return Err(ApiError::bad_request("Title and role are required"));
    }
    reject_past_start(body.start_time)?;

    // Placement decides the initial status; the requested assignee only
    // holds for managers
    let actor = user.actor();
    let (status, assigned_to) = lifecycle::placement(&actor, body.assigned_to);

    let shifts = ShiftService::new().await?;
    let view = shifts
        .create(NewShiftRecord {
            title: body.title,
            start_time: body.start_time,
            end_time: body.end_time,
            assigned_to,
            status,
            role: body.role,
            description: body.description,
            created_by: user.id,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(value(&view)?)))
}

/// GET /api/shifts/:id
pub async fn get(
    Extension(_user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let shifts = ShiftService::new().await?;
    let view = shifts
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Shift not found"))?;
    to_json(&view)
}

/// PUT /api/shifts/:id - manager only, fields other than status/assignee
pub async fn update(
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateShift>,
) -> Result<Json<Value>, ApiError> {
    require_role(&user, &[Role::Manager])?;
    let shifts = ShiftService::new().await?;
    let view = shifts
        .update(id, body)
        .await?
        .ok_or_else(|| ApiError::not_found("Shift not found"))?;
    to_json(&view)
}

/// DELETE /api/shifts/:id
pub async fn delete(
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    require_role(&user, &[Role::Manager])?;
    let shifts = ShiftService::new().await?;
    if !shifts.delete(id).await? {
        return Err(ApiError::not_found("Shift not found"));
    }
    Ok(Json(json!({ "message": "Shift deleted" })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignRequest {
    pub staff_id: Uuid,
}

/// POST /api/shifts/:id/assign - manager reassignment
pub async fn assign(
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(body): Json<AssignRequest>,
) -> Result<Json<Value>, ApiError> {
    require_role(&user, &[Role::Manager])?;
    let view = transition(&user, id, ShiftEvent::Assign(body.staff_id)).await?;
    to_json(&view)
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

/// POST /api/shifts/:id/status - staff direct status set
pub async fn status(
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(body): Json<StatusRequest>,
) -> Result<Json<Value>, ApiError> {
    require_role(&user, &[Role::Staff])?;
    let next = ShiftStatus::parse(&body.status)
        .ok_or_else(|| ApiError::bad_request("Invalid shift status for this action"))?;
    let view = transition(&user, id, ShiftEvent::SetStatus(next)).await?;
    to_json(&view)
}

#[derive(Debug, Deserialize)]
pub struct ApproveRequest {
    pub action: String,
}

/// POST /api/shifts/:id/approve - approve or reject. The action string
/// is narrowed here so an unknown value is a 400, not an implicit reject.
pub async fn approve(
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(body): Json<ApproveRequest>,
) -> Result<Json<Value>, ApiError> {
    require_role(&user, &[Role::Manager, Role::Staff])?;
    let decision =
        Decision::parse(&body.action).ok_or_else(|| ApiError::bad_request("Invalid action"))?;
    let view = transition(&user, id, ShiftEvent::Decide(decision)).await?;
    to_json(&view)
}

/// POST /api/shifts/:id/cancel
pub async fn cancel(
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    require_role(&user, &[Role::Manager, Role::Staff])?;
    let view = transition(&user, id, ShiftEvent::Cancel).await?;
    to_json(&view)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposePreviewRequest {
    pub natural_language: String,
}

/// POST /api/shifts/propose-preview - parse a natural-language proposal.
/// The proposing user comes from the token, never the body.
pub async fn propose_preview(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<ProposePreviewRequest>,
) -> Result<Json<Value>, ApiError> {
    if body.natural_language.trim().is_empty() {
        return Err(ApiError::bad_request("naturalLanguage is required"));
    }

    let preview_shifts = state
        .generator
        .parse_shift_proposal(&body.natural_language, user.id)
        .await?;
    Ok(Json(json!({ "previewShifts": preview_shifts })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposeSaveRequest {
    pub preview_shifts: Vec<CandidateShift>,
}

/// POST /api/shifts/propose-save - persist previewed proposals, all as
/// `proposed` and self-assigned regardless of the preview payload.
pub async fn propose_save(
    Extension(user): Extension<AuthUser>,
    Json(body): Json<ProposeSaveRequest>,
) -> Result<Json<Value>, ApiError> {
    if body.preview_shifts.is_empty() {
        return Err(ApiError::bad_request("previewShifts (array) are required"));
    }

    let mut parsed = Vec::with_capacity(body.preview_shifts.len());
    for shift in &body.preview_shifts {
        let start = parse_iso(&shift.start_time)
            .ok_or_else(|| ApiError::bad_request("Invalid date format"))?;
        let end = parse_iso(&shift.end_time)
            .ok_or_else(|| ApiError::bad_request("Invalid date format"))?;
        reject_past_start(start)?;
        parsed.push((shift, start, end));
    }

    let shifts = ShiftService::new().await?;
    let mut saved: Vec<ShiftView> = Vec::with_capacity(parsed.len());
    for (shift, start, end) in parsed {
        let view = shifts
            .create(NewShiftRecord {
                title: shift.title.clone(),
                start_time: start,
                end_time: end,
                assigned_to: Some(user.id),
                status: ShiftStatus::Proposed,
                role: "staff".to_string(),
                description: shift.description.clone(),
                created_by: user.id,
            })
            .await?;
        saved.push(view);
    }

    Ok(Json(json!({ "shifts": saved })))
}

/// Run an event through the engine against the stored shift, persist
/// the approved transition, and return the updated record.
async fn transition(user: &AuthUser, id: Uuid, event: ShiftEvent) -> Result<ShiftView, ApiError> {
    let shifts = ShiftService::new().await?;
    let current = shifts
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Shift not found"))?;

    let outcome = lifecycle::apply(&user.actor(), &current.state(), event)?;

    let updated = match outcome {
        Transition::Status(next) => shifts.set_status(id, next).await?,
        Transition::Assignee(staff_id) => shifts.set_assignee(id, staff_id).await?,
    };
    updated.ok_or_else(|| ApiError::not_found("Shift not found"))
}

fn reject_past_start(start: DateTime<Utc>) -> Result<(), ApiError> {
    let today = Utc::now()
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc());
    if let Some(today) = today {
        if start < today {
            return Err(ApiError::bad_request("Cannot book a shift before today."));
        }
    }
    Ok(())
}

fn value<T: serde::Serialize>(v: &T) -> Result<Value, ApiError> {
    serde_json::to_value(v).map_err(|e| ApiError::internal_server_error(e.to_string()))
}

fn to_json<T: serde::Serialize>(v: &T) -> Result<Json<Value>, ApiError> {
    Ok(Json(value(v)?))
}
