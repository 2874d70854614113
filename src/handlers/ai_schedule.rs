// AI schedule endpoints: generate-and-save, preview, save a previewed
// schedule, and generation stats. All manager-only.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
    Extension,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::config;
use crate::database::models::user::Role;
use crate::error::ApiError;
use crate::middleware::{require_role, AuthUser};
use crate::schedule::{
    self, CandidateShift, CoverageSummary, ManagerConstraints, ScheduleRequest, StaffAvailability,
};
use crate::services::{NewShiftRecord, PreferenceService, ShiftService, UserService};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub manager_id: Option<Uuid>,
}

/// Load the manager's constraints and the roster's availability.
async fn gather(manager_id: Uuid) -> Result<(ManagerConstraints, Vec<StaffAvailability>), ApiError> {
    let prefs = PreferenceService::new().await?;
    let manager_prefs = prefs
        .find(manager_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Manager work preferences not found"))?;

    let users = UserService::new().await?;
    if users.staff_count(manager_id).await? == 0 {
        return Err(ApiError::bad_request("No staff members found under this manager"));
    }

    // Only staff with a stored preference record feed the generator
    let staff = prefs
        .for_staff_of(manager_id)
        .await?
        .into_iter()
        .map(|p| StaffAvailability {
            user_id: p.user_id,
            name: p.name,
            preferences: p.preferences,
        })
        .collect();

    let manager = ManagerConstraints {
        preferences: manager_prefs.preferences.0,
        staff_requirements: manager_prefs.staff_requirements.0,
    };
    Ok((manager, staff))
}

fn schedule_request(
    body: &GenerateRequest,
    manager: ManagerConstraints,
    staff: Vec<StaffAvailability>,
) -> Result<ScheduleRequest, ApiError> {
    let (start_date, end_date) = match (body.start_date, body.end_date) {
        (Some(s), Some(e)) => (s, e),
        _ => return Err(ApiError::bad_request("Start date and end date are required")),
    };
    Ok(ScheduleRequest { manager, staff, start_date, end_date })
}

#[derive(Debug)]
struct ParsedCandidate<'a> {
    shift: &'a CandidateShift,
    start: chrono::DateTime<chrono::Utc>,
    end: chrono::DateTime<chrono::Utc>,
    assigned_to: Option<Uuid>,
}

/// Parse every candidate up front so a bad one rejects the whole batch
/// before anything is written.
fn parse_candidates(shifts: &[CandidateShift]) -> Result<Vec<ParsedCandidate<'_>>, ApiError> {
    let mut parsed = Vec::with_capacity(shifts.len());
    for shift in shifts {
        let start = schedule::parse_iso(&shift.start_time)
            .ok_or_else(|| ApiError::bad_request("Invalid shifts data provided"))?;
        let end = schedule::parse_iso(&shift.end_time)
            .ok_or_else(|| ApiError::bad_request("Invalid shifts data provided"))?;
        let assigned_to = Uuid::parse_str(&shift.assigned_to).ok();
        parsed.push(ParsedCandidate { shift, start, end, assigned_to });
    }
    Ok(parsed)
}

async fn save_candidates(
    shifts: &[CandidateShift],
    user: &AuthUser,
) -> Result<Vec<Value>, ApiError> {
    let parsed = parse_candidates(shifts)?;

    let service = ShiftService::new().await?;
    let force_scheduled = config::config().ai.force_scheduled;
    let actor = user.actor();

    let mut saved = Vec::with_capacity(parsed.len());
    for candidate in parsed {
        let view = service
            .create(NewShiftRecord {
                title: candidate.shift.title.clone(),
                start_time: candidate.start,
                end_time: candidate.end,
                assigned_to: candidate.assigned_to,
                status: schedule::saved_status(force_scheduled, &actor, candidate.assigned_to),
                role: candidate.shift.role.clone(),
                description: candidate.shift.description.clone(),
                created_by: user.id,
            })
            .await?;
        saved.push(
            serde_json::to_value(&view)
                .map_err(|e| ApiError::internal_server_error(e.to_string()))?,
        );
    }
    Ok(saved)
}

/// POST /api/ai-schedule/generate - generate, validate and save
pub async fn generate(
    State(state): State<super::AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<GenerateRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    require_role(&user, &[Role::Manager])
        .map_err(|_| ApiError::forbidden("Only managers can generate AI schedules"))?;

    let manager_id = body.manager_id.unwrap_or(user.id);
    let (manager, staff) = gather(manager_id).await?;
    let request = schedule_request(&body, manager, staff.clone())?;

    let generated = state.generator.generate_schedule(&request).await?;
    let validation = schedule::validate_schedule(&generated, &staff);

    if !validation.is_valid {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(json!({
                "success": false,
                "message": "Generated schedule validation failed",
                "errors": validation.errors,
                "warnings": validation.warnings,
            })),
        ));
    }

    let saved = save_candidates(&generated.shifts, &user).await?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "success": true,
            "message": "AI schedule generated successfully",
            "data": {
                "shifts": saved,
                "summary": generated.summary,
                "validation": { "warnings": validation.warnings },
            },
        })),
    ))
}

/// POST /api/ai-schedule/preview - generate and validate, nothing saved
pub async fn preview(
    State(state): State<super::AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<GenerateRequest>,
) -> Result<Json<Value>, ApiError> {
    require_role(&user, &[Role::Manager])
        .map_err(|_| ApiError::forbidden("Only managers can preview AI schedules"))?;

    let manager_id = body.manager_id.unwrap_or(user.id);
    let (manager, staff) = gather(manager_id).await?;
    let request = schedule_request(&body, manager, staff.clone())?;

    let generated = state.generator.generate_schedule(&request).await?;
    let validation = schedule::validate_schedule(&generated, &staff);

    Ok(Json(json!({
        "success": true,
        "message": "AI schedule preview generated",
        "data": {
            "shifts": generated.shifts,
            "summary": generated.summary,
            "validation": validation,
        },
    })))
}

#[derive(Debug, Deserialize)]
pub struct SavePreviewRequest {
    #[serde(default)]
    pub shifts: Vec<CandidateShift>,
    #[serde(default)]
    pub summary: Option<CoverageSummary>,
}

/// POST /api/ai-schedule/save-preview - persist a previewed schedule
pub async fn save_preview(
    Extension(user): Extension<AuthUser>,
    Json(body): Json<SavePreviewRequest>,
) -> Result<Json<Value>, ApiError> {
    require_role(&user, &[Role::Manager])
        .map_err(|_| ApiError::forbidden("Only managers can save AI schedules"))?;

    if body.shifts.is_empty() {
        return Err(ApiError::bad_request("Invalid shifts data provided"));
    }

    let saved = save_candidates(&body.shifts, &user).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Preview schedule saved successfully",
        "data": {
            "shifts": saved,
            "summary": body.summary,
        },
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsQuery {
    pub manager_id: Option<Uuid>,
}

/// GET /api/ai-schedule/stats - readiness numbers for the generate UI
pub async fn stats(
    Extension(user): Extension<AuthUser>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<Value>, ApiError> {
    require_role(&user, &[Role::Manager])
        .map_err(|_| ApiError::forbidden("Only managers can view AI schedule stats"))?;

    let manager_id = query.manager_id.unwrap_or(user.id);

    let prefs = PreferenceService::new().await?;
    let manager_prefs = prefs
        .find(manager_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Manager work preferences not found"))?;

    let users = UserService::new().await?;
    let staff_count = users.staff_count(manager_id).await?;

    let shifts = ShiftService::new().await?;
    let existing_shifts_count = shifts.count_created_by(manager_id).await?;

    Ok(Json(json!({
        "success": true,
        "data": {
            "managerPreferences": {
                "staffRequirements": manager_prefs.staff_requirements.0,
                "hasPreferences": manager_prefs.preferences.0.any_slot(),
            },
            "staffCount": staff_count,
            "existingShiftsCount": existing_shifts_count,
            "canGenerate": staff_count > 0,
        },
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(start: &str) -> CandidateShift {
        CandidateShift {
            title: "Morning shift".to_string(),
            start_time: start.to_string(),
            end_time: "2026-09-01T17:00:00.000Z".to_string(),
            assigned_to: Uuid::new_v4().to_string(),
            role: "staff".to_string(),
            description: None,
        }
    }

    #[test]
    fn candidate_batch_parses_as_a_whole() {
        let batch = vec![
            candidate("2026-09-01T09:00:00.000Z"),
            candidate("2026-09-02T09:00:00.000Z"),
        ];
        let parsed = parse_candidates(&batch).unwrap();
        assert_eq!(parsed.len(), 2);
        assert!(parsed.iter().all(|c| c.assigned_to.is_some()));
    }

    #[test]
    fn bad_candidate_rejects_the_whole_batch() {
        // A bad date in a later shift must fail before any write, so the
        // first shift never gets a chance to be persisted alone
        let batch = vec![
            candidate("2026-09-01T09:00:00.000Z"),
            candidate("next Tuesday"),
        ];
        let err = parse_candidates(&batch).unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.message(), "Invalid shifts data provided");
    }

    #[test]
    fn unparseable_assignee_is_kept_as_unassigned() {
        let mut shift = candidate("2026-09-01T09:00:00.000Z");
        shift.assigned_to = "not-a-uuid".to_string();
        let batch = [shift];
        let parsed = parse_candidates(&batch).unwrap();
        assert!(parsed[0].assigned_to.is_none());
    }
}
