//! AI-assisted schedule generation.
//!
//! The [`ScheduleGenerator`] trait is the seam: handlers depend on the
//! trait object in application state, the Gemini-backed implementation
//! lives in [`gemini`], and tests script their own.

pub mod gemini;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::database::models::preference::{WeekCounts, WeekSlots};
use crate::database::models::user::Role;
use crate::lifecycle::{self, Actor, ShiftStatus};

pub use gemini::GeminiGenerator;

/// One staff member's availability, as fed to the generator.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffAvailability {
    pub user_id: Uuid,
    pub name: String,
    pub preferences: WeekSlots,
}

/// The manager's own availability plus per-day headcount targets.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagerConstraints {
    pub preferences: WeekSlots,
    pub staff_requirements: WeekCounts,
}

#[derive(Debug, Clone)]
pub struct ScheduleRequest {
    pub manager: ManagerConstraints,
    pub staff: Vec<StaffAvailability>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// A shift as the model proposes it. Times stay strings until the
/// validation pass has ruled on them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateShift {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub start_time: String,
    #[serde(default)]
    pub end_time: String,
    #[serde(default)]
    pub assigned_to: String,
    #[serde(default)]
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageSummary {
    pub total_shifts: i64,
    #[serde(default)]
    pub coverage: WeekCounts,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedSchedule {
    pub shifts: Vec<CandidateShift>,
    pub summary: CoverageSummary,
}

#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("Failed to generate schedule: {0}")]
    Upstream(String),
    #[error("Invalid response format from generator")]
    Malformed,
    #[error("Generator request failed: {0}")]
    Http(#[from] reqwest::Error),
}

#[async_trait]
pub trait ScheduleGenerator: Send + Sync {
    async fn generate_schedule(
        &self,
        request: &ScheduleRequest,
    ) -> Result<GeneratedSchedule, GeneratorError>;

    /// Parse a natural-language shift proposal ("I can work Thursday
    /// 4-5pm") into candidate shifts for the given staff member.
    async fn parse_shift_proposal(
        &self,
        natural_language: &str,
        user_id: Uuid,
    ) -> Result<Vec<CandidateShift>, GeneratorError>;
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// Check a generated schedule before anything is saved. Errors block
/// saving; warnings ride along in the response.
pub fn validate_schedule(schedule: &GeneratedSchedule, staff: &[StaffAvailability]) -> ValidationReport {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    for (i, shift) in schedule.shifts.iter().enumerate() {
        let n = i + 1;

        if shift.title.is_empty()
            || shift.start_time.is_empty()
            || shift.end_time.is_empty()
            || shift.assigned_to.is_empty()
            || shift.role.is_empty()
        {
            errors.push(format!("Shift {n}: Missing required fields"));
        }

        if parse_iso(&shift.start_time).is_none() || parse_iso(&shift.end_time).is_none() {
            errors.push(format!("Shift {n}: Invalid date format"));
        }

        let known = Uuid::parse_str(&shift.assigned_to)
            .map(|id| staff.iter().any(|s| s.user_id == id))
            .unwrap_or(false);
        if !known {
            warnings.push(format!("Shift {n}: Assigned staff not found in preferences"));
        }
    }

    ValidationReport { is_valid: errors.is_empty(), errors, warnings }
}

pub fn parse_iso(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Status for a generated shift being saved. Under the force-scheduled
/// policy everything lands as `scheduled` so staff acknowledge each
/// assignment; with the policy off, normal placement rules apply.
pub fn saved_status(force_scheduled: bool, actor: &Actor, assignee: Option<Uuid>) -> ShiftStatus {
    if force_scheduled && actor.role == Role::Manager {
        ShiftStatus::Scheduled
    } else {
        lifecycle::placement(actor, assignee).0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn staff_entry(user_id: Uuid) -> StaffAvailability {
        StaffAvailability {
            user_id,
            name: "Sam Doe".to_string(),
            preferences: WeekSlots::default(),
        }
    }

    fn candidate(assigned_to: &str) -> CandidateShift {
        CandidateShift {
            title: "Morning shift".to_string(),
            start_time: "2026-09-01T09:00:00.000Z".to_string(),
            end_time: "2026-09-01T17:00:00.000Z".to_string(),
            assigned_to: assigned_to.to_string(),
            role: "staff".to_string(),
            description: None,
        }
    }

    #[test]
    fn valid_schedule_passes() {
        let id = Uuid::new_v4();
        let schedule = GeneratedSchedule {
            shifts: vec![candidate(&id.to_string())],
            summary: CoverageSummary::default(),
        };
        let report = validate_schedule(&schedule, &[staff_entry(id)]);
        assert!(report.is_valid);
        assert!(report.errors.is_empty());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn missing_fields_block_saving() {
        let id = Uuid::new_v4();
        let mut shift = candidate(&id.to_string());
        shift.title.clear();
        let schedule = GeneratedSchedule {
            shifts: vec![shift],
            summary: CoverageSummary::default(),
        };
        let report = validate_schedule(&schedule, &[staff_entry(id)]);
        assert!(!report.is_valid);
        assert_eq!(report.errors[0], "Shift 1: Missing required fields");
    }

    #[test]
    fn bad_dates_block_saving() {
        let id = Uuid::new_v4();
        let mut shift = candidate(&id.to_string());
        shift.start_time = "next Tuesday".to_string();
        let schedule = GeneratedSchedule {
            shifts: vec![shift],
            summary: CoverageSummary::default(),
        };
        let report = validate_schedule(&schedule, &[staff_entry(id)]);
        assert!(!report.is_valid);
        assert!(report.errors.iter().any(|e| e == "Shift 1: Invalid date format"));
    }

    #[test]
    fn unknown_assignee_is_a_warning_not_an_error() {
        let schedule = GeneratedSchedule {
            shifts: vec![candidate(&Uuid::new_v4().to_string())],
            summary: CoverageSummary::default(),
        };
        let report = validate_schedule(&schedule, &[staff_entry(Uuid::new_v4())]);
        assert!(report.is_valid);
        assert_eq!(
            report.warnings,
            vec!["Shift 1: Assigned staff not found in preferences".to_string()]
        );
    }

    #[test]
    fn shift_numbers_in_messages_are_one_based() {
        let id = Uuid::new_v4();
        let mut second = candidate(&id.to_string());
        second.role.clear();
        let schedule = GeneratedSchedule {
            shifts: vec![candidate(&id.to_string()), second],
            summary: CoverageSummary::default(),
        };
        let report = validate_schedule(&schedule, &[staff_entry(id)]);
        assert_eq!(report.errors, vec!["Shift 2: Missing required fields".to_string()]);
    }

    #[test]
    fn force_scheduled_overrides_manager_placement() {
        let manager = Actor { id: Uuid::new_v4(), role: Role::Manager };
        let assignee = Some(Uuid::new_v4());

        // Without the policy a manager assigning someone else already
        // gets `scheduled`; the policy matters for self/no assignee
        assert_eq!(saved_status(true, &manager, None), ShiftStatus::Scheduled);
        assert_eq!(saved_status(true, &manager, Some(manager.id)), ShiftStatus::Scheduled);
        assert_eq!(saved_status(true, &manager, assignee), ShiftStatus::Scheduled);

        assert_eq!(saved_status(false, &manager, None), ShiftStatus::Confirmed);
        assert_eq!(saved_status(false, &manager, assignee), ShiftStatus::Scheduled);
    }

    #[test]
    fn candidate_shifts_deserialize_from_camel_case() {
        let raw = r#"{
            "title": "Evening shift",
            "startTime": "2026-09-01T17:00:00.000Z",
            "endTime": "2026-09-01T21:00:00.000Z",
            "assignedTo": "4b1c0c3a-7c8e-4f9d-9b7d-0f6f3f9a2d11",
            "role": "staff"
        }"#;
        let shift: CandidateShift = serde_json::from_str(raw).unwrap();
        assert_eq!(shift.title, "Evening shift");
        assert!(shift.description.is_none());
        assert!(parse_iso(&shift.start_time).is_some());
    }
}
