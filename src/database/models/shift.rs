use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use crate::database::models::user::{UserRef, UserSummary};
use crate::lifecycle::{ShiftState, ShiftStatus};

/// Shift row joined against the users table for both references.
/// Summary columns are null when the reference is unset or the user row
/// is gone.
#[derive(Debug, Clone, FromRow)]
pub struct ShiftRow {
    pub id: Uuid,
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub assigned_to: Option<Uuid>,
    pub status: String,
    pub role: String,
    pub description: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub assigned_username: Option<String>,
    pub assigned_name: Option<String>,
    pub creator_username: Option<String>,
    pub creator_name: Option<String>,
}

/// Shift as served: user references populated where the join found a
/// row, bare identifiers otherwise.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftView {
    pub id: Uuid,
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub assigned_to: Option<UserRef>,
    pub status: ShiftStatus,
    pub role: String,
    pub description: Option<String>,
    pub created_by: UserRef,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ShiftView {
    /// The facts the lifecycle engine rules on.
    pub fn state(&self) -> ShiftState<'_> {
        ShiftState {
            status: self.status,
            assigned_to: self.assigned_to.as_ref(),
            created_by: &self.created_by,
        }
    }
}

fn user_ref(id: Uuid, username: Option<String>, name: Option<String>) -> UserRef {
    match (username, name) {
        (Some(username), Some(name)) => UserRef::Summary(UserSummary { id, username, name }),
        _ => UserRef::Id(id),
    }
}

impl From<ShiftRow> for ShiftView {
    fn from(row: ShiftRow) -> Self {
        let assigned_to = row
            .assigned_to
            .map(|id| user_ref(id, row.assigned_username, row.assigned_name));
        let created_by = user_ref(row.created_by, row.creator_username, row.creator_name);

        Self {
            id: row.id,
            title: row.title,
            start_time: row.start_time,
            end_time: row.end_time,
            assigned_to,
            // Column is CHECK-constrained to known statuses
            status: ShiftStatus::parse(&row.status).unwrap_or(ShiftStatus::Proposed),
            role: row.role,
            description: row.description,
            created_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
