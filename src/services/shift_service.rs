use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::shift::{ShiftRow, ShiftView};
use crate::lifecycle::ShiftStatus;

#[derive(Debug, Error)]
pub enum ShiftError {
    #[error("Shift not found")]
    NotFound,
    #[error(transparent)]
    Database(#[from] DatabaseError),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Engine-approved record for a new shift. Status and assignee come out
/// of `lifecycle::placement`, never straight from a request body.
#[derive(Debug)]
pub struct NewShiftRecord {
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub assigned_to: Option<Uuid>,
    pub status: ShiftStatus,
    pub role: String,
    pub description: Option<String>,
    pub created_by: Uuid,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateShift {
    pub title: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub role: Option<String>,
    pub description: Option<String>,
}

// Both user references joined so listings carry populated summaries
const SHIFT_SELECT: &str = r#"
SELECT s.id, s.title, s.start_time, s.end_time, s.assigned_to, s.status,
       s.role, s.description, s.created_by, s.created_at, s.updated_at,
       a.username AS assigned_username, a.name AS assigned_name,
       c.username AS creator_username, c.name AS creator_name
FROM shifts s
LEFT JOIN users a ON a.id = s.assigned_to
LEFT JOIN users c ON c.id = s.created_by
"#;

pub struct ShiftService {
    pool: PgPool,
}

impl ShiftService {
    pub async fn new() -> Result<Self, DatabaseError> {
        let pool = DatabaseManager::pool().await?;
        Ok(Self { pool })
    }

    /// Every non-rejected shift, the broad staff-facing listing.
    pub async fn list_all(&self) -> Result<Vec<ShiftView>, ShiftError> {
        let query = format!("{SHIFT_SELECT} WHERE s.status <> 'rejected' ORDER BY s.start_time");
        let rows = sqlx::query_as::<_, ShiftRow>(&query).fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(ShiftView::from).collect())
    }

    /// Shifts where the given user is the assignee.
    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<ShiftView>, ShiftError> {
        let query = format!("{SHIFT_SELECT} WHERE s.assigned_to = $1 ORDER BY s.start_time");
        let rows = sqlx::query_as::<_, ShiftRow>(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(ShiftView::from).collect())
    }

    /// Shifts assigned to the given roster. Empty roster means an empty
    /// listing, not an error.
    pub async fn list_for_roster(&self, roster: &[Uuid]) -> Result<Vec<ShiftView>, ShiftError> {
        if roster.is_empty() {
            return Ok(Vec::new());
        }
        let query = format!(
            "{SHIFT_SELECT} WHERE s.assigned_to = ANY($1) AND s.status <> 'rejected' ORDER BY s.start_time"
        );
        let rows = sqlx::query_as::<_, ShiftRow>(&query)
            .bind(roster)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(ShiftView::from).collect())
    }

    /// Direct lookup; rejected shifts stay reachable here.
    pub async fn get(&self, id: Uuid) -> Result<Option<ShiftView>, ShiftError> {
        let query = format!("{SHIFT_SELECT} WHERE s.id = $1");
        let row = sqlx::query_as::<_, ShiftRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(ShiftView::from))
    }

    pub async fn create(&self, record: NewShiftRecord) -> Result<ShiftView, ShiftError> {
        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO shifts (title, start_time, end_time, assigned_to, status, role, description, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(record.title.trim())
        .bind(record.start_time)
        .bind(record.end_time)
        .bind(record.assigned_to)
        .bind(record.status.as_str())
        .bind(record.role.trim())
        .bind(&record.description)
        .bind(record.created_by)
        .fetch_one(&self.pool)
        .await?;

        self.get(id).await?.ok_or(ShiftError::NotFound)
    }

    pub async fn update(&self, id: Uuid, changes: UpdateShift) -> Result<Option<ShiftView>, ShiftError> {
        let updated = sqlx::query_scalar::<_, Uuid>(
            r#"
            UPDATE shifts SET
                title = COALESCE($2, title),
                start_time = COALESCE($3, start_time),
                end_time = COALESCE($4, end_time),
                role = COALESCE($5, role),
                description = COALESCE($6, description),
                updated_at = now()
            WHERE id = $1
            RETURNING id
            "#,
        )
        .bind(id)
        .bind(&changes.title)
        .bind(changes.start_time)
        .bind(changes.end_time)
        .bind(&changes.role)
        .bind(&changes.description)
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(id) => self.get(id).await,
            None => Ok(None),
        }
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, ShiftError> {
        let deleted = sqlx::query_scalar::<_, Uuid>("DELETE FROM shifts WHERE id = $1 RETURNING id")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(deleted.is_some())
    }

    /// Persist an engine-approved status transition.
    pub async fn set_status(&self, id: Uuid, status: ShiftStatus) -> Result<Option<ShiftView>, ShiftError> {
        let updated = sqlx::query_scalar::<_, Uuid>(
            "UPDATE shifts SET status = $2, updated_at = now() WHERE id = $1 RETURNING id",
        )
        .bind(id)
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(id) => self.get(id).await,
            None => Ok(None),
        }
    }

    /// Persist an engine-approved reassignment.
    pub async fn set_assignee(&self, id: Uuid, staff_id: Uuid) -> Result<Option<ShiftView>, ShiftError> {
        let updated = sqlx::query_scalar::<_, Uuid>(
            "UPDATE shifts SET assigned_to = $2, updated_at = now() WHERE id = $1 RETURNING id",
        )
        .bind(id)
        .bind(staff_id)
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(id) => self.get(id).await,
            None => Ok(None),
        }
    }

    pub async fn count_created_by(&self, user_id: Uuid) -> Result<i64, ShiftError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM shifts WHERE created_by = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
