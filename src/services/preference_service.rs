use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use thiserror::Error;
use uuid::Uuid;

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::preference::{
    PreferenceRow, PreferenceView, StaffPreferenceView, WeekCounts, WeekSlots,
};

const MAX_STAFF_REQUIREMENT: i64 = 50;

#[derive(Debug, Error)]
pub enum PreferenceError {
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Database(#[from] DatabaseError),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

pub struct PreferenceService {
    pool: PgPool,
}

impl PreferenceService {
    pub async fn new() -> Result<Self, DatabaseError> {
        let pool = DatabaseManager::pool().await?;
        Ok(Self { pool })
    }

    pub async fn find(&self, user_id: Uuid) -> Result<Option<PreferenceRow>, PreferenceError> {
        let row = sqlx::query_as::<_, PreferenceRow>(
            "SELECT * FROM work_preferences WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Read a user's record, creating it with empty defaults on first
    /// access.
    pub async fn get_or_create(&self, user_id: Uuid) -> Result<PreferenceView, PreferenceError> {
        if let Some(row) = self.find(user_id).await? {
            return Ok(row.into());
        }

        sqlx::query(
            r#"
            INSERT INTO work_preferences (user_id, preferences, staff_requirements)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(Json(WeekSlots::default()))
        .bind(Json(WeekCounts::default()))
        .execute(&self.pool)
        .await?;

        let row = self
            .find(user_id)
            .await?
            .ok_or_else(|| PreferenceError::Validation("Failed to create preferences".to_string()))?;
        Ok(row.into())
    }

    /// Validated partial update: either section may be omitted to keep
    /// its current value.
    pub async fn update(
        &self,
        user_id: Uuid,
        preferences: Option<WeekSlots>,
        staff_requirements: Option<WeekCounts>,
    ) -> Result<PreferenceView, PreferenceError> {
        if let Some(slots) = &preferences {
            validate_slots(slots)?;
        }
        if let Some(counts) = &staff_requirements {
            validate_requirements(counts)?;
        }

        let current = self.find(user_id).await?;
        let merged_slots = preferences
            .or_else(|| current.as_ref().map(|r| r.preferences.0.clone()))
            .unwrap_or_default();
        let merged_counts = staff_requirements
            .or_else(|| current.as_ref().map(|r| r.staff_requirements.0.clone()))
            .unwrap_or_default();

        let row = sqlx::query_as::<_, PreferenceRow>(
            r#"
            INSERT INTO work_preferences (user_id, preferences, staff_requirements)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id) DO UPDATE SET
                preferences = EXCLUDED.preferences,
                staff_requirements = EXCLUDED.staff_requirements,
                updated_at = now()
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(Json(merged_slots))
        .bind(Json(merged_counts))
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    /// Preference records for a manager's active staff, with contact
    /// fields for display.
    pub async fn for_staff_of(
        &self,
        manager_id: Uuid,
    ) -> Result<Vec<StaffPreferenceView>, PreferenceError> {
        #[derive(FromRow)]
        struct StaffPrefRow {
            user_id: Uuid,
            name: String,
            email: String,
            phone: Option<String>,
            preferences: Json<WeekSlots>,
            staff_requirements: Json<WeekCounts>,
        }

        let rows = sqlx::query_as::<_, StaffPrefRow>(
            r#"
            SELECT u.id AS user_id, u.name, u.email, u.phone,
                   p.preferences, p.staff_requirements
            FROM users u
            JOIN work_preferences p ON p.user_id = u.id
            WHERE u.manager_id = $1 AND u.role = 'staff' AND u.is_active
            ORDER BY u.name
            "#,
        )
        .bind(manager_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| StaffPreferenceView {
                user_id: r.user_id,
                name: r.name,
                email: r.email,
                phone: r.phone,
                preferences: r.preferences.0,
                staff_requirements: r.staff_requirements.0,
            })
            .collect())
    }
}

/// Format check only (`HH:MM-HH:MM`); out-of-range clock values are not
/// rejected, matching the stored-format contract.
pub fn is_valid_time_slot(slot: &str) -> bool {
    let bytes = slot.as_bytes();
    if bytes.len() != 11 {
        return false;
    }
    bytes.iter().enumerate().all(|(i, b)| match i {
        2 | 8 => *b == b':',
        5 => *b == b'-',
        _ => b.is_ascii_digit(),
    })
}

fn validate_slots(slots: &WeekSlots) -> Result<(), PreferenceError> {
    for (_, day_slots) in slots.days() {
        for slot in day_slots {
            if !is_valid_time_slot(slot) {
                return Err(PreferenceError::Validation(format!(
                    "Invalid time slot format: {}. Expected format: HH:MM-HH:MM",
                    slot
                )));
            }
        }
    }
    Ok(())
}

fn validate_requirements(counts: &WeekCounts) -> Result<(), PreferenceError> {
    for (day, count) in counts.days() {
        if !(0..=MAX_STAFF_REQUIREMENT).contains(&count) {
            return Err(PreferenceError::Validation(format!(
                "Invalid staff requirement for {}. Must be a number between 0 and 50.",
                day
            )));
        }
    }
    Ok(())
}
