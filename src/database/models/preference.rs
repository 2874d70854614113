use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

/// Weekly availability: a list of `HH:MM-HH:MM` slots per day.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeekSlots {
    #[serde(default)]
    pub monday: Vec<String>,
    #[serde(default)]
    pub tuesday: Vec<String>,
    #[serde(default)]
    pub wednesday: Vec<String>,
    #[serde(default)]
    pub thursday: Vec<String>,
    #[serde(default)]
    pub friday: Vec<String>,
    #[serde(default)]
    pub saturday: Vec<String>,
    #[serde(default)]
    pub sunday: Vec<String>,
}

impl WeekSlots {
    pub fn days(&self) -> [(&'static str, &Vec<String>); 7] {
        [
            ("monday", &self.monday),
            ("tuesday", &self.tuesday),
            ("wednesday", &self.wednesday),
            ("thursday", &self.thursday),
            ("friday", &self.friday),
            ("saturday", &self.saturday),
            ("sunday", &self.sunday),
        ]
    }

    pub fn any_slot(&self) -> bool {
        self.days().iter().any(|(_, slots)| !slots.is_empty())
    }
}

/// Per-day required staff headcount (meaningful for managers).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeekCounts {
    #[serde(default)]
    pub monday: i64,
    #[serde(default)]
    pub tuesday: i64,
    #[serde(default)]
    pub wednesday: i64,
    #[serde(default)]
    pub thursday: i64,
    #[serde(default)]
    pub friday: i64,
    #[serde(default)]
    pub saturday: i64,
    #[serde(default)]
    pub sunday: i64,
}

impl WeekCounts {
    pub fn days(&self) -> [(&'static str, i64); 7] {
        [
            ("monday", self.monday),
            ("tuesday", self.tuesday),
            ("wednesday", self.wednesday),
            ("thursday", self.thursday),
            ("friday", self.friday),
            ("saturday", self.saturday),
            ("sunday", self.sunday),
        ]
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct PreferenceRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub preferences: Json<WeekSlots>,
    pub staff_requirements: Json<WeekCounts>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// What `GET /api/preferences/:userId` returns.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferenceView {
    pub preferences: WeekSlots,
    pub staff_requirements: WeekCounts,
}

impl From<PreferenceRow> for PreferenceView {
    fn from(row: PreferenceRow) -> Self {
        Self {
            preferences: row.preferences.0,
            staff_requirements: row.staff_requirements.0,
        }
    }
}

/// One managed staff member's preference record with contact fields,
/// as listed by `GET /api/preferences/staff`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffPreferenceView {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub preferences: WeekSlots,
    pub staff_requirements: WeekCounts,
}
