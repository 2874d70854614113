use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Account role. Managers run a roster of staff; staff get assigned shifts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Manager,
    Staff,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Manager => "manager",
            Role::Staff => "staff",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "manager" => Some(Role::Manager),
            "staff" => Some(Role::Staff),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw users row. Role is stored as text and narrowed at the edges.
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: String,
    pub manager_id: Option<Uuid>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRow {
    pub fn role(&self) -> Role {
        // Column is CHECK-constrained to the two known roles
        Role::parse(&self.role).unwrap_or(Role::Staff)
    }
}

/// Short user projection embedded in related records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
    pub name: String,
}

/// A reference to a user as it appears on the wire: either a bare
/// identifier or a populated summary carrying its own id. All equality
/// checks go through [`UserRef::id`] - never compare the raw structures.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserRef {
    Id(Uuid),
    Summary(UserSummary),
}

impl UserRef {
    /// The single identifier-extraction point for both representations.
    pub fn id(&self) -> Uuid {
        match self {
            UserRef::Id(id) => *id,
            UserRef::Summary(summary) => summary.id,
        }
    }
}

impl From<Uuid> for UserRef {
    fn from(id: Uuid) -> Self {
        UserRef::Id(id)
    }
}

/// User as returned by the API: password hash stripped, roster computed
/// from the inverse of `manager_id`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: Uuid,
    pub username: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: Role,
    pub manager_id: Option<Uuid>,
    pub managed_staff: Vec<UserSummary>,
    pub staff_count: usize,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserView {
    pub fn from_row(row: UserRow, managed_staff: Vec<UserSummary>) -> Self {
        let role = row.role();
        Self {
            id: row.id,
            username: row.username,
            name: row.name,
            email: row.email,
            phone: row.phone,
            role,
            manager_id: row.manager_id,
            staff_count: managed_staff.len(),
            managed_staff,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn user_ref_accepts_bare_id_and_populated_object() {
        let id = Uuid::new_v4();

        let bare: UserRef = serde_json::from_value(json!(id.to_string())).unwrap();
        let populated: UserRef = serde_json::from_value(json!({
            "id": id.to_string(),
            "username": "sam",
            "name": "Sam Doe",
        }))
        .unwrap();

        assert_eq!(bare.id(), id);
        assert_eq!(populated.id(), id);
    }
}
