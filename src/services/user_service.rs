use serde::Deserialize;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::user::{Role, UserRow, UserSummary, UserView};

#[derive(Debug, Error)]
pub enum UserError {
    #[error("User not found")]
    NotFound,
    #[error("Invalid staff user")]
    InvalidStaff,
    #[error("Invalid manager user")]
    InvalidManager,
    #[error("{0}")]
    Validation(String),
    #[error("A user with that {0} already exists")]
    Duplicate(&'static str),
    #[error("Password hash error: {0}")]
    Hash(#[from] bcrypt::BcryptError),
    #[error(transparent)]
    Database(#[from] DatabaseError),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: Role,
    pub manager_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUser {
    pub username: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub manager_id: Option<Uuid>,
}

pub struct UserService {
    pool: PgPool,
}

impl UserService {
    pub async fn new() -> Result<Self, DatabaseError> {
        let pool = DatabaseManager::pool().await?;
        Ok(Self { pool })
    }

    /// All active users, rosters populated for managers.
    pub async fn list_active(&self) -> Result<Vec<UserView>, UserError> {
        let rows = sqlx::query_as::<_, UserRow>(
            "SELECT * FROM users WHERE is_active ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut views = Vec::with_capacity(rows.len());
        for row in rows {
            views.push(self.view(row).await?);
        }
        Ok(views)
    }

    pub async fn create(&self, new_user: NewUser) -> Result<UserView, UserError> {
        if new_user.role == Role::Staff && new_user.manager_id.is_none() {
            return Err(UserError::Validation(
                "Staff users require a manager".to_string(),
            ));
        }
        if new_user.username.trim().is_empty() || new_user.password.is_empty() {
            return Err(UserError::Validation(
                "Username and password are required".to_string(),
            ));
        }

        let password_hash = bcrypt::hash(&new_user.password, bcrypt::DEFAULT_COST)?;

        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (username, password_hash, name, email, phone, role, manager_id)
            VALUES ($1, $2, $3, lower($4), $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(new_user.username.trim())
        .bind(&password_hash)
        .bind(new_user.name.trim())
        .bind(new_user.email.trim())
        .bind(&new_user.phone)
        .bind(new_user.role.as_str())
        .bind(new_user.manager_id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_unique)?;

        self.view(row).await
    }

    pub async fn find_row(&self, id: Uuid) -> Result<Option<UserRow>, UserError> {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<UserView>, UserError> {
        match self.find_row(id).await? {
            Some(row) => Ok(Some(self.view(row).await?)),
            None => Ok(None),
        }
    }

    pub async fn update(&self, id: Uuid, changes: UpdateUser) -> Result<Option<UserView>, UserError> {
        let password_hash = match &changes.password {
            Some(password) => Some(bcrypt::hash(password, bcrypt::DEFAULT_COST)?),
            None => None,
        };
        let email = changes.email.as_ref().map(|e| e.trim().to_lowercase());

        let row = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users SET
                username = COALESCE($2, username),
                password_hash = COALESCE($3, password_hash),
                name = COALESCE($4, name),
                email = COALESCE($5, email),
                phone = COALESCE($6, phone),
                manager_id = COALESCE($7, manager_id),
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&changes.username)
        .bind(&password_hash)
        .bind(&changes.name)
        .bind(&email)
        .bind(&changes.phone)
        .bind(changes.manager_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_unique)?;

        match row {
            Some(row) => Ok(Some(self.view(row).await?)),
            None => Ok(None),
        }
    }

    /// Soft delete. Deactivating a manager detaches the whole roster in
    /// the same transaction.
    pub async fn deactivate(&self, id: Uuid) -> Result<bool, UserError> {
        let Some(row) = self.find_row(id).await? else {
            return Ok(false);
        };

        let mut tx = self.pool.begin().await?;

        if row.role() == Role::Manager {
            sqlx::query("UPDATE users SET manager_id = NULL, updated_at = now() WHERE manager_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query("UPDATE users SET is_active = FALSE, updated_at = now() WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }

    pub async fn managers(&self) -> Result<Vec<UserView>, UserError> {
        let rows = sqlx::query_as::<_, UserRow>(
            "SELECT * FROM users WHERE role = 'manager' AND is_active ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut views = Vec::with_capacity(rows.len());
        for row in rows {
            views.push(self.view(row).await?);
        }
        Ok(views)
    }

    /// Active staff currently reporting to the given manager.
    pub async fn staff_of(&self, manager_id: Uuid) -> Result<Vec<UserView>, UserError> {
        let rows = sqlx::query_as::<_, UserRow>(
            "SELECT * FROM users WHERE manager_id = $1 AND role = 'staff' AND is_active ORDER BY name",
        )
        .bind(manager_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| UserView::from_row(r, Vec::new())).collect())
    }

    pub async fn roster_ids(&self, manager_id: Uuid) -> Result<Vec<Uuid>, UserError> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM users WHERE manager_id = $1 AND role = 'staff' AND is_active",
        )
        .bind(manager_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    pub async fn staff_count(&self, manager_id: Uuid) -> Result<i64, UserError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM users WHERE manager_id = $1 AND role = 'staff' AND is_active",
        )
        .bind(manager_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// Move a staff member under a manager. The roster is the inverse of
    /// `manager_id`, so this is a single-row write.
    pub async fn assign_staff(&self, staff_id: Uuid, manager_id: Uuid) -> Result<UserView, UserError> {
        let staff = self.find_row(staff_id).await?.ok_or(UserError::InvalidStaff)?;
        if staff.role() != Role::Staff {
            return Err(UserError::InvalidStaff);
        }

        let manager = self.find_row(manager_id).await?.ok_or(UserError::InvalidManager)?;
        if manager.role() != Role::Manager {
            return Err(UserError::InvalidManager);
        }

        sqlx::query("UPDATE users SET manager_id = $2, updated_at = now() WHERE id = $1")
            .bind(staff_id)
            .bind(manager_id)
            .execute(&self.pool)
            .await?;

        self.get(staff_id).await?.ok_or(UserError::NotFound)
    }

    pub async fn unassign_staff(&self, staff_id: Uuid) -> Result<UserView, UserError> {
        let staff = self.find_row(staff_id).await?.ok_or(UserError::InvalidStaff)?;
        if staff.role() != Role::Staff {
            return Err(UserError::InvalidStaff);
        }

        sqlx::query("UPDATE users SET manager_id = NULL, updated_at = now() WHERE id = $1")
            .bind(staff_id)
            .execute(&self.pool)
            .await?;

        self.get(staff_id).await?.ok_or(UserError::NotFound)
    }

    async fn view(&self, row: UserRow) -> Result<UserView, UserError> {
        let managed_staff = if row.role() == Role::Manager {
            sqlx::query_as::<_, UserSummary>(
                "SELECT id, username, name FROM users WHERE manager_id = $1 AND role = 'staff' AND is_active ORDER BY name",
            )
            .bind(row.id)
            .fetch_all(&self.pool)
            .await?
        } else {
            Vec::new()
        };

        Ok(UserView::from_row(row, managed_staff))
    }
}

fn map_unique(e: sqlx::Error) -> UserError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return UserError::Duplicate("username or email");
        }
    }
    UserError::Sqlx(e)
}
