use sqlx::PgPool;
use thiserror::Error;

use crate::auth::{generate_jwt, Claims, JwtError};
use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::user::UserRow;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error(transparent)]
    Jwt(#[from] JwtError),
    #[error(transparent)]
    Database(#[from] DatabaseError),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

pub struct AuthService {
    pool: PgPool,
}

impl AuthService {
    pub async fn new() -> Result<Self, DatabaseError> {
        let pool = DatabaseManager::pool().await?;
        Ok(Self { pool })
    }

    /// Look up an active account and verify the password against its
    /// bcrypt hash. Missing user and wrong password are the same error.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<UserRow, AuthError> {
        let user = sqlx::query_as::<_, UserRow>(
            "SELECT * FROM users WHERE username = $1 AND is_active",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

        let valid = bcrypt::verify(password, &user.password_hash).unwrap_or(false);
        if !valid {
            return Err(AuthError::InvalidCredentials);
        }

        Ok(user)
    }

    pub fn issue_token(&self, user: &UserRow) -> Result<String, AuthError> {
        let claims = Claims::new(user.id, user.username.clone(), user.role());
        Ok(generate_jwt(claims)?)
    }
}
