// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::database::manager::DatabaseError;
use crate::lifecycle::TransitionError;
use crate::schedule::GeneratorError;
use crate::services::auth_service::AuthError;
use crate::services::preference_service::PreferenceError;
use crate::services::shift_service::ShiftError;
use crate::services::user_service::UserError;

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),

    // 401 Unauthorized
    Unauthorized(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict
    Conflict(String),

    // 500 Internal Server Error
    InternalServerError(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::Unauthorized(_) => 401,
            ApiError::Forbidden(_) => 403,
            ApiError::NotFound(_) => 404,
            ApiError::Conflict(_) => 409,
            ApiError::InternalServerError(_) => 500,
            ApiError::ServiceUnavailable(_) => 503,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::Unauthorized(msg) => msg,
            ApiError::Forbidden(msg) => msg,
            ApiError::NotFound(msg) => msg,
            ApiError::Conflict(msg) => msg,
            ApiError::InternalServerError(msg) => msg,
            ApiError::ServiceUnavailable(msg) => msg,
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        json!({
            "error": true,
            "message": self.message(),
            "code": self.error_code()
        })
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }
}

// Static constructor methods
impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }
}

// Convert other error types to ApiError
impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound(msg) => ApiError::not_found(msg),
            DatabaseError::ConfigMissing(name) => {
                tracing::error!("Missing configuration: {}", name);
                ApiError::service_unavailable("Database temporarily unavailable")
            }
            DatabaseError::InvalidDatabaseUrl => {
                tracing::error!("Invalid database URL");
                ApiError::service_unavailable("Database temporarily unavailable")
            }
            DatabaseError::MigrationError(msg) => {
                tracing::error!("Migration error: {}", msg);
                ApiError::service_unavailable("Service is being updated, please try again later")
            }
            DatabaseError::Sqlx(sqlx_err) => {
                // Log the real error but return a generic message
                tracing::error!("SQLx error: {}", sqlx_err);
                ApiError::internal_server_error("Database error occurred")
            }
        }
    }
}

impl From<TransitionError> for ApiError {
    fn from(err: TransitionError) -> Self {
        match err {
            TransitionError::PermissionDenied => ApiError::forbidden(err.to_string()),
            TransitionError::InvalidStatus | TransitionError::AlreadyClosed => {
                ApiError::bad_request(err.to_string())
            }
        }
    }
}

impl From<UserError> for ApiError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::NotFound => ApiError::not_found("User not found"),
            UserError::InvalidStaff | UserError::InvalidManager => {
                ApiError::bad_request(err.to_string())
            }
            UserError::Validation(msg) => ApiError::bad_request(msg),
            UserError::Duplicate(_) => ApiError::conflict(err.to_string()),
            UserError::Hash(e) => {
                tracing::error!("Password hash error: {}", e);
                ApiError::internal_server_error("Server error")
            }
            UserError::Database(e) => e.into(),
            UserError::Sqlx(e) => DatabaseError::Sqlx(e).into(),
        }
    }
}

impl From<ShiftError> for ApiError {
    fn from(err: ShiftError) -> Self {
        match err {
            ShiftError::NotFound => ApiError::not_found("Shift not found"),
            ShiftError::Database(e) => e.into(),
            ShiftError::Sqlx(e) => DatabaseError::Sqlx(e).into(),
        }
    }
}

impl From<PreferenceError> for ApiError {
    fn from(err: PreferenceError) -> Self {
        match err {
            PreferenceError::Validation(msg) => ApiError::bad_request(msg),
            PreferenceError::Database(e) => e.into(),
            PreferenceError::Sqlx(e) => DatabaseError::Sqlx(e).into(),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => ApiError::unauthorized("Invalid credentials"),
            AuthError::Jwt(e) => {
                tracing::error!("JWT error: {}", e);
                ApiError::internal_server_error("Server error")
            }
            AuthError::Database(e) => e.into(),
            AuthError::Sqlx(e) => DatabaseError::Sqlx(e).into(),
        }
    }
}

impl From<GeneratorError> for ApiError {
    fn from(err: GeneratorError) -> Self {
        match err {
            GeneratorError::Http(e) => {
                tracing::error!("Generator request failed: {}", e);
                ApiError::internal_server_error("Failed to generate schedule: upstream request failed")
            }
            // Upstream and malformed-response messages are surfaced so
            // the client can tell generation failures apart
            other => ApiError::internal_server_error(other.to_string()),
        }
    }
}

impl From<crate::auth::JwtError> for ApiError {
    fn from(err: crate::auth::JwtError) -> Self {
        tracing::error!("JWT error: {}", err);
        ApiError::internal_server_error("Server error")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = StatusCode::from_u16(self.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_errors_map_to_http_statuses() {
        assert_eq!(ApiError::from(TransitionError::InvalidStatus).status_code(), 400);
        assert_eq!(ApiError::from(TransitionError::AlreadyClosed).status_code(), 400);
        let forbidden = ApiError::from(TransitionError::PermissionDenied);
        assert_eq!(forbidden.status_code(), 403);
        assert_eq!(forbidden.message(), "Insufficient permissions");
    }

    #[test]
    fn invalid_credentials_is_401_with_exact_message() {
        let err = ApiError::from(AuthError::InvalidCredentials);
        assert_eq!(err.status_code(), 401);
        assert_eq!(err.to_json()["message"], "Invalid credentials");
    }

    #[test]
    fn duplicate_user_conflicts() {
        let err = ApiError::from(UserError::Duplicate("username or email"));
        assert_eq!(err.status_code(), 409);
    }
}
