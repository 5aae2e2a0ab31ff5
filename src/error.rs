use thiserror::Error;
use actix_web::{ResponseError, HttpResponse, http::StatusCode};
use serde_json::json;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication error: {0}")]
    AuthError(#[from] AuthError),

    #[error("Ad error: {0}")]
    AdError(#[from] AdError),

    #[error("Database error: {0}")]
    DatabaseError(#[from] DatabaseError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Request deadline exceeded")]
    Timeout,

    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl AppError {
    /// Stable machine-readable error kind, safe to hand to clients.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::AuthError(AuthError::UserExists) => "user_exists",
            AppError::AuthError(AuthError::InvalidCredentials) => "invalid_credentials",
            AppError::AuthError(AuthError::InvalidToken) => "invalid_token",
            AppError::AuthError(AuthError::HashingError) => "internal_error",
            AppError::AdError(AdError::AccessDenied) => "access_denied",
            AppError::AdError(AdError::NotFound) => "not_found",
            AppError::DatabaseError(DatabaseError::NotFound) => "not_found",
            AppError::DatabaseError(DatabaseError::Duplicate) => "conflict",
            AppError::DatabaseError(_) => "transient_store_error",
            AppError::ConfigError(_) => "config_error",
            AppError::ValidationError(_) => "validation_error",
            AppError::Timeout => "timeout",
            AppError::InternalError(_) => "internal_error",
        }
    }

    /// Human readable message that never carries storage, hashing or key details.
    pub fn public_message(&self) -> String {
        match self {
            AppError::AuthError(AuthError::HashingError) => "Internal server error".to_string(),
            AppError::AuthError(e) => e.to_string(),
            AppError::AdError(e) => e.to_string(),
            AppError::DatabaseError(DatabaseError::NotFound) => "Record not found".to_string(),
            AppError::DatabaseError(DatabaseError::Duplicate) => "Record already exists".to_string(),
            AppError::DatabaseError(_) => "Storage is temporarily unavailable".to_string(),
            AppError::ValidationError(msg) => msg.clone(),
            AppError::Timeout => "Request deadline exceeded".to_string(),
            AppError::ConfigError(_) | AppError::InternalError(_) => {
                "Internal server error".to_string()
            }
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(err.to_string())
    }
}

impl From<tokio::time::error::Elapsed> for AppError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        AppError::Timeout
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let response = json!({
            "error": {
                "status": status.as_u16(),
                "kind": self.kind(),
                "message": self.public_message()
            }
        });
        HttpResponse::build(status).json(response)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::AuthError(e) => match e {
                AuthError::UserExists => StatusCode::CONFLICT,
                AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                AuthError::InvalidToken => StatusCode::UNAUTHORIZED,
                AuthError::HashingError => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::AdError(AdError::AccessDenied) => StatusCode::FORBIDDEN,
            AppError::AdError(AdError::NotFound) => StatusCode::NOT_FOUND,
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::Timeout => StatusCode::SERVICE_UNAVAILABLE,
            AppError::DatabaseError(DatabaseError::NotFound) => StatusCode::NOT_FOUND,
            AppError::DatabaseError(DatabaseError::Duplicate) => StatusCode::CONFLICT,
            AppError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::ConfigError(_) | AppError::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("User with this username already exists")]
    UserExists,

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Password hashing failed")]
    HashingError,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdError {
    #[error("Ad not found")]
    NotFound,

    #[error("Access denied")]
    AccessDenied,
}

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Query error in {op}: {message}")]
    QueryError { op: &'static str, message: String },

    #[error("Migration error: {0}")]
    MigrationError(String),

    #[error("Record not found")]
    NotFound,

    #[error("Duplicate record")]
    Duplicate,
}

impl DatabaseError {
    /// Classify a sqlx failure, tagging it with the repository operation that raised it.
    pub fn from_sqlx(op: &'static str, err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DatabaseError::NotFound,
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                DatabaseError::Duplicate
            }
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                DatabaseError::ConnectionError(format!("{op}: {err}"))
            }
            _ => DatabaseError::QueryError {
                op,
                message: err.to_string(),
            },
        }
    }
}

/// Failures of the cache store. These never reach a caller; the caching
/// repository logs them and falls back to the durable store.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache connection error: {0}")]
    Connection(String),

    #[error("Cache command failed: {0}")]
    Command(String),

    #[error("Cache payload could not be (de)serialized: {0}")]
    Serialization(String),

    #[error("Cache operation timed out")]
    Timeout,
}

impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_connection_dropped() || err.is_connection_refusal() || err.is_io_error() {
            CacheError::Connection(err.to_string())
        } else {
            CacheError::Command(err.to_string())
        }
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        CacheError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let app_err: AppError = io_err.into();
        assert!(matches!(app_err, AppError::InternalError(_)));

        let config_err = config::ConfigError::NotFound(String::from("key not found"));
        let app_err: AppError = config_err.into();
        assert!(matches!(app_err, AppError::ConfigError(_)));

        let db_err = DatabaseError::from_sqlx("ads.find_by_id", sqlx::Error::RowNotFound);
        assert!(matches!(db_err, DatabaseError::NotFound));

        let db_err = DatabaseError::from_sqlx("ads.list", sqlx::Error::PoolTimedOut);
        assert!(matches!(db_err, DatabaseError::ConnectionError(_)));
    }

    #[test]
    fn test_error_status_codes() {
        let cases = [
            (AppError::AuthError(AuthError::UserExists), StatusCode::CONFLICT),
            (AppError::AuthError(AuthError::InvalidCredentials), StatusCode::UNAUTHORIZED),
            (AppError::AuthError(AuthError::InvalidToken), StatusCode::UNAUTHORIZED),
            (AppError::AdError(AdError::AccessDenied), StatusCode::FORBIDDEN),
            (AppError::AdError(AdError::NotFound), StatusCode::NOT_FOUND),
            (AppError::ValidationError("bad".into()), StatusCode::BAD_REQUEST),
            (AppError::Timeout, StatusCode::SERVICE_UNAVAILABLE),
            (
                AppError::DatabaseError(DatabaseError::ConnectionError("down".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.status_code(), expected, "status for {err:?}");
        }
    }

    #[test]
    fn test_error_kinds_are_stable() {
        assert_eq!(AppError::from(AuthError::UserExists).kind(), "user_exists");
        assert_eq!(AppError::from(AuthError::InvalidCredentials).kind(), "invalid_credentials");
        assert_eq!(AppError::from(AuthError::InvalidToken).kind(), "invalid_token");
        assert_eq!(AppError::from(AdError::AccessDenied).kind(), "access_denied");
        assert_eq!(AppError::from(AdError::NotFound).kind(), "not_found");
        assert_eq!(AppError::from(DatabaseError::Duplicate).kind(), "conflict");
        assert_eq!(
            AppError::from(DatabaseError::Duplicate).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::from(DatabaseError::ConnectionError("refused".into())).kind(),
            "transient_store_error"
        );
    }

    #[test]
    fn test_public_message_hides_internals() {
        let err = AppError::DatabaseError(DatabaseError::QueryError {
            op: "users.create",
            message: "syntax error at or near \"SELEC\"".into(),
        });
        assert!(err.to_string().contains("users.create"));
        assert_eq!(err.public_message(), "Storage is temporarily unavailable");

        let err = AppError::ConfigError("jwt secret is empty".into());
        assert_eq!(err.public_message(), "Internal server error");

        let err = AppError::AuthError(AuthError::HashingError);
        assert_eq!(err.public_message(), "Internal server error");
    }

    #[test]
    fn test_error_display() {
        let err = AppError::ValidationError("test error".to_string());
        assert_eq!(err.to_string(), "Validation error: test error");

        let err = AppError::AuthError(AuthError::InvalidCredentials);
        assert_eq!(err.to_string(), "Authentication error: Invalid username or password");

        let err = AppError::DatabaseError(DatabaseError::NotFound);
        assert_eq!(err.to_string(), "Database error: Record not found");
    }

    #[actix_web::test]
    async fn test_error_response_body() {
        let err = AppError::AdError(AdError::AccessDenied);
        let resp = err.error_response();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let body = actix_web::body::to_bytes(resp.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"]["status"], 403);
        assert_eq!(json["error"]["kind"], "access_denied");
        assert_eq!(json["error"]["message"], "Access denied");
    }
}
