//!
//! # Custom Error Handling
//!
//! This module defines the custom error type `AppError` used throughout the application.
//! Every failure a request can hit (a misconfigured signing secret, malformed input,
//! a missing or rejected credential, an absent record, a stale update or a storage
//! fault) is expressed as one of its variants.
//!
//! `AppError` implements `actix_web::error::ResponseError`, so handlers and the
//! authentication middleware can simply return it and Actix renders the matching
//! status code with a `{"error": "..."}` body. Server-side failures are logged with
//! their detail and answered with a generic message.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use log::{error, warn};
use serde_json::json;
use std::fmt;
use validator::ValidationErrors;

/// Fixed message shared by authentication and authorization failures, so a caller
/// cannot tell a bad token from a missing privilege.
pub const UNAUTHORIZED_MESSAGE: &str = "Usuario no autorizado para acceder a esta información.";

/// A write collided with a unique value already stored.
pub const DUPLICATE_MESSAGE: &str = "Ya existe un registro con ese valor.";
/// A write referenced a row that does not exist.
pub const MISSING_REFERENCE_MESSAGE: &str = "El registro referenciado no existe.";

/// Represents all possible errors that can occur within the application.
#[derive(Debug)]
pub enum AppError {
    /// The signing secret (or another startup setting) is absent or unusable (HTTP 500).
    Configuration(String),
    /// Missing, invalid or expired credentials, or insufficient privilege (HTTP 401).
    Unauthorized(String),
    /// Malformed or semantically invalid request (HTTP 400).
    BadRequest(String),
    /// Field-level validation failure reported by the `validator` crate (HTTP 400).
    ValidationError(String),
    /// The requested resource does not exist (HTTP 404).
    NotFound(String),
    /// The record changed since it was read; the update was not applied (HTTP 409).
    Conflict(String),
    /// Unexpected server-side failure (HTTP 500).
    InternalServerError(String),
    /// Error originating from the storage layer (HTTP 500).
    DatabaseError(String),
}

impl AppError {
    /// Shorthand for the uniform 401 outcome.
    pub fn unauthorized() -> Self {
        AppError::Unauthorized(UNAUTHORIZED_MESSAGE.into())
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::Configuration(msg) => write!(f, "Configuration Error: {}", msg),
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation Error: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::InternalServerError(msg) => write!(f, "Internal Server Error: {}", msg),
            AppError::DatabaseError(msg) => write!(f, "Database Error: {}", msg),
        }
    }
}

/// Converts `AppError` variants into `HttpResponse` objects.
///
/// Server-side variants never echo their detail to the client.
impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::BadRequest(_) | AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Configuration(_)
            | AppError::InternalServerError(_)
            | AppError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            AppError::Unauthorized(msg)
            | AppError::BadRequest(msg)
            | AppError::ValidationError(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg) => msg.clone(),
            AppError::Configuration(_)
            | AppError::InternalServerError(_)
            | AppError::DatabaseError(_) => {
                error!("{}", self);
                "Error interno del servidor.".to_string()
            }
        };
        HttpResponse::build(self.status_code()).json(json!({ "error": message }))
    }
}

/// Converts `sqlx::Error` into `AppError`.
///
/// `RowNotFound` becomes `NotFound`. Unique and foreign key violations are the
/// client's doing (an email already taken, an owner that no longer exists) and
/// become `BadRequest`; every other database error is a `DatabaseError`.
impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> AppError {
        if let sqlx::Error::Database(db) = &error {
            if db.is_unique_violation() {
                warn!("Unique constraint rejected a write: {}", db);
                return AppError::BadRequest(DUPLICATE_MESSAGE.into());
            }
            if db.is_foreign_key_violation() {
                warn!("Foreign key rejected a write: {}", db);
                return AppError::BadRequest(MISSING_REFERENCE_MESSAGE.into());
            }
        }
        match error {
            sqlx::Error::RowNotFound => AppError::NotFound("Registro no encontrado.".into()),
            _ => AppError::DatabaseError(error.to_string()),
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(error: ValidationErrors) -> AppError {
        AppError::ValidationError(error.to_string())
    }
}

/// Converts `bcrypt::BcryptError` into `AppError::InternalServerError`.
impl From<bcrypt::BcryptError> for AppError {
    fn from(error: bcrypt::BcryptError) -> AppError {
        AppError::InternalServerError(error.to_string())
    }
}
