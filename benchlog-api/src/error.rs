//! API errors.
//!
//! Everything a handler can fail with becomes an [`ApiError`]; its
//! [`ErrorCode`] picks the HTTP status. Core, Postgres and pool errors are
//! converted here so handlers can use `?` throughout.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use benchlog_core::{BenchError, StorageError, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Wire code of an [`ApiError`], serialized in SCREAMING_SNAKE_CASE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // 401
    Unauthorized,
    InvalidToken,
    TokenExpired,

    // 400 / 413
    InvalidInput,
    MissingField,
    PayloadTooLarge,

    // 404 / 409
    EntityNotFound,
    EntityAlreadyExists,

    // 500 / 503
    InternalError,
    DatabaseError,
    ServiceUnavailable,
    /// No pooled connection became free before the wait timeout.
    ConnectionPoolExhausted,
}

impl ErrorCode {
    pub fn status_code(&self) -> StatusCode {
        use ErrorCode::*;
        match self {
            Unauthorized | InvalidToken | TokenExpired => StatusCode::UNAUTHORIZED,
            InvalidInput | MissingField => StatusCode::BAD_REQUEST,
            PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            EntityNotFound => StatusCode::NOT_FOUND,
            EntityAlreadyExists => StatusCode::CONFLICT,
            InternalError | DatabaseError => StatusCode::INTERNAL_SERVER_ERROR,
            ServiceUnavailable | ConnectionPoolExhausted => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// ============================================================================
// API ERROR
// ============================================================================

/// Error body returned by every failing endpoint: `{code, message, details?}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,

    /// Extra context, e.g. `{"field": "ids"}`.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Object>))]
    pub details: Option<serde_json::Value>,
}

/// One `fn name(message) -> ApiError` per listed code.
macro_rules! message_constructors {
    ($($name:ident => $code:ident),* $(,)?) => {
        $(
            pub fn $name(message: impl Into<String>) -> Self {
                Self::new(ErrorCode::$code, message)
            }
        )*
    };
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn status_code(&self) -> StatusCode {
        self.code.status_code()
    }

    message_constructors! {
        unauthorized => Unauthorized,
        invalid_token => InvalidToken,
        invalid_input => InvalidInput,
        payload_too_large => PayloadTooLarge,
        entity_already_exists => EntityAlreadyExists,
        internal_error => InternalError,
        database_error => DatabaseError,
        service_unavailable => ServiceUnavailable,
    }

    pub fn token_expired() -> Self {
        Self::new(ErrorCode::TokenExpired, "Token has expired")
    }

    /// `{"field": ...}` goes in the details so clients can highlight it.
    pub fn missing_field(field: &str) -> Self {
        Self::new(ErrorCode::MissingField, format!("{} is required", field))
            .with_details(serde_json::json!({ "field": field }))
    }

    /// `"{entity_type} with id {id} not found"`.
    pub fn entity_not_found(entity_type: &str, id: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::EntityNotFound,
            format!("{} with id {} not found", entity_type, id),
        )
    }

    pub fn connection_pool_exhausted() -> Self {
        Self::new(
            ErrorCode::ConnectionPoolExhausted,
            "No database connection available",
        )
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self)).into_response()
    }
}

// ============================================================================
// CONVERSIONS FROM CORE ERRORS
// ============================================================================

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::RequiredFieldMissing { field } => ApiError::missing_field(&field),
            ValidationError::InvalidValue { field, reason } => {
                ApiError::invalid_input(format!("Invalid value for {}: {}", field, reason))
                    .with_details(serde_json::json!({ "field": field }))
            }
        }
    }
}

impl From<BenchError> for ApiError {
    fn from(err: BenchError) -> Self {
        match err {
            BenchError::Storage(StorageError::NotFound { entity_type, id }) => {
                ApiError::entity_not_found(entity_type.display_name(), id)
            }
            BenchError::Storage(StorageError::Duplicate { reason, .. }) => {
                ApiError::entity_already_exists(reason)
            }
            BenchError::Storage(StorageError::Unavailable { reason }) => {
                tracing::error!(%reason, "Storage unavailable");
                ApiError::service_unavailable("Storage is temporarily unavailable")
            }
            BenchError::Storage(other) => {
                // Log the full error; callers only see a generic message
                tracing::error!(error = %other, "Storage error");
                ApiError::database_error("Database operation failed")
            }
            BenchError::Validation(validation) => validation.into(),
            BenchError::Config(config) => {
                tracing::error!(error = %config, "Configuration error");
                ApiError::internal_error("Server configuration error")
            }
        }
    }
}

// ============================================================================
// CONVERSIONS FROM DRIVER ERRORS
// ============================================================================

impl From<tokio_postgres::Error> for ApiError {
    fn from(err: tokio_postgres::Error) -> Self {
        tracing::error!(error = ?err, "Postgres error");
        ApiError::database_error("Database operation failed")
    }
}

impl From<deadpool_postgres::PoolError> for ApiError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        tracing::error!(error = ?err, "Pool error");

        match err {
            deadpool_postgres::PoolError::Timeout(_) => ApiError::connection_pool_exhausted(),
            deadpool_postgres::PoolError::Closed => {
                ApiError::service_unavailable("Database connection pool is closed")
            }
            _ => ApiError::database_error("Failed to acquire database connection"),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::invalid_input(format!("Invalid JSON: {}", err))
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
