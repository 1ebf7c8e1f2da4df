//! # Command Error Type
//!
//! Unified error type for CLI commands.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Weft                                   │
//! │                                                                         │
//! │  weft shipment create ...                                              │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Command Function                                                │  │
//! │  │  Result<(), AppError>                                            │  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Database Error? ─── DbError::Sqlite("...")      ──┐            │  │
//! │  │         │                                          │            │  │
//! │  │         ▼                                          ▼            │  │
//! │  │  Business Error? ─── CoreError::InsufficientStock ─ AppError ──►│  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  stderr: "error: Insufficient stock in P-1041: available ..."          │
//! │  exit code: ErrorCode::exit_code()                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Internal causes (SQL text, transaction failures) are logged with
//! `tracing::error!`; the operator only sees a one-line message.

use serde::Serialize;
use std::fmt;
use weft_core::{CoreError, ValidationError};
use weft_db::DbError;

/// Error returned from CLI commands.
///
/// With `--json` it is printed as:
/// ```json
/// { "code": "NOT_FOUND", "message": "Customer not found: 1f0c..." }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct AppError {
    /// Machine-readable error code
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,
}

pub type AppResult<T> = Result<T, AppError>;

/// Error codes for command failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Record not found
    NotFound,

    /// Input validation failed
    ValidationError,

    /// Not enough stock for a shipment line
    InsufficientStock,

    /// Record is still referenced by others
    InUse,

    /// Other business rule violation
    BusinessLogic,

    /// Database operation failed
    DatabaseError,

    /// Internal error
    Internal,
}

impl ErrorCode {
    /// Process exit code for this kind of failure.
    pub fn exit_code(self) -> u8 {
        match self {
            ErrorCode::Internal => 1,
            ErrorCode::ValidationError => 2,
            ErrorCode::NotFound => 3,
            ErrorCode::InsufficientStock => 4,
            ErrorCode::InUse | ErrorCode::BusinessLogic => 5,
            ErrorCode::DatabaseError => 10,
        }
    }
}

impl AppError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        AppError {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &str, id: &str) -> Self {
        AppError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        AppError::new(ErrorCode::ValidationError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        AppError::new(ErrorCode::Internal, message)
    }
}

/// Storage failures. Rule violations pass through with their own text;
/// SQLite detail only goes to the log.
impl From<DbError> for AppError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => AppError::not_found(&entity, &id),
            DbError::Duplicate { entity, id } => {
                AppError::validation(format!("{} {} already exists", entity, id))
            }
            DbError::InvalidField(field) => AppError::internal(format!("invalid field name: {}", field)),
            DbError::Busy => AppError::new(
                ErrorCode::DatabaseError,
                "Database is busy, try again",
            ),
            DbError::Core(e) => AppError::from(e),
            other => {
                tracing::error!(error = %other, "Database failure");
                let message = match other {
                    DbError::Open(_) => "Cannot open database",
                    DbError::Migration(_) => "Database migration failed",
                    DbError::Transaction(_) => "Database transaction failed",
                    DbError::Document { .. } => "Stored record is unreadable",
                    _ => "Database operation failed",
                };
                AppError::new(ErrorCode::DatabaseError, message)
            }
        }
    }
}

/// Converts core errors to command errors.
impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        let code = match &err {
            CoreError::LotNotFound(_) => ErrorCode::NotFound,
            CoreError::InsufficientStock { .. } => ErrorCode::InsufficientStock,
            CoreError::InUse { .. } => ErrorCode::InUse,
            CoreError::Validation(_) | CoreError::TooManyLines { .. } => ErrorCode::ValidationError,
            CoreError::OverRestore { .. }
            | CoreError::ProductMismatch { .. }
            | CoreError::TotalBelowShipped { .. } => ErrorCode::BusinessLogic,
        };
        AppError::new(code, err.to_string())
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::validation(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::internal(format!("JSON output failed: {}", err))
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for AppError {}
