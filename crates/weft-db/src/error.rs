//! # Storage Errors
//!
//! What can go wrong between a repository call and the SQLite file.
//!
//! ```text
//!   sqlx::Error ──────────┐
//!   MigrateError ─────────┤
//!   bad JSON body ────────┼──► DbError ──► AppError (CLI) ──► exit code
//!   CoreError (rules) ────┘        │
//!                                  └── Core(..) stays transparent so the
//!                                      shortage / in-use text reaches the
//!                                      operator unchanged
//! ```

use thiserror::Error;
use weft_core::{CoreError, ValidationError};

/// Errors from the document store and the repositories on top of it.
#[derive(Debug, Error)]
pub enum DbError {
    /// No record with this id in its store.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A record with this id is already stored.
    #[error("{entity} {id} already exists")]
    Duplicate { entity: String, id: String },

    /// The database file could not be opened or the pool is gone.
    #[error("Cannot open database: {0}")]
    Open(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    /// SQLite rejected a statement.
    #[error("SQLite error: {0}")]
    Sqlite(String),

    /// BEGIN or COMMIT failed; nothing was written.
    #[error("Transaction failed: {0}")]
    Transaction(String),

    /// Every connection is busy or the file is locked by another writer.
    #[error("Database is busy")]
    Busy,

    /// A stored body does not match its record type.
    #[error("Unreadable {store} document: {reason}")]
    Document { store: String, reason: String },

    /// A query-by-field used a name that is not a plain field.
    #[error("Invalid field name: {0}")]
    InvalidField(String),

    /// A business rule rejected the operation.
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn duplicate(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::Duplicate {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn document(store: &str, err: serde_json::Error) -> Self {
        DbError::Document {
            store: store.to_string(),
            reason: err.to_string(),
        }
    }

    /// Maps a failed BEGIN / COMMIT.
    pub fn transaction(err: sqlx::Error) -> Self {
        DbError::Transaction(err.to_string())
    }

    /// True for an id that is already taken.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, DbError::Duplicate { .. })
    }
}

/// ```text
/// RowNotFound            → NotFound
/// UNIQUE failure         → Duplicate (collection fills in entity and id)
/// SQLITE_BUSY / timeout  → Busy
/// PoolClosed             → Open
/// anything else          → Sqlite
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "?"),
            sqlx::Error::Database(db_err) => {
                if db_err.is_unique_violation() {
                    DbError::duplicate("Record", "?")
                } else if db_err.code().as_deref() == Some("5") {
                    DbError::Busy
                } else {
                    DbError::Sqlite(db_err.message().to_string())
                }
            }
            sqlx::Error::PoolTimedOut => DbError::Busy,
            sqlx::Error::PoolClosed => DbError::Open("connection pool is closed".to_string()),
            other => DbError::Sqlite(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::Migration(err.to_string())
    }
}

impl From<ValidationError> for DbError {
    fn from(err: ValidationError) -> Self {
        DbError::Core(err.into())
    }
}

pub type DbResult<T> = Result<T, DbError>;
