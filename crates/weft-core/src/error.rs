//! # Errors
//!
//! Two layers: `ValidationError` for a bad field, `CoreError` for a rule the
//! ledger refuses to break (stock, references, edits that would rewrite
//! history). Both carry operator-readable text.
//!
//! ```text
//!   ValidationError ──► CoreError ──► DbError (weft-db) ──► AppError (weft)
//! ```

use thiserror::Error;

use crate::weight::Weight;

// =============================================================================
// Core Error
// =============================================================================

/// A ledger rule was violated.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A shipment line references a lot that was not supplied.
    #[error("Lot not found: {0}")]
    LotNotFound(String),

    /// Not enough stock left in a lot (or across a product's lots).
    ///
    /// ## User Workflow
    /// ```text
    /// Shipment line: lot P-1041, 300.00 kg
    ///      │
    ///      ▼
    /// Check lot: remaining 120.50 kg
    ///      │
    ///      ▼
    /// InsufficientStock { lot: "P-1041", available: 120.50, requested: 300.00 }
    /// ```
    #[error("Insufficient stock in {lot}: available {available}, requested {requested}")]
    InsufficientStock {
        lot: String,
        available: Weight,
        requested: Weight,
    },

    /// Restoring a shipment would push a lot above its total weight.
    #[error("Cannot restore {restored} to lot {lot}: only {room} was shipped from it")]
    OverRestore {
        lot: String,
        restored: Weight,
        room: Weight,
    },

    /// A line names a product that the referenced lot does not hold.
    #[error("Lot {lot} holds product {lot_product}, not {requested_product}")]
    ProductMismatch {
        lot: String,
        lot_product: String,
        requested_product: String,
    },

    /// A lot edit would set the total below what has already shipped.
    #[error("Lot {lot}: total {total} is below the {shipped} already shipped")]
    TotalBelowShipped {
        lot: String,
        total: Weight,
        shipped: Weight,
    },

    /// A record cannot be removed because other records reference it.
    #[error("{entity} {id} is referenced by {count} {referenced_by}")]
    InUse {
        entity: String,
        id: String,
        referenced_by: String,
        count: usize,
    },

    /// A shipment has more lines than allowed.
    #[error("Shipment cannot have more than {max} lines")]
    TooManyLines { max: usize },

    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    pub fn in_use(
        entity: impl Into<String>,
        id: impl Into<String>,
        referenced_by: impl Into<String>,
        count: usize,
    ) -> Self {
        CoreError::InUse {
            entity: entity.into(),
            id: id.into(),
            referenced_by: referenced_by.into(),
            count,
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// A single field failed its check. `field` is the name the operator typed.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Missing or blank.
    #[error("{field} is required")]
    Required { field: String },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Rolls, weights and lines have hard limits.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Unparseable amount, weight, date or `--line` value.
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Unknown payment method or cost category.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

impl ValidationError {
    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
