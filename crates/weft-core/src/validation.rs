//! # Validation Module
//!
//! Input validation for Weft records.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: CLI parsing (clap)                                           │
//! │  ├── Money / Weight / date parsing                                     │
//! │  └── Immediate error on malformed arguments                            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Record validation (THIS MODULE)                              │
//! │  ├── Required names, lengths, positive amounts and weights             │
//! │  └── Lot quantity invariants                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Repository (weft-db)                                         │
//! │  ├── Referenced records exist                                          │
//! │  └── UNIQUE (store, id)                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use weft_core::validation::{validate_name, validate_rolls};
//!
//! assert_eq!(validate_name("name", "  Navy Jersey ").unwrap(), "Navy Jersey");
//! assert!(validate_rolls(0).is_err());
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{
    Customer, InventoryLot, Payment, Product, ProductionCost, Supplier, SupplierPayment,
};
use crate::weight::Weight;
use crate::{MAX_AMOUNT, MAX_LOT_ROLLS, MAX_LOT_WEIGHT, MAX_UNIT_PRICE};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest name accepted for customers, suppliers and products.
pub const MAX_NAME_LEN: usize = 200;

/// Longest free-text note.
pub const MAX_NOTES_LEN: usize = 2000;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a required name and returns it trimmed.
///
/// ## Example
/// ```rust
/// use weft_core::validation::validate_name;
///
/// assert!(validate_name("name", "Acme Konfeksiyon").is_ok());
/// assert!(validate_name("name", "   ").is_err());
/// ```
pub fn validate_name(field: &str, value: &str) -> ValidationResult<String> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(value.to_string())
}

/// Validates a party (lot) number.
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters, no whitespace inside
pub fn validate_party(party: &str) -> ValidationResult<String> {
    let party = party.trim();

    if party.is_empty() {
        return Err(ValidationError::Required {
            field: "party".to_string(),
        });
    }

    if party.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "party".to_string(),
            max: 50,
        });
    }

    if party.chars().any(char::is_whitespace) {
        return Err(ValidationError::invalid_format("party", "must not contain spaces"));
    }

    Ok(party.to_string())
}

/// Validates optional free text; blank becomes `None`.
pub fn validate_optional_text(
    field: &str,
    value: Option<&str>,
    max: usize,
) -> ValidationResult<Option<String>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) if text.chars().count() > max => Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        }),
        Some(text) => Ok(Some(text.to_string())),
    }
}

/// Loose e-mail check: one `@` with text on both sides.
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let mut parts = email.trim().split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(ValidationError::invalid_format("email", "must look like name@example.com")),
    }
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a weight: positive and at most [`MAX_LOT_WEIGHT`].
pub fn validate_weight(field: &str, kg: Weight) -> ValidationResult<()> {
    if !kg.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }

    if kg > MAX_LOT_WEIGHT {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_LOT_WEIGHT.grams() / 1000,
        });
    }

    Ok(())
}

/// Validates the roll count of a lot (1 to [`MAX_LOT_ROLLS`]).
pub fn validate_rolls(rolls: u32) -> ValidationResult<()> {
    if rolls == 0 || rolls > MAX_LOT_ROLLS {
        return Err(ValidationError::OutOfRange {
            field: "rolls".to_string(),
            min: 1,
            max: MAX_LOT_ROLLS as i64,
        });
    }

    Ok(())
}

/// Validates a payment or cost amount.
///
/// ## Rules
/// - Must be positive (> 0)
/// - At most [`MAX_AMOUNT`]
pub fn validate_amount(field: &str, amount: Money) -> ValidationResult<()> {
    if !amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }

    if amount > MAX_AMOUNT {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_AMOUNT.cents() / 100,
        });
    }

    Ok(())
}

/// Validates a price per kg: 0 to [`MAX_UNIT_PRICE`]. Zero is allowed
/// (samples sent free).
pub fn validate_unit_price(price: Money) -> ValidationResult<()> {
    if price.is_negative() || price > MAX_UNIT_PRICE {
        return Err(ValidationError::OutOfRange {
            field: "unit price".to_string(),
            min: 0,
            max: MAX_UNIT_PRICE.cents() / 100,
        });
    }

    Ok(())
}

// =============================================================================
// Record Validators
// =============================================================================

fn check_notes(notes: &Option<String>) -> ValidationResult<()> {
    validate_optional_text("notes", notes.as_deref(), MAX_NOTES_LEN).map(|_| ())
}

pub fn validate_customer(customer: &Customer) -> ValidationResult<()> {
    validate_name("name", &customer.name)?;
    if let Some(email) = &customer.email {
        validate_email(email)?;
    }
    check_notes(&customer.notes)
}

pub fn validate_product(product: &Product) -> ValidationResult<()> {
    validate_name("name", &product.name)?;
    if let Some(width) = product.width_cm {
        if width == 0 || width > 1000 {
            return Err(ValidationError::OutOfRange {
                field: "width".to_string(),
                min: 1,
                max: 1000,
            });
        }
    }
    check_notes(&product.notes)
}

pub fn validate_supplier(supplier: &Supplier) -> ValidationResult<()> {
    validate_name("name", &supplier.name)?;
    if let Some(email) = &supplier.email {
        validate_email(email)?;
    }
    check_notes(&supplier.notes)
}

/// Validates a lot's fields and quantity invariants.
///
/// ## Rules
/// - total > 0, rolls ≥ 1
/// - 0 ≤ remaining ≤ total
/// - cost per kg, when given, is not negative
pub fn validate_lot(lot: &InventoryLot) -> ValidationResult<()> {
    validate_party(&lot.party)?;
    validate_rolls(lot.rolls)?;
    validate_weight("total kg", lot.total_kg)?;

    if lot.remaining_kg.is_negative() || lot.remaining_kg > lot.total_kg {
        return Err(ValidationError::OutOfRange {
            field: "remaining kg".to_string(),
            min: 0,
            max: lot.total_kg.grams() / 1000,
        });
    }

    if let Some(cost) = lot.cost_per_kg {
        if cost.is_negative() {
            return Err(ValidationError::MustBePositive {
                field: "cost per kg".to_string(),
            });
        }
        if cost > MAX_UNIT_PRICE {
            return Err(ValidationError::OutOfRange {
                field: "cost per kg".to_string(),
                min: 0,
                max: MAX_UNIT_PRICE.cents() / 100,
            });
        }
    }

    check_notes(&lot.notes)
}

pub fn validate_payment(payment: &Payment) -> ValidationResult<()> {
    validate_amount("amount", payment.amount)?;
    check_notes(&payment.notes)
}

pub fn validate_supplier_payment(payment: &SupplierPayment) -> ValidationResult<()> {
    validate_amount("amount", payment.amount)?;
    check_notes(&payment.notes)
}

pub fn validate_cost(cost: &ProductionCost) -> ValidationResult<()> {
    validate_name("description", &cost.description)?;
    validate_amount("amount", cost.amount)?;
    if let Some(kg) = cost.kg {
        validate_weight("kg", kg)?;
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
