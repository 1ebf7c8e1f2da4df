//! # weft-core: Pure Business Logic for Weft
//!
//! This crate is the **heart** of Weft. It contains the textile ledger's
//! business rules as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Weft Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    weft CLI (apps/cli)                          │   │
//! │  │    customer / lot / shipment / payment / report commands        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ weft-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │ inventory │  │  report   │  │   │
//! │  │   │   Lot     │  │  weight   │  │   FIFO    │  │  receipt  │  │   │
//! │  │   │ Shipment  │  │           │  │  reverse  │  │           │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    weft-db (Database Layer)                     │   │
//! │  │          SQLite document collections, transactions              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain records (Customer, InventoryLot, Shipment, ...)
//! - [`money`] - Money type with integer cents
//! - [`weight`] - Weight type with integer grams
//! - [`inventory`] - FIFO allocation and lot decrement/restore
//! - [`validation`] - Input validation
//! - [`report`] - Balances, statements, stock and sales aggregation
//! - [`receipt`] - Plain-text shipment receipts
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use weft_core::{Money, Weight};
//!
//! let price = Money::from_cents(450);        // $4.50 per kg
//! let kg = Weight::from_grams(25_300);        // 25.30 kg
//!
//! assert_eq!(price.for_weight(kg), Some(Money::from_cents(11385)));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod inventory;
pub mod money;
pub mod receipt;
pub mod report;
pub mod types;
pub mod validation;
pub mod weight;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use inventory::{Allocation, LotPick};
pub use money::Money;
pub use types::*;
pub use weight::Weight;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum lines allowed in a single shipment.
///
/// ## Business Reason
/// A delivery note that runs past a hundred lots is almost certainly a
/// data entry mistake.
pub const MAX_SHIPMENT_LINES: usize = 100;

/// Maximum rolls recorded on a single lot.
pub const MAX_LOT_ROLLS: u32 = 10_000;

/// Maximum weight accepted for a single lot or line (100 tonnes).
pub const MAX_LOT_WEIGHT: Weight = Weight::from_grams(100_000_000);

/// Maximum price per kilogram on a shipment line ($100,000).
///
/// Together with [`MAX_LOT_WEIGHT`] this caps a line total at 10^12
/// cents, so a shipment of [`MAX_SHIPMENT_LINES`] lines sums well inside
/// an i64.
pub const MAX_UNIT_PRICE: Money = Money::from_cents(10_000_000);

/// Maximum single payment or cost amount ($10 billion).
pub const MAX_AMOUNT: Money = Money::from_cents(1_000_000_000_000);
