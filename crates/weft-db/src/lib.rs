//! # weft-db: Database Layer for Weft
//!
//! SQLite persistence for the textile lot ledger, built on sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Weft Data Flow                                 │
//! │                                                                         │
//! │  weft shipment create --customer ... --line LOT:KG:PRICE               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     weft-db (THIS CRATE)                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories  │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │                │    │  (embedded)  │  │   │
//! │  │   │               │    │ Collection<T>  │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ LotRepo        │    │ 001_init.sql │  │   │
//! │  │   │ WAL mode      │    │ ShipmentRepo   │    │              │  │   │
//! │  │   │               │    │ LedgerRepo     │    │              │  │   │
//! │  │   │               │    │ ReportRepo     │    │              │  │   │
//! │  │   └───────────────┘    └────────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │   SQLite: documents(store, id, body JSON, created_at, ...)     │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Collections and the transactional repositories
//!
//! ## Usage
//!
//! ```rust,ignore
//! use weft_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("weft.db")).await?;
//! let lots = db.lots().list_for_product(&product_id).await?;
//! let balances = db.reports().customer_balances().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::collection::Collection;
pub use repository::ledger::LedgerRepository;
pub use repository::lot::{LotEdit, LotRepository, NewLot};
pub use repository::report::ReportRepository;
pub use repository::shipment::{FifoShipment, NewShipment, ShipmentRepository};
