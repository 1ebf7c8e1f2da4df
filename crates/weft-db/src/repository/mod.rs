//! # Repository Module
//!
//! Database repositories for Weft.
//!
//! ## Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  CLI command                                                           │
//! │       │                                                                 │
//! │       │  db.shipments().create(draft)                                  │
//! │       ▼                                                                 │
//! │  ShipmentRepository / LotRepository / LedgerRepository                 │
//! │       │   one transaction per operation                                │
//! │       ▼                                                                 │
//! │  collection::{insert, get, update, delete, find_by, ...}               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  documents table                                                       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`collection::Collection`] - Generic CRUD for any `Entity`
//! - [`lot::LotRepository`] - Lot receipt, edits, guarded deletes
//! - [`shipment::ShipmentRepository`] - Stock-moving shipment flows
//! - [`ledger::LedgerRepository`] - Parties, payments, production costs
//! - [`report::ReportRepository`] - Balances, statements, stock, sales

pub mod collection;
pub mod ledger;
pub mod lot;
pub mod report;
pub mod shipment;
