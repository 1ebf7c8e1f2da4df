//! # Domain Types
//!
//! Records persisted by Weft.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌──────────────┐      ┌────────────────┐      ┌──────────────────┐    │
//! │  │   Product    │◄─────│  InventoryLot  │◄─────│  ShipmentLine    │    │
//! │  │  name, color │      │  party, rolls  │      │  kg × unit price │    │
//! │  └──────────────┘      │  total/remain  │      └────────┬─────────┘    │
//! │                        │  status        │               │              │
//! │                        └────────────────┘      ┌────────▼─────────┐    │
//! │  ┌──────────────┐                              │    Shipment      │    │
//! │  │   Customer   │◄─────────────────────────────│  number, date    │    │
//! │  │              │◄──────┐                      └──────────────────┘    │
//! │  └──────────────┘       │  ┌──────────┐                                │
//! │                         └──│ Payment  │                                │
//! │                            └──────────┘                                │
//! │  ┌──────────────┐  ┌─────────────────┐  ┌────────────────┐             │
//! │  │   Supplier   │◄─│ SupplierPayment │  │ ProductionCost │             │
//! │  └──────────────┘  └─────────────────┘  └────────────────┘             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every record carries a UUID v4 `id` plus `created_at`/`updated_at`,
//! which the persistence layer stamps on write.

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::ValidationError;
use crate::money::Money;
use crate::weight::Weight;

/// Generates a new record ID.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Entity Trait
// =============================================================================

/// A record stored in a named collection.
///
/// `STORE` is the logical collection name the persistence layer files the
/// record under; `NAME` is used in error messages.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + Unpin + 'static {
    const STORE: &'static str;
    const NAME: &'static str;

    fn id(&self) -> &str;

    fn created_at(&self) -> DateTime<Utc>;

    fn set_timestamps(&mut self, created_at: DateTime<Utc>, updated_at: DateTime<Utc>);
}

macro_rules! impl_entity {
    ($ty:ty, $store:literal, $name:literal) => {
        impl Entity for $ty {
            const STORE: &'static str = $store;
            const NAME: &'static str = $name;

            fn id(&self) -> &str {
                &self.id
            }

            fn created_at(&self) -> DateTime<Utc> {
                self.created_at
            }

            fn set_timestamps(&mut self, created_at: DateTime<Utc>, updated_at: DateTime<Utc>) {
                self.created_at = created_at;
                self.updated_at = updated_at;
            }
        }
    };
}

// =============================================================================
// Customer
// =============================================================================

/// A buyer of fabric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    /// Tax office / tax number as printed on invoices.
    #[serde(default)]
    pub tax_number: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Customer {
            id: new_id(),
            name: name.into(),
            phone: None,
            email: None,
            address: None,
            tax_number: None,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }
}

impl_entity!(Customer, "customers", "Customer");

// =============================================================================
// Product
// =============================================================================

/// A fabric article (e.g. "Single Jersey 30/1, Navy").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    /// Short article code.
    #[serde(default)]
    pub code: Option<String>,
    /// Fibre composition, e.g. "95% cotton 5% elastane".
    #[serde(default)]
    pub composition: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    /// Open width in centimetres.
    #[serde(default)]
    pub width_cm: Option<u32>,
    #[serde(default)]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Product {
            id: new_id(),
            name: name.into(),
            code: None,
            composition: None,
            color: None,
            width_cm: None,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Name with color appended when known, for receipts and reports.
    pub fn display_name(&self) -> String {
        match &self.color {
            Some(color) if !color.is_empty() => format!("{} ({})", self.name, color),
            _ => self.name.clone(),
        }
    }
}

impl_entity!(Product, "products", "Product");

// =============================================================================
// Lot Status
// =============================================================================

/// Stock state of a lot, derived from its remaining and total weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LotStatus {
    /// Nothing shipped yet (remaining == total).
    InStock,
    /// Partly shipped.
    Partial,
    /// Fully shipped (remaining == 0).
    Depleted,
}

impl LotStatus {
    /// Derives the status from quantities.
    ///
    /// ## Rules
    /// ```text
    /// remaining == 0      → Depleted
    /// remaining == total  → InStock
    /// otherwise           → Partial
    /// ```
    pub fn from_quantities(remaining: Weight, total: Weight) -> Self {
        if remaining.is_zero() {
            LotStatus::Depleted
        } else if remaining == total {
            LotStatus::InStock
        } else {
            LotStatus::Partial
        }
    }
}

impl fmt::Display for LotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LotStatus::InStock => write!(f, "in stock"),
            LotStatus::Partial => write!(f, "partial"),
            LotStatus::Depleted => write!(f, "depleted"),
        }
    }
}

// =============================================================================
// Inventory Lot
// =============================================================================

/// A batch of fabric received into stock.
///
/// ## Lifecycle
/// ```text
/// create ──► remaining = total, InStock
///    │
///    ├── shipment created ──► remaining -= kg  (Partial / Depleted)
///    │
///    └── shipment deleted ──► remaining += kg  (back towards InStock)
/// ```
/// `0 ≤ remaining_kg ≤ total_kg` holds at every step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryLot {
    pub id: String,
    pub product_id: String,
    /// Party (lot) number printed on the rolls.
    pub party: String,
    /// Date the lot was received; FIFO order key.
    pub date: NaiveDate,
    pub rolls: u32,
    pub avg_kg_per_roll: Weight,
    pub total_kg: Weight,
    pub remaining_kg: Weight,
    pub status: LotStatus,
    #[serde(default)]
    pub supplier_id: Option<String>,
    /// Purchase cost per kg, when known.
    #[serde(default)]
    pub cost_per_kg: Option<Money>,
    #[serde(default)]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InventoryLot {
    /// Creates a lot holding its full stock.
    pub fn new(
        product_id: impl Into<String>,
        party: impl Into<String>,
        date: NaiveDate,
        rolls: u32,
        total_kg: Weight,
    ) -> Self {
        let now = Utc::now();
        InventoryLot {
            id: new_id(),
            product_id: product_id.into(),
            party: party.into(),
            date,
            rolls,
            avg_kg_per_roll: total_kg.per_unit(rolls),
            total_kg,
            remaining_kg: total_kg,
            status: LotStatus::InStock,
            supplier_id: None,
            cost_per_kg: None,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Weight already shipped out of this lot.
    pub fn shipped_kg(&self) -> Weight {
        self.total_kg - self.remaining_kg
    }

    /// True while the lot can still supply a shipment.
    pub fn is_available(&self) -> bool {
        self.remaining_kg.is_positive()
    }

    /// Recomputes `status` and `avg_kg_per_roll` from the quantities.
    pub fn refresh(&mut self) {
        self.status = LotStatus::from_quantities(self.remaining_kg, self.total_kg);
        self.avg_kg_per_roll = self.total_kg.per_unit(self.rolls);
    }
}

impl_entity!(InventoryLot, "lots", "Lot");

// =============================================================================
// Shipment
// =============================================================================

/// A requested shipment line before it is checked against stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRequest {
    pub lot_id: String,
    pub kg: Weight,
    /// Price per kg.
    pub unit_price: Money,
}

impl FromStr for LineRequest {
    type Err = ValidationError;

    /// Parses `LOT_ID:KG:UNIT_PRICE`, e.g. `3f2a...:120.5:4.25`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != 3 {
            return Err(ValidationError::invalid_format(
                "line",
                format!("expected LOT_ID:KG:UNIT_PRICE, got '{}'", s),
            ));
        }
        let lot_id = parts[0].trim();
        if lot_id.is_empty() {
            return Err(ValidationError::Required {
                field: "lot id".to_string(),
            });
        }
        Ok(LineRequest {
            lot_id: lot_id.to_string(),
            kg: parts[1].parse()?,
            unit_price: parts[2].parse()?,
        })
    }
}

/// A line of a shipment, priced per kg.
///
/// Uses the snapshot pattern for `party` and `product_id` so the delivery
/// note stays readable if the lot is later edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipmentLine {
    pub lot_id: String,
    pub product_id: String,
    pub party: String,
    pub kg: Weight,
    pub unit_price: Money,
    pub line_total: Money,
}

impl ShipmentLine {
    /// Builds a priced line from a lot.
    ///
    /// Fails when `kg × unit_price` does not fit in the money range.
    pub fn from_lot(lot: &InventoryLot, kg: Weight, unit_price: Money) -> Result<Self, ValidationError> {
        let line_total = unit_price
            .for_weight(kg)
            .ok_or_else(|| ValidationError::invalid_format("line total", "amount too large"))?;
        Ok(ShipmentLine {
            lot_id: lot.id.clone(),
            product_id: lot.product_id.clone(),
            party: lot.party.clone(),
            kg,
            unit_price,
            line_total,
        })
    }
}

/// An outbound delivery to a customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shipment {
    pub id: String,
    /// Human-readable delivery number, `SHP-YYYYMMDD-NNN`.
    pub number: String,
    pub customer_id: String,
    pub date: NaiveDate,
    pub lines: Vec<ShipmentLine>,
    pub total_kg: Weight,
    pub total_amount: Money,
    #[serde(default)]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Shipment {
    pub fn new(
        number: impl Into<String>,
        customer_id: impl Into<String>,
        date: NaiveDate,
        lines: Vec<ShipmentLine>,
    ) -> Self {
        let now = Utc::now();
        let mut shipment = Shipment {
            id: new_id(),
            number: number.into(),
            customer_id: customer_id.into(),
            date,
            lines,
            total_kg: Weight::zero(),
            total_amount: Money::zero(),
            notes: None,
            created_at: now,
            updated_at: now,
        };
        shipment.recompute_totals();
        shipment
    }

    /// Recomputes the aggregate totals from the lines.
    pub fn recompute_totals(&mut self) {
        self.total_kg = self.lines.iter().map(|l| l.kg).sum();
        self.total_amount = self.lines.iter().map(|l| l.line_total).sum();
    }

    /// Distinct lot IDs touched by this shipment.
    pub fn lot_ids(&self) -> BTreeSet<String> {
        self.lines.iter().map(|l| l.lot_id.clone()).collect()
    }

    /// Shipment number for a given date and daily sequence.
    ///
    /// ## Example
    /// `SHP-20261017-004`
    pub fn format_number(date: NaiveDate, sequence: u32) -> String {
        format!("SHP-{}-{:03}", date.format("%Y%m%d"), sequence)
    }
}

impl_entity!(Shipment, "shipments", "Shipment");

// =============================================================================
// Payment Method
// =============================================================================

/// How money changed hands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    BankTransfer,
    Check,
    Card,
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentMethod::Cash => write!(f, "cash"),
            PaymentMethod::BankTransfer => write!(f, "bank transfer"),
            PaymentMethod::Check => write!(f, "check"),
            PaymentMethod::Card => write!(f, "card"),
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cash" => Ok(PaymentMethod::Cash),
            "bank" | "transfer" | "bank_transfer" | "bank-transfer" | "wire" => {
                Ok(PaymentMethod::BankTransfer)
            }
            "check" | "cheque" => Ok(PaymentMethod::Check),
            "card" | "credit" | "debit" => Ok(PaymentMethod::Card),
            _ => Err(ValidationError::NotAllowed {
                field: "method".to_string(),
                allowed: vec![
                    "cash".to_string(),
                    "bank".to_string(),
                    "check".to_string(),
                    "card".to_string(),
                ],
            }),
        }
    }
}

// =============================================================================
// Payment
// =============================================================================

/// Money received from a customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: String,
    pub customer_id: String,
    /// Amount in USD.
    pub amount: Money,
    pub method: PaymentMethod,
    pub date: NaiveDate,
    #[serde(default)]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    pub fn new(
        customer_id: impl Into<String>,
        amount: Money,
        method: PaymentMethod,
        date: NaiveDate,
    ) -> Self {
        let now = Utc::now();
        Payment {
            id: new_id(),
            customer_id: customer_id.into(),
            amount,
            method,
            date,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }
}

impl_entity!(Payment, "payments", "Payment");

// =============================================================================
// Supplier
// =============================================================================

/// A yarn seller, knitter, dye house or other vendor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Supplier {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Supplier {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Supplier {
            id: new_id(),
            name: name.into(),
            phone: None,
            email: None,
            address: None,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }
}

impl_entity!(Supplier, "suppliers", "Supplier");

/// Money paid to a supplier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplierPayment {
    pub id: String,
    pub supplier_id: String,
    pub amount: Money,
    pub method: PaymentMethod,
    pub date: NaiveDate,
    #[serde(default)]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SupplierPayment {
    pub fn new(
        supplier_id: impl Into<String>,
        amount: Money,
        method: PaymentMethod,
        date: NaiveDate,
    ) -> Self {
        let now = Utc::now();
        SupplierPayment {
            id: new_id(),
            supplier_id: supplier_id.into(),
            amount,
            method,
            date,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }
}

impl_entity!(SupplierPayment, "supplier_payments", "Supplier payment");

// =============================================================================
// Production Cost
// =============================================================================

/// Production stage a cost belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostCategory {
    Yarn,
    Knitting,
    Dyeing,
    Finishing,
    Transport,
    Labor,
    Other,
}

impl CostCategory {
    pub const ALL: [CostCategory; 7] = [
        CostCategory::Yarn,
        CostCategory::Knitting,
        CostCategory::Dyeing,
        CostCategory::Finishing,
        CostCategory::Transport,
        CostCategory::Labor,
        CostCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CostCategory::Yarn => "yarn",
            CostCategory::Knitting => "knitting",
            CostCategory::Dyeing => "dyeing",
            CostCategory::Finishing => "finishing",
            CostCategory::Transport => "transport",
            CostCategory::Labor => "labor",
            CostCategory::Other => "other",
        }
    }
}

impl fmt::Display for CostCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CostCategory {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        CostCategory::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "category".to_string(),
                allowed: CostCategory::ALL.iter().map(|c| c.as_str().to_string()).collect(),
            })
    }
}

/// A cost incurred producing fabric (yarn purchase, dyeing, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionCost {
    pub id: String,
    pub category: CostCategory,
    pub description: String,
    pub amount: Money,
    /// Weight processed, when the cost is billed by weight.
    #[serde(default)]
    pub kg: Option<Weight>,
    #[serde(default)]
    pub product_id: Option<String>,
    #[serde(default)]
    pub lot_id: Option<String>,
    /// Supplier that billed this cost; counts towards the supplier balance.
    #[serde(default)]
    pub supplier_id: Option<String>,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProductionCost {
    pub fn new(
        category: CostCategory,
        description: impl Into<String>,
        amount: Money,
        date: NaiveDate,
    ) -> Self {
        let now = Utc::now();
        ProductionCost {
            id: new_id(),
            category,
            description: description.into(),
            amount,
            kg: None,
            product_id: None,
            lot_id: None,
            supplier_id: None,
            date,
            created_at: now,
            updated_at: now,
        }
    }
}

impl_entity!(ProductionCost, "production_costs", "Production cost");

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_lot_status_rules() {
        let total = Weight::from_kg(100);
        assert_eq!(LotStatus::from_quantities(total, total), LotStatus::InStock);
        assert_eq!(LotStatus::from_quantities(Weight::from_kg(40), total), LotStatus::Partial);
        assert_eq!(LotStatus::from_quantities(Weight::zero(), total), LotStatus::Depleted);
    }

    #[test]
    fn test_new_lot_is_full() {
        let lot = InventoryLot::new("p-1", "P-1001", date(2026, 3, 1), 8, Weight::from_kg(200));
        assert_eq!(lot.remaining_kg, lot.total_kg);
        assert_eq!(lot.status, LotStatus::InStock);
        assert_eq!(lot.avg_kg_per_roll, Weight::from_kg(25));
        assert_eq!(lot.shipped_kg(), Weight::zero());
        assert!(lot.is_available());
    }

    #[test]
    fn test_shipment_totals() {
        let lot = InventoryLot::new("p-1", "P-1001", date(2026, 3, 1), 8, Weight::from_kg(200));
        let lines = vec![
            ShipmentLine::from_lot(&lot, Weight::from_kg(10), Money::from_cents(400)).unwrap(),
            ShipmentLine::from_lot(&lot, Weight::from_grams(2_500), Money::from_cents(400)).unwrap(),
        ];
        let shipment = Shipment::new("SHP-1", "c-1", date(2026, 3, 5), lines);

        assert_eq!(shipment.total_kg, Weight::from_grams(12_500));
        assert_eq!(shipment.total_amount, Money::from_cents(5_000));
        assert_eq!(shipment.lot_ids().len(), 1);
    }

    #[test]
    fn test_shipment_number_format() {
        assert_eq!(Shipment::format_number(date(2026, 10, 17), 4), "SHP-20261017-004");
    }

    #[test]
    fn test_line_request_parse() {
        let line: LineRequest = "lot-1:120.5:4.25".parse().unwrap();
        assert_eq!(line.lot_id, "lot-1");
        assert_eq!(line.kg, Weight::from_grams(120_500));
        assert_eq!(line.unit_price, Money::from_cents(425));

        assert!("lot-1:120.5".parse::<LineRequest>().is_err());
        assert!(":1:1".parse::<LineRequest>().is_err());
        assert!("lot-1:abc:1".parse::<LineRequest>().is_err());
    }

    #[test]
    fn test_payment_method_parse() {
        assert_eq!("Cash".parse::<PaymentMethod>().unwrap(), PaymentMethod::Cash);
        assert_eq!("wire".parse::<PaymentMethod>().unwrap(), PaymentMethod::BankTransfer);
        assert_eq!("cheque".parse::<PaymentMethod>().unwrap(), PaymentMethod::Check);
        assert!("barter".parse::<PaymentMethod>().is_err());
    }

    #[test]
    fn test_cost_category_parse() {
        assert_eq!("Dyeing".parse::<CostCategory>().unwrap(), CostCategory::Dyeing);
        assert!("magic".parse::<CostCategory>().is_err());
    }

    #[test]
    fn test_document_round_trip_keeps_optional_defaults() {
        let json = r#"{
            "id": "c-1",
            "name": "Acme Konfeksiyon",
            "created_at": "2026-01-01T00:00:00Z",
            "updated_at": "2026-01-01T00:00:00Z"
        }"#;
        let customer: Customer = serde_json::from_str(json).unwrap();
        assert_eq!(customer.name, "Acme Konfeksiyon");
        assert!(customer.phone.is_none());
        assert_eq!(Customer::STORE, "customers");
    }

    #[test]
    fn test_product_display_name() {
        let mut product = Product::new("Single Jersey");
        assert_eq!(product.display_name(), "Single Jersey");
        product.color = Some("Navy".to_string());
        assert_eq!(product.display_name(), "Single Jersey (Navy)");
    }
}
