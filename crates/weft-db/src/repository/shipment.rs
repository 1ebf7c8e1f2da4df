//! # Shipment Repository
//!
//! Shipment flows that move stock. Each runs in one SQLite transaction so a
//! shipment and the lots it touched are always written together.
//!
//! ## Shipment Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Shipment Lifecycle                                │
//! │                                                                         │
//! │  1. CREATE                                                             │
//! │     └── customer exists, lines priced against their lots               │
//! │     └── apply_lines → lots decremented                                 │
//! │     └── number SHP-YYYYMMDD-NNN assigned                               │
//! │     └── lots + shipment written, COMMIT                                │
//! │                                                                         │
//! │  2. (OPTIONAL) EDIT                                                    │
//! │     └── old lines restored, new lines applied (both or neither)        │
//! │                                                                         │
//! │  3. (OPTIONAL) DELETE                                                  │
//! │     └── reverse_lines → lots restored, shipment removed                │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};
use std::collections::BTreeSet;
use tracing::{debug, info};

use weft_core::inventory::{allocate_fifo, apply_lines, price_lines, replace_lines, reverse_lines};
use weft_core::validation::{validate_optional_text, validate_unit_price, validate_weight, MAX_NOTES_LEN};
use weft_core::{Allocation, Customer, InventoryLot, LineRequest, Money, Product, Shipment, Weight};

use crate::error::{DbError, DbResult};
use crate::repository::collection;
use crate::repository::lot::load_lots;

/// Input for a new shipment (or the replacement content of an edit).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewShipment {
    pub customer_id: String,
    pub date: NaiveDate,
    pub lines: Vec<LineRequest>,
    pub notes: Option<String>,
}

/// Input for a shipment allocated FIFO from one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FifoShipment {
    pub customer_id: String,
    pub product_id: String,
    pub kg: Weight,
    pub unit_price: Money,
    pub date: NaiveDate,
    pub notes: Option<String>,
}

/// Repository for shipments.
#[derive(Debug, Clone)]
pub struct ShipmentRepository {
    pool: SqlitePool,
}

impl ShipmentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ShipmentRepository { pool }
    }

    pub async fn get(&self, id: &str) -> DbResult<Option<Shipment>> {
        let mut conn = self.pool.acquire().await?;
        collection::get(&mut conn, id).await
    }

    pub async fn get_required(&self, id: &str) -> DbResult<Shipment> {
        let mut conn = self.pool.acquire().await?;
        collection::get_required(&mut conn, id).await
    }

    /// All shipments, newest date first.
    pub async fn list(&self) -> DbResult<Vec<Shipment>> {
        let mut conn = self.pool.acquire().await?;
        let mut shipments: Vec<Shipment> = collection::list(&mut conn).await?;
        shipments.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| b.number.cmp(&a.number)));
        Ok(shipments)
    }

    pub async fn list_for_customer(&self, customer_id: &str) -> DbResult<Vec<Shipment>> {
        let mut conn = self.pool.acquire().await?;
        collection::find_by(&mut conn, "customer_id", customer_id).await
    }

    /// Read-only FIFO preview of which lots would supply `kg` of a product.
    pub async fn allocate(&self, product_id: &str, kg: Weight) -> DbResult<Allocation> {
        let mut conn = self.pool.acquire().await?;
        collection::ensure_exists::<Product>(&mut conn, product_id).await?;
        validate_weight("kg", kg)?;

        let lots: Vec<InventoryLot> = collection::find_by(&mut conn, "product_id", product_id).await?;
        let allocation = allocate_fifo(&lots, product_id, kg);
        debug!(
            product_id = %product_id,
            allocated = %allocation.allocated,
            shortfall = %allocation.shortfall,
            "FIFO preview"
        );
        Ok(allocation)
    }

    /// Creates a shipment and decrements its lots.
    ///
    /// ## Errors
    /// - `NotFound` for an unknown customer
    /// - `Core(LotNotFound | InsufficientStock | Validation)` for bad lines
    pub async fn create(&self, input: NewShipment) -> DbResult<Shipment> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(DbError::transaction)?;

        let ids: BTreeSet<String> = input.lines.iter().map(|l| l.lot_id.clone()).collect();
        let lots = load_lots(&mut tx, &ids).await?;
        let shipment = insert_shipment(&mut tx, input, lots).await?;

        tx.commit()
            .await
            .map_err(DbError::transaction)?;

        info!(
            shipment_id = %shipment.id,
            number = %shipment.number,
            total_kg = %shipment.total_kg,
            total = %shipment.total_amount,
            "Shipment created"
        );
        Ok(shipment)
    }

    /// Allocates `kg` of a product oldest-lot-first and ships it at one price.
    ///
    /// ## Errors
    /// `Core(InsufficientStock)` when the product's lots cannot cover `kg`.
    pub async fn create_fifo(&self, input: FifoShipment) -> DbResult<Shipment> {
        validate_weight("kg", input.kg)?;
        validate_unit_price(input.unit_price)?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(DbError::transaction)?;

        collection::ensure_exists::<Product>(&mut tx, &input.product_id).await?;
        let lots: Vec<InventoryLot> = collection::find_by(&mut tx, "product_id", &input.product_id).await?;
        let allocation = allocate_fifo(&lots, &input.product_id, input.kg).require_full()?;

        let draft = NewShipment {
            customer_id: input.customer_id,
            date: input.date,
            lines: allocation.to_line_requests(input.unit_price),
            notes: input.notes,
        };
        let shipment = insert_shipment(&mut tx, draft, lots).await?;

        tx.commit()
            .await
            .map_err(DbError::transaction)?;

        info!(
            shipment_id = %shipment.id,
            number = %shipment.number,
            lots = allocation.picks.len(),
            total_kg = %shipment.total_kg,
            "FIFO shipment created"
        );
        Ok(shipment)
    }

    /// Replaces a shipment's customer, date, lines and notes.
    ///
    /// The old lines are restored and the new lines applied in the same
    /// transaction; on any error nothing changes. The shipment keeps its id
    /// and number.
    pub async fn update(&self, id: &str, input: NewShipment) -> DbResult<Shipment> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(DbError::transaction)?;

        let mut shipment: Shipment = collection::get_required(&mut tx, id).await?;
        collection::ensure_exists::<Customer>(&mut tx, &input.customer_id).await?;

        let mut ids = shipment.lot_ids();
        ids.extend(input.lines.iter().map(|l| l.lot_id.clone()));
        let mut lots = load_lots(&mut tx, &ids).await?;

        let new_lines = price_lines(&lots, &input.lines)?;
        replace_lines(&mut lots, &shipment.lines, &new_lines)?;

        for lot in &lots {
            collection::update(&mut tx, lot).await?;
        }

        shipment.customer_id = input.customer_id;
        shipment.date = input.date;
        shipment.lines = new_lines;
        shipment.notes = validate_optional_text("notes", input.notes.as_deref(), MAX_NOTES_LEN)?;
        shipment.recompute_totals();
        let shipment = collection::update(&mut tx, &shipment).await?;

        tx.commit()
            .await
            .map_err(DbError::transaction)?;

        info!(
            shipment_id = %shipment.id,
            number = %shipment.number,
            total_kg = %shipment.total_kg,
            "Shipment edited"
        );
        Ok(shipment)
    }

    /// Deletes a shipment and restores every lot it drew from.
    pub async fn delete(&self, id: &str) -> DbResult<Shipment> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(DbError::transaction)?;

        let shipment: Shipment = collection::get_required(&mut tx, id).await?;
        let mut lots = load_lots(&mut tx, &shipment.lot_ids()).await?;
        reverse_lines(&mut lots, &shipment.lines)?;

        for lot in &lots {
            collection::update(&mut tx, lot).await?;
        }
        collection::delete::<Shipment>(&mut tx, id).await?;

        tx.commit()
            .await
            .map_err(DbError::transaction)?;

        info!(
            shipment_id = %shipment.id,
            number = %shipment.number,
            lots_restored = lots.len(),
            "Shipment deleted"
        );
        Ok(shipment)
    }
}

/// Prices, applies and stores a new shipment inside an open transaction.
async fn insert_shipment(
    conn: &mut SqliteConnection,
    input: NewShipment,
    mut lots: Vec<InventoryLot>,
) -> DbResult<Shipment> {
    collection::ensure_exists::<Customer>(conn, &input.customer_id).await?;
    let notes = validate_optional_text("notes", input.notes.as_deref(), MAX_NOTES_LEN)?;

    let lines = price_lines(&lots, &input.lines)?;
    apply_lines(&mut lots, &lines)?;

    let touched: BTreeSet<&str> = lines.iter().map(|l| l.lot_id.as_str()).collect();
    for lot in lots.iter().filter(|lot| touched.contains(lot.id.as_str())) {
        collection::update(conn, lot).await?;
    }

    let number = next_number(conn, input.date).await?;
    let mut shipment = Shipment::new(number, input.customer_id, input.date, lines);
    shipment.notes = notes;

    collection::insert(conn, &shipment).await
}

/// Next free `SHP-YYYYMMDD-NNN` number for `date`.
async fn next_number(conn: &mut SqliteConnection, date: NaiveDate) -> DbResult<String> {
    let numbers: Vec<String> = sqlx::query_scalar(
        r#"
        SELECT json_extract(body, '$.number')
        FROM documents
        WHERE store = 'shipments' AND json_extract(body, '$.date') = ?1
        "#,
    )
    .bind(date.format("%Y-%m-%d").to_string())
    .fetch_all(&mut *conn)
    .await?;

    let last = numbers
        .iter()
        .filter_map(|n| n.rsplit('-').next())
        .filter_map(|seq| seq.parse::<u32>().ok())
        .max()
        .unwrap_or(0);

    Ok(Shipment::format_number(date, last + 1))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::lot::NewLot;
    use crate::{Database, DbConfig};
    use weft_core::{CoreError, LotStatus};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 7, d).unwrap()
    }

    struct Fixture {
        db: Database,
        customer: Customer,
        product: Product,
        lots: Vec<InventoryLot>,
    }

    /// One customer, one product and three lots (100, 80, 60 kg) received
    /// on the 1st, 2nd and 3rd.
    async fn fixture() -> Fixture {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let customer = db.customers().insert(&Customer::new("Acme")).await.unwrap();
        let product = db.products().insert(&Product::new("Rib 2x2")).await.unwrap();

        let mut lots = Vec::new();
        for (i, kg) in [100, 80, 60].into_iter().enumerate() {
            let lot = db
                .lots()
                .create(NewLot {
                    product_id: product.id.clone(),
                    party: format!("P-{}", 300 + i),
                    date: day(i as u32 + 1),
                    rolls: 4,
                    total_kg: Weight::from_kg(kg),
                    supplier_id: None,
                    cost_per_kg: None,
                    notes: None,
                })
                .await
                .unwrap();
            lots.push(lot);
        }

        Fixture {
            db,
            customer,
            product,
            lots,
        }
    }

    fn request(lot: &InventoryLot, kg: i64) -> LineRequest {
        LineRequest {
            lot_id: lot.id.clone(),
            kg: Weight::from_kg(kg),
            unit_price: Money::from_cents(450),
        }
    }

    async fn remaining(db: &Database, lot: &InventoryLot) -> Weight {
        db.lots().get_required(&lot.id).await.unwrap().remaining_kg
    }

    #[tokio::test]
    async fn test_create_decrements_lots() {
        let f = fixture().await;
        let shipment = f
            .db
            .shipments()
            .create(NewShipment {
                customer_id: f.customer.id.clone(),
                date: day(10),
                lines: vec![request(&f.lots[0], 100), request(&f.lots[1], 30)],
                notes: Some("Truck 34 ABC 12".to_string()),
            })
            .await
            .unwrap();

        assert_eq!(shipment.number, "SHP-20260710-001");
        assert_eq!(shipment.total_kg, Weight::from_kg(130));
        assert_eq!(shipment.total_amount, Money::from_cents(58_500));

        let first = f.db.lots().get_required(&f.lots[0].id).await.unwrap();
        assert_eq!(first.remaining_kg, Weight::zero());
        assert_eq!(first.status, LotStatus::Depleted);
        let second = f.db.lots().get_required(&f.lots[1].id).await.unwrap();
        assert_eq!(second.remaining_kg, Weight::from_kg(50));
        assert_eq!(second.status, LotStatus::Partial);
        assert_eq!(remaining(&f.db, &f.lots[2]).await, Weight::from_kg(60));
    }

    #[tokio::test]
    async fn test_create_rejects_over_allocation_atomically() {
        let f = fixture().await;
        let err = f
            .db
            .shipments()
            .create(NewShipment {
                customer_id: f.customer.id.clone(),
                date: day(10),
                lines: vec![request(&f.lots[0], 50), request(&f.lots[2], 61)],
                notes: None,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::Core(CoreError::InsufficientStock { .. })));
        assert_eq!(remaining(&f.db, &f.lots[0]).await, Weight::from_kg(100));
        assert_eq!(remaining(&f.db, &f.lots[2]).await, Weight::from_kg(60));
        assert_eq!(f.db.shipments().list().await.unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_create_requires_customer_and_lot() {
        let f = fixture().await;
        let err = f
            .db
            .shipments()
            .create(NewShipment {
                customer_id: "ghost".to_string(),
                date: day(10),
                lines: vec![request(&f.lots[0], 5)],
                notes: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));

        let mut ghost_line = request(&f.lots[0], 5);
        ghost_line.lot_id = "ghost-lot".to_string();
        let err = f
            .db
            .shipments()
            .create(NewShipment {
                customer_id: f.customer.id.clone(),
                date: day(10),
                lines: vec![ghost_line],
                notes: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::LotNotFound(_))));
    }

    #[tokio::test]
    async fn test_create_rejects_unpriceable_line() {
        let f = fixture().await;
        let mut line = request(&f.lots[0], 2);
        line.unit_price = "92233720368547758.07".parse().unwrap();

        let err = f
            .db
            .shipments()
            .create(NewShipment {
                customer_id: f.customer.id.clone(),
                date: day(10),
                lines: vec![line],
                notes: None,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::Core(CoreError::Validation(_))));
        assert_eq!(remaining(&f.db, &f.lots[0]).await, Weight::from_kg(100));
        assert_eq!(f.db.shipments().list().await.unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_numbers_are_sequential_per_day() {
        let f = fixture().await;
        let mut numbers = Vec::new();
        for (d, kg) in [(10, 1), (10, 1), (11, 1), (10, 1)] {
            let s = f
                .db
                .shipments()
                .create(NewShipment {
                    customer_id: f.customer.id.clone(),
                    date: day(d),
                    lines: vec![request(&f.lots[2], kg)],
                    notes: None,
                })
                .await
                .unwrap();
            numbers.push(s.number);
        }
        assert_eq!(
            numbers,
            vec!["SHP-20260710-001", "SHP-20260710-002", "SHP-20260711-001", "SHP-20260710-003"]
        );
    }

    #[tokio::test]
    async fn test_create_then_delete_restores_lots() {
        let f = fixture().await;
        let before: Vec<Weight> = f.lots.iter().map(|l| l.remaining_kg).collect();

        let shipment = f
            .db
            .shipments()
            .create(NewShipment {
                customer_id: f.customer.id.clone(),
                date: day(10),
                lines: vec![request(&f.lots[0], 40), request(&f.lots[0], 60), request(&f.lots[2], 15)],
                notes: None,
            })
            .await
            .unwrap();
        assert_eq!(remaining(&f.db, &f.lots[0]).await, Weight::zero());

        let deleted = f.db.shipments().delete(&shipment.id).await.unwrap();
        assert_eq!(deleted.id, shipment.id);
        assert!(f.db.shipments().get(&shipment.id).await.unwrap().is_none());

        for (lot, expected) in f.lots.iter().zip(before) {
            let restored = f.db.lots().get_required(&lot.id).await.unwrap();
            assert_eq!(restored.remaining_kg, expected);
            assert_eq!(restored.status, LotStatus::InStock);
        }
    }

    #[tokio::test]
    async fn test_create_fifo_uses_oldest_lots() {
        let f = fixture().await;
        let shipment = f
            .db
            .shipments()
            .create_fifo(FifoShipment {
                customer_id: f.customer.id.clone(),
                product_id: f.product.id.clone(),
                kg: Weight::from_kg(150),
                unit_price: Money::from_cents(500),
                date: day(12),
                notes: None,
            })
            .await
            .unwrap();

        let lots: Vec<&str> = shipment.lines.iter().map(|l| l.lot_id.as_str()).collect();
        assert_eq!(lots, vec![f.lots[0].id.as_str(), f.lots[1].id.as_str()]);
        assert_eq!(shipment.lines[1].kg, Weight::from_kg(50));
        assert_eq!(shipment.total_amount, Money::from_cents(75_000));
        assert_eq!(remaining(&f.db, &f.lots[1]).await, Weight::from_kg(30));

        let err = f
            .db
            .shipments()
            .create_fifo(FifoShipment {
                customer_id: f.customer.id.clone(),
                product_id: f.product.id.clone(),
                kg: Weight::from_kg(91),
                unit_price: Money::from_cents(500),
                date: day(12),
                notes: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::InsufficientStock { .. })));
        assert_eq!(remaining(&f.db, &f.lots[2]).await, Weight::from_kg(60));
    }

    #[tokio::test]
    async fn test_allocate_preview_does_not_mutate() {
        let f = fixture().await;
        let allocation = f.db.shipments().allocate(&f.product.id, Weight::from_kg(300)).await.unwrap();

        assert_eq!(allocation.allocated, Weight::from_kg(240));
        assert_eq!(allocation.shortfall, Weight::from_kg(60));
        assert_eq!(allocation.picks.len(), 3);
        assert_eq!(remaining(&f.db, &f.lots[0]).await, Weight::from_kg(100));
    }

    #[tokio::test]
    async fn test_update_moves_stock_between_lots() {
        let f = fixture().await;
        let shipment = f
            .db
            .shipments()
            .create(NewShipment {
                customer_id: f.customer.id.clone(),
                date: day(10),
                lines: vec![request(&f.lots[0], 70)],
                notes: None,
            })
            .await
            .unwrap();

        let edited = f
            .db
            .shipments()
            .update(
                &shipment.id,
                NewShipment {
                    customer_id: f.customer.id.clone(),
                    date: day(11),
                    lines: vec![request(&f.lots[0], 20), request(&f.lots[1], 80)],
                    notes: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(edited.number, shipment.number);
        assert_eq!(edited.total_kg, Weight::from_kg(100));
        assert_eq!(remaining(&f.db, &f.lots[0]).await, Weight::from_kg(80));
        assert_eq!(remaining(&f.db, &f.lots[1]).await, Weight::zero());
    }

    #[tokio::test]
    async fn test_failed_update_changes_nothing() {
        let f = fixture().await;
        let shipment = f
            .db
            .shipments()
            .create(NewShipment {
                customer_id: f.customer.id.clone(),
                date: day(10),
                lines: vec![request(&f.lots[0], 70)],
                notes: None,
            })
            .await
            .unwrap();

        // 61 kg does not fit in the 60 kg lot even after the old lines return.
        let err = f
            .db
            .shipments()
            .update(
                &shipment.id,
                NewShipment {
                    customer_id: f.customer.id.clone(),
                    date: day(10),
                    lines: vec![request(&f.lots[2], 61)],
                    notes: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::InsufficientStock { .. })));

        assert_eq!(remaining(&f.db, &f.lots[0]).await, Weight::from_kg(30));
        assert_eq!(remaining(&f.db, &f.lots[2]).await, Weight::from_kg(60));
        let stored = f.db.shipments().get_required(&shipment.id).await.unwrap();
        assert_eq!(stored.lines, shipment.lines);
    }

    #[tokio::test]
    async fn test_list_for_customer() {
        let f = fixture().await;
        let other = f.db.customers().insert(&Customer::new("Zeta")).await.unwrap();
        for customer_id in [&f.customer.id, &other.id, &f.customer.id] {
            f.db.shipments()
                .create(NewShipment {
                    customer_id: customer_id.clone(),
                    date: day(10),
                    lines: vec![request(&f.lots[0], 1)],
                    notes: None,
                })
                .await
                .unwrap();
        }
        assert_eq!(f.db.shipments().list_for_customer(&f.customer.id).await.unwrap().len(), 2);
        assert_eq!(f.db.shipments().list().await.unwrap().len(), 3);
    }
}
