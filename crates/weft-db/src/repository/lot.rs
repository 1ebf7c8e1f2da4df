//! # Lot Repository
//!
//! Inventory lot creation, edits and guarded deletes.
//!
//! ## Lot Edits
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  total 500 kg, remaining 320 kg  →  shipped 180 kg                      │
//! │                                                                         │
//! │  edit total to 400 kg  →  remaining = 400 − 180 = 220 kg  ✓            │
//! │  edit total to 150 kg  →  below shipped 180 kg           ✗ rejected    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use weft_core::validation::{validate_lot, validate_optional_text, validate_party, MAX_NOTES_LEN};
use weft_core::{CoreError, InventoryLot, Money, Product, ProductionCost, Supplier, Weight};

use crate::error::{DbError, DbResult};
use crate::repository::collection;
use crate::repository::ledger::guard;

/// Input for a new lot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLot {
    pub product_id: String,
    pub party: String,
    pub date: NaiveDate,
    pub rolls: u32,
    pub total_kg: Weight,
    pub supplier_id: Option<String>,
    pub cost_per_kg: Option<Money>,
    pub notes: Option<String>,
}

/// Fields that may change on an existing lot. `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotEdit {
    pub party: Option<String>,
    pub date: Option<NaiveDate>,
    pub rolls: Option<u32>,
    pub total_kg: Option<Weight>,
    pub supplier_id: Option<String>,
    pub cost_per_kg: Option<Money>,
    pub notes: Option<String>,
}

/// Repository for inventory lots.
#[derive(Debug, Clone)]
pub struct LotRepository {
    pool: SqlitePool,
}

impl LotRepository {
    pub fn new(pool: SqlitePool) -> Self {
        LotRepository { pool }
    }

    pub async fn get(&self, id: &str) -> DbResult<Option<InventoryLot>> {
        let mut conn = self.pool.acquire().await?;
        collection::get(&mut conn, id).await
    }

    pub async fn get_required(&self, id: &str) -> DbResult<InventoryLot> {
        let mut conn = self.pool.acquire().await?;
        collection::get_required(&mut conn, id).await
    }

    /// All lots in creation order.
    pub async fn list(&self) -> DbResult<Vec<InventoryLot>> {
        let mut conn = self.pool.acquire().await?;
        collection::list(&mut conn).await
    }

    /// Lots of one product, oldest received first.
    pub async fn list_for_product(&self, product_id: &str) -> DbResult<Vec<InventoryLot>> {
        let mut conn = self.pool.acquire().await?;
        let mut lots: Vec<InventoryLot> = collection::find_by(&mut conn, "product_id", product_id).await?;
        lots.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.created_at.cmp(&b.created_at)));
        Ok(lots)
    }

    /// Creates a lot holding its full weight.
    ///
    /// ## Checks
    /// - product exists (and supplier, when given)
    /// - party not empty, rolls ≥ 1, total > 0
    pub async fn create(&self, input: NewLot) -> DbResult<InventoryLot> {
        let mut conn = self.pool.acquire().await?;

        collection::ensure_exists::<Product>(&mut conn, &input.product_id).await?;
        if let Some(supplier_id) = &input.supplier_id {
            collection::ensure_exists::<Supplier>(&mut conn, supplier_id).await?;
        }

        let party = validate_party(&input.party)?;
        let mut lot = InventoryLot::new(input.product_id, party, input.date, input.rolls, input.total_kg);
        lot.supplier_id = input.supplier_id;
        lot.cost_per_kg = input.cost_per_kg;
        lot.notes = validate_optional_text("notes", input.notes.as_deref(), MAX_NOTES_LEN)?;
        validate_lot(&lot)?;

        let lot = collection::insert(&mut conn, &lot).await?;
        info!(
            lot_id = %lot.id,
            party = %lot.party,
            total = %lot.total_kg,
            "Lot received"
        );
        Ok(lot)
    }

    /// Edits a lot, keeping what has already shipped out of it.
    ///
    /// ## Errors
    /// `TotalBelowShipped` if the new total is less than the shipped weight.
    pub async fn update(&self, id: &str, edit: LotEdit) -> DbResult<InventoryLot> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(DbError::transaction)?;

        let mut lot: InventoryLot = collection::get_required(&mut tx, id).await?;
        let shipped = lot.shipped_kg();

        if let Some(party) = edit.party {
            lot.party = validate_party(&party)?;
        }
        if let Some(date) = edit.date {
            lot.date = date;
        }
        if let Some(rolls) = edit.rolls {
            lot.rolls = rolls;
        }
        if let Some(supplier_id) = edit.supplier_id {
            collection::ensure_exists::<Supplier>(&mut tx, &supplier_id).await?;
            lot.supplier_id = Some(supplier_id);
        }
        if let Some(cost) = edit.cost_per_kg {
            lot.cost_per_kg = Some(cost);
        }
        if let Some(notes) = edit.notes {
            lot.notes = validate_optional_text("notes", Some(notes.as_str()), MAX_NOTES_LEN)?;
        }
        if let Some(total) = edit.total_kg {
            if total < shipped {
                return Err(CoreError::TotalBelowShipped {
                    lot: lot.party.clone(),
                    total,
                    shipped,
                }
                .into());
            }
            lot.total_kg = total;
            lot.remaining_kg = total - shipped;
        }

        lot.refresh();
        validate_lot(&lot)?;
        let lot = collection::update(&mut tx, &lot).await?;

        tx.commit()
            .await
            .map_err(DbError::transaction)?;

        info!(
            lot_id = %lot.id,
            total = %lot.total_kg,
            remaining = %lot.remaining_kg,
            status = %lot.status,
            "Lot adjusted"
        );
        Ok(lot)
    }

    /// Deletes a lot that no shipment or production cost references.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(DbError::transaction)?;

        let lot: InventoryLot = collection::get_required(&mut tx, id).await?;
        let references = shipments_referencing(&mut tx, id).await?;
        if references > 0 {
            return Err(CoreError::in_use("Lot", lot.party.clone(), "shipments", references as usize).into());
        }
        guard::<ProductionCost>(&mut tx, "Lot", &lot.party, "lot_id", id).await?;

        collection::delete::<InventoryLot>(&mut tx, id).await?;
        tx.commit()
            .await
            .map_err(DbError::transaction)?;

        info!(lot_id = %id, party = %lot.party, "Lot deleted");
        Ok(())
    }
}

/// Number of shipments with at least one line drawing from `lot_id`.
pub(crate) async fn shipments_referencing(conn: &mut SqliteConnection, lot_id: &str) -> DbResult<i64> {
    debug!(lot_id = %lot_id, "Counting shipments referencing lot");

    let n: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(DISTINCT d.id)
        FROM documents d, json_each(d.body, '$.lines') AS line
        WHERE d.store = 'shipments'
          AND json_extract(line.value, '$.lot_id') = ?1
        "#,
    )
    .bind(lot_id)
    .fetch_one(&mut *conn)
    .await?;

    Ok(n)
}

/// Loads the lots with the given ids, skipping ids that don't exist.
pub(crate) async fn load_lots<'a>(
    conn: &mut SqliteConnection,
    ids: impl IntoIterator<Item = &'a String>,
) -> DbResult<Vec<InventoryLot>> {
    let mut lots = Vec::new();
    for id in ids {
        if let Some(lot) = collection::get::<InventoryLot>(conn, id).await? {
            lots.push(lot);
        }
    }
    Ok(lots)
}

// =============================================================================
// Unit Tests
// =============================================================================
