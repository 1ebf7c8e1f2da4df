//! # Inventory Allocation
//!
//! FIFO allocation of fabric across lots, and the decrement/restore rules
//! applied when shipments are created, edited or deleted.
//!
//! ## Shipment Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  allocate_fifo(lots, product, 300 kg)                                   │
//! │       │                                                                 │
//! │       │   oldest received first                                         │
//! │       ▼                                                                 │
//! │  ┌──────────┐   ┌──────────┐   ┌──────────┐                             │
//! │  │ P-1001   │   │ P-1002   │   │ P-1003   │                             │
//! │  │ 120 kg   │──►│ 150 kg   │──►│ 200 kg   │                             │
//! │  │ take 120 │   │ take 150 │   │ take 30  │                             │
//! │  └──────────┘   └──────────┘   └──────────┘                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  apply_lines   ──► remaining -= kg   (all lines checked first)          │
//! │  reverse_lines ──► remaining += kg   (never above total)                │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every function here works on an in-memory slice of lots. Callers load
//! the lots, run the rule, and persist the mutated lots in one transaction.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::{InventoryLot, LineRequest, ShipmentLine};
use crate::money::Money;
use crate::validation::{validate_unit_price, validate_weight};
use crate::weight::Weight;
use crate::MAX_SHIPMENT_LINES;

// =============================================================================
// Allocation Result
// =============================================================================

/// Quantity taken from one lot by a FIFO allocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotPick {
    pub lot_id: String,
    pub party: String,
    pub kg: Weight,
    /// What the lot held before the pick.
    pub available: Weight,
}

/// Outcome of a FIFO allocation.
///
/// `allocated + shortfall == requested` always holds; a shortfall means
/// the product's lots could not cover the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    pub product_id: String,
    pub requested: Weight,
    pub picks: Vec<LotPick>,
    pub allocated: Weight,
    pub shortfall: Weight,
}

impl Allocation {
    pub fn is_complete(&self) -> bool {
        self.shortfall.is_zero()
    }

    /// Fails with `InsufficientStock` unless the full request was covered.
    pub fn require_full(self) -> CoreResult<Self> {
        if self.is_complete() {
            Ok(self)
        } else {
            Err(CoreError::InsufficientStock {
                lot: format!("product {}", self.product_id),
                available: self.allocated,
                requested: self.requested,
            })
        }
    }

    /// Turns the picks into shipment line requests at a single price.
    pub fn to_line_requests(&self, unit_price: Money) -> Vec<LineRequest> {
        self.picks
            .iter()
            .map(|pick| LineRequest {
                lot_id: pick.lot_id.clone(),
                kg: pick.kg,
                unit_price,
            })
            .collect()
    }
}

// =============================================================================
// FIFO
// =============================================================================

/// Lots of a product that still hold stock, oldest first.
///
/// Ordered by received date, then creation time, then id so the order is
/// total and stable.
pub fn fifo_order<'a>(lots: &'a [InventoryLot], product_id: &str) -> Vec<&'a InventoryLot> {
    let mut candidates: Vec<&InventoryLot> = lots
        .iter()
        .filter(|lot| lot.product_id == product_id && lot.is_available())
        .collect();
    candidates.sort_by(|a, b| {
        a.date
            .cmp(&b.date)
            .then_with(|| a.created_at.cmp(&b.created_at))
            .then_with(|| a.id.cmp(&b.id))
    });
    candidates
}

/// Allocates `required` of a product across its lots, oldest first.
///
/// Each pick is capped at the lot's remaining weight, so the result never
/// over-allocates. Does not mutate the lots.
pub fn allocate_fifo(lots: &[InventoryLot], product_id: &str, required: Weight) -> Allocation {
    let mut picks = Vec::new();
    let mut outstanding = if required.is_positive() {
        required
    } else {
        Weight::zero()
    };

    for lot in fifo_order(lots, product_id) {
        if outstanding.is_zero() {
            break;
        }
        let take = outstanding.min(lot.remaining_kg);
        picks.push(LotPick {
            lot_id: lot.id.clone(),
            party: lot.party.clone(),
            kg: take,
            available: lot.remaining_kg,
        });
        outstanding -= take;
    }

    let allocated: Weight = picks.iter().map(|p| p.kg).sum();
    Allocation {
        product_id: product_id.to_string(),
        requested: required,
        picks,
        allocated,
        shortfall: outstanding,
    }
}

// =============================================================================
// Line Pricing
// =============================================================================

/// Resolves line requests against the lots and prices them.
///
/// ## Errors
/// - `TooManyLines` / `Required` for an empty or oversized line list
/// - `MustBePositive` / `OutOfRange` for a kg outside 0 to [`MAX_LOT_WEIGHT`]
/// - `OutOfRange` for a unit price outside 0 to [`MAX_UNIT_PRICE`]
/// - `LotNotFound` for an unknown lot id
///
/// [`MAX_LOT_WEIGHT`]: crate::MAX_LOT_WEIGHT
/// [`MAX_UNIT_PRICE`]: crate::MAX_UNIT_PRICE
pub fn price_lines(lots: &[InventoryLot], requests: &[LineRequest]) -> CoreResult<Vec<ShipmentLine>> {
    if requests.is_empty() {
        return Err(ValidationError::Required {
            field: "lines".to_string(),
        }
        .into());
    }
    if requests.len() > MAX_SHIPMENT_LINES {
        return Err(CoreError::TooManyLines {
            max: MAX_SHIPMENT_LINES,
        });
    }

    requests
        .iter()
        .map(|req| -> CoreResult<ShipmentLine> {
            validate_weight("kg", req.kg)?;
            validate_unit_price(req.unit_price)?;
            let lot = lots
                .iter()
                .find(|lot| lot.id == req.lot_id)
                .ok_or_else(|| CoreError::LotNotFound(req.lot_id.clone()))?;
            Ok(ShipmentLine::from_lot(lot, req.kg, req.unit_price)?)
        })
        .collect()
}

// =============================================================================
// Decrement / Restore
// =============================================================================

/// Total requested weight per lot id.
///
/// Several lines may draw from the same lot; they are checked together.
pub fn plan_deductions(lines: &[ShipmentLine]) -> BTreeMap<String, Weight> {
    let mut plan: BTreeMap<String, Weight> = BTreeMap::new();
    for line in lines {
        *plan.entry(line.lot_id.clone()).or_default() += line.kg;
    }
    plan
}

fn lot_index(lots: &[InventoryLot], lot_id: &str) -> CoreResult<usize> {
    lots.iter()
        .position(|lot| lot.id == lot_id)
        .ok_or_else(|| CoreError::LotNotFound(lot_id.to_string()))
}

impl InventoryLot {
    /// Takes `kg` out of the lot.
    pub fn deduct(&mut self, kg: Weight) -> CoreResult<()> {
        if kg > self.remaining_kg {
            return Err(CoreError::InsufficientStock {
                lot: self.party.clone(),
                available: self.remaining_kg,
                requested: kg,
            });
        }
        self.remaining_kg -= kg;
        self.refresh();
        Ok(())
    }

    /// Puts `kg` back into the lot.
    pub fn restore(&mut self, kg: Weight) -> CoreResult<()> {
        let room = self.shipped_kg();
        if kg > room {
            return Err(CoreError::OverRestore {
                lot: self.party.clone(),
                restored: kg,
                room,
            });
        }
        self.remaining_kg += kg;
        self.refresh();
        Ok(())
    }
}

/// Decrements lots for a shipment's lines.
///
/// Every line is checked (lot exists, product matches, aggregate kg fits in
/// the remaining stock) before any lot is touched. On error the lots are
/// unchanged.
pub fn apply_lines(lots: &mut [InventoryLot], lines: &[ShipmentLine]) -> CoreResult<()> {
    for line in lines {
        if !line.kg.is_positive() {
            return Err(ValidationError::MustBePositive {
                field: "kg".to_string(),
            }
            .into());
        }
        let lot = &lots[lot_index(lots, &line.lot_id)?];
        if !line.product_id.is_empty() && line.product_id != lot.product_id {
            return Err(CoreError::ProductMismatch {
                lot: lot.party.clone(),
                lot_product: lot.product_id.clone(),
                requested_product: line.product_id.clone(),
            });
        }
    }

    let plan = plan_deductions(lines);
    let mut targets = Vec::with_capacity(plan.len());
    for (lot_id, kg) in &plan {
        let idx = lot_index(lots, lot_id)?;
        let lot = &lots[idx];
        if *kg > lot.remaining_kg {
            return Err(CoreError::InsufficientStock {
                lot: lot.party.clone(),
                available: lot.remaining_kg,
                requested: *kg,
            });
        }
        targets.push((idx, *kg));
    }

    for (idx, kg) in targets {
        lots[idx].deduct(kg)?;
    }
    Ok(())
}

/// Restores lots for a shipment's lines. All-or-nothing like `apply_lines`.
pub fn reverse_lines(lots: &mut [InventoryLot], lines: &[ShipmentLine]) -> CoreResult<()> {
    let plan = plan_deductions(lines);
    let mut targets = Vec::with_capacity(plan.len());
    for (lot_id, kg) in &plan {
        let idx = lot_index(lots, lot_id)?;
        let lot = &lots[idx];
        let room = lot.shipped_kg();
        if *kg > room {
            return Err(CoreError::OverRestore {
                lot: lot.party.clone(),
                restored: *kg,
                room,
            });
        }
        targets.push((idx, *kg));
    }

    for (idx, kg) in targets {
        lots[idx].restore(kg)?;
    }
    Ok(())
}

/// Replaces a shipment's old lines with new ones on the lots.
///
/// The old lines are restored and the new ones applied on a scratch copy;
/// the lots are only overwritten when both steps succeed.
pub fn replace_lines(
    lots: &mut [InventoryLot],
    old_lines: &[ShipmentLine],
    new_lines: &[ShipmentLine],
) -> CoreResult<()> {
    let mut scratch = lots.to_vec();
    reverse_lines(&mut scratch, old_lines)?;
    apply_lines(&mut scratch, new_lines)?;
    lots.clone_from_slice(&scratch);
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
