//! # Reports
//!
//! Aggregations over loaded records. Every function here is a pure
//! group-by: the database layer loads the collections and passes them in.
//!
//! ## Reports
//! ```text
//! customer_balances   shipments − payments per customer
//! customer_statement  chronological ledger with running balance
//! stock_summary       lots grouped by product
//! sales_by_product    shipment lines grouped by product
//! sales_by_month      shipments grouped by YYYY-MM
//! supplier_balances   billed costs − supplier payments
//! cost_summary        production costs grouped by category
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::money::Money;
use crate::types::{
    CostCategory, Customer, InventoryLot, LotStatus, Payment, Product, ProductionCost, Shipment,
    Supplier, SupplierPayment,
};
use crate::weight::Weight;

// =============================================================================
// Date Range
// =============================================================================

/// Inclusive date range; an open end means unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        DateRange { from, to }
    }

    /// The unbounded range.
    pub fn all() -> Self {
        DateRange::default()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from.map_or(true, |from| date >= from) && self.to.map_or(true, |to| date <= to)
    }

    /// True when `date` falls before the start of the range.
    pub fn is_before(&self, date: NaiveDate) -> bool {
        self.from.map_or(false, |from| date < from)
    }
}

// =============================================================================
// Customer Balances
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerBalance {
    pub customer_id: String,
    pub customer_name: String,
    pub shipment_count: usize,
    pub shipped_kg: Weight,
    pub shipped_total: Money,
    pub paid_total: Money,
    /// Shipped minus paid; positive means the customer owes money.
    pub balance: Money,
}

/// Balance of every customer, sorted by name.
pub fn customer_balances(
    customers: &[Customer],
    shipments: &[Shipment],
    payments: &[Payment],
) -> Vec<CustomerBalance> {
    let mut rows: BTreeMap<&str, CustomerBalance> = customers
        .iter()
        .map(|c| {
            (
                c.id.as_str(),
                CustomerBalance {
                    customer_id: c.id.clone(),
                    customer_name: c.name.clone(),
                    shipment_count: 0,
                    shipped_kg: Weight::zero(),
                    shipped_total: Money::zero(),
                    paid_total: Money::zero(),
                    balance: Money::zero(),
                },
            )
        })
        .collect();

    for shipment in shipments {
        if let Some(row) = rows.get_mut(shipment.customer_id.as_str()) {
            row.shipment_count += 1;
            row.shipped_kg += shipment.total_kg;
            row.shipped_total += shipment.total_amount;
        }
    }
    for payment in payments {
        if let Some(row) = rows.get_mut(payment.customer_id.as_str()) {
            row.paid_total += payment.amount;
        }
    }

    let mut balances: Vec<CustomerBalance> = rows
        .into_values()
        .map(|mut row| {
            row.balance = row.shipped_total - row.paid_total;
            row
        })
        .collect();
    balances.sort_by(|a, b| a.customer_name.cmp(&b.customer_name).then_with(|| a.customer_id.cmp(&b.customer_id)));
    balances
}

// =============================================================================
// Customer Statement
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Shipment,
    Payment,
}

/// One line of an account statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementEntry {
    pub date: NaiveDate,
    pub kind: EntryKind,
    /// Record id of the shipment or payment.
    pub record_id: String,
    /// Shipment number, or payment method.
    pub reference: String,
    pub kg: Option<Weight>,
    pub debit: Money,
    pub credit: Money,
    /// Balance after this entry.
    pub balance: Money,
    #[serde(skip)]
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statement {
    pub customer_id: String,
    pub customer_name: String,
    pub range: DateRange,
    /// Balance carried in from before the range.
    pub opening_balance: Money,
    pub entries: Vec<StatementEntry>,
    pub total_debit: Money,
    pub total_credit: Money,
    pub closing_balance: Money,
}

fn ledger_entries(customer_id: &str, shipments: &[Shipment], payments: &[Payment]) -> Vec<StatementEntry> {
    let mut entries: Vec<StatementEntry> = shipments
        .iter()
        .filter(|s| s.customer_id == customer_id)
        .map(|s| StatementEntry {
            date: s.date,
            kind: EntryKind::Shipment,
            record_id: s.id.clone(),
            reference: s.number.clone(),
            kg: Some(s.total_kg),
            debit: s.total_amount,
            credit: Money::zero(),
            balance: Money::zero(),
            created_at: s.created_at,
        })
        .chain(
            payments
                .iter()
                .filter(|p| p.customer_id == customer_id)
                .map(|p| StatementEntry {
                    date: p.date,
                    kind: EntryKind::Payment,
                    record_id: p.id.clone(),
                    reference: p.method.to_string(),
                    kg: None,
                    debit: Money::zero(),
                    credit: p.amount,
                    balance: Money::zero(),
                    created_at: p.created_at,
                }),
        )
        .collect();
    entries.sort_by(|a, b| {
        a.date
            .cmp(&b.date)
            .then_with(|| a.created_at.cmp(&b.created_at))
            .then_with(|| a.record_id.cmp(&b.record_id))
    });
    entries
}

/// Chronological account statement for one customer.
///
/// Entries before `range.from` are folded into the opening balance;
/// entries after `range.to` are ignored.
pub fn customer_statement(
    customer: &Customer,
    shipments: &[Shipment],
    payments: &[Payment],
    range: DateRange,
) -> Statement {
    let mut opening_balance = Money::zero();
    let mut running = Money::zero();
    let mut total_debit = Money::zero();
    let mut total_credit = Money::zero();
    let mut entries = Vec::new();

    for mut entry in ledger_entries(&customer.id, shipments, payments) {
        if range.is_before(entry.date) {
            opening_balance += entry.debit - entry.credit;
            running = opening_balance;
            continue;
        }
        if !range.contains(entry.date) {
            continue;
        }
        running += entry.debit - entry.credit;
        total_debit += entry.debit;
        total_credit += entry.credit;
        entry.balance = running;
        entries.push(entry);
    }

    Statement {
        customer_id: customer.id.clone(),
        customer_name: customer.name.clone(),
        range,
        opening_balance,
        entries,
        total_debit,
        total_credit,
        closing_balance: opening_balance + total_debit - total_credit,
    }
}

/// The customer's balance just before `shipment`, in statement order.
///
/// Used for the "previous balance" line of a receipt.
pub fn balance_before(shipment: &Shipment, shipments: &[Shipment], payments: &[Payment]) -> Money {
    ledger_entries(&shipment.customer_id, shipments, payments)
        .into_iter()
        .take_while(|entry| entry.record_id != shipment.id)
        .map(|entry| entry.debit - entry.credit)
        .sum()
}

// =============================================================================
// Stock Summary
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockSummary {
    pub product_id: String,
    pub product_name: String,
    pub lot_count: usize,
    pub rolls: u64,
    pub total_kg: Weight,
    pub remaining_kg: Weight,
    pub shipped_kg: Weight,
    pub in_stock: usize,
    pub partial: usize,
    pub depleted: usize,
}

/// Lots grouped by product, sorted by product name.
///
/// Products without lots are listed with zero stock.
pub fn stock_summary(products: &[Product], lots: &[InventoryLot]) -> Vec<StockSummary> {
    let mut rows: HashMap<&str, StockSummary> = products
        .iter()
        .map(|p| {
            (
                p.id.as_str(),
                StockSummary {
                    product_id: p.id.clone(),
                    product_name: p.display_name(),
                    lot_count: 0,
                    rolls: 0,
                    total_kg: Weight::zero(),
                    remaining_kg: Weight::zero(),
                    shipped_kg: Weight::zero(),
                    in_stock: 0,
                    partial: 0,
                    depleted: 0,
                },
            )
        })
        .collect();

    for lot in lots {
        let row = rows.entry(lot.product_id.as_str()).or_insert_with(|| StockSummary {
            product_id: lot.product_id.clone(),
            product_name: format!("(unknown product {})", lot.product_id),
            lot_count: 0,
            rolls: 0,
            total_kg: Weight::zero(),
            remaining_kg: Weight::zero(),
            shipped_kg: Weight::zero(),
            in_stock: 0,
            partial: 0,
            depleted: 0,
        });
        row.lot_count += 1;
        row.rolls += u64::from(lot.rolls);
        row.total_kg += lot.total_kg;
        row.remaining_kg += lot.remaining_kg;
        row.shipped_kg += lot.shipped_kg();
        match LotStatus::from_quantities(lot.remaining_kg, lot.total_kg) {
            LotStatus::InStock => row.in_stock += 1,
            LotStatus::Partial => row.partial += 1,
            LotStatus::Depleted => row.depleted += 1,
        }
    }

    let mut summary: Vec<StockSummary> = rows.into_values().collect();
    summary.sort_by(|a, b| a.product_name.cmp(&b.product_name).then_with(|| a.product_id.cmp(&b.product_id)));
    summary
}

// =============================================================================
// Sales
// =============================================================================

/// Sales grouped under one key (a product or a month).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesRow {
    pub key: String,
    pub label: String,
    pub shipment_count: usize,
    pub kg: Weight,
    pub amount: Money,
    /// Average realised price per kg.
    pub avg_price_per_kg: Option<Money>,
}

#[derive(Default)]
struct SalesAcc {
    shipments: BTreeSet<String>,
    kg: Weight,
    amount: Money,
}

fn finish_sales(groups: BTreeMap<String, SalesAcc>, label: impl Fn(&str) -> String) -> Vec<SalesRow> {
    groups
        .into_iter()
        .map(|(key, acc)| SalesRow {
            label: label(&key),
            shipment_count: acc.shipments.len(),
            avg_price_per_kg: acc.amount.per_kg(acc.kg),
            kg: acc.kg,
            amount: acc.amount,
            key,
        })
        .collect()
}

/// Shipment lines within `range` grouped by product, ordered by amount
/// (largest first).
pub fn sales_by_product(products: &[Product], shipments: &[Shipment], range: DateRange) -> Vec<SalesRow> {
    let names: HashMap<&str, String> = products.iter().map(|p| (p.id.as_str(), p.display_name())).collect();
    let mut groups: BTreeMap<String, SalesAcc> = BTreeMap::new();

    for shipment in shipments.iter().filter(|s| range.contains(s.date)) {
        for line in &shipment.lines {
            let acc = groups.entry(line.product_id.clone()).or_default();
            acc.shipments.insert(shipment.id.clone());
            acc.kg += line.kg;
            acc.amount += line.line_total;
        }
    }

    let mut rows = finish_sales(groups, |id| {
        names
            .get(id)
            .cloned()
            .unwrap_or_else(|| format!("(unknown product {})", id))
    });
    rows.sort_by(|a, b| b.amount.cmp(&a.amount).then_with(|| a.label.cmp(&b.label)));
    rows
}

/// Shipments within `range` grouped by calendar month (`YYYY-MM`),
/// oldest month first.
pub fn sales_by_month(shipments: &[Shipment], range: DateRange) -> Vec<SalesRow> {
    let mut groups: BTreeMap<String, SalesAcc> = BTreeMap::new();

    for shipment in shipments.iter().filter(|s| range.contains(s.date)) {
        let acc = groups.entry(shipment.date.format("%Y-%m").to_string()).or_default();
        acc.shipments.insert(shipment.id.clone());
        acc.kg += shipment.total_kg;
        acc.amount += shipment.total_amount;
    }

    finish_sales(groups, str::to_string)
}

// =============================================================================
// Suppliers & Costs
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplierBalance {
    pub supplier_id: String,
    pub supplier_name: String,
    /// Production costs billed by the supplier.
    pub billed: Money,
    pub paid: Money,
    /// Billed minus paid; positive means we owe the supplier.
    pub balance: Money,
}

/// Balance of every supplier, sorted by name.
pub fn supplier_balances(
    suppliers: &[Supplier],
    costs: &[ProductionCost],
    payments: &[SupplierPayment],
) -> Vec<SupplierBalance> {
    let mut billed: HashMap<&str, Money> = HashMap::new();
    for cost in costs {
        if let Some(supplier_id) = cost.supplier_id.as_deref() {
            *billed.entry(supplier_id).or_default() += cost.amount;
        }
    }
    let mut paid: HashMap<&str, Money> = HashMap::new();
    for payment in payments {
        *paid.entry(payment.supplier_id.as_str()).or_default() += payment.amount;
    }

    let mut rows: Vec<SupplierBalance> = suppliers
        .iter()
        .map(|s| {
            let billed = billed.get(s.id.as_str()).copied().unwrap_or_default();
            let paid = paid.get(s.id.as_str()).copied().unwrap_or_default();
            SupplierBalance {
                supplier_id: s.id.clone(),
                supplier_name: s.name.clone(),
                billed,
                paid,
                balance: billed - paid,
            }
        })
        .collect();
    rows.sort_by(|a, b| a.supplier_name.cmp(&b.supplier_name).then_with(|| a.supplier_id.cmp(&b.supplier_id)));
    rows
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostSummary {
    pub category: CostCategory,
    pub entry_count: usize,
    pub amount: Money,
    /// Weight covered by entries that recorded one.
    pub kg: Weight,
    /// Amount of weighed entries divided by their weight.
    pub cost_per_kg: Option<Money>,
}

/// Production costs within `range` per category, in category order.
/// Categories without entries are omitted.
pub fn cost_summary(costs: &[ProductionCost], range: DateRange) -> Vec<CostSummary> {
    #[derive(Default)]
    struct Acc {
        count: usize,
        amount: Money,
        weighed_amount: Money,
        kg: Weight,
    }

    let mut groups: BTreeMap<CostCategory, Acc> = BTreeMap::new();
    for cost in costs.iter().filter(|c| range.contains(c.date)) {
        let acc = groups.entry(cost.category).or_default();
        acc.count += 1;
        acc.amount += cost.amount;
        if let Some(kg) = cost.kg {
            acc.kg += kg;
            acc.weighed_amount += cost.amount;
        }
    }

    groups
        .into_iter()
        .map(|(category, acc)| CostSummary {
            category,
            entry_count: acc.count,
            amount: acc.amount,
            kg: acc.kg,
            cost_per_kg: acc.weighed_amount.per_kg(acc.kg),
        })
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PaymentMethod, ShipmentLine};
    use chrono::Duration;

    fn date(month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, month, day).unwrap()
    }

    fn customer(id: &str, name: &str) -> Customer {
        let mut c = Customer::new(name);
        c.id = id.to_string();
        c
    }

    fn shipment(id: &str, customer_id: &str, when: NaiveDate, lot: &InventoryLot, kg: i64, cents_per_kg: i64) -> Shipment {
        let line = ShipmentLine::from_lot(lot, Weight::from_kg(kg), Money::from_cents(cents_per_kg)).unwrap();
        let mut s = Shipment::new(format!("SHP-{}", id), customer_id, when, vec![line]);
        s.id = id.to_string();
        s
    }

    fn payment(customer_id: &str, when: NaiveDate, cents: i64) -> Payment {
        Payment::new(customer_id, Money::from_cents(cents), PaymentMethod::Cash, when)
    }

    fn jersey_lot() -> InventoryLot {
        let mut lot = InventoryLot::new("jersey", "P-1", date(1, 1), 10, Weight::from_kg(1_000));
        lot.id = "lot-1".to_string();
        lot
    }

    #[test]
    fn test_date_range() {
        let range = DateRange::new(Some(date(2, 1)), Some(date(2, 28)));
        assert!(range.contains(date(2, 1)));
        assert!(range.contains(date(2, 28)));
        assert!(!range.contains(date(3, 1)));
        assert!(range.is_before(date(1, 31)));
        assert!(DateRange::all().contains(date(12, 31)));
        assert!(!DateRange::all().is_before(date(1, 1)));
    }

    #[test]
    fn test_customer_balances() {
        let lot = jersey_lot();
        let customers = vec![customer("c-2", "Zeta Tekstil"), customer("c-1", "Acme")];
        let shipments = vec![
            shipment("s-1", "c-1", date(1, 5), &lot, 100, 400),
            shipment("s-2", "c-1", date(1, 9), &lot, 50, 400),
            shipment("s-3", "c-2", date(1, 9), &lot, 10, 500),
        ];
        let payments = vec![payment("c-1", date(1, 10), 30_000)];

        let balances = customer_balances(&customers, &shipments, &payments);
        assert_eq!(balances[0].customer_name, "Acme");
        assert_eq!(balances[0].shipment_count, 2);
        assert_eq!(balances[0].shipped_kg, Weight::from_kg(150));
        assert_eq!(balances[0].shipped_total, Money::from_cents(60_000));
        assert_eq!(balances[0].balance, Money::from_cents(30_000));
        assert_eq!(balances[1].balance, Money::from_cents(5_000));
    }

    #[test]
    fn test_statement_running_balance_and_range() {
        let lot = jersey_lot();
        let acme = customer("c-1", "Acme");
        let shipments = vec![
            shipment("s-1", "c-1", date(1, 5), &lot, 100, 400),
            shipment("s-2", "c-1", date(2, 3), &lot, 50, 400),
            shipment("s-3", "c-1", date(3, 7), &lot, 10, 400),
        ];
        let payments = vec![payment("c-1", date(1, 20), 10_000), payment("c-1", date(2, 10), 15_000)];

        let full = customer_statement(&acme, &shipments, &payments, DateRange::all());
        let balances: Vec<i64> = full.entries.iter().map(|e| e.balance.cents()).collect();
        assert_eq!(balances, vec![40_000, 30_000, 50_000, 35_000, 39_000]);
        assert_eq!(full.closing_balance, Money::from_cents(39_000));

        let feb = customer_statement(&acme, &shipments, &payments, DateRange::new(Some(date(2, 1)), Some(date(2, 28))));
        assert_eq!(feb.opening_balance, Money::from_cents(30_000));
        assert_eq!(feb.entries.len(), 2);
        assert_eq!(feb.entries[0].balance, Money::from_cents(50_000));
        assert_eq!(feb.total_debit, Money::from_cents(20_000));
        assert_eq!(feb.total_credit, Money::from_cents(15_000));
        assert_eq!(feb.closing_balance, Money::from_cents(35_000));
    }

    #[test]
    fn test_balance_before_shipment() {
        let lot = jersey_lot();
        let first = shipment("s-1", "c-1", date(1, 5), &lot, 100, 400);
        let mut second = shipment("s-2", "c-1", date(1, 5), &lot, 10, 400);
        second.created_at = first.created_at + Duration::seconds(5);
        let shipments = vec![second.clone(), first.clone()];
        let payments = vec![payment("c-1", date(1, 1), 5_000)];

        assert_eq!(balance_before(&first, &shipments, &payments), Money::from_cents(-5_000));
        assert_eq!(balance_before(&second, &shipments, &payments), Money::from_cents(35_000));
    }

    #[test]
    fn test_stock_summary() {
        let mut jersey = Product::new("Jersey");
        jersey.id = "jersey".to_string();
        let mut rib = Product::new("Rib");
        rib.id = "rib".to_string();

        let mut a = jersey_lot();
        a.deduct(Weight::from_kg(400)).unwrap();
        let mut b = InventoryLot::new("jersey", "P-2", date(1, 2), 5, Weight::from_kg(200));
        b.deduct(Weight::from_kg(200)).unwrap();
        let c = InventoryLot::new("jersey", "P-3", date(1, 3), 3, Weight::from_kg(90));

        let summary = stock_summary(&[jersey, rib], &[a, b, c]);
        assert_eq!(summary.len(), 2);
        let row = &summary[0];
        assert_eq!(row.product_name, "Jersey");
        assert_eq!(row.lot_count, 3);
        assert_eq!(row.rolls, 18);
        assert_eq!(row.total_kg, Weight::from_kg(1_290));
        assert_eq!(row.remaining_kg, Weight::from_kg(690));
        assert_eq!(row.shipped_kg, Weight::from_kg(600));
        assert_eq!((row.in_stock, row.partial, row.depleted), (1, 1, 1));
        assert_eq!(summary[1].lot_count, 0);
    }

    #[test]
    fn test_sales_grouping() {
        let lot = jersey_lot();
        let mut jersey = Product::new("Jersey");
        jersey.id = "jersey".to_string();
        let shipments = vec![
            shipment("s-1", "c-1", date(1, 5), &lot, 100, 400),
            shipment("s-2", "c-1", date(1, 25), &lot, 50, 500),
            shipment("s-3", "c-2", date(2, 3), &lot, 10, 500),
        ];

        let by_product = sales_by_product(&[jersey], &shipments, DateRange::all());
        assert_eq!(by_product.len(), 1);
        assert_eq!(by_product[0].label, "Jersey");
        assert_eq!(by_product[0].shipment_count, 3);
        assert_eq!(by_product[0].kg, Weight::from_kg(160));
        assert_eq!(by_product[0].amount, Money::from_cents(70_000));
        assert_eq!(by_product[0].avg_price_per_kg, Some(Money::from_cents(438)));

        let by_month = sales_by_month(&shipments, DateRange::all());
        let keys: Vec<&str> = by_month.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["2026-01", "2026-02"]);
        assert_eq!(by_month[0].amount, Money::from_cents(65_000));

        let feb_only = sales_by_month(&shipments, DateRange::new(Some(date(2, 1)), None));
        assert_eq!(feb_only.len(), 1);
    }

    #[test]
    fn test_supplier_balances() {
        let mut dye_house = Supplier::new("Renk Boya");
        dye_house.id = "s-1".to_string();
        let mut cost = ProductionCost::new(CostCategory::Dyeing, "Navy run", Money::from_cents(80_000), date(1, 3));
        cost.supplier_id = Some("s-1".to_string());
        let unrelated = ProductionCost::new(CostCategory::Transport, "Truck", Money::from_cents(5_000), date(1, 3));
        let paid = SupplierPayment::new("s-1", Money::from_cents(50_000), PaymentMethod::BankTransfer, date(1, 10));

        let rows = supplier_balances(&[dye_house], &[cost, unrelated], &[paid]);
        assert_eq!(rows[0].billed, Money::from_cents(80_000));
        assert_eq!(rows[0].paid, Money::from_cents(50_000));
        assert_eq!(rows[0].balance, Money::from_cents(30_000));
    }

    #[test]
    fn test_cost_summary() {
        let mut yarn = ProductionCost::new(CostCategory::Yarn, "30/1 cotton", Money::from_cents(300_000), date(1, 2));
        yarn.kg = Some(Weight::from_kg(1_000));
        let extra = ProductionCost::new(CostCategory::Yarn, "Freight surcharge", Money::from_cents(10_000), date(1, 2));
        let dye = ProductionCost::new(CostCategory::Dyeing, "Navy", Money::from_cents(50_000), date(1, 4));

        let summary = cost_summary(&[dye, yarn, extra], DateRange::all());
        assert_eq!(summary[0].category, CostCategory::Yarn);
        assert_eq!(summary[0].entry_count, 2);
        assert_eq!(summary[0].amount, Money::from_cents(310_000));
        assert_eq!(summary[0].cost_per_kg, Some(Money::from_cents(300)));
        assert_eq!(summary[1].category, CostCategory::Dyeing);
        assert_eq!(summary[1].cost_per_kg, None);
    }
}
