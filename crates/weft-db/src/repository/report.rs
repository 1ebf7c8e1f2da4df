//! # Report Repository
//!
//! Loads the collections a report needs and hands them to the pure
//! aggregations in `weft_core::report`.
//!
//! Collections are loaded one after another on the same connection; the
//! in-memory pool has a single connection.

use sqlx::SqlitePool;
use tracing::debug;

use weft_core::receipt::{CompanyHeader, Receipt};
use weft_core::report::{
    self, CostSummary, CustomerBalance, DateRange, SalesRow, Statement, StockSummary, SupplierBalance,
};
use weft_core::{
    Customer, Entity, InventoryLot, Payment, Product, ProductionCost, Shipment, Supplier, SupplierPayment,
};

use crate::error::DbResult;
use crate::repository::collection;

/// Read-only reports.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    async fn load<T: Entity>(&self) -> DbResult<Vec<T>> {
        let mut conn = self.pool.acquire().await?;
        let records = collection::list::<T>(&mut conn).await?;
        debug!(store = T::STORE, count = records.len(), "Loaded for report");
        Ok(records)
    }

    pub async fn customer_balances(&self) -> DbResult<Vec<CustomerBalance>> {
        let customers = self.load::<Customer>().await?;
        let shipments = self.load::<Shipment>().await?;
        let payments = self.load::<Payment>().await?;
        Ok(report::customer_balances(&customers, &shipments, &payments))
    }

    pub async fn customer_statement(&self, customer_id: &str, range: DateRange) -> DbResult<Statement> {
        let (customer, shipments, payments) = {
            let mut conn = self.pool.acquire().await?;
            let customer: Customer = collection::get_required(&mut conn, customer_id).await?;
            let shipments: Vec<Shipment> = collection::find_by(&mut conn, "customer_id", customer_id).await?;
            let payments: Vec<Payment> = collection::find_by(&mut conn, "customer_id", customer_id).await?;
            (customer, shipments, payments)
        };
        Ok(report::customer_statement(&customer, &shipments, &payments, range))
    }

    pub async fn stock_summary(&self) -> DbResult<Vec<StockSummary>> {
        let products = self.load::<Product>().await?;
        let lots = self.load::<InventoryLot>().await?;
        Ok(report::stock_summary(&products, &lots))
    }

    pub async fn sales_by_product(&self, range: DateRange) -> DbResult<Vec<SalesRow>> {
        let products = self.load::<Product>().await?;
        let shipments = self.load::<Shipment>().await?;
        Ok(report::sales_by_product(&products, &shipments, range))
    }

    pub async fn sales_by_month(&self, range: DateRange) -> DbResult<Vec<SalesRow>> {
        let shipments = self.load::<Shipment>().await?;
        Ok(report::sales_by_month(&shipments, range))
    }

    pub async fn supplier_balances(&self) -> DbResult<Vec<SupplierBalance>> {
        let suppliers = self.load::<Supplier>().await?;
        let costs = self.load::<ProductionCost>().await?;
        let payments = self.load::<SupplierPayment>().await?;
        Ok(report::supplier_balances(&suppliers, &costs, &payments))
    }

    pub async fn cost_summary(&self, range: DateRange) -> DbResult<Vec<CostSummary>> {
        let costs = self.load::<ProductionCost>().await?;
        Ok(report::cost_summary(&costs, range))
    }

    /// Printable receipt for a shipment, with the customer's balance before
    /// and after it.
    pub async fn receipt(&self, shipment_id: &str, company: CompanyHeader) -> DbResult<Receipt> {
        let mut conn = self.pool.acquire().await?;
        let shipment: Shipment = collection::get_required(&mut conn, shipment_id).await?;
        let customer: Customer = collection::get_required(&mut conn, &shipment.customer_id).await?;
        let shipments: Vec<Shipment> = collection::find_by(&mut conn, "customer_id", &customer.id).await?;
        let payments: Vec<Payment> = collection::find_by(&mut conn, "customer_id", &customer.id).await?;
        let products: Vec<Product> = collection::list(&mut conn).await?;

        let previous_balance = report::balance_before(&shipment, &shipments, &payments);
        Ok(Receipt::build(company, &shipment, &customer, &products, previous_balance))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
