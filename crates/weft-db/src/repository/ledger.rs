//! # Ledger Repository
//!
//! Validated writes for customers, products, suppliers, payments and
//! production costs, plus deletes that refuse to orphan other records.
//!
//! ## Delete Guards
//! ```text
//! customer  ← shipments.customer_id, payments.customer_id
//! product   ← lots.product_id, production_costs.product_id
//! supplier  ← lots.supplier_id, supplier_payments.supplier_id,
//!             production_costs.supplier_id
//! ```

use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use weft_core::validation::{
    validate_cost, validate_customer, validate_payment, validate_product, validate_supplier,
    validate_supplier_payment,
};
use weft_core::{
    CoreError, Customer, Entity, InventoryLot, Payment, Product, ProductionCost, Shipment, Supplier,
    SupplierPayment,
};

use crate::error::{DbError, DbResult};
use crate::repository::collection;

/// Repository for the parties and money records around the stock.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    pool: SqlitePool,
}

impl LedgerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        LedgerRepository { pool }
    }

    // =========================================================================
    // Customers
    // =========================================================================

    pub async fn add_customer(&self, customer: Customer) -> DbResult<Customer> {
        validate_customer(&customer)?;
        let mut conn = self.pool.acquire().await?;
        let customer = collection::insert(&mut conn, &trimmed_customer(customer)).await?;
        info!(customer_id = %customer.id, name = %customer.name, "Customer added");
        Ok(customer)
    }

    pub async fn update_customer(&self, customer: Customer) -> DbResult<Customer> {
        validate_customer(&customer)?;
        let mut conn = self.pool.acquire().await?;
        let customer = collection::update(&mut conn, &trimmed_customer(customer)).await?;
        info!(customer_id = %customer.id, "Customer updated");
        Ok(customer)
    }

    /// Deletes a customer with no shipments or payments.
    pub async fn delete_customer(&self, id: &str) -> DbResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(DbError::transaction)?;

        let customer: Customer = collection::get_required(&mut tx, id).await?;
        guard::<Shipment>(&mut tx, "Customer", &customer.name, "customer_id", id).await?;
        guard::<Payment>(&mut tx, "Customer", &customer.name, "customer_id", id).await?;
        collection::delete::<Customer>(&mut tx, id).await?;

        tx.commit()
            .await
            .map_err(DbError::transaction)?;

        info!(customer_id = %id, name = %customer.name, "Customer deleted");
        Ok(())
    }

    // =========================================================================
    // Products
    // =========================================================================

    pub async fn add_product(&self, mut product: Product) -> DbResult<Product> {
        validate_product(&product)?;
        product.name = product.name.trim().to_string();
        let mut conn = self.pool.acquire().await?;
        let product = collection::insert(&mut conn, &product).await?;
        info!(product_id = %product.id, name = %product.display_name(), "Product added");
        Ok(product)
    }

    /// Deletes a product with no lots or production costs.
    pub async fn delete_product(&self, id: &str) -> DbResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(DbError::transaction)?;

        let product: Product = collection::get_required(&mut tx, id).await?;
        guard::<InventoryLot>(&mut tx, "Product", &product.name, "product_id", id).await?;
        guard::<ProductionCost>(&mut tx, "Product", &product.name, "product_id", id).await?;
        collection::delete::<Product>(&mut tx, id).await?;

        tx.commit()
            .await
            .map_err(DbError::transaction)?;

        info!(product_id = %id, name = %product.name, "Product deleted");
        Ok(())
    }

    // =========================================================================
    // Suppliers
    // =========================================================================

    pub async fn add_supplier(&self, mut supplier: Supplier) -> DbResult<Supplier> {
        validate_supplier(&supplier)?;
        supplier.name = supplier.name.trim().to_string();
        let mut conn = self.pool.acquire().await?;
        let supplier = collection::insert(&mut conn, &supplier).await?;
        info!(supplier_id = %supplier.id, name = %supplier.name, "Supplier added");
        Ok(supplier)
    }

    /// Deletes a supplier with no lots, payments or costs.
    pub async fn delete_supplier(&self, id: &str) -> DbResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(DbError::transaction)?;

        let supplier: Supplier = collection::get_required(&mut tx, id).await?;
        guard::<InventoryLot>(&mut tx, "Supplier", &supplier.name, "supplier_id", id).await?;
        guard::<SupplierPayment>(&mut tx, "Supplier", &supplier.name, "supplier_id", id).await?;
        guard::<ProductionCost>(&mut tx, "Supplier", &supplier.name, "supplier_id", id).await?;
        collection::delete::<Supplier>(&mut tx, id).await?;

        tx.commit()
            .await
            .map_err(DbError::transaction)?;

        info!(supplier_id = %id, name = %supplier.name, "Supplier deleted");
        Ok(())
    }

    // =========================================================================
    // Payments
    // =========================================================================

    /// Records money received from an existing customer.
    pub async fn record_payment(&self, payment: Payment) -> DbResult<Payment> {
        validate_payment(&payment)?;
        let mut conn = self.pool.acquire().await?;
        collection::ensure_exists::<Customer>(&mut conn, &payment.customer_id).await?;

        let payment = collection::insert(&mut conn, &payment).await?;
        info!(
            payment_id = %payment.id,
            customer_id = %payment.customer_id,
            amount = %payment.amount,
            method = %payment.method,
            "Payment recorded"
        );
        Ok(payment)
    }

    pub async fn delete_payment(&self, id: &str) -> DbResult<()> {
        let mut conn = self.pool.acquire().await?;
        collection::delete::<Payment>(&mut conn, id).await?;
        info!(payment_id = %id, "Payment deleted");
        Ok(())
    }

    /// Records money paid to an existing supplier.
    pub async fn record_supplier_payment(&self, payment: SupplierPayment) -> DbResult<SupplierPayment> {
        validate_supplier_payment(&payment)?;
        let mut conn = self.pool.acquire().await?;
        collection::ensure_exists::<Supplier>(&mut conn, &payment.supplier_id).await?;

        let payment = collection::insert(&mut conn, &payment).await?;
        info!(
            payment_id = %payment.id,
            supplier_id = %payment.supplier_id,
            amount = %payment.amount,
            "Supplier payment recorded"
        );
        Ok(payment)
    }

    pub async fn delete_supplier_payment(&self, id: &str) -> DbResult<()> {
        let mut conn = self.pool.acquire().await?;
        collection::delete::<SupplierPayment>(&mut conn, id).await?;
        info!(payment_id = %id, "Supplier payment deleted");
        Ok(())
    }

    // =========================================================================
    // Production Costs
    // =========================================================================

    /// Records a production cost. Product, lot and supplier must exist when
    /// given.
    pub async fn record_cost(&self, mut cost: ProductionCost) -> DbResult<ProductionCost> {
        validate_cost(&cost)?;
        cost.description = cost.description.trim().to_string();

        let mut conn = self.pool.acquire().await?;
        if let Some(product_id) = &cost.product_id {
            collection::ensure_exists::<Product>(&mut conn, product_id).await?;
        }
        if let Some(lot_id) = &cost.lot_id {
            collection::ensure_exists::<InventoryLot>(&mut conn, lot_id).await?;
        }
        if let Some(supplier_id) = &cost.supplier_id {
            collection::ensure_exists::<Supplier>(&mut conn, supplier_id).await?;
        }

        let cost = collection::insert(&mut conn, &cost).await?;
        info!(
            cost_id = %cost.id,
            category = %cost.category,
            amount = %cost.amount,
            "Production cost recorded"
        );
        Ok(cost)
    }

    pub async fn delete_cost(&self, id: &str) -> DbResult<()> {
        let mut conn = self.pool.acquire().await?;
        collection::delete::<ProductionCost>(&mut conn, id).await?;
        info!(cost_id = %id, "Production cost deleted");
        Ok(())
    }
}

fn trimmed_customer(mut customer: Customer) -> Customer {
    customer.name = customer.name.trim().to_string();
    customer
}

/// `InUse` when any `R` record points at `id` through `field`.
pub(crate) async fn guard<R: Entity>(
    conn: &mut SqliteConnection,
    entity: &str,
    label: &str,
    field: &str,
    id: &str,
) -> DbResult<()> {
    let count = collection::count_by::<R>(conn, field, id).await?;
    debug!(entity, id = %id, store = R::STORE, count, "Reference check");
    if count > 0 {
        return Err(CoreError::in_use(entity, label, R::STORE.replace('_', " "), count as usize).into());
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::lot::NewLot;
    use crate::repository::shipment::NewShipment;
    use crate::{Database, DbConfig};
    use chrono::NaiveDate;
    use weft_core::{CostCategory, LineRequest, Money, PaymentMethod, Weight};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, d).unwrap()
    }

    async fn setup() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn lot_input(product_id: &str, supplier_id: Option<String>) -> NewLot {
        NewLot {
            product_id: product_id.to_string(),
            party: "P-88".to_string(),
            date: day(1),
            rolls: 2,
            total_kg: Weight::from_kg(50),
            supplier_id,
            cost_per_kg: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_add_customer_validates_and_trims() {
        let db = setup().await;
        let ledger = db.ledger();

        let stored = ledger.add_customer(Customer::new("  Acme Tekstil ")).await.unwrap();
        assert_eq!(stored.name, "Acme Tekstil");

        let err = ledger.add_customer(Customer::new("   ")).await.unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::Validation(_))));

        let mut bad_email = Customer::new("Zeta");
        bad_email.email = Some("not-an-email".to_string());
        assert!(ledger.add_customer(bad_email).await.is_err());
    }

    #[tokio::test]
    async fn test_update_customer() {
        let db = setup().await;
        let mut customer = db.ledger().add_customer(Customer::new("Acme")).await.unwrap();
        customer.phone = Some("+90 212 555 0000".to_string());

        let updated = db.ledger().update_customer(customer.clone()).await.unwrap();
        assert_eq!(updated.phone.as_deref(), Some("+90 212 555 0000"));
        assert_eq!(updated.created_at, customer.created_at);
    }

    #[tokio::test]
    async fn test_payment_requires_customer_and_positive_amount() {
        let db = setup().await;
        let ledger = db.ledger();
        let customer = ledger.add_customer(Customer::new("Acme")).await.unwrap();

        let err = ledger
            .record_payment(Payment::new("ghost", Money::from_cents(100), PaymentMethod::Cash, day(2)))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));

        let err = ledger
            .record_payment(Payment::new(&customer.id, Money::zero(), PaymentMethod::Cash, day(2)))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::Validation(_))));

        let payment = ledger
            .record_payment(Payment::new(&customer.id, Money::from_cents(25_000), PaymentMethod::BankTransfer, day(2)))
            .await
            .unwrap();
        assert_eq!(db.payments().count().await.unwrap(), 1);

        ledger.delete_payment(&payment.id).await.unwrap();
        assert_eq!(db.payments().count().await.unwrap(), 0);
        assert!(ledger.delete_payment(&payment.id).await.is_err());
    }

    #[tokio::test]
    async fn test_customer_delete_guarded() {
        let db = setup().await;
        let ledger = db.ledger();
        let customer = ledger.add_customer(Customer::new("Acme")).await.unwrap();
        let idle = ledger.add_customer(Customer::new("Idle")).await.unwrap();
        let product = ledger.add_product(Product::new("Pique")).await.unwrap();
        let lot = db.lots().create(lot_input(&product.id, None)).await.unwrap();

        db.shipments()
            .create(NewShipment {
                customer_id: customer.id.clone(),
                date: day(3),
                lines: vec![LineRequest {
                    lot_id: lot.id.clone(),
                    kg: Weight::from_kg(5),
                    unit_price: Money::from_cents(300),
                }],
                notes: None,
            })
            .await
            .unwrap();

        let err = ledger.delete_customer(&customer.id).await.unwrap_err();
        match err {
            DbError::Core(CoreError::InUse { referenced_by, count, .. }) => {
                assert_eq!(referenced_by, "shipments");
                assert_eq!(count, 1);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        ledger.delete_customer(&idle.id).await.unwrap();
        assert!(db.customers().get(&idle.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_product_delete_guarded_by_lots() {
        let db = setup().await;
        let ledger = db.ledger();
        let product = ledger.add_product(Product::new("Pique")).await.unwrap();
        let lot = db.lots().create(lot_input(&product.id, None)).await.unwrap();

        assert!(matches!(
            ledger.delete_product(&product.id).await.unwrap_err(),
            DbError::Core(CoreError::InUse { .. })
        ));

        db.lots().delete(&lot.id).await.unwrap();
        ledger.delete_product(&product.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_supplier_payments_and_delete_guard() {
        let db = setup().await;
        let ledger = db.ledger();
        let supplier = ledger.add_supplier(Supplier::new("Yarn House")).await.unwrap();

        let payment = ledger
            .record_supplier_payment(SupplierPayment::new(
                &supplier.id,
                Money::from_cents(80_000),
                PaymentMethod::Check,
                day(4),
            ))
            .await
            .unwrap();

        assert!(matches!(
            ledger.delete_supplier(&supplier.id).await.unwrap_err(),
            DbError::Core(CoreError::InUse { .. })
        ));

        ledger.delete_supplier_payment(&payment.id).await.unwrap();
        ledger.delete_supplier(&supplier.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_record_cost_checks_references() {
        let db = setup().await;
        let ledger = db.ledger();
        let supplier = ledger.add_supplier(Supplier::new("Dye House")).await.unwrap();

        let mut cost = ProductionCost::new(CostCategory::Dyeing, "Navy batch", Money::from_cents(120_000), day(5));
        cost.supplier_id = Some("ghost".to_string());
        assert!(matches!(
            ledger.record_cost(cost.clone()).await.unwrap_err(),
            DbError::NotFound { .. }
        ));

        cost.supplier_id = Some(supplier.id.clone());
        cost.kg = Some(Weight::from_kg(400));
        let stored = ledger.record_cost(cost).await.unwrap();
        assert_eq!(stored.category, CostCategory::Dyeing);

        assert!(ledger.delete_supplier(&supplier.id).await.is_err());
        ledger.delete_cost(&stored.id).await.unwrap();
        ledger.delete_supplier(&supplier.id).await.unwrap();
    }
}
