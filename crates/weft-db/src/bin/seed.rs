//! # Seed Data Generator
//!
//! Populates a database with demo textile data for development.
//!
//! ## Usage
//! ```bash
//! # Seed ./weft_dev.db with 40 lots (default)
//! cargo run -p weft-db --bin seed
//!
//! # More lots
//! cargo run -p weft-db --bin seed -- --lots 200
//!
//! # Specify database path
//! cargo run -p weft-db --bin seed -- --db ./data/weft.db
//! ```
//!
//! ## Generated Data
//! - Articles in several colors (Single Jersey, Rib, Interlock, ...)
//! - Customers and suppliers
//! - Lots spread over the last few months, each with a party number
//! - FIFO shipments against those lots, payments, production costs

use chrono::{Duration, Local, NaiveDate};
use std::env;
use weft_core::validation::validate_product;
use weft_core::{
    CostCategory, Customer, Money, Payment, PaymentMethod, Product, ProductionCost, Supplier, Weight,
};
use weft_db::{Database, DbConfig, FifoShipment, NewLot};

/// Articles with their composition.
const ARTICLES: &[(&str, &str, &str)] = &[
    ("SJ", "Single Jersey 30/1", "100% cotton"),
    ("SJL", "Single Jersey Lycra", "95% cotton 5% elastane"),
    ("RIB", "Rib 2x2", "100% cotton"),
    ("INT", "Interlock", "100% cotton"),
    ("PIQ", "Pique", "60% cotton 40% polyester"),
    ("FLC", "Fleece 3-Thread", "80% cotton 20% polyester"),
];

const COLORS: &[&str] = &["Ecru", "Black", "Navy", "Heather Grey", "Bordeaux"];

const CUSTOMERS: &[&str] = &[
    "Anka Konfeksiyon",
    "Blue Line Apparel",
    "Deniz Tekstil",
    "Marmara Garments",
    "Northwind Fashion",
    "Yildiz Moda",
];

const SUPPLIERS: &[&str] = &["Ege Yarn Mills", "Kartal Knitting", "Bosphorus Dye House"];

const METHODS: &[PaymentMethod] = &[
    PaymentMethod::BankTransfer,
    PaymentMethod::Cash,
    PaymentMethod::Check,
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut lot_count: usize = 40;
    let mut db_path = String::from("./weft_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--lots" | "-l" => {
                if i + 1 < args.len() {
                    lot_count = args[i + 1].parse().unwrap_or(40);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Weft Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -l, --lots <N>     Number of lots to receive (default: 40)");
                println!("  -d, --db <PATH>    Database file path (default: ./weft_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Weft Seed Data Generator");
    println!("========================");
    println!("Database: {}", db_path);
    println!("Lots:     {}", lot_count);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let start = std::time::Instant::now();
    let today = Local::now().date_naive();
    let ledger = db.ledger();

    // Parties
    let mut customers = Vec::new();
    for name in CUSTOMERS {
        let mut customer = Customer::new(*name);
        customer.phone = Some(format!("+90 212 555 {:04}", customers.len() * 37));
        customers.push(ledger.add_customer(customer).await?);
    }
    let mut suppliers = Vec::new();
    for name in SUPPLIERS {
        suppliers.push(ledger.add_supplier(Supplier::new(*name)).await?);
    }
    println!("✓ {} customers, {} suppliers", customers.len(), suppliers.len());

    // Articles, stored in one transaction
    let mut articles = Vec::new();
    for (code, name, composition) in ARTICLES {
        for (color_idx, color) in COLORS.iter().enumerate() {
            let mut product = Product::new(*name);
            product.code = Some(format!("{}-{:02}", code, color_idx + 1));
            product.composition = Some(composition.to_string());
            product.color = Some(color.to_string());
            product.width_cm = Some(180);
            validate_product(&product)?;
            articles.push(product);
        }
    }
    let products = db.products().put_batch(&articles).await?;
    println!("✓ {} products", products.len());

    // Lots, oldest first
    for seed in 0..lot_count {
        let product = &products[(seed * 7) % products.len()];
        let supplier = &suppliers[seed % suppliers.len()];
        let rolls = 8 + (seed % 17) as u32;
        let kg_per_roll_grams = 18_000 + ((seed * 311) % 9_000) as i64;

        db.lots()
            .create(NewLot {
                product_id: product.id.clone(),
                party: format!("P-{}", 4100 + seed),
                date: days_ago(today, (lot_count - seed) as i64 * 2),
                rolls,
                total_kg: Weight::from_grams(kg_per_roll_grams * rolls as i64),
                supplier_id: Some(supplier.id.clone()),
                cost_per_kg: Some(Money::from_cents(280 + ((seed * 13) % 90) as i64)),
                notes: None,
            })
            .await?;
    }
    println!("✓ {} lots received", lot_count);

    // Shipments drawn FIFO from the stocked products
    let mut shipped = 0;
    for seed in 0..lot_count {
        let product = &products[(seed * 7) % products.len()];
        let customer = &customers[seed % customers.len()];
        let draft = FifoShipment {
            customer_id: customer.id.clone(),
            product_id: product.id.clone(),
            kg: Weight::from_kg(60 + ((seed * 29) % 120) as i64),
            unit_price: Money::from_cents(420 + ((seed * 11) % 150) as i64),
            date: days_ago(today, (lot_count - seed) as i64),
            notes: None,
        };
        match db.shipments().create_fifo(draft).await {
            Ok(_) => shipped += 1,
            Err(e) => eprintln!("  Skipped shipment {}: {}", seed, e),
        }
    }
    println!("✓ {} shipments", shipped);

    // Payments covering part of each balance
    let balances = db.reports().customer_balances().await?;
    for (idx, balance) in balances.iter().enumerate() {
        let amount = Money::from_cents(balance.shipped_total.cents() * 6 / 10);
        if amount.is_positive() {
            let method = METHODS[idx % METHODS.len()];
            ledger
                .record_payment(Payment::new(&balance.customer_id, amount, method, days_ago(today, 3)))
                .await?;
        }
    }
    println!("✓ {} payments", db.payments().count().await?);

    // Production costs billed by the suppliers
    let stages = [
        (CostCategory::Yarn, "Yarn purchase"),
        (CostCategory::Knitting, "Knitting"),
        (CostCategory::Dyeing, "Dyeing and finishing"),
    ];
    for (supplier, (category, description)) in suppliers.iter().zip(stages) {
        let mut cost = ProductionCost::new(category, description, Money::from_cents(350_000), days_ago(today, 30));
        cost.kg = Some(Weight::from_kg(1_000));
        cost.supplier_id = Some(supplier.id.clone());
        ledger.record_cost(cost).await?;
    }
    println!("✓ {} production costs", db.production_costs().count().await?);

    let elapsed = start.elapsed();
    println!();
    println!("✓ Seed complete in {:?}", elapsed);

    db.close().await;
    Ok(())
}

fn days_ago(today: NaiveDate, days: i64) -> NaiveDate {
    today - Duration::days(days)
}
