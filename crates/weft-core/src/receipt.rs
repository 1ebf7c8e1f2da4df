//! # Receipts
//!
//! Plain-text delivery receipt for a shipment.
//!
//! ## Layout
//! ```text
//! ================================================================
//!                      ACME TEXTILE TRADING
//!                   Organize Sanayi Bolgesi 12
//! ================================================================
//! Shipment: SHP-20261017-001                     Date: 2026-10-17
//! Customer: Zeta Konfeksiyon
//! ----------------------------------------------------------------
//! Product              Party          Kg        Price        Total
//! ----------------------------------------------------------------
//! Jersey (Navy)        P-1041     120.50 kg     $4.25      $512.13
//! ----------------------------------------------------------------
//! Total                           120.50 kg                $512.13
//! Previous balance                                       $1,000.00
//! New balance                                            $1,512.13
//! ================================================================
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::money::Money;
use crate::types::{Customer, Product, Shipment};
use crate::weight::Weight;

const WIDTH: usize = 64;

/// Company details printed at the top of a receipt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyHeader {
    pub name: String,
    pub address_lines: Vec<String>,
    pub currency_symbol: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptLine {
    pub product: String,
    pub party: String,
    pub kg: Weight,
    pub unit_price: Money,
    pub line_total: Money,
}

/// Everything needed to print a shipment receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub company: CompanyHeader,
    pub shipment_number: String,
    pub date: NaiveDate,
    pub customer_name: String,
    pub customer_address: Option<String>,
    pub lines: Vec<ReceiptLine>,
    pub total_kg: Weight,
    pub total_amount: Money,
    pub previous_balance: Money,
    pub new_balance: Money,
    pub notes: Option<String>,
}

impl Receipt {
    /// Builds a receipt. `previous_balance` is the customer's balance just
    /// before this shipment.
    pub fn build(
        company: CompanyHeader,
        shipment: &Shipment,
        customer: &Customer,
        products: &[Product],
        previous_balance: Money,
    ) -> Self {
        let names: HashMap<&str, String> = products
            .iter()
            .map(|p| (p.id.as_str(), p.display_name()))
            .collect();

        let lines = shipment
            .lines
            .iter()
            .map(|line| ReceiptLine {
                product: names
                    .get(line.product_id.as_str())
                    .cloned()
                    .unwrap_or_else(|| line.product_id.clone()),
                party: line.party.clone(),
                kg: line.kg,
                unit_price: line.unit_price,
                line_total: line.line_total,
            })
            .collect();

        Receipt {
            company,
            shipment_number: shipment.number.clone(),
            date: shipment.date,
            customer_name: customer.name.clone(),
            customer_address: customer.address.clone(),
            lines,
            total_kg: shipment.total_kg,
            total_amount: shipment.total_amount,
            previous_balance,
            new_balance: previous_balance + shipment.total_amount,
            notes: shipment.notes.clone(),
        }
    }

    fn money(&self, amount: Money) -> String {
        if self.company.currency_symbol.is_empty() {
            amount.to_string()
        } else {
            amount.format_with(&self.company.currency_symbol)
        }
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let mut cut: String = text.chars().take(max.saturating_sub(1)).collect();
        cut.push('~');
        cut
    }
}

fn centered(f: &mut fmt::Formatter<'_>, text: &str) -> fmt::Result {
    writeln!(f, "{:^width$}", truncate(text, WIDTH), width = WIDTH)
}

impl fmt::Display for Receipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let heavy = "=".repeat(WIDTH);
        let light = "-".repeat(WIDTH);

        writeln!(f, "{}", heavy)?;
        if !self.company.name.is_empty() {
            centered(f, &self.company.name.to_uppercase())?;
        }
        for line in &self.company.address_lines {
            centered(f, line)?;
        }
        writeln!(f, "{}", heavy)?;

        let date = format!("Date: {}", self.date.format("%Y-%m-%d"));
        let number = format!("Shipment: {}", self.shipment_number);
        writeln!(f, "{}{:>width$}", number, date, width = WIDTH.saturating_sub(number.chars().count()))?;
        writeln!(f, "Customer: {}", self.customer_name)?;
        if let Some(address) = &self.customer_address {
            writeln!(f, "          {}", address)?;
        }

        writeln!(f, "{}", light)?;
        writeln!(f, "{:<20} {:<10} {:>10} {:>9} {:>11}", "Product", "Party", "Kg", "Price", "Total")?;
        writeln!(f, "{}", light)?;
        for line in &self.lines {
            writeln!(
                f,
                "{:<20} {:<10} {:>10} {:>9} {:>11}",
                truncate(&line.product, 20),
                truncate(&line.party, 10),
                line.kg.to_string(),
                self.money(line.unit_price),
                self.money(line.line_total),
            )?;
        }
        writeln!(f, "{}", light)?;

        writeln!(f, "{:<31} {:>10} {:>21}", "Total", self.total_kg.to_string(), self.money(self.total_amount))?;
        writeln!(f, "{:<31} {:>32}", "Previous balance", self.money(self.previous_balance))?;
        writeln!(f, "{:<31} {:>32}", "New balance", self.money(self.new_balance))?;

        if let Some(notes) = &self.notes {
            writeln!(f, "{}", light)?;
            writeln!(f, "Notes: {}", notes)?;
        }
        writeln!(f, "{}", heavy)
    }
}
