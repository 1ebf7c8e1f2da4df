//! # Report Commands
//!
//! ```text
//! weft report balances                      who owes what
//! weft report statement --customer <ID>     running account with opening balance
//! weft report stock                         lots per product
//! weft report sales --from 2026-01-01       by product
//! weft report monthly                       by calendar month
//! weft report suppliers                     billed vs paid
//! weft report costs                         per production stage
//! ```

use clap::Subcommand;

use weft_core::report::{EntryKind, SalesRow};

use super::{Context, RangeArgs};
use crate::error::AppResult;
use crate::output::Table;

#[derive(Debug, Subcommand)]
pub enum ReportCommand {
    /// Customer balances
    Balances,

    /// Account statement for one customer
    Statement {
        #[arg(long)]
        customer: String,

        #[command(flatten)]
        range: RangeArgs,
    },

    /// Stock per product
    Stock,

    /// Sales per product
    Sales {
        #[command(flatten)]
        range: RangeArgs,
    },

    /// Sales per month
    Monthly {
        #[command(flatten)]
        range: RangeArgs,
    },

    /// Supplier balances
    Suppliers,

    /// Production costs per category
    Costs {
        #[command(flatten)]
        range: RangeArgs,
    },
}

fn sales_table(ctx: &Context, first: &str, rows: &[SalesRow]) -> String {
    let mut table = Table::new(&[first, "SHIPMENTS", "KG", "AMOUNT", "AVG / KG"]).align_right(&[1, 2, 3, 4]);
    for row in rows {
        table.row(vec![
            row.label.clone(),
            row.shipment_count.to_string(),
            row.kg.to_string(),
            ctx.money(row.amount),
            ctx.money_opt(row.avg_price_per_kg),
        ]);
    }
    table.to_string()
}

pub async fn run(ctx: &Context, cmd: ReportCommand) -> AppResult<()> {
    let reports = ctx.db.reports();
    match cmd {
        ReportCommand::Balances => {
            let rows = reports.customer_balances().await?;
            ctx.out.emit(&rows, |rows| {
                let mut table = Table::new(&["CUSTOMER", "SHIPMENTS", "KG", "SHIPPED", "PAID", "BALANCE"])
                    .align_right(&[1, 2, 3, 4, 5]);
                for r in rows {
                    table.row(vec![
                        r.customer_name.clone(),
                        r.shipment_count.to_string(),
                        r.shipped_kg.to_string(),
                        ctx.money(r.shipped_total),
                        ctx.money(r.paid_total),
                        ctx.money(r.balance),
                    ]);
                }
                table.to_string()
            })
        }

        ReportCommand::Statement { customer, range } => {
            let statement = reports.customer_statement(&customer, range.range()?).await?;
            ctx.out.emit(&statement, |s| {
                let mut table = Table::new(&["DATE", "ENTRY", "REFERENCE", "KG", "DEBIT", "CREDIT", "BALANCE"])
                    .align_right(&[3, 4, 5, 6]);
                for e in &s.entries {
                    let (entry, debit, credit) = match e.kind {
                        EntryKind::Shipment => ("shipment", ctx.money(e.debit), String::new()),
                        EntryKind::Payment => ("payment", String::new(), ctx.money(e.credit)),
                    };
                    table.row(vec![
                        e.date.to_string(),
                        entry.to_string(),
                        e.reference.clone(),
                        e.kg.map(|kg| kg.to_string()).unwrap_or_default(),
                        debit,
                        credit,
                        ctx.money(e.balance),
                    ]);
                }
                format!(
                    "Statement for {}\nOpening balance: {}\n{}Debit {}  Credit {}  Closing balance: {}\n",
                    s.customer_name,
                    ctx.money(s.opening_balance),
                    table,
                    ctx.money(s.total_debit),
                    ctx.money(s.total_credit),
                    ctx.money(s.closing_balance),
                )
            })
        }

        ReportCommand::Stock => {
            let rows = reports.stock_summary().await?;
            ctx.out.emit(&rows, |rows| {
                let mut table = Table::new(&[
                    "PRODUCT", "LOTS", "ROLLS", "TOTAL", "SHIPPED", "REMAINING", "IN STOCK", "PARTIAL", "DEPLETED",
                ])
                .align_right(&[1, 2, 3, 4, 5, 6, 7, 8]);
                for r in rows {
                    table.row(vec![
                        r.product_name.clone(),
                        r.lot_count.to_string(),
                        r.rolls.to_string(),
                        r.total_kg.to_string(),
                        r.shipped_kg.to_string(),
                        r.remaining_kg.to_string(),
                        r.in_stock.to_string(),
                        r.partial.to_string(),
                        r.depleted.to_string(),
                    ]);
                }
                table.to_string()
            })
        }

        ReportCommand::Sales { range } => {
            let rows = reports.sales_by_product(range.range()?).await?;
            ctx.out.emit(&rows, |rows| sales_table(ctx, "PRODUCT", rows))
        }

        ReportCommand::Monthly { range } => {
            let rows = reports.sales_by_month(range.range()?).await?;
            ctx.out.emit(&rows, |rows| sales_table(ctx, "MONTH", rows))
        }

        ReportCommand::Suppliers => {
            let rows = reports.supplier_balances().await?;
            ctx.out.emit(&rows, |rows| {
                let mut table = Table::new(&["SUPPLIER", "BILLED", "PAID", "BALANCE"]).align_right(&[1, 2, 3]);
                for r in rows {
                    table.row(vec![
                        r.supplier_name.clone(),
                        ctx.money(r.billed),
                        ctx.money(r.paid),
                        ctx.money(r.balance),
                    ]);
                }
                table.to_string()
            })
        }

        ReportCommand::Costs { range } => {
            let rows = reports.cost_summary(range.range()?).await?;
            ctx.out.emit(&rows, |rows| {
                let mut table =
                    Table::new(&["CATEGORY", "ENTRIES", "AMOUNT", "KG", "COST / KG"]).align_right(&[1, 2, 3, 4]);
                for r in rows {
                    table.row(vec![
                        r.category.to_string(),
                        r.entry_count.to_string(),
                        ctx.money(r.amount),
                        r.kg.to_string(),
                        ctx.money_opt(r.cost_per_kg),
                    ]);
                }
                table.to_string()
            })
        }
    }
}
