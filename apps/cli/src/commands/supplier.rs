//! # Supplier Commands

use chrono::NaiveDate;
use clap::{Args, Subcommand};

use weft_core::{Money, PaymentMethod, Supplier, SupplierPayment};

use super::{date_or_today, Context};
use crate::error::AppResult;
use crate::output::{or_dash, Table};

#[derive(Debug, Subcommand)]
pub enum SupplierCommand {
    /// Add a supplier
    Add(SupplierFields),

    /// List suppliers with their balances
    List,

    /// Delete a supplier without lots, payments or costs
    Delete {
        id: String,
    },

    /// Record money paid to a supplier
    Pay {
        #[arg(long)]
        supplier: String,

        #[arg(long)]
        amount: Money,

        #[arg(long, default_value = "bank-transfer")]
        method: PaymentMethod,

        #[arg(long)]
        date: Option<NaiveDate>,

        #[arg(long)]
        notes: Option<String>,
    },

    /// List supplier payments
    Payments {
        #[arg(long)]
        supplier: Option<String>,
    },

    /// Delete a supplier payment
    DeletePayment {
        id: String,
    },
}

#[derive(Debug, Args)]
pub struct SupplierFields {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub phone: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub address: Option<String>,
    #[arg(long)]
    pub notes: Option<String>,
}

pub async fn run(ctx: &Context, cmd: SupplierCommand) -> AppResult<()> {
    match cmd {
        SupplierCommand::Add(fields) => {
            let mut supplier = Supplier::new(fields.name);
            supplier.phone = fields.phone;
            supplier.email = fields.email;
            supplier.address = fields.address;
            supplier.notes = fields.notes;

            let supplier = ctx.db.ledger().add_supplier(supplier).await?;
            ctx.out
                .done(&supplier, format!("Added supplier {} ({})", supplier.name, supplier.id))
        }

        SupplierCommand::List => {
            let balances = ctx.db.reports().supplier_balances().await?;
            ctx.out.emit(&balances, |rows| {
                let mut table = Table::new(&["ID", "NAME", "BILLED", "PAID", "BALANCE"]).align_right(&[2, 3, 4]);
                for row in rows {
                    table.row(vec![
                        row.supplier_id.clone(),
                        row.supplier_name.clone(),
                        ctx.money(row.billed),
                        ctx.money(row.paid),
                        ctx.money(row.balance),
                    ]);
                }
                table.to_string()
            })
        }

        SupplierCommand::Delete { id } => {
            ctx.db.ledger().delete_supplier(&id).await?;
            ctx.out.done(&serde_json::json!({ "deleted": id }), format!("Deleted supplier {}", id))
        }

        SupplierCommand::Pay {
            supplier,
            amount,
            method,
            date,
            notes,
        } => {
            let mut payment = SupplierPayment::new(supplier, amount, method, date_or_today(date));
            payment.notes = notes;

            let payment = ctx.db.ledger().record_supplier_payment(payment).await?;
            ctx.out.done(
                &payment,
                format!("Recorded {} paid to supplier ({})", ctx.money(payment.amount), payment.id),
            )
        }

        SupplierCommand::Payments { supplier } => {
            let mut payments = match &supplier {
                Some(supplier_id) => ctx.db.supplier_payments().find_by("supplier_id", supplier_id).await?,
                None => ctx.db.supplier_payments().list().await?,
            };
            payments.sort_by(|a, b| b.date.cmp(&a.date));

            ctx.out.emit(&payments, |payments| {
                let mut table =
                    Table::new(&["ID", "DATE", "SUPPLIER", "METHOD", "AMOUNT", "NOTES"]).align_right(&[4]);
                for p in payments {
                    table.row(vec![
                        p.id.clone(),
                        p.date.to_string(),
                        p.supplier_id.clone(),
                        p.method.to_string(),
                        ctx.money(p.amount),
                        or_dash(p.notes.as_deref()),
                    ]);
                }
                table.to_string()
            })
        }

        SupplierCommand::DeletePayment { id } => {
            ctx.db.ledger().delete_supplier_payment(&id).await?;
            ctx.out
                .done(&serde_json::json!({ "deleted": id }), format!("Deleted supplier payment {}", id))
        }
    }
}
