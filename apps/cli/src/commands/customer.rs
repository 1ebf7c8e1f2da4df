//! # Customer Commands

use clap::{Args, Subcommand};
use serde::Serialize;
use tracing::debug;

use weft_core::report::CustomerBalance;
use weft_core::Customer;

use super::Context;
use crate::error::AppResult;
use crate::output::{or_dash, Table};

#[derive(Debug, Subcommand)]
pub enum CustomerCommand {
    /// Add a customer
    Add(CustomerFields),

    /// List customers with their balances
    List,

    /// Show one customer
    Show {
        id: String,
    },

    /// Change a customer's details
    Edit {
        id: String,
        #[command(flatten)]
        fields: CustomerEdit,
    },

    /// Delete a customer without shipments or payments
    Delete {
        id: String,
    },
}

#[derive(Debug, Args)]
pub struct CustomerFields {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub phone: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub address: Option<String>,
    #[arg(long)]
    pub tax_number: Option<String>,
    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(Debug, Args)]
pub struct CustomerEdit {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub phone: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub address: Option<String>,
    #[arg(long)]
    pub tax_number: Option<String>,
    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
struct CustomerView {
    customer: Customer,
    balance: Option<CustomerBalance>,
}

pub async fn run(ctx: &Context, cmd: CustomerCommand) -> AppResult<()> {
    match cmd {
        CustomerCommand::Add(fields) => {
            let mut customer = Customer::new(fields.name);
            customer.phone = fields.phone;
            customer.email = fields.email;
            customer.address = fields.address;
            customer.tax_number = fields.tax_number;
            customer.notes = fields.notes;

            let customer = ctx.db.ledger().add_customer(customer).await?;
            ctx.out
                .done(&customer, format!("Added customer {} ({})", customer.name, customer.id))
        }

        CustomerCommand::List => {
            let balances = ctx.db.reports().customer_balances().await?;
            debug!(count = balances.len(), "Listing customers");
            ctx.out.emit(&balances, |rows| {
                let mut table = Table::new(&["ID", "NAME", "SHIPMENTS", "SHIPPED", "PAID", "BALANCE"])
                    .align_right(&[2, 3, 4, 5]);
                for row in rows {
                    table.row(vec![
                        row.customer_id.clone(),
                        row.customer_name.clone(),
                        row.shipment_count.to_string(),
                        ctx.money(row.shipped_total),
                        ctx.money(row.paid_total),
                        ctx.money(row.balance),
                    ]);
                }
                table.to_string()
            })
        }

        CustomerCommand::Show { id } => {
            let customer = ctx.db.customers().get_required(&id).await?;
            let balance = ctx
                .db
                .reports()
                .customer_balances()
                .await?
                .into_iter()
                .find(|b| b.customer_id == id);

            ctx.out.emit(&CustomerView { customer, balance }, |view| {
                let c = &view.customer;
                let mut text = format!(
                    "{}\n  id:         {}\n  phone:      {}\n  email:      {}\n  address:    {}\n  tax number: {}\n  notes:      {}\n",
                    c.name,
                    c.id,
                    or_dash(c.phone.as_deref()),
                    or_dash(c.email.as_deref()),
                    or_dash(c.address.as_deref()),
                    or_dash(c.tax_number.as_deref()),
                    or_dash(c.notes.as_deref()),
                );
                if let Some(b) = &view.balance {
                    text.push_str(&format!(
                        "  shipped:    {} in {} shipments ({})\n  paid:       {}\n  balance:    {}\n",
                        ctx.money(b.shipped_total),
                        b.shipment_count,
                        b.shipped_kg,
                        ctx.money(b.paid_total),
                        ctx.money(b.balance),
                    ));
                }
                text
            })
        }

        CustomerCommand::Edit { id, fields } => {
            let mut customer = ctx.db.customers().get_required(&id).await?;
            if let Some(name) = fields.name {
                customer.name = name;
            }
            if let Some(phone) = fields.phone {
                customer.phone = Some(phone);
            }
            if let Some(email) = fields.email {
                customer.email = Some(email);
            }
            if let Some(address) = fields.address {
                customer.address = Some(address);
            }
            if let Some(tax_number) = fields.tax_number {
                customer.tax_number = Some(tax_number);
            }
            if let Some(notes) = fields.notes {
                customer.notes = Some(notes);
            }

            let customer = ctx.db.ledger().update_customer(customer).await?;
            ctx.out.done(&customer, format!("Updated customer {}", customer.name))
        }

        CustomerCommand::Delete { id } => {
            ctx.db.ledger().delete_customer(&id).await?;
            ctx.out.done(&serde_json::json!({ "deleted": id }), format!("Deleted customer {}", id))
        }
    }
}
