//! # Payment Commands

use chrono::NaiveDate;
use clap::Subcommand;
use std::collections::HashMap;

use weft_core::{Money, Payment, PaymentMethod};

use super::{date_or_today, Context, RangeArgs};
use crate::error::AppResult;
use crate::output::{or_dash, Table};

#[derive(Debug, Subcommand)]
pub enum PaymentCommand {
    /// Record money received from a customer
    Add {
        #[arg(long)]
        customer: String,

        #[arg(long)]
        amount: Money,

        /// cash, bank-transfer, check or card
        #[arg(long, default_value = "cash")]
        method: PaymentMethod,

        /// Payment date (default: today)
        #[arg(long)]
        date: Option<NaiveDate>,

        #[arg(long)]
        notes: Option<String>,
    },

    /// List payments, newest first
    List {
        #[arg(long)]
        customer: Option<String>,

        #[command(flatten)]
        range: RangeArgs,
    },

    /// Delete a payment
    Delete {
        id: String,
    },
}

pub async fn run(ctx: &Context, cmd: PaymentCommand) -> AppResult<()> {
    match cmd {
        PaymentCommand::Add {
            customer,
            amount,
            method,
            date,
            notes,
        } => {
            let mut payment = Payment::new(customer, amount, method, date_or_today(date));
            payment.notes = notes;

            let payment = ctx.db.ledger().record_payment(payment).await?;
            ctx.out.done(
                &payment,
                format!("Recorded {} {} payment ({})", ctx.money(payment.amount), payment.method, payment.id),
            )
        }

        PaymentCommand::List { customer, range } => {
            let range = range.range()?;
            let mut payments = match &customer {
                Some(customer_id) => ctx.db.payments().find_by("customer_id", customer_id).await?,
                None => ctx.db.payments().list().await?,
            };
            payments.retain(|p| range.contains(p.date));
            payments.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| b.created_at.cmp(&a.created_at)));

            let names: HashMap<String, String> = ctx
                .db
                .customers()
                .list()
                .await?
                .into_iter()
                .map(|c| (c.id, c.name))
                .collect();

            ctx.out.emit(&payments, |payments| {
                let mut table =
                    Table::new(&["ID", "DATE", "CUSTOMER", "METHOD", "AMOUNT", "NOTES"]).align_right(&[4]);
                for p in payments {
                    table.row(vec![
                        p.id.clone(),
                        p.date.to_string(),
                        names.get(&p.customer_id).cloned().unwrap_or_else(|| p.customer_id.clone()),
                        p.method.to_string(),
                        ctx.money(p.amount),
                        or_dash(p.notes.as_deref()),
                    ]);
                }
                table.to_string()
            })
        }

        PaymentCommand::Delete { id } => {
            ctx.db.ledger().delete_payment(&id).await?;
            ctx.out.done(&serde_json::json!({ "deleted": id }), format!("Deleted payment {}", id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing;
    use crate::error::ErrorCode;
    use weft_core::Customer;

    #[tokio::test]
    async fn test_add_list_delete() {
        let ctx = testing::context().await;
        let customer = ctx.db.customers().insert(&Customer::new("Anka")).await.unwrap();

        run(
            &ctx,
            PaymentCommand::Add {
                customer: customer.id.clone(),
                amount: Money::from_cents(50_000),
                method: PaymentMethod::BankTransfer,
                date: None,
                notes: None,
            },
        )
        .await
        .unwrap();
        run(
            &ctx,
            PaymentCommand::List {
                customer: Some(customer.id.clone()),
                range: RangeArgs::default(),
            },
        )
        .await
        .unwrap();

        let payment = ctx.db.payments().list().await.unwrap().remove(0);
        assert_eq!(payment.amount, Money::from_cents(50_000));

        run(&ctx, PaymentCommand::Delete { id: payment.id }).await.unwrap();
        assert_eq!(ctx.db.payments().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_negative_amount_rejected() {
        let ctx = testing::context().await;
        let customer = ctx.db.customers().insert(&Customer::new("Anka")).await.unwrap();
        let err = run(
            &ctx,
            PaymentCommand::Add {
                customer: customer.id,
                amount: Money::from_cents(-100),
                method: PaymentMethod::Cash,
                date: None,
                notes: None,
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }
}
