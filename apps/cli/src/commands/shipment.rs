//! # Shipment Commands
//!
//! ## Creating a Shipment
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Explicit lots:                                                        │
//! │    weft shipment create --customer <ID> \                              │
//! │        --line <LOT>:120.5:4.25 --line <LOT>:80:4.25                    │
//! │                                                                         │
//! │  Oldest lots first:                                                    │
//! │    weft shipment create-fifo --customer <ID> --product <ID> \          │
//! │        --kg 500 --price 4.25                                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  lots decremented + shipment stored in one transaction                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SHP-YYYYMMDD-NNN printed; `weft shipment show` prints the receipt     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;
use clap::{Args, Subcommand};
use std::collections::HashMap;

use weft_core::{LineRequest, Money, Shipment, Weight};
use weft_db::{FifoShipment, NewShipment};

use super::{date_or_today, Context, RangeArgs};
use crate::error::{AppError, AppResult};
use crate::output::Table;

#[derive(Debug, Subcommand)]
pub enum ShipmentCommand {
    /// Ship from explicit lots
    Create(ShipmentCreate),

    /// Ship one product from its oldest lots
    CreateFifo(ShipmentFifo),

    /// List shipments, newest first
    List {
        #[arg(long)]
        customer: Option<String>,

        #[command(flatten)]
        range: RangeArgs,
    },

    /// Print a shipment receipt
    Show {
        id: String,
    },

    /// Replace a shipment's lines; stock moves back and forth atomically
    Edit {
        id: String,
        #[command(flatten)]
        fields: ShipmentEdit,
    },

    /// Delete a shipment and return its weight to the lots
    Delete {
        id: String,
    },
}

#[derive(Debug, Args)]
pub struct ShipmentCreate {
    #[arg(long)]
    pub customer: String,

    /// Shipment date (default: today)
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// Line as LOT_ID:KG:UNIT_PRICE, repeatable
    #[arg(long = "line", value_name = "LOT:KG:PRICE", required = true)]
    pub lines: Vec<LineRequest>,

    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(Debug, Args)]
pub struct ShipmentFifo {
    #[arg(long)]
    pub customer: String,

    #[arg(long)]
    pub product: String,

    /// Weight in kg
    #[arg(long)]
    pub kg: Weight,

    /// Price per kg
    #[arg(long)]
    pub price: Money,

    #[arg(long)]
    pub date: Option<NaiveDate>,

    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(Debug, Args)]
pub struct ShipmentEdit {
    #[arg(long)]
    pub customer: Option<String>,

    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// Replacement lines; the current lines are kept when none are given
    #[arg(long = "line", value_name = "LOT:KG:PRICE")]
    pub lines: Vec<LineRequest>,

    #[arg(long)]
    pub notes: Option<String>,
}

fn created_message(ctx: &Context, shipment: &Shipment) -> String {
    format!(
        "Created shipment {} ({}): {} lines, {}, {}",
        shipment.number,
        shipment.id,
        shipment.lines.len(),
        shipment.total_kg,
        ctx.money(shipment.total_amount)
    )
}

pub async fn run(ctx: &Context, cmd: ShipmentCommand) -> AppResult<()> {
    match cmd {
        ShipmentCommand::Create(args) => {
            let shipment = ctx
                .db
                .shipments()
                .create(NewShipment {
                    customer_id: args.customer,
                    date: date_or_today(args.date),
                    lines: args.lines,
                    notes: args.notes,
                })
                .await?;
            ctx.out.done(&shipment, created_message(ctx, &shipment))
        }

        ShipmentCommand::CreateFifo(args) => {
            let shipment = ctx
                .db
                .shipments()
                .create_fifo(FifoShipment {
                    customer_id: args.customer,
                    product_id: args.product,
                    kg: args.kg,
                    unit_price: args.price,
                    date: date_or_today(args.date),
                    notes: args.notes,
                })
                .await?;
            ctx.out.done(&shipment, created_message(ctx, &shipment))
        }

        ShipmentCommand::List { customer, range } => {
            let range = range.range()?;
            let mut shipments = match &customer {
                Some(customer_id) => ctx.db.shipments().list_for_customer(customer_id).await?,
                None => ctx.db.shipments().list().await?,
            };
            shipments.retain(|s| range.contains(s.date));
            shipments.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| b.number.cmp(&a.number)));

            let names: HashMap<String, String> = ctx
                .db
                .customers()
                .list()
                .await?
                .into_iter()
                .map(|c| (c.id, c.name))
                .collect();

            ctx.out.emit(&shipments, |shipments| {
                let mut table = Table::new(&["ID", "NUMBER", "DATE", "CUSTOMER", "LINES", "KG", "TOTAL"])
                    .align_right(&[4, 5, 6]);
                for s in shipments {
                    table.row(vec![
                        s.id.clone(),
                        s.number.clone(),
                        s.date.to_string(),
                        names.get(&s.customer_id).cloned().unwrap_or_else(|| s.customer_id.clone()),
                        s.lines.len().to_string(),
                        s.total_kg.to_string(),
                        ctx.money(s.total_amount),
                    ]);
                }
                table.to_string()
            })
        }

        ShipmentCommand::Show { id } => {
            let receipt = ctx.db.reports().receipt(&id, ctx.config.company_header()).await?;
            ctx.out.emit(&receipt, |r| r.to_string())
        }

        ShipmentCommand::Edit { id, fields } => {
            let current = ctx.db.shipments().get_required(&id).await?;
            let lines = if fields.lines.is_empty() {
                current
                    .lines
                    .iter()
                    .map(|l| LineRequest {
                        lot_id: l.lot_id.clone(),
                        kg: l.kg,
                        unit_price: l.unit_price,
                    })
                    .collect()
            } else {
                fields.lines
            };
            if lines.is_empty() {
                return Err(AppError::validation("a shipment needs at least one line"));
            }

            let shipment = ctx
                .db
                .shipments()
                .update(
                    &id,
                    NewShipment {
                        customer_id: fields.customer.unwrap_or(current.customer_id),
                        date: fields.date.unwrap_or(current.date),
                        lines,
                        notes: fields.notes.or(current.notes),
                    },
                )
                .await?;
            ctx.out.done(
                &shipment,
                format!(
                    "Updated shipment {}: {}, {}",
                    shipment.number,
                    shipment.total_kg,
                    ctx.money(shipment.total_amount)
                ),
            )
        }

        ShipmentCommand::Delete { id } => {
            let shipment = ctx.db.shipments().delete(&id).await?;
            ctx.out.done(
                &shipment,
                format!("Deleted shipment {}; {} returned to stock", shipment.number, shipment.total_kg),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing;
    use crate::error::ErrorCode;
    use weft_core::{Customer, InventoryLot, Product};
    use weft_db::NewLot;

    struct Setup {
        ctx: Context,
        customer: Customer,
        product: Product,
        lot: InventoryLot,
    }

    async fn setup() -> Setup {
        let ctx = testing::context().await;
        let customer = ctx.db.customers().insert(&Customer::new("Anka")).await.unwrap();
        let product = ctx.db.products().insert(&Product::new("Pique")).await.unwrap();
        let lot = ctx
            .db
            .lots()
            .create(NewLot {
                product_id: product.id.clone(),
                party: "P-9".to_string(),
                date: NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(),
                rolls: 4,
                total_kg: Weight::from_kg(100),
                supplier_id: None,
                cost_per_kg: None,
                notes: None,
            })
            .await
            .unwrap();
        Setup {
            ctx,
            customer,
            product,
            lot,
        }
    }

    fn line(lot: &InventoryLot, kg: i64) -> LineRequest {
        LineRequest {
            lot_id: lot.id.clone(),
            kg: Weight::from_kg(kg),
            unit_price: Money::from_cents(425),
        }
    }

    #[tokio::test]
    async fn test_create_show_edit_delete() {
        let s = setup().await;
        run(
            &s.ctx,
            ShipmentCommand::Create(ShipmentCreate {
                customer: s.customer.id.clone(),
                date: None,
                lines: vec![line(&s.lot, 40)],
                notes: None,
            }),
        )
        .await
        .unwrap();

        let shipment = s.ctx.db.shipments().list().await.unwrap().remove(0);
        run(&s.ctx, ShipmentCommand::Show { id: shipment.id.clone() }).await.unwrap();

        run(
            &s.ctx,
            ShipmentCommand::Edit {
                id: shipment.id.clone(),
                fields: ShipmentEdit {
                    customer: None,
                    date: None,
                    lines: vec![line(&s.lot, 25)],
                    notes: Some("second truck".to_string()),
                },
            },
        )
        .await
        .unwrap();
        let lot = s.ctx.db.lots().get_required(&s.lot.id).await.unwrap();
        assert_eq!(lot.remaining_kg, Weight::from_kg(75));

        run(&s.ctx, ShipmentCommand::Delete { id: shipment.id }).await.unwrap();
        let lot = s.ctx.db.lots().get_required(&s.lot.id).await.unwrap();
        assert_eq!(lot.remaining_kg, Weight::from_kg(100));
    }

    #[tokio::test]
    async fn test_edit_without_lines_keeps_them() {
        let s = setup().await;
        let shipment = s
            .ctx
            .db
            .shipments()
            .create(NewShipment {
                customer_id: s.customer.id.clone(),
                date: NaiveDate::from_ymd_opt(2026, 1, 6).unwrap(),
                lines: vec![line(&s.lot, 10)],
                notes: None,
            })
            .await
            .unwrap();

        let new_date = NaiveDate::from_ymd_opt(2026, 1, 7).unwrap();
        run(
            &s.ctx,
            ShipmentCommand::Edit {
                id: shipment.id.clone(),
                fields: ShipmentEdit {
                    customer: None,
                    date: Some(new_date),
                    lines: vec![],
                    notes: None,
                },
            },
        )
        .await
        .unwrap();

        let edited = s.ctx.db.shipments().get_required(&shipment.id).await.unwrap();
        assert_eq!(edited.date, new_date);
        assert_eq!(edited.total_kg, Weight::from_kg(10));
        let lot = s.ctx.db.lots().get_required(&s.lot.id).await.unwrap();
        assert_eq!(lot.remaining_kg, Weight::from_kg(90));
    }

    #[tokio::test]
    async fn test_fifo_shortfall_is_reported() {
        let s = setup().await;
        let err = run(
            &s.ctx,
            ShipmentCommand::CreateFifo(ShipmentFifo {
                customer: s.customer.id.clone(),
                product: s.product.id.clone(),
                kg: Weight::from_kg(101),
                price: Money::from_cents(400),
                date: None,
                notes: None,
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientStock);

        run(
            &s.ctx,
            ShipmentCommand::List {
                customer: Some(s.customer.id.clone()),
                range: RangeArgs::default(),
            },
        )
        .await
        .unwrap();
    }
}
