//! # Lot Commands
//!
//! Receiving fabric into stock, adjusting lots and previewing FIFO picks.
//!
//! ```text
//! weft lot add --product <ID> --party P-4102 --rolls 12 --kg 286.4
//! weft lot allocate --product <ID> --kg 500
//!   P-4102   286.40 kg of 286.40 kg
//!   P-4107   213.60 kg of 301.00 kg
//!   allocated 500.00 kg, shortfall 0.00 kg
//! ```

use chrono::NaiveDate;
use clap::{Args, Subcommand};
use std::collections::HashMap;

use weft_core::{InventoryLot, Money, Weight};
use weft_db::{LotEdit, NewLot};

use super::{date_or_today, Context};
use crate::error::AppResult;
use crate::output::{or_dash, Table};

#[derive(Debug, Subcommand)]
pub enum LotCommand {
    /// Receive a lot into stock
    Add(LotFields),

    /// List lots
    List {
        /// Only lots of this product
        #[arg(long)]
        product: Option<String>,

        /// Hide depleted lots
        #[arg(long)]
        available: bool,
    },

    /// Show one lot
    Show {
        id: String,
    },

    /// Adjust a lot; already shipped weight is kept
    Edit {
        id: String,
        #[command(flatten)]
        fields: LotEditFields,
    },

    /// Delete a lot no shipment draws from
    Delete {
        id: String,
    },

    /// Preview which lots would supply an amount, oldest first
    Allocate {
        #[arg(long)]
        product: String,

        /// Weight in kg
        #[arg(long)]
        kg: Weight,
    },
}

#[derive(Debug, Args)]
pub struct LotFields {
    #[arg(long)]
    pub product: String,

    /// Party number printed on the rolls
    #[arg(long)]
    pub party: String,

    /// Received date (default: today)
    #[arg(long)]
    pub date: Option<NaiveDate>,

    #[arg(long)]
    pub rolls: u32,

    /// Total weight in kg
    #[arg(long)]
    pub kg: Weight,

    #[arg(long)]
    pub supplier: Option<String>,

    /// Purchase cost per kg
    #[arg(long)]
    pub cost_per_kg: Option<Money>,

    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(Debug, Args)]
pub struct LotEditFields {
    #[arg(long)]
    pub party: Option<String>,
    #[arg(long)]
    pub date: Option<NaiveDate>,
    #[arg(long)]
    pub rolls: Option<u32>,
    /// New total weight in kg
    #[arg(long)]
    pub kg: Option<Weight>,
    #[arg(long)]
    pub supplier: Option<String>,
    #[arg(long)]
    pub cost_per_kg: Option<Money>,
    #[arg(long)]
    pub notes: Option<String>,
}

impl From<LotEditFields> for LotEdit {
    fn from(f: LotEditFields) -> Self {
        LotEdit {
            party: f.party,
            date: f.date,
            rolls: f.rolls,
            total_kg: f.kg,
            supplier_id: f.supplier,
            cost_per_kg: f.cost_per_kg,
            notes: f.notes,
        }
    }
}

pub async fn run(ctx: &Context, cmd: LotCommand) -> AppResult<()> {
    match cmd {
        LotCommand::Add(fields) => {
            let lot = ctx
                .db
                .lots()
                .create(NewLot {
                    product_id: fields.product,
                    party: fields.party,
                    date: date_or_today(fields.date),
                    rolls: fields.rolls,
                    total_kg: fields.kg,
                    supplier_id: fields.supplier,
                    cost_per_kg: fields.cost_per_kg,
                    notes: fields.notes,
                })
                .await?;
            ctx.out.done(
                &lot,
                format!("Received lot {} ({}): {} in {} rolls", lot.party, lot.id, lot.total_kg, lot.rolls),
            )
        }

        LotCommand::List { product, available } => {
            let mut lots = match &product {
                Some(product_id) => ctx.db.lots().list_for_product(product_id).await?,
                None => ctx.db.lots().list().await?,
            };
            if available {
                lots.retain(InventoryLot::is_available);
            }
            lots.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.created_at.cmp(&b.created_at)));

            let names: HashMap<String, String> = ctx
                .db
                .products()
                .list()
                .await?
                .into_iter()
                .map(|p| (p.id.clone(), p.display_name()))
                .collect();

            ctx.out.emit(&lots, |lots| {
                let mut table = Table::new(&["ID", "PARTY", "DATE", "PRODUCT", "ROLLS", "TOTAL", "REMAINING", "STATUS"])
                    .align_right(&[4, 5, 6]);
                for lot in lots {
                    table.row(vec![
                        lot.id.clone(),
                        lot.party.clone(),
                        lot.date.to_string(),
                        names.get(&lot.product_id).cloned().unwrap_or_else(|| lot.product_id.clone()),
                        lot.rolls.to_string(),
                        lot.total_kg.to_string(),
                        lot.remaining_kg.to_string(),
                        lot.status.to_string(),
                    ]);
                }
                table.to_string()
            })
        }

        LotCommand::Show { id } => {
            let lot = ctx.db.lots().get_required(&id).await?;
            let product = ctx.db.products().get(&lot.product_id).await?;
            let product_name = product.map(|p| p.display_name()).unwrap_or_else(|| lot.product_id.clone());

            ctx.out.emit(&lot, |lot| {
                format!(
                    "Lot {}\n  id:           {}\n  product:      {}\n  received:     {}\n  rolls:        {} (avg {} per roll)\n  total:        {}\n  shipped:      {}\n  remaining:    {}\n  status:       {}\n  supplier:     {}\n  cost per kg:  {}\n  notes:        {}\n",
                    lot.party,
                    lot.id,
                    product_name,
                    lot.date,
                    lot.rolls,
                    lot.avg_kg_per_roll,
                    lot.total_kg,
                    lot.shipped_kg(),
                    lot.remaining_kg,
                    lot.status,
                    or_dash(lot.supplier_id.as_deref()),
                    ctx.money_opt(lot.cost_per_kg),
                    or_dash(lot.notes.as_deref()),
                )
            })
        }

        LotCommand::Edit { id, fields } => {
            let lot = ctx.db.lots().update(&id, fields.into()).await?;
            ctx.out.done(
                &lot,
                format!("Adjusted lot {}: {} of {} remaining ({})", lot.party, lot.remaining_kg, lot.total_kg, lot.status),
            )
        }

        LotCommand::Delete { id } => {
            ctx.db.lots().delete(&id).await?;
            ctx.out.done(&serde_json::json!({ "deleted": id }), format!("Deleted lot {}", id))
        }

        LotCommand::Allocate { product, kg } => {
            let allocation = ctx.db.shipments().allocate(&product, kg).await?;
            ctx.out.emit(&allocation, |a| {
                let mut table = Table::new(&["LOT", "PARTY", "TAKE", "AVAILABLE"]).align_right(&[2, 3]);
                for pick in &a.picks {
                    table.row(vec![
                        pick.lot_id.clone(),
                        pick.party.clone(),
                        pick.kg.to_string(),
                        pick.available.to_string(),
                    ]);
                }
                let mut text = table.to_string();
                text.push_str(&format!(
                    "requested {}, allocated {}, shortfall {}\n",
                    a.requested, a.allocated, a.shortfall
                ));
                text
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing;
    use crate::error::ErrorCode;
    use weft_core::{LotStatus, Product};

    async fn product(ctx: &Context) -> Product {
        ctx.db.products().insert(&Product::new("Interlock")).await.unwrap()
    }

    fn fields(product_id: &str, kg: i64) -> LotFields {
        LotFields {
            product: product_id.to_string(),
            party: "P-1".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 2, 1),
            rolls: 5,
            kg: Weight::from_kg(kg),
            supplier: None,
            cost_per_kg: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_add_list_edit() {
        let ctx = testing::context().await;
        let product = product(&ctx).await;

        run(&ctx, LotCommand::Add(fields(&product.id, 100))).await.unwrap();
        run(
            &ctx,
            LotCommand::List {
                product: Some(product.id.clone()),
                available: true,
            },
        )
        .await
        .unwrap();

        let lot = ctx.db.lots().list().await.unwrap().remove(0);
        run(
            &ctx,
            LotCommand::Edit {
                id: lot.id.clone(),
                fields: LotEditFields {
                    party: Some("P-1B".to_string()),
                    date: None,
                    rolls: None,
                    kg: Some(Weight::from_kg(90)),
                    supplier: None,
                    cost_per_kg: None,
                    notes: None,
                },
            },
        )
        .await
        .unwrap();

        let edited = ctx.db.lots().get_required(&lot.id).await.unwrap();
        assert_eq!(edited.party, "P-1B");
        assert_eq!(edited.remaining_kg, Weight::from_kg(90));
        assert_eq!(edited.status, LotStatus::InStock);
        run(&ctx, LotCommand::Show { id: lot.id }).await.unwrap();
    }

    #[tokio::test]
    async fn test_allocate_preview() {
        let ctx = testing::context().await;
        let product = product(&ctx).await;
        run(&ctx, LotCommand::Add(fields(&product.id, 100))).await.unwrap();

        run(
            &ctx,
            LotCommand::Allocate {
                product: product.id.clone(),
                kg: Weight::from_kg(150),
            },
        )
        .await
        .unwrap();

        let err = run(
            &ctx,
            LotCommand::Allocate {
                product: "nope".to_string(),
                kg: Weight::from_kg(1),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
