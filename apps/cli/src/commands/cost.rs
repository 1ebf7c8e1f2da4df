//! # Production Cost Commands

use chrono::NaiveDate;
use clap::{Args, Subcommand};

use weft_core::{CostCategory, Money, ProductionCost, Weight};

use super::{date_or_today, Context, RangeArgs};
use crate::error::AppResult;
use crate::output::Table;

#[derive(Debug, Subcommand)]
pub enum CostCommand {
    /// Record a production cost
    Add(CostFields),

    /// List production costs, newest first
    List {
        #[arg(long)]
        category: Option<CostCategory>,

        #[command(flatten)]
        range: RangeArgs,
    },

    /// Delete a production cost
    Delete {
        id: String,
    },
}

#[derive(Debug, Args)]
pub struct CostFields {
    /// yarn, knitting, dyeing, finishing, transport, labor or other
    #[arg(long)]
    pub category: CostCategory,

    #[arg(long)]
    pub description: String,

    #[arg(long)]
    pub amount: Money,

    /// Weight processed, for cost per kg
    #[arg(long)]
    pub kg: Option<Weight>,

    #[arg(long)]
    pub product: Option<String>,

    #[arg(long)]
    pub lot: Option<String>,

    /// Supplier that billed the cost
    #[arg(long)]
    pub supplier: Option<String>,

    #[arg(long)]
    pub date: Option<NaiveDate>,
}

pub async fn run(ctx: &Context, cmd: CostCommand) -> AppResult<()> {
    match cmd {
        CostCommand::Add(fields) => {
            let mut cost = ProductionCost::new(
                fields.category,
                fields.description,
                fields.amount,
                date_or_today(fields.date),
            );
            cost.kg = fields.kg;
            cost.product_id = fields.product;
            cost.lot_id = fields.lot;
            cost.supplier_id = fields.supplier;

            let cost = ctx.db.ledger().record_cost(cost).await?;
            ctx.out.done(
                &cost,
                format!("Recorded {} cost {} ({})", cost.category, ctx.money(cost.amount), cost.id),
            )
        }

        CostCommand::List { category, range } => {
            let range = range.range()?;
            let mut costs = ctx.db.production_costs().list().await?;
            costs.retain(|c| range.contains(c.date) && category.map_or(true, |wanted| c.category == wanted));
            costs.sort_by(|a, b| b.date.cmp(&a.date));

            ctx.out.emit(&costs, |costs| {
                let mut table =
                    Table::new(&["ID", "DATE", "CATEGORY", "DESCRIPTION", "KG", "AMOUNT"]).align_right(&[4, 5]);
                for c in costs {
                    table.row(vec![
                        c.id.clone(),
                        c.date.to_string(),
                        c.category.to_string(),
                        c.description.clone(),
                        c.kg.map(|kg| kg.to_string()).unwrap_or_else(|| "-".to_string()),
                        ctx.money(c.amount),
                    ]);
                }
                table.to_string()
            })
        }

        CostCommand::Delete { id } => {
            ctx.db.ledger().delete_cost(&id).await?;
            ctx.out.done(&serde_json::json!({ "deleted": id }), format!("Deleted cost {}", id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing;
    use crate::error::ErrorCode;

    fn fields(supplier: Option<String>) -> CostFields {
        CostFields {
            category: CostCategory::Dyeing,
            description: "Navy, 400 kg".to_string(),
            amount: Money::from_cents(60_000),
            kg: Some(Weight::from_kg(400)),
            product: None,
            lot: None,
            supplier,
            date: None,
        }
    }

    #[tokio::test]
    async fn test_add_list_delete() {
        let ctx = testing::context().await;
        run(&ctx, CostCommand::Add(fields(None))).await.unwrap();
        run(
            &ctx,
            CostCommand::List {
                category: Some(CostCategory::Dyeing),
                range: RangeArgs::default(),
            },
        )
        .await
        .unwrap();

        let cost = ctx.db.production_costs().list().await.unwrap().remove(0);
        run(&ctx, CostCommand::Delete { id: cost.id }).await.unwrap();
        assert_eq!(ctx.db.production_costs().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unknown_supplier_rejected() {
        let ctx = testing::context().await;
        let err = run(&ctx, CostCommand::Add(fields(Some("nope".to_string())))).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
