//! # Product Commands

use clap::{Args, Subcommand};

use weft_core::Product;

use super::Context;
use crate::error::AppResult;
use crate::output::{or_dash, Table};

#[derive(Debug, Subcommand)]
pub enum ProductCommand {
    /// Add a fabric article
    Add(ProductFields),

    /// List articles
    List,

    /// Delete an article without lots or costs
    Delete {
        id: String,
    },
}

#[derive(Debug, Args)]
pub struct ProductFields {
    /// Article name, e.g. "Single Jersey 30/1"
    #[arg(long)]
    pub name: String,

    /// Short article code
    #[arg(long)]
    pub code: Option<String>,

    /// Fibre composition, e.g. "95% cotton 5% elastane"
    #[arg(long)]
    pub composition: Option<String>,

    #[arg(long)]
    pub color: Option<String>,

    /// Open width in cm
    #[arg(long)]
    pub width: Option<u32>,

    #[arg(long)]
    pub notes: Option<String>,
}

pub async fn run(ctx: &Context, cmd: ProductCommand) -> AppResult<()> {
    match cmd {
        ProductCommand::Add(fields) => {
            let mut product = Product::new(fields.name);
            product.code = fields.code;
            product.composition = fields.composition;
            product.color = fields.color;
            product.width_cm = fields.width;
            product.notes = fields.notes;

            let product = ctx.db.ledger().add_product(product).await?;
            ctx.out
                .done(&product, format!("Added product {} ({})", product.display_name(), product.id))
        }

        ProductCommand::List => {
            let mut products = ctx.db.products().list().await?;
            products.sort_by_key(|p| p.display_name());
            ctx.out.emit(&products, |products| {
                let mut table = Table::new(&["ID", "CODE", "NAME", "COMPOSITION", "WIDTH"]).align_right(&[4]);
                for p in products {
                    table.row(vec![
                        p.id.clone(),
                        or_dash(p.code.as_deref()),
                        p.display_name(),
                        or_dash(p.composition.as_deref()),
                        p.width_cm.map(|w| format!("{} cm", w)).unwrap_or_else(|| "-".to_string()),
                    ]);
                }
                table.to_string()
            })
        }

        ProductCommand::Delete { id } => {
            ctx.db.ledger().delete_product(&id).await?;
            ctx.out.done(&serde_json::json!({ "deleted": id }), format!("Deleted product {}", id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing;
    use crate::error::ErrorCode;

    #[tokio::test]
    async fn test_add_and_delete() {
        let ctx = testing::context().await;
        run(
            &ctx,
            ProductCommand::Add(ProductFields {
                name: "Rib 2x2".to_string(),
                code: Some("RIB-01".to_string()),
                composition: None,
                color: Some("Black".to_string()),
                width: Some(90),
                notes: None,
            }),
        )
        .await
        .unwrap();
        run(&ctx, ProductCommand::List).await.unwrap();

        let product = &ctx.db.products().list().await.unwrap()[0];
        assert_eq!(product.display_name(), "Rib 2x2 (Black)");

        run(&ctx, ProductCommand::Delete { id: product.id.clone() }).await.unwrap();
        assert_eq!(ctx.db.products().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_width_is_validated() {
        let ctx = testing::context().await;
        let err = run(
            &ctx,
            ProductCommand::Add(ProductFields {
                name: "Fleece".to_string(),
                code: None,
                composition: None,
                color: None,
                width: Some(0),
                notes: None,
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }
}
