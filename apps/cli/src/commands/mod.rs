//! # Commands
//!
//! One module per command group. Every command receives the shared
//! [`Context`] and returns `AppResult<()>`; the result is printed through
//! [`Output`] so `--json` works everywhere.
//!
//! ```text
//! commands/
//! ├── customer.rs   add | list | show | edit | delete
//! ├── product.rs    add | list | delete
//! ├── lot.rs        add | list | show | edit | delete | allocate
//! ├── shipment.rs   create | create-fifo | list | show | edit | delete
//! ├── payment.rs    add | list | delete
//! ├── supplier.rs   add | list | delete | pay | payments | delete-payment
//! ├── cost.rs       add | list | delete
//! └── report.rs     balances | statement | stock | sales | monthly | suppliers | costs
//! ```

pub mod cost;
pub mod customer;
pub mod lot;
pub mod payment;
pub mod product;
pub mod report;
pub mod shipment;
pub mod supplier;

use chrono::{Local, NaiveDate};
use clap::Args;
use weft_core::report::DateRange;
use weft_core::Money;
use weft_db::Database;

use crate::cli::Command;
use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use crate::output::Output;

/// Everything a command needs.
#[derive(Debug, Clone)]
pub struct Context {
    pub db: Database,
    pub config: AppConfig,
    pub out: Output,
}

impl Context {
    pub fn new(db: Database, config: AppConfig, out: Output) -> Self {
        Context { db, config, out }
    }

    /// Formats money with the configured currency symbol.
    pub fn money(&self, amount: Money) -> String {
        amount.format_with(&self.config.business.currency_symbol)
    }

    pub fn money_opt(&self, amount: Option<Money>) -> String {
        amount.map(|m| self.money(m)).unwrap_or_else(|| "-".to_string())
    }
}

/// Date given on the command line, or today.
pub fn date_or_today(date: Option<NaiveDate>) -> NaiveDate {
    date.unwrap_or_else(|| Local::now().date_naive())
}

/// `--from` / `--to` filter shared by the reports and listings.
#[derive(Debug, Clone, Default, Args)]
pub struct RangeArgs {
    /// First day included (YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<NaiveDate>,

    /// Last day included (YYYY-MM-DD)
    #[arg(long)]
    pub to: Option<NaiveDate>,
}

impl RangeArgs {
    pub fn range(&self) -> AppResult<DateRange> {
        if let (Some(from), Some(to)) = (self.from, self.to) {
            if from > to {
                return Err(AppError::validation(format!(
                    "--from {} is after --to {}",
                    from, to
                )));
            }
        }
        Ok(DateRange::new(self.from, self.to))
    }
}

/// Routes a parsed command to its group.
pub async fn execute(ctx: &Context, command: Command) -> AppResult<()> {
    match command {
        Command::Customer(cmd) => customer::run(ctx, cmd).await,
        Command::Product(cmd) => product::run(ctx, cmd).await,
        Command::Lot(cmd) => lot::run(ctx, cmd).await,
        Command::Shipment(cmd) => shipment::run(ctx, cmd).await,
        Command::Payment(cmd) => payment::run(ctx, cmd).await,
        Command::Supplier(cmd) => supplier::run(ctx, cmd).await,
        Command::Cost(cmd) => cost::run(ctx, cmd).await,
        Command::Report(cmd) => report::run(ctx, cmd).await,
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use weft_db::DbConfig;

    /// Context over a fresh in-memory database, JSON output.
    pub async fn context() -> Context {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        Context::new(db, AppConfig::default(), Output::new(true))
    }
}
