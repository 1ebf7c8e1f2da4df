//! Command line definition.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::commands::cost::CostCommand;
use crate::commands::customer::CustomerCommand;
use crate::commands::lot::LotCommand;
use crate::commands::payment::PaymentCommand;
use crate::commands::product::ProductCommand;
use crate::commands::report::ReportCommand;
use crate::commands::shipment::ShipmentCommand;
use crate::commands::supplier::SupplierCommand;

/// Fabric lots, shipments and balances for a textile business.
#[derive(Debug, Parser)]
#[command(name = "weft", version, about, propagate_version = true)]
pub struct Cli {
    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Config file (default: platform config dir)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Database file, overrides the config file and WEFT_DB_PATH
    #[arg(long, global = true, value_name = "PATH")]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Customers (buyers of fabric)
    #[command(subcommand)]
    Customer(CustomerCommand),

    /// Fabric articles
    #[command(subcommand)]
    Product(ProductCommand),

    /// Inventory lots (parties)
    #[command(subcommand)]
    Lot(LotCommand),

    /// Outbound shipments
    #[command(subcommand)]
    Shipment(ShipmentCommand),

    /// Customer payments
    #[command(subcommand)]
    Payment(PaymentCommand),

    /// Suppliers and supplier payments
    #[command(subcommand)]
    Supplier(SupplierCommand),

    /// Production costs
    #[command(subcommand)]
    Cost(CostCommand),

    /// Balances, statements, stock and sales
    #[command(subcommand)]
    Report(ReportCommand),
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["weft", "customer", "list", "--json", "--db", "/tmp/x.db"]).unwrap();
        assert!(cli.json);
        assert_eq!(cli.db, Some(PathBuf::from("/tmp/x.db")));
        assert!(matches!(cli.command, Command::Customer(CustomerCommand::List)));
    }

    #[test]
    fn test_shipment_lines_parse() {
        let cli = Cli::try_parse_from([
            "weft",
            "shipment",
            "create",
            "--customer",
            "c-1",
            "--line",
            "lot-a:120.5:4.25",
            "--line",
            "lot-b:30:4.00",
            "--date",
            "2026-07-10",
        ])
        .unwrap();

        match cli.command {
            Command::Shipment(ShipmentCommand::Create(args)) => {
                assert_eq!(args.lines.len(), 2);
                assert_eq!(args.lines[0].lot_id, "lot-a");
                assert_eq!(args.lines[0].kg.grams(), 120_500);
                assert_eq!(args.lines[1].unit_price.cents(), 400);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_bad_line_is_rejected() {
        let err = Cli::try_parse_from(["weft", "shipment", "create", "--customer", "c-1", "--line", "lot-a:12"]);
        assert!(err.is_err());
    }

    #[test]
    fn test_unknown_payment_method_is_rejected() {
        let err = Cli::try_parse_from([
            "weft", "payment", "add", "--customer", "c-1", "--amount", "10", "--method", "barter",
        ]);
        assert!(err.is_err());
    }
}
