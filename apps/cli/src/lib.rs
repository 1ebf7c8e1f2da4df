//! # Weft CLI Library
//!
//! Entry point for the `weft` command line application.
//!
//! ## Module Organization
//! ```text
//! weft_cli/
//! ├── lib.rs          ◄─── You are here (start-up & run)
//! ├── cli.rs          ◄─── clap definitions
//! ├── config.rs       ◄─── AppConfig (TOML + environment)
//! ├── output.rs       ◄─── tables / --json
//! ├── error.rs        ◄─── AppError for commands
//! └── commands/
//!     ├── mod.rs      ◄─── Context + dispatch
//!     ├── customer.rs, product.rs, lot.rs, shipment.rs
//!     └── payment.rs, supplier.rs, cost.rs, report.rs
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;

use anyhow::Context as _;
use clap::Parser;
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use weft_db::{Database, DbConfig};

use cli::Cli;
use commands::Context;
use config::AppConfig;
use output::Output;

/// Runs the CLI and returns the process exit code.
///
/// ## Startup Sequence
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                       Application Startup                               │
/// │                                                                         │
/// │  1. Parse arguments (clap exits on --help / usage errors)              │
/// │  2. Load AppConfig: defaults → TOML → WEFT_* env → --db               │
/// │  3. Initialize logging to stderr (RUST_LOG, else log_filter)           │
/// │  4. Open database: create parent dir, connect, migrate                 │
/// │  5. Run the command; print AppError and map it to an exit code         │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub async fn run() -> ExitCode {
    let cli = Cli::parse();
    let out = Output::new(cli.json);

    let ctx = match start(&cli, out).await {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("error: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = commands::execute(&ctx, cli.command).await;
    ctx.db.close().await;

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            debug!(code = ?err.code, "Command failed");
            if out.is_json() {
                match serde_json::to_string_pretty(&err) {
                    Ok(json) => eprintln!("{}", json),
                    Err(_) => eprintln!("error: {}", err),
                }
            } else {
                eprintln!("error: {}", err);
            }
            ExitCode::from(err.code.exit_code())
        }
    }
}

/// Loads configuration, installs logging and opens the database.
async fn start(cli: &Cli, out: Output) -> anyhow::Result<Context> {
    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(db) = &cli.db {
        config.database.path = db.clone();
    }
    config.validate()?;

    init_tracing(config.log_filter());
    debug!(?config, "Configuration loaded");

    let db = open_database(&config).await?;
    Ok(Context::new(db, config, out))
}

/// Initializes the tracing subscriber. Logs go to stderr so `--json`
/// output on stdout stays parseable.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=weft_db=trace` - Trace the database layer only
/// - Default: the config `log_filter`, else `warn,weft=info,sqlx=warn`
///
/// Returns false when a global subscriber was already installed (tests,
/// or an embedding binary); the existing one keeps receiving events.
fn init_tracing(default_filter: &str) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    match tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
    {
        Ok(()) => true,
        Err(e) => {
            debug!(error = %e, "Tracing subscriber already installed");
            false
        }
    }
}

async fn open_database(config: &AppConfig) -> anyhow::Result<Database> {
    let path = &config.database.path;
    let db_config = DbConfig::new(path.clone()).max_connections(config.database.max_connections);

    if !db_config.is_in_memory() {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating database directory {}", parent.display()))?;
        }
    }

    let db = Database::new(db_config)
        .await
        .with_context(|| format!("opening database {}", path.display()))?;
    info!(path = %path.display(), "Database ready");
    Ok(db)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_database_creates_parent_directory() {
        let dir = std::env::temp_dir().join(format!("weft-cli-test-{}", std::process::id()));
        let mut config = AppConfig::default();
        config.database.path = dir.join("nested").join("weft.db");

        let db = open_database(&config).await.unwrap();
        assert!(db.health_check().await);
        db.close().await;
        assert!(config.database.path.exists());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_init_tracing_twice_keeps_first_subscriber() {
        init_tracing("warn");
        assert!(!init_tracing("debug"));
    }

    #[tokio::test]
    async fn test_in_memory_path() {
        let mut config = AppConfig::default();
        config.database.path = weft_db::pool::IN_MEMORY_PATH.into();
        config.database.max_connections = 1;
        let db = open_database(&config).await.unwrap();
        assert!(db.health_check().await);
    }
}
