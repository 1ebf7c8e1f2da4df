//! # Database Handle
//!
//! Opens the SQLite file, applies migrations and hands out repositories.
//!
//! ```text
//!   DbConfig { path, max_connections, .. }
//!        │ connect_options()
//!        ▼
//!   SqlitePool ──► migrations::run_migrations
//!        │
//!        ▼
//!   Database (Clone, one pool)
//!    ├── customers() products() suppliers()        Collection<T>
//!    ├── payments() supplier_payments()            Collection<T>
//!    ├── production_costs()                        Collection<T>
//!    ├── lots()       LotRepository        stock edits, guarded delete
//!    ├── shipments()  ShipmentRepository   transactional stock moves
//!    ├── ledger()     LedgerRepository     validated parties and money
//!    └── reports()    ReportRepository     balances, statements, sales
//! ```
//!
//! File databases run in WAL mode with a busy timeout, so a reader in one
//! terminal does not fail a write in another. `:memory:` opens a private
//! database per pool and must stay on a single connection.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

use weft_core::{Customer, Entity, Payment, Product, ProductionCost, Supplier, SupplierPayment};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::collection::Collection;
use crate::repository::ledger::LedgerRepository;
use crate::repository::lot::LotRepository;
use crate::repository::report::ReportRepository;
use crate::repository::shipment::ShipmentRepository;

/// Path that selects a private in-memory database.
pub const IN_MEMORY_PATH: &str = ":memory:";

// =============================================================================
// Configuration
// =============================================================================

/// How to open the database.
///
/// ```rust,ignore
/// let config = DbConfig::new("/var/lib/weft/weft.db").max_connections(4);
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// SQLite file, or `:memory:`.
    pub path: PathBuf,

    /// Pool size. Default 5; always 1 for `:memory:`.
    pub max_connections: u32,

    /// How long to wait for a free connection.
    pub acquire_timeout: Duration,

    /// How long SQLite waits on a locked file before giving up.
    pub busy_timeout: Duration,

    /// Apply pending migrations on open. Default true.
    pub migrate: bool,
}

impl DbConfig {
    /// File database; the file is created on first open.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let in_memory = path.as_os_str() == IN_MEMORY_PATH;
        DbConfig {
            path,
            max_connections: if in_memory { 1 } else { 5 },
            acquire_timeout: Duration::from_secs(10),
            busy_timeout: Duration::from_secs(5),
            migrate: true,
        }
    }

    /// Fresh, isolated in-memory database. Used by tests.
    pub fn in_memory() -> Self {
        DbConfig::new(IN_MEMORY_PATH)
    }

    /// Sets the pool size. Ignored for in-memory databases.
    pub fn max_connections(mut self, max: u32) -> Self {
        if !self.is_in_memory() {
            self.max_connections = max.max(1);
        }
        self
    }

    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    /// Opens without touching the schema.
    pub fn skip_migrations(mut self) -> Self {
        self.migrate = false;
        self
    }

    pub fn is_in_memory(&self) -> bool {
        self.path.as_os_str() == IN_MEMORY_PATH
    }

    fn connect_options(&self) -> SqliteConnectOptions {
        let options = if self.is_in_memory() {
            SqliteConnectOptions::new()
                .in_memory(true)
                .journal_mode(SqliteJournalMode::Memory)
        } else {
            SqliteConnectOptions::new()
                .filename(&self.path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal)
        };
        options.busy_timeout(self.busy_timeout)
    }
}

// =============================================================================
// Database
// =============================================================================

/// Shared handle to the store. Cloning shares the pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens the pool and, unless disabled, brings the schema up to date.
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(path = %config.path.display(), "Opening database");

        let mut options = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout);
        if config.is_in_memory() {
            // Dropping the last connection drops the data.
            options = options.min_connections(1).idle_timeout(None).max_lifetime(None);
        }

        let pool = options
            .connect_with(config.connect_options())
            .await
            .map_err(|e| DbError::Open(format!("{}: {}", config.path.display(), e)))?;
        debug!(max_connections = config.max_connections, "Pool ready");

        let db = Database { pool };
        if config.migrate {
            migrations::run_migrations(&db.pool).await?;
        }
        Ok(db)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Plain collection for any record type.
    pub fn collection<T: Entity>(&self) -> Collection<T> {
        Collection::new(self.pool.clone())
    }

    pub fn customers(&self) -> Collection<Customer> {
        self.collection()
    }

    pub fn products(&self) -> Collection<Product> {
        self.collection()
    }

    pub fn suppliers(&self) -> Collection<Supplier> {
        self.collection()
    }

    pub fn payments(&self) -> Collection<Payment> {
        self.collection()
    }

    pub fn supplier_payments(&self) -> Collection<SupplierPayment> {
        self.collection()
    }

    pub fn production_costs(&self) -> Collection<ProductionCost> {
        self.collection()
    }

    pub fn lots(&self) -> LotRepository {
        LotRepository::new(self.pool.clone())
    }

    pub fn shipments(&self) -> ShipmentRepository {
        ShipmentRepository::new(self.pool.clone())
    }

    pub fn ledger(&self) -> LedgerRepository {
        LedgerRepository::new(self.pool.clone())
    }

    pub fn reports(&self) -> ReportRepository {
        ReportRepository::new(self.pool.clone())
    }

    /// Waits for open connections to finish and closes the pool.
    pub async fn close(&self) {
        debug!("Closing database");
        self.pool.close().await;
    }

    /// True when a trivial query succeeds.
    pub async fn health_check(&self) -> bool {
        sqlx::query_scalar::<_, i64>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_database() {
        let config = DbConfig::in_memory();
        assert!(config.is_in_memory());
        assert_eq!(config.max_connections, 1);

        let db = Database::new(config).await.unwrap();
        assert!(db.health_check().await);
    }

    #[tokio::test]
    async fn test_in_memory_databases_are_isolated() {
        let a = Database::new(DbConfig::in_memory()).await.unwrap();
        let b = Database::new(DbConfig::in_memory()).await.unwrap();

        a.customers().insert(&Customer::new("Only in A")).await.unwrap();

        assert_eq!(a.customers().count().await.unwrap(), 1);
        assert_eq!(b.customers().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_file_database_persists() {
        let path = std::env::temp_dir().join(format!("weft-test-{}.db", uuid::Uuid::new_v4()));
        {
            let db = Database::new(DbConfig::new(&path)).await.unwrap();
            db.products().insert(&Product::new("Interlock")).await.unwrap();
            db.close().await;
        }
        let db = Database::new(DbConfig::new(&path)).await.unwrap();
        assert_eq!(db.products().count().await.unwrap(), 1);
        db.close().await;
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_config_builder() {
        let config = DbConfig::new("/tmp/weft.db").max_connections(8).skip_migrations();
        assert_eq!(config.max_connections, 8);
        assert!(!config.migrate);
        assert!(!config.is_in_memory());

        let memory = DbConfig::in_memory().max_connections(8);
        assert_eq!(memory.max_connections, 1);
    }
}
