//! # QuickCreate Persistence
//!
//! SQLite store behind the allocator: exercises, the chart of accounts,
//! sub-accounts and the product tables used by quick-create.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use quickcreate_persistence::{Database, SubAccountRepo};
//!
//! // Open (and migrate) the database
//! let db = Database::init("sqlite:data/quickcreate.db").await?;
//!
//! // Query via repos
//! let taken = SubAccountRepo::exists(db.pool(), "5700000001", "2026").await?;
//! ```

pub mod error;
pub mod sqlite;

pub use error::{PersistenceError, PersistenceResult};
pub use sqlite::{
    init_database, init_memory_database, AccountRepo, ExerciseRepo, LookupKind, LookupRepo,
    ProductRepo, SubAccountRepo,
};
pub use sqlite::schema::{
    AccountRow, ExerciseRow, LookupRow, ProductRow, SubAccountRow, VariantRow,
};

use sqlx::SqlitePool;

/// Database facade - owns the SQLite pool
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connect to an existing database
    ///
    /// # Arguments
    /// * `db_url` - SQLite database URL (e.g., "sqlite:quickcreate.db")
    pub async fn new(db_url: &str) -> PersistenceResult<Self> {
        let pool = sqlite::create_pool(db_url).await?;
        Ok(Self { pool })
    }

    /// Open the database, creating the file if needed, and run migrations
    pub async fn init(db_url: &str) -> PersistenceResult<Self> {
        let pool = init_database(db_url).await?;
        Ok(Self { pool })
    }

    /// Migrated in-memory database (tests, dry runs)
    pub async fn in_memory() -> PersistenceResult<Self> {
        let pool = init_memory_database().await?;
        Ok(Self { pool })
    }

    /// Get SQLite connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close every connection
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
