//! SQLite persistence module
//!
//! Repository pattern for SQLite database access.

pub mod repos;
pub mod schema;

pub use repos::{
    create_pool, init_database, init_memory_database, run_migrations, AccountRepo, ExerciseRepo,
    LookupKind, LookupRepo, ProductRepo, SubAccountRepo,
};
pub use schema::{AccountRow, ExerciseRow, LookupRow, ProductRow, SubAccountRow, VariantRow};
