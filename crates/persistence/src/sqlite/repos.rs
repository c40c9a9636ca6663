//! Repository implementations for SQLite
//!
//! Natural-key lookups, prefix/substring searches and inserts for every
//! table. Repositories return row types; callers convert to domain types.

use crate::error::{PersistenceError, PersistenceResult};
use crate::sqlite::schema::*;
use quickcreate_core::{Exercise, NewAccount, NewProduct, NewSubAccount};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

/// Escape `%`, `_` and `\` so user input matches literally inside LIKE.
/// Queries using it must declare `ESCAPE '\'`.
fn like_escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn starts_with_pattern(prefix: &str) -> String {
    format!("{}%", like_escape(prefix))
}

fn contains_pattern(fragment: &str) -> String {
    format!("%{}%", like_escape(fragment))
}

// ============================================================================
// Exercise Repository
// ============================================================================

/// Repository for the exercises table
pub struct ExerciseRepo;

impl ExerciseRepo {
    /// Find exercise by code
    pub async fn find(pool: &SqlitePool, code: &str) -> PersistenceResult<Option<ExerciseRow>> {
        let row = sqlx::query_as::<_, ExerciseRow>("SELECT * FROM exercises WHERE code = ?")
            .bind(code)
            .fetch_optional(pool)
            .await?;
        Ok(row)
    }

    /// Get exercise by code, NotFound if missing
    pub async fn get_by_code(pool: &SqlitePool, code: &str) -> PersistenceResult<ExerciseRow> {
        Self::find(pool, code)
            .await?
            .ok_or_else(|| PersistenceError::not_found("Exercise", code))
    }

    /// Most recent open exercise, if any
    pub async fn find_open(pool: &SqlitePool) -> PersistenceResult<Option<ExerciseRow>> {
        let row = sqlx::query_as::<_, ExerciseRow>(
            "SELECT * FROM exercises WHERE state = 'open' ORDER BY code DESC LIMIT 1",
        )
        .fetch_optional(pool)
        .await?;
        Ok(row)
    }

    /// All exercises, newest first
    pub async fn get_all(pool: &SqlitePool) -> PersistenceResult<Vec<ExerciseRow>> {
        let rows = sqlx::query_as::<_, ExerciseRow>("SELECT * FROM exercises ORDER BY code DESC")
            .fetch_all(pool)
            .await?;
        Ok(rows)
    }

    /// Insert a new exercise
    pub async fn insert(pool: &SqlitePool, exercise: &Exercise) -> PersistenceResult<()> {
        sqlx::query(
            "INSERT INTO exercises (code, name, state, subaccount_code_length) VALUES (?, ?, ?, ?)",
        )
        .bind(&exercise.code)
        .bind(&exercise.name)
        .bind(exercise.state.as_str())
        .bind(exercise.subaccount_code_length as i64)
        .execute(pool)
        .await
        .map_err(|e| PersistenceError::from_insert(e, "Exercise", &exercise.code))?;
        Ok(())
    }
}

// ============================================================================
// Account Repository
// ============================================================================

/// Repository for the accounts table
pub struct AccountRepo;

impl AccountRepo {
    /// Find account by natural key `(code, exercise_code)`
    pub async fn find(
        pool: &SqlitePool,
        code: &str,
        exercise_code: &str,
    ) -> PersistenceResult<Option<AccountRow>> {
        let row = sqlx::query_as::<_, AccountRow>(
            "SELECT * FROM accounts WHERE code = ? AND exercise_code = ?",
        )
        .bind(code)
        .bind(exercise_code)
        .fetch_optional(pool)
        .await?;
        Ok(row)
    }

    /// Find account by surrogate id
    pub async fn find_by_id(pool: &SqlitePool, id: i64) -> PersistenceResult<Option<AccountRow>> {
        let row = sqlx::query_as::<_, AccountRow>("SELECT * FROM accounts WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(row)
    }

    /// Accounts whose code starts with `code_prefix` or whose description
    /// contains `fragment`, ordered by code
    pub async fn search(
        pool: &SqlitePool,
        exercise_code: &str,
        code_prefix: &str,
        fragment: &str,
        limit: u32,
    ) -> PersistenceResult<Vec<AccountRow>> {
        let rows = sqlx::query_as::<_, AccountRow>(
            r#"
            SELECT * FROM accounts
            WHERE exercise_code = ?
              AND (code LIKE ? ESCAPE '\' OR description LIKE ? ESCAPE '\')
            ORDER BY code
            LIMIT ?
            "#,
        )
        .bind(exercise_code)
        .bind(starts_with_pattern(code_prefix))
        .bind(contains_pattern(fragment))
        .bind(i64::from(limit))
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }

    /// Insert a new account, returning its id
    pub async fn insert(pool: &SqlitePool, account: &NewAccount) -> PersistenceResult<i64> {
        let result = sqlx::query(
            "INSERT INTO accounts (code, exercise_code, description, parent_code) VALUES (?, ?, ?, ?)",
        )
        .bind(&account.code)
        .bind(&account.exercise_code)
        .bind(&account.description)
        .bind(&account.parent_code)
        .execute(pool)
        .await
        .map_err(|e| {
            PersistenceError::from_insert(
                e,
                "Account",
                &format!("{}@{}", account.code, account.exercise_code),
            )
        })?;
        Ok(result.last_insert_rowid())
    }

    /// Count accounts
    pub async fn count(pool: &SqlitePool) -> PersistenceResult<i64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM accounts")
            .fetch_one(pool)
            .await?;
        Ok(row.0)
    }
}

// ============================================================================
// SubAccount Repository
// ============================================================================

/// Repository for the subaccounts table
pub struct SubAccountRepo;

impl SubAccountRepo {
    /// Whether `(code, exercise_code)` is taken
    pub async fn exists(
        pool: &SqlitePool,
        code: &str,
        exercise_code: &str,
    ) -> PersistenceResult<bool> {
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM subaccounts WHERE code = ? AND exercise_code = ?",
        )
        .bind(code)
        .bind(exercise_code)
        .fetch_one(pool)
        .await?;
        Ok(row.0 > 0)
    }

    /// Codes already taken under a prefix
    pub async fn codes_with_prefix(
        pool: &SqlitePool,
        exercise_code: &str,
        prefix: &str,
    ) -> PersistenceResult<Vec<String>> {
        let codes = sqlx::query_scalar::<_, String>(
            "SELECT code FROM subaccounts WHERE exercise_code = ? AND code LIKE ? ESCAPE '\\'",
        )
        .bind(exercise_code)
        .bind(starts_with_pattern(prefix))
        .fetch_all(pool)
        .await?;
        Ok(codes)
    }

    /// Sub-accounts whose code starts with `prefix`, ordered by code
    pub async fn search_by_code_prefix(
        pool: &SqlitePool,
        exercise_code: &str,
        prefix: &str,
        limit: u32,
    ) -> PersistenceResult<Vec<SubAccountRow>> {
        let rows = sqlx::query_as::<_, SubAccountRow>(
            r#"
            SELECT * FROM subaccounts
            WHERE exercise_code = ? AND code LIKE ? ESCAPE '\'
            ORDER BY code
            LIMIT ?
            "#,
        )
        .bind(exercise_code)
        .bind(starts_with_pattern(prefix))
        .bind(i64::from(limit))
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }

    /// Sub-accounts whose description contains `fragment` (case-insensitive
    /// for ASCII), ordered by code
    pub async fn search_by_description(
        pool: &SqlitePool,
        exercise_code: &str,
        fragment: &str,
        limit: u32,
    ) -> PersistenceResult<Vec<SubAccountRow>> {
        let rows = sqlx::query_as::<_, SubAccountRow>(
            r#"
            SELECT * FROM subaccounts
            WHERE exercise_code = ? AND description LIKE ? ESCAPE '\'
            ORDER BY code
            LIMIT ?
            "#,
        )
        .bind(exercise_code)
        .bind(contains_pattern(fragment))
        .bind(i64::from(limit))
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }

    /// Sub-accounts under an account
    pub async fn get_by_account(
        pool: &SqlitePool,
        account_id: i64,
    ) -> PersistenceResult<Vec<SubAccountRow>> {
        let rows = sqlx::query_as::<_, SubAccountRow>(
            "SELECT * FROM subaccounts WHERE account_id = ? ORDER BY code",
        )
        .bind(account_id)
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }

    /// Insert a new sub-account and return the stored row.
    ///
    /// A taken `(code, exercise_code)` is reported as `AlreadyExists`.
    pub async fn insert(
        pool: &SqlitePool,
        subaccount: &NewSubAccount,
    ) -> PersistenceResult<SubAccountRow> {
        let key = format!("{}@{}", subaccount.code, subaccount.exercise_code);
        let result = sqlx::query(
            r#"
            INSERT INTO subaccounts (code, exercise_code, account_id, account_code, description, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&subaccount.code)
        .bind(&subaccount.exercise_code)
        .bind(subaccount.account_id)
        .bind(&subaccount.account_code)
        .bind(&subaccount.description)
        .bind(subaccount.created_at)
        .execute(pool)
        .await
        .map_err(|e| PersistenceError::from_insert(e, "SubAccount", &key))?;

        sqlx::query_as::<_, SubAccountRow>("SELECT * FROM subaccounts WHERE id = ?")
            .bind(result.last_insert_rowid())
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| PersistenceError::not_found("SubAccount", &key))
    }

    /// Count sub-accounts
    pub async fn count(pool: &SqlitePool) -> PersistenceResult<i64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM subaccounts")
            .fetch_one(pool)
            .await?;
        Ok(row.0)
    }
}

// ============================================================================
// Product Repository
// ============================================================================

/// Repository for the products and variants tables
pub struct ProductRepo;

impl ProductRepo {
    /// Whether a product or variant already uses `reference`
    pub async fn reference_exists(pool: &SqlitePool, reference: &str) -> PersistenceResult<bool> {
        let row: (i64,) = sqlx::query_as(
            r#"
            SELECT (SELECT COUNT(*) FROM products WHERE reference = ?)
                 + (SELECT COUNT(*) FROM variants WHERE reference = ?)
            "#,
        )
        .bind(reference)
        .bind(reference)
        .fetch_one(pool)
        .await?;
        Ok(row.0 > 0)
    }

    /// Find product by reference
    pub async fn find_by_reference(
        pool: &SqlitePool,
        reference: &str,
    ) -> PersistenceResult<Option<ProductRow>> {
        let row = sqlx::query_as::<_, ProductRow>("SELECT * FROM products WHERE reference = ?")
            .bind(reference)
            .fetch_optional(pool)
            .await?;
        Ok(row)
    }

    /// Variants of a product
    pub async fn get_variants(
        pool: &SqlitePool,
        product_id: i64,
    ) -> PersistenceResult<Vec<VariantRow>> {
        let rows = sqlx::query_as::<_, VariantRow>(
            "SELECT * FROM variants WHERE product_id = ? ORDER BY id",
        )
        .bind(product_id)
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }

    /// Insert a product together with its default variant, atomically
    pub async fn insert(
        pool: &SqlitePool,
        product: &NewProduct,
    ) -> PersistenceResult<(ProductRow, VariantRow)> {
        let mut tx = pool.begin().await?;

        let product_id = sqlx::query(
            r#"
            INSERT INTO products (reference, description, price, family_code, manufacturer_code,
                                  tax_code, vat_exception, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&product.reference)
        .bind(&product.description)
        .bind(product.price.to_string())
        .bind(&product.family_code)
        .bind(&product.manufacturer_code)
        .bind(&product.tax_code)
        .bind(&product.vat_exception)
        .bind(product.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| PersistenceError::from_insert(e, "Product", &product.reference))?
        .last_insert_rowid();

        let variant_id = sqlx::query("INSERT INTO variants (product_id, reference, price) VALUES (?, ?, ?)")
            .bind(product_id)
            .bind(&product.reference)
            .bind(product.price.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| PersistenceError::from_insert(e, "Variant", &product.reference))?
            .last_insert_rowid();

        let product_row = sqlx::query_as::<_, ProductRow>("SELECT * FROM products WHERE id = ?")
            .bind(product_id)
            .fetch_one(&mut *tx)
            .await?;
        let variant_row = sqlx::query_as::<_, VariantRow>("SELECT * FROM variants WHERE id = ?")
            .bind(variant_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok((product_row, variant_row))
    }

    /// Count products
    pub async fn count(pool: &SqlitePool) -> PersistenceResult<i64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products")
            .fetch_one(pool)
            .await?;
        Ok(row.0)
    }
}

// ============================================================================
// Lookup Repository
// ============================================================================

/// Lookup tables referenced by products
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupKind {
    Family,
    Manufacturer,
    Tax,
}

impl LookupKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LookupKind::Family => "family",
            LookupKind::Manufacturer => "manufacturer",
            LookupKind::Tax => "tax",
        }
    }

    fn table(&self) -> &'static str {
        match self {
            LookupKind::Family => "families",
            LookupKind::Manufacturer => "manufacturers",
            LookupKind::Tax => "taxes",
        }
    }

    fn label_column(&self) -> &'static str {
        match self {
            LookupKind::Family | LookupKind::Tax => "description",
            LookupKind::Manufacturer => "name",
        }
    }
}

/// Repository for families, manufacturers and taxes
pub struct LookupRepo;

impl LookupRepo {
    /// All rows of a lookup table, ordered by label
    pub async fn get_all(pool: &SqlitePool, kind: LookupKind) -> PersistenceResult<Vec<LookupRow>> {
        let sql = format!(
            "SELECT code, {label} AS label FROM {table} ORDER BY {label}",
            label = kind.label_column(),
            table = kind.table(),
        );
        let rows = sqlx::query_as::<_, LookupRow>(&sql).fetch_all(pool).await?;
        Ok(rows)
    }

    /// Whether `code` exists in a lookup table
    pub async fn exists(pool: &SqlitePool, kind: LookupKind, code: &str) -> PersistenceResult<bool> {
        let sql = format!("SELECT COUNT(*) FROM {} WHERE code = ?", kind.table());
        let row: (i64,) = sqlx::query_as(&sql).bind(code).fetch_one(pool).await?;
        Ok(row.0 > 0)
    }

    /// Insert a lookup row
    pub async fn insert(
        pool: &SqlitePool,
        kind: LookupKind,
        code: &str,
        label: &str,
    ) -> PersistenceResult<()> {
        let sql = format!(
            "INSERT INTO {} (code, {}) VALUES (?, ?)",
            kind.table(),
            kind.label_column()
        );
        sqlx::query(&sql)
            .bind(code)
            .bind(label)
            .execute(pool)
            .await
            .map_err(|e| PersistenceError::from_insert(e, kind.as_str(), code))?;
        Ok(())
    }
}

// ============================================================================
// Database initialization
// ============================================================================

/// Create database connection pool
pub async fn create_pool(database_url: &str) -> PersistenceResult<SqlitePool> {
    let pool = SqlitePool::connect(database_url).await?;
    Ok(pool)
}

/// Run migrations
pub async fn run_migrations(pool: &SqlitePool) -> PersistenceResult<()> {
    sqlx::migrate!("../../migrations").run(pool).await?;
    Ok(())
}

/// Open (creating if needed) a database and bring its schema up to date
pub async fn init_database(database_url: &str) -> PersistenceResult<SqlitePool> {
    let pool = SqlitePool::connect_with(
        SqliteConnectOptions::from_str(database_url)?.create_if_missing(true),
    )
    .await?;

    run_migrations(&pool).await?;

    Ok(pool)
}

/// Private in-memory database with the full schema.
///
/// Uses a single connection that never expires, since every new SQLite
/// memory connection would see an empty database.
pub async fn init_memory_database() -> PersistenceResult<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(SqliteConnectOptions::from_str("sqlite::memory:")?)
        .await?;

    run_migrations(&pool).await?;

    Ok(pool)
}
