//! Database initialization and status

use anyhow::{Context, Result};
use quickcreate_core::{Exercise, NewAccount};
use quickcreate_persistence::{
    AccountRepo, Database, ExerciseRepo, LookupKind, LookupRepo, PersistenceResult, ProductRepo,
    SubAccountRepo,
};
use sqlx::SqlitePool;
use std::path::Path;

fn database_url(db_path: &Path) -> String {
    format!("sqlite:{}", db_path.display())
}

/// Create (or migrate) the database, optionally loading sample data
pub async fn init_database(db_path: &Path, force: bool, seed: bool) -> Result<()> {
    if force && db_path.exists() {
        std::fs::remove_file(db_path).context("Failed to remove existing database")?;
        println!("🗑️  Removed existing database");
    }

    println!("📦 Applying migrations...");
    let db = Database::init(&database_url(db_path))
        .await
        .context("Failed to initialize database")?;

    if seed {
        seed_data(db.pool()).await?;
    }

    db.close().await;
    Ok(())
}

/// Show database status
pub async fn show_status(db_path: &Path) -> Result<()> {
    if !db_path.exists() {
        println!("❌ Database not found at {:?}", db_path);
        println!("   Run 'quickcreate init' to create the database");
        return Ok(());
    }

    let db = connect(db_path).await?;
    let pool = db.pool();

    println!("📊 Database Status");
    println!("   Path: {:?}", db_path);
    println!();

    let exercises = ExerciseRepo::get_all(pool).await?;
    let open = exercises.iter().filter(|e| e.state == "open").count();
    let lookups: (i64,) = sqlx::query_as(
        "SELECT (SELECT COUNT(*) FROM families) + (SELECT COUNT(*) FROM manufacturers) + (SELECT COUNT(*) FROM taxes)",
    )
    .fetch_one(pool)
    .await
    .unwrap_or((0,));

    println!("   Exercises:    {} ({} open)", exercises.len(), open);
    println!("   Accounts:     {}", AccountRepo::count(pool).await?);
    println!("   Sub-accounts: {}", SubAccountRepo::count(pool).await?);
    println!("   Products:     {}", ProductRepo::count(pool).await?);
    println!("   Lookups:      {}", lookups.0);

    db.close().await;
    Ok(())
}

/// Ignore rows that a previous seed already inserted
fn skip_existing(result: PersistenceResult<()>) -> Result<()> {
    match result {
        Err(e) if e.is_already_exists() => Ok(()),
        other => Ok(other?),
    }
}

/// Seed a sample exercise, chart accounts and product lookups
async fn seed_data(pool: &SqlitePool) -> Result<()> {
    println!("🌱 Seeding sample data...");

    skip_existing(ExerciseRepo::insert(pool, &Exercise::new("2026", "Ejercicio 2026", 10)).await)?;

    let accounts = [
        ("430", "Clientes"),
        ("570", "Caja, euros"),
        ("572", "Bancos e instituciones de crédito"),
        ("629", "Otros servicios"),
    ];
    for (code, description) in accounts {
        let result = AccountRepo::insert(pool, &NewAccount::new(code, "2026", description))
            .await
            .map(|_| ());
        skip_existing(result)?;
    }

    let lookups = [
        (LookupKind::Family, "GEN", "General"),
        (LookupKind::Family, "TOOLS", "Herramientas"),
        (LookupKind::Manufacturer, "ACME", "Acme"),
        (LookupKind::Tax, "IVA21", "IVA 21%"),
        (LookupKind::Tax, "IVA10", "IVA 10%"),
        (LookupKind::Tax, "IVA4", "IVA 4%"),
        (LookupKind::Tax, "IVA0", "IVA 0%"),
    ];
    for (kind, code, label) in lookups {
        skip_existing(LookupRepo::insert(pool, kind, code, label).await)?;
    }

    Ok(())
}

/// Open an existing database
pub async fn connect(db_path: &Path) -> Result<Database> {
    Database::new(&database_url(db_path))
        .await
        .context("Failed to connect to database. Run 'quickcreate init' first.")
}
