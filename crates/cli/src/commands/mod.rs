//! Command handlers

pub mod account;
pub mod api;
pub mod exercise;
pub mod product;
pub mod subaccount;

use anyhow::{Context, Result};
use quickcreate_business::ServiceContext;
use quickcreate_core::QuickCreateConfig;
use quickcreate_persistence::{Database, ExerciseRepo};
use std::path::Path;

use crate::db;

/// Load configuration and open the database behind a service context
pub async fn open_context(
    db_path: &Path,
    config_path: Option<&Path>,
) -> Result<(Database, ServiceContext)> {
    let config = QuickCreateConfig::load(config_path).context("Failed to load configuration")?;
    let db = db::connect(db_path).await?;
    let ctx = ServiceContext::new(&db, config);
    Ok((db, ctx))
}

/// Use the given exercise code, or the open exercise when none is given
pub async fn resolve_exercise(db: &Database, exercise: Option<String>) -> Result<String> {
    if let Some(code) = exercise.filter(|c| !c.trim().is_empty()) {
        return Ok(code.trim().to_string());
    }

    let open = ExerciseRepo::find_open(db.pool())
        .await?
        .context("No open exercise. Pass --exercise or create one with 'quickcreate init --seed'")?;
    eprintln!("📅 Using open exercise {}", open.code);
    Ok(open.code)
}
