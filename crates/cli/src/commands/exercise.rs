//! Exercise listing and code transformation

use anyhow::{Context, Result};
use quickcreate_core::code::transform as transform_code;
use quickcreate_core::{Exercise, QuickCreateConfig};
use quickcreate_persistence::ExerciseRepo;
use std::path::Path;

use crate::db;
use crate::ExerciseAction;

/// Handle exercise subcommands
pub async fn handle(db_path: &Path, action: ExerciseAction) -> Result<()> {
    let db = db::connect(db_path).await?;

    match action {
        ExerciseAction::List => {
            let rows = ExerciseRepo::get_all(db.pool()).await?;
            if rows.is_empty() {
                println!("No exercises found.");
            } else {
                println!("{:<10} {:<24} {:<8} {:<6}", "CODE", "NAME", "STATE", "LENGTH");
                println!("{}", "-".repeat(50));
                for row in rows {
                    let exercise = Exercise::try_from(row)?;
                    println!(
                        "{:<10} {:<24} {:<8} {:<6}",
                        exercise.code,
                        exercise.name,
                        exercise.state.as_str(),
                        exercise.subaccount_code_length
                    );
                }
            }
        }
    }

    db.close().await;
    Ok(())
}

/// Print the canonical form of a typed code
pub fn transform(config_path: Option<&Path>, code: &str, length: Option<usize>) -> Result<()> {
    let length = match length {
        Some(length) => length,
        None => {
            QuickCreateConfig::load(config_path)
                .context("Failed to load configuration")?
                .default_code_length
        }
    };

    println!("{}", transform_code(code, length));
    Ok(())
}
