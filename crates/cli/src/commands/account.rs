//! Ledger account commands

use anyhow::{Context, Result};
use quickcreate_business::SearchService;
use quickcreate_core::NewAccount;
use quickcreate_persistence::{AccountRepo, ExerciseRepo};
use std::path::Path;

use super::{open_context, resolve_exercise};
use crate::AccountAction;

/// Handle account subcommands
pub async fn handle(db_path: &Path, config: Option<&Path>, action: AccountAction) -> Result<()> {
    let (db, ctx) = open_context(db_path, config).await?;

    match action {
        AccountAction::Search { query, exercise } => {
            let exercise_code = resolve_exercise(&db, exercise).await?;
            let accounts = SearchService::new(&ctx)
                .search_accounts(&query, &exercise_code)
                .await?;

            if accounts.is_empty() {
                println!("No accounts found.");
            } else {
                println!("{:<6} {:<12} {:<40}", "ID", "CODE", "DESCRIPTION");
                println!("{}", "-".repeat(58));
                for account in accounts {
                    println!("{:<6} {:<12} {:<40}", account.id, account.code, account.description);
                }
            }
        }

        AccountAction::Create {
            code,
            description,
            parent,
            exercise,
        } => {
            let exercise_code = resolve_exercise(&db, exercise).await?;
            ExerciseRepo::get_by_code(db.pool(), &exercise_code)
                .await
                .with_context(|| format!("Exercise '{}' not found", exercise_code))?;

            let mut account = NewAccount::new(code.trim(), &exercise_code, &description);
            if let Some(parent) = parent.as_deref() {
                account = account.with_parent(parent);
            }
            let id = AccountRepo::insert(db.pool(), &account).await?;

            println!("✅ Created account:");
            println!("   ID:          {}", id);
            println!("   Code:        {}", account.code);
            println!("   Description: {}", account.description);
            println!("   Exercise:    {}", account.exercise_code);
        }
    }

    db.close().await;
    Ok(())
}
