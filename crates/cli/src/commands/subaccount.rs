//! Sub-account commands

use anyhow::{Context, Result};
use quickcreate_business::{
    BusinessError, CreateSubAccount, ParentRef, SearchService, SubAccountService,
};
use quickcreate_core::code::transform;
use quickcreate_core::SubAccount;
use quickcreate_persistence::{AccountRepo, SubAccountRepo};
use std::path::Path;

use super::{open_context, resolve_exercise};
use crate::SubaccountAction;

/// Handle sub-account subcommands
pub async fn handle(db_path: &Path, config: Option<&Path>, action: SubaccountAction) -> Result<()> {
    let (db, ctx) = open_context(db_path, config).await?;

    match action {
        SubaccountAction::Create {
            code,
            parent,
            description,
            exercise,
        } => {
            let exercise_code = resolve_exercise(&db, exercise).await?;
            let service = SubAccountService::new(&ctx);
            let length = service
                .exercise(&exercise_code)
                .await?
                .map(|e| e.subaccount_code_length)
                .unwrap_or(ctx.config().default_code_length);

            let parent = match parent {
                Some(code) => ParentRef::Code(code),
                None => ParentRef::Resolve,
            };
            let subaccount = service
                .create_subaccount(CreateSubAccount {
                    code: transform(&code, length),
                    description,
                    parent,
                    exercise_code,
                })
                .await?;
            print_created(&subaccount);
        }

        SubaccountAction::Search { query, exercise } => {
            let exercise_code = resolve_exercise(&db, exercise).await?;
            let search = SearchService::new(&ctx)
                .search_subaccounts(&query, &exercise_code)
                .await?;

            if search.results.is_empty() {
                println!("No sub-accounts found.");
            } else {
                println!("{:<14} {:<40}", "CODE", "DESCRIPTION");
                println!("{}", "-".repeat(54));
                for hit in &search.results {
                    println!("{:<14} {:<40}", hit.code, hit.description);
                }
            }
            if let Some(code) = search.suggested_code {
                println!();
                println!("💡 Suggested new code: {}", code);
            }
        }

        SubaccountAction::List { parent, exercise } => {
            let exercise_code = resolve_exercise(&db, exercise).await?;
            let account = AccountRepo::find(db.pool(), &parent, &exercise_code)
                .await?
                .with_context(|| {
                    format!("Account '{}' not found in exercise {}", parent, exercise_code)
                })?;

            let rows = SubAccountRepo::get_by_account(db.pool(), account.id).await?;
            if rows.is_empty() {
                println!("No sub-accounts under {}.", account.code);
            } else {
                println!("{:<14} {:<40} {:<20}", "CODE", "DESCRIPTION", "CREATED");
                println!("{}", "-".repeat(74));
                for row in rows {
                    let subaccount = SubAccount::from(row);
                    println!(
                        "{:<14} {:<40} {:<20}",
                        subaccount.code,
                        subaccount.description,
                        subaccount.created_at.format("%Y-%m-%d %H:%M:%S")
                    );
                }
            }
        }

        SubaccountAction::Allocate {
            parent,
            description,
            exercise,
        } => {
            let exercise_code = resolve_exercise(&db, exercise).await?;
            let subaccount = SubAccountService::new(&ctx)
                .allocate_subaccount(&parent, &exercise_code, description.as_deref())
                .await?;
            print_created(&subaccount);
        }
    }

    db.close().await;
    Ok(())
}

/// Print the next free code under `parent`
pub async fn next_code(
    db_path: &Path,
    config: Option<&Path>,
    parent: &str,
    exercise: Option<String>,
) -> Result<()> {
    let (db, ctx) = open_context(db_path, config).await?;
    let exercise_code = resolve_exercise(&db, exercise).await?;

    match SubAccountService::new(&ctx)
        .next_free_code(parent, &exercise_code)
        .await
    {
        Ok(Some(code)) => println!("{}", code),
        Ok(None) => println!(
            "❌ Account '{}' not found in exercise {}",
            parent, exercise_code
        ),
        Err(BusinessError::CodeSpaceExhausted { .. }) => {
            println!("❌ No free sub-account codes left under '{}'", parent)
        }
        Err(BusinessError::ParentCodeTooLong { length, .. }) => {
            println!("❌ '{}' leaves no room for a suffix in {} characters", parent, length)
        }
        Err(e) => return Err(e.into()),
    }

    db.close().await;
    Ok(())
}

fn print_created(subaccount: &SubAccount) {
    println!("✅ Created sub-account:");
    println!("   Code:        {}", subaccount.code);
    println!("   Parent:      {}", subaccount.account_code);
    println!("   Description: {}", subaccount.description);
    println!("   Exercise:    {}", subaccount.exercise_code);
    println!(
        "   Created:     {}",
        subaccount.created_at.format("%Y-%m-%d %H:%M:%S")
    );
}
