//! QuickCreate CLI - sub-account and product quick-create from the command line
//!
//! Usage:
//! ```bash
//! quickcreate init --seed
//! quickcreate transform 570.1
//! quickcreate next-code 629 --exercise 2026
//! quickcreate subaccount allocate 629 --description "Hosting"
//! quickcreate subaccount search 572. --exercise 2026
//! quickcreate subaccount list 572
//! quickcreate product create HAM-01 --description "Martillo" --price 12,50
//! quickcreate api '{"action": "get-product-options"}'
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::path::PathBuf;

mod commands;
mod db;

use commands::{account, api, exercise, product, subaccount};

/// QuickCreate - sub-account allocator and quick-create tools
#[derive(Parser)]
#[command(name = "quickcreate")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Database file path
    #[arg(long, default_value = "data/quickcreate.db", global = true)]
    pub db: PathBuf,

    /// JSON configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize database schema
    Init {
        /// Force re-initialization (drops existing data)
        #[arg(long)]
        force: bool,
        /// Load a sample exercise, accounts and product lookups
        #[arg(long)]
        seed: bool,
    },

    /// Show database status
    Status,

    /// Fiscal exercises
    Exercise {
        #[command(subcommand)]
        action: ExerciseAction,
    },

    /// Expand dot notation (e.g. 570.1) to a full sub-account code
    Transform {
        /// Code as typed
        code: String,
        /// Target length (defaults to the configured length)
        #[arg(long, short)]
        length: Option<usize>,
    },

    /// Show the next free sub-account code under an account
    NextCode {
        /// Parent account code (e.g., 629)
        parent: String,
        /// Exercise code (defaults to the open exercise)
        #[arg(long, short)]
        exercise: Option<String>,
    },

    /// Sub-account management
    Subaccount {
        #[command(subcommand)]
        action: SubaccountAction,
    },

    /// Ledger account management
    Account {
        #[command(subcommand)]
        action: AccountAction,
    },

    /// Product quick-create
    Product {
        #[command(subcommand)]
        action: ProductAction,
    },

    /// Dispatch a raw JSON API request and print the response envelope
    Api {
        /// Request body, e.g. '{"action": "next-free-code", "parentAccountId": 1}'
        json: String,
    },
}

#[derive(Subcommand)]
pub enum ExerciseAction {
    /// List all exercises
    List,
}

#[derive(Subcommand)]
pub enum SubaccountAction {
    /// Create a sub-account with an explicit code (dot notation accepted)
    Create {
        /// Sub-account code (e.g., 4300000001 or 430.1)
        code: String,
        /// Parent account code (found by prefix when omitted)
        #[arg(long, short)]
        parent: Option<String>,
        /// Description (defaults to the parent's)
        #[arg(long, short)]
        description: Option<String>,
        /// Exercise code (defaults to the open exercise)
        #[arg(long, short)]
        exercise: Option<String>,
    },
    /// Search sub-accounts by code or description
    Search {
        /// Code prefix, dot notation or description fragment
        query: String,
        /// Exercise code (defaults to the open exercise)
        #[arg(long, short)]
        exercise: Option<String>,
    },
    /// List the sub-accounts of a ledger account
    List {
        /// Parent account code
        parent: String,
        /// Exercise code (defaults to the open exercise)
        #[arg(long, short)]
        exercise: Option<String>,
    },
    /// Create a sub-account with the next free code
    Allocate {
        /// Parent account code
        parent: String,
        /// Description (defaults to the parent's)
        #[arg(long, short)]
        description: Option<String>,
        /// Exercise code (defaults to the open exercise)
        #[arg(long, short)]
        exercise: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum AccountAction {
    /// Search ledger accounts by code prefix or description
    Search {
        /// Code prefix or description fragment
        query: String,
        /// Exercise code (defaults to the open exercise)
        #[arg(long, short)]
        exercise: Option<String>,
    },
    /// Create a ledger account
    Create {
        /// Account code (e.g., 629)
        code: String,
        /// Account description
        description: String,
        /// Parent account code
        #[arg(long, short)]
        parent: Option<String>,
        /// Exercise code (defaults to the open exercise)
        #[arg(long, short)]
        exercise: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum ProductAction {
    /// Create a product with its default variant
    Create {
        /// Product reference
        reference: String,
        /// Description
        #[arg(long, short, default_value = "")]
        description: String,
        /// Price (decimal comma accepted)
        #[arg(long, short, default_value = "0", value_parser = parse_price_arg)]
        price: Decimal,
        /// Family code
        #[arg(long)]
        family: Option<String>,
        /// Manufacturer code
        #[arg(long)]
        manufacturer: Option<String>,
        /// Tax code
        #[arg(long)]
        tax: Option<String>,
        /// VAT exemption code (E1-E6)
        #[arg(long)]
        vat_exception: Option<String>,
    },
    /// Show a product and its variants
    Show {
        /// Product reference
        reference: String,
    },
    /// List families, manufacturers, taxes and VAT exemptions
    Options,
}

fn parse_price_arg(input: &str) -> Result<Decimal, String> {
    quickcreate_core::product::parse_price(input).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    // Ensure data directory exists
    if let Some(parent) = cli.db.parent() {
        std::fs::create_dir_all(parent).ok();
    }

    let config = cli.config.as_deref();

    match cli.command {
        Commands::Init { force, seed } => {
            db::init_database(&cli.db, force, seed).await?;
            println!("✅ Database initialized at {:?}", cli.db);
        }

        Commands::Status => {
            db::show_status(&cli.db).await?;
        }

        Commands::Exercise { action } => {
            exercise::handle(&cli.db, action).await?;
        }

        Commands::Transform { code, length } => {
            exercise::transform(config, &code, length)?;
        }

        Commands::NextCode { parent, exercise } => {
            subaccount::next_code(&cli.db, config, &parent, exercise).await?;
        }

        Commands::Subaccount { action } => {
            subaccount::handle(&cli.db, config, action).await?;
        }

        Commands::Account { action } => {
            account::handle(&cli.db, config, action).await?;
        }

        Commands::Product { action } => {
            product::handle(&cli.db, config, action).await?;
        }

        Commands::Api { json } => {
            api::dispatch(&cli.db, config, &json).await?;
        }
    }

    Ok(())
}
