//! Database schema definitions
//!
//! Row types for sqlx mapping from SQLite tables.
//! The schema is defined in migrations/20260301000000_init.sql

use crate::error::PersistenceError;
use chrono::{DateTime, Utc};
use quickcreate_core::{Account, Exercise, ExerciseState, Product, SubAccount};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Row type for the `exercises` table
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct ExerciseRow {
    pub code: String,
    pub name: String,
    pub state: String,
    pub subaccount_code_length: i64,
}

/// Row type for the `accounts` table
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct AccountRow {
    pub id: i64,
    pub code: String,
    pub exercise_code: String,
    pub description: String,
    pub parent_code: Option<String>,
}

/// Row type for the `subaccounts` table
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct SubAccountRow {
    pub id: i64,
    pub code: String,
    pub exercise_code: String,
    pub account_id: i64,
    pub account_code: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// Row type for the `products` table
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct ProductRow {
    pub id: i64,
    pub reference: String,
    pub description: String,
    pub price: String, // Decimal stored as TEXT
    pub family_code: Option<String>,
    pub manufacturer_code: Option<String>,
    pub tax_code: Option<String>,
    pub vat_exception: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Row type for the `variants` table
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct VariantRow {
    pub id: i64,
    pub product_id: i64,
    pub reference: String,
    pub price: String,
}

/// `(code, label)` row from a lookup table (families, manufacturers, taxes)
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct LookupRow {
    pub code: String,
    pub label: String,
}

// === Conversion implementations ===

impl TryFrom<ExerciseRow> for Exercise {
    type Error = PersistenceError;

    fn try_from(row: ExerciseRow) -> Result<Self, Self::Error> {
        let state = ExerciseState::from_str(&row.state).map_err(|_| {
            PersistenceError::InvalidEnumValue {
                field: "exercises.state".to_string(),
                value: row.state.clone(),
            }
        })?;
        let subaccount_code_length = usize::try_from(row.subaccount_code_length).map_err(|_| {
            PersistenceError::InvalidInteger {
                field: "exercises.subaccount_code_length".to_string(),
                value: row.subaccount_code_length,
            }
        })?;

        Ok(Exercise {
            code: row.code,
            name: row.name,
            state,
            subaccount_code_length,
        })
    }
}

impl From<AccountRow> for Account {
    fn from(row: AccountRow) -> Self {
        Account {
            id: row.id,
            code: row.code,
            exercise_code: row.exercise_code,
            description: row.description,
            parent_code: row.parent_code,
        }
    }
}

impl From<SubAccountRow> for SubAccount {
    fn from(row: SubAccountRow) -> Self {
        SubAccount {
            id: row.id,
            code: row.code,
            exercise_code: row.exercise_code,
            account_id: row.account_id,
            account_code: row.account_code,
            description: row.description,
            created_at: row.created_at,
        }
    }
}

impl TryFrom<ProductRow> for Product {
    type Error = PersistenceError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let price = Decimal::from_str(&row.price)
            .map_err(|e| PersistenceError::InvalidDecimal(format!("{}: {}", row.price, e)))?;

        Ok(Product {
            id: row.id,
            reference: row.reference,
            description: row.description,
            price,
            family_code: row.family_code,
            manufacturer_code: row.manufacturer_code,
            tax_code: row.tax_code,
            vat_exception: row.vat_exception,
            created_at: row.created_at,
        })
    }
}
