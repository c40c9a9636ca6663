//! # Account Module
//!
//! Chart-of-accounts nodes (Account) and the leaf ledger accounts hanging
//! from them (SubAccount). Both are scoped to one Exercise.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Chart-of-accounts node, identified by `(code, exercise_code)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: i64,
    pub code: String,
    pub exercise_code: String,
    pub description: String,
    /// Code of the enclosing account group, if any
    pub parent_code: Option<String>,
}

impl Account {
    /// Whether a sub-account code lives under this account
    pub fn contains_code(&self, code: &str) -> bool {
        code.starts_with(&self.code)
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({})", self.code, self.description, self.exercise_code)
    }
}

/// Data for a chart-of-accounts node that is not stored yet.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub code: String,
    pub exercise_code: String,
    pub description: String,
    pub parent_code: Option<String>,
}

impl NewAccount {
    pub fn new(code: &str, exercise_code: &str, description: &str) -> Self {
        Self {
            code: code.to_string(),
            exercise_code: exercise_code.to_string(),
            description: description.to_string(),
            parent_code: None,
        }
    }

    pub fn with_parent(mut self, parent_code: &str) -> Self {
        self.parent_code = Some(parent_code.to_string());
        self
    }
}

/// Leaf ledger account, identified by `(code, exercise_code)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubAccount {
    pub id: i64,
    pub code: String,
    pub exercise_code: String,
    /// Surrogate id of the parent Account
    pub account_id: i64,
    pub account_code: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl fmt::Display for SubAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} (account {}, exercise {})",
            self.code, self.description, self.account_code, self.exercise_code
        )
    }
}

/// Sub-account about to be inserted.
///
/// Built from a resolved parent so the parent reference is always consistent.
#[derive(Debug, Clone)]
pub struct NewSubAccount {
    pub code: String,
    pub exercise_code: String,
    pub account_id: i64,
    pub account_code: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl NewSubAccount {
    /// Sub-account under `parent`; a missing or blank description falls back
    /// to the parent's.
    pub fn under(parent: &Account, code: &str, description: Option<&str>) -> Self {
        let description = description
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .unwrap_or(&parent.description);

        Self {
            code: code.to_string(),
            exercise_code: parent.exercise_code.clone(),
            account_id: parent.id,
            account_code: parent.code.clone(),
            description: description.to_string(),
            created_at: Utc::now(),
        }
    }
}
