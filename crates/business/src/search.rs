//! Account and sub-account search for autocomplete
//!
//! Sub-account search merges code-prefix and description matches and may
//! suggest a code that does not exist yet.

use crate::allocator::SubAccountService;
use crate::error::{BusinessError, BusinessResult};
use crate::services::ServiceContext;
use quickcreate_core::code::{self, pad_code, QueryShape};
use quickcreate_core::Exercise;
use quickcreate_persistence::{AccountRepo, SubAccountRepo};
use serde::Serialize;
use std::collections::HashSet;

/// One sub-account search hit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubAccountHit {
    pub code: String,
    pub description: String,
    pub id: i64,
}

/// Sub-account search result with an optional suggested new code
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubAccountSearch {
    pub results: Vec<SubAccountHit>,
    pub suggested_code: Option<String>,
}

/// One account search hit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountSummary {
    pub id: i64,
    pub code: String,
    pub description: String,
}

/// Search service
pub struct SearchService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> SearchService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Search sub-accounts by code prefix (dot notation accepted) and by
    /// description.
    ///
    /// Code matches come first, up to `search_code_limit`; description
    /// matches fill the rest up to `search_limit`, without duplicates.
    pub async fn search_subaccounts(
        &self,
        query: &str,
        exercise_code: &str,
    ) -> BusinessResult<SubAccountSearch> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(SubAccountSearch::default());
        }

        let exercise = SubAccountService::new(self.ctx)
            .exercise(exercise_code)
            .await?
            .ok_or_else(|| BusinessError::ExerciseNotFound(exercise_code.to_string()))?;

        let config = self.ctx.config();
        let pool = self.ctx.pool();
        let prefix = code::search_prefix(query, exercise.subaccount_code_length);

        let by_code = SubAccountRepo::search_by_code_prefix(
            pool,
            exercise_code,
            &prefix,
            config.search_code_limit,
        )
        .await?;
        let by_description =
            SubAccountRepo::search_by_description(pool, exercise_code, query, config.search_limit)
                .await?;

        let mut seen = HashSet::new();
        let results: Vec<SubAccountHit> = by_code
            .into_iter()
            .chain(by_description)
            .filter(|row| seen.insert(row.id))
            .take(config.search_limit as usize)
            .map(|row| SubAccountHit {
                code: row.code,
                description: row.description,
                id: row.id,
            })
            .collect();

        let suggested_code = self.suggest_code(query, &exercise).await?;

        tracing::debug!(
            query = %query,
            results = results.len(),
            suggested = ?suggested_code,
            "Sub-account search"
        );
        Ok(SubAccountSearch {
            results,
            suggested_code,
        })
    }

    /// Code to offer for creation, if the query looks like a parent prefix or
    /// dot notation. Never returns an existing code.
    pub async fn suggest_code(
        &self,
        query: &str,
        exercise: &Exercise,
    ) -> BusinessResult<Option<String>> {
        let parent = match QueryShape::classify(query) {
            QueryShape::BarePrefix(prefix) => prefix,
            QueryShape::Dotted { prefix, suffix } if suffix.is_empty() => prefix,
            QueryShape::Dotted { prefix, suffix } => {
                return self.suggest_dotted(prefix, suffix, exercise).await;
            }
            QueryShape::Other => return Ok(None),
        };

        match SubAccountService::new(self.ctx)
            .next_free_code(parent, &exercise.code)
            .await
        {
            Ok(code) => Ok(code),
            Err(BusinessError::CodeSpaceExhausted { .. })
            | Err(BusinessError::ParentCodeTooLong { .. }) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// `prefix.suffix` names an exact code; offer it only when the prefix is
    /// an existing account and the code is well-formed and free.
    async fn suggest_dotted(
        &self,
        prefix: &str,
        suffix: &str,
        exercise: &Exercise,
    ) -> BusinessResult<Option<String>> {
        let candidate = pad_code(prefix, suffix, exercise.subaccount_code_length);
        if !exercise.fits_code(&candidate) {
            return Ok(None);
        }

        let pool = self.ctx.pool();
        if AccountRepo::find(pool, prefix, &exercise.code).await?.is_none() {
            return Ok(None);
        }
        if SubAccountRepo::exists(pool, &candidate, &exercise.code).await? {
            return Ok(None);
        }
        Ok(Some(candidate))
    }

    /// Search accounts by code prefix or description, ordered by code
    pub async fn search_accounts(
        &self,
        query: &str,
        exercise_code: &str,
    ) -> BusinessResult<Vec<AccountSummary>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let rows = AccountRepo::search(
            self.ctx.pool(),
            exercise_code,
            query,
            query,
            self.ctx.config().search_limit,
        )
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| AccountSummary {
                id: row.id,
                code: row.code,
                description: row.description,
            })
            .collect())
    }
}
