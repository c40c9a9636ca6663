//! Sub-account allocator
//!
//! Finds the next free sub-account code under a parent account, resolves the
//! parent of an explicit code and creates sub-accounts after checking length,
//! uniqueness and parent/exercise consistency.

use crate::error::{BusinessError, BusinessResult};
use crate::services::ServiceContext;
use quickcreate_core::code::{self, candidate_codes, code_len};
use quickcreate_core::{Account, Exercise, NewSubAccount, SubAccount};
use quickcreate_persistence::{AccountRepo, ExerciseRepo, SubAccountRepo};
use std::collections::HashSet;

/// How the parent account of a new sub-account is identified
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParentRef {
    /// Account surrogate id; must belong to the request's exercise
    Id(i64),
    /// Account code within the request's exercise
    Code(String),
    /// Longest existing account code that prefixes the sub-account code
    Resolve,
}

/// Request to create one sub-account with an explicit code
#[derive(Debug, Clone)]
pub struct CreateSubAccount {
    /// Canonical code (dot notation must already be expanded)
    pub code: String,
    /// Falls back to the parent's description when missing or blank
    pub description: Option<String>,
    pub parent: ParentRef,
    pub exercise_code: String,
}

/// Sub-account allocation and creation
pub struct SubAccountService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> SubAccountService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Load an exercise by code
    pub async fn exercise(&self, exercise_code: &str) -> BusinessResult<Option<Exercise>> {
        match ExerciseRepo::find(self.ctx.pool(), exercise_code).await? {
            Some(row) => Ok(Some(Exercise::try_from(row)?)),
            None => Ok(None),
        }
    }

    async fn require_exercise(&self, exercise_code: &str) -> BusinessResult<Exercise> {
        self.exercise(exercise_code)
            .await?
            .ok_or_else(|| BusinessError::ExerciseNotFound(exercise_code.to_string()))
    }

    /// Next unused sub-account code under `parent_code`.
    ///
    /// Returns `Ok(None)` when the exercise or the parent account does not
    /// exist, `ParentCodeTooLong` when the parent code leaves no room for a
    /// suffix, and `CodeSpaceExhausted` when every suffix up to the configured
    /// maximum is taken.
    pub async fn next_free_code(
        &self,
        parent_code: &str,
        exercise_code: &str,
    ) -> BusinessResult<Option<String>> {
        let Some(exercise) = self.exercise(exercise_code).await? else {
            tracing::debug!(exercise = %exercise_code, "Exercise not found, no code to suggest");
            return Ok(None);
        };

        if AccountRepo::find(self.ctx.pool(), parent_code, exercise_code)
            .await?
            .is_none()
        {
            tracing::debug!(
                parent = %parent_code,
                exercise = %exercise_code,
                "Parent account not found, no code to suggest"
            );
            return Ok(None);
        }

        if code_len(parent_code) >= exercise.subaccount_code_length {
            return Err(BusinessError::ParentCodeTooLong {
                parent: parent_code.to_string(),
                length: exercise.subaccount_code_length,
            });
        }

        let taken: HashSet<String> =
            SubAccountRepo::codes_with_prefix(self.ctx.pool(), exercise_code, parent_code)
                .await?
                .into_iter()
                .collect();

        let free = candidate_codes(
            parent_code,
            exercise.subaccount_code_length,
            self.ctx.config().max_suffix,
        )
        .find(|candidate| !taken.contains(candidate));

        match free {
            Some(code) => {
                tracing::debug!(parent = %parent_code, code = %code, "Next free sub-account code");
                Ok(Some(code))
            }
            None => {
                tracing::warn!(
                    parent = %parent_code,
                    exercise = %exercise_code,
                    taken = taken.len(),
                    "Sub-account code space exhausted"
                );
                Err(BusinessError::exhausted(parent_code, exercise_code))
            }
        }
    }

    /// Find the parent account of `subaccount_code` by stripping trailing
    /// characters until an account code matches.
    ///
    /// The first candidate drops two characters; the last is one character
    /// long.
    pub async fn resolve_parent_by_stripping_suffix(
        &self,
        subaccount_code: &str,
        exercise_code: &str,
    ) -> BusinessResult<Option<Account>> {
        for candidate in code::parent_candidates(subaccount_code) {
            if let Some(row) = AccountRepo::find(self.ctx.pool(), candidate, exercise_code).await? {
                tracing::debug!(
                    code = %subaccount_code,
                    parent = %row.code,
                    "Resolved parent account"
                );
                return Ok(Some(row.into()));
            }
        }

        tracing::debug!(code = %subaccount_code, exercise = %exercise_code, "No parent account");
        Ok(None)
    }

    async fn resolve_parent(
        &self,
        parent: &ParentRef,
        code: &str,
        exercise_code: &str,
    ) -> BusinessResult<Account> {
        let account: Account = match parent {
            ParentRef::Id(id) => AccountRepo::find_by_id(self.ctx.pool(), *id)
                .await?
                .filter(|row| row.exercise_code == exercise_code)
                .ok_or_else(|| BusinessError::ParentNotFound(format!("account id {}", id)))?
                .into(),
            ParentRef::Code(parent_code) => {
                AccountRepo::find(self.ctx.pool(), parent_code, exercise_code)
                    .await?
                    .ok_or_else(|| BusinessError::ParentNotFound(parent_code.clone()))?
                    .into()
            }
            ParentRef::Resolve => {
                return self
                    .resolve_parent_by_stripping_suffix(code, exercise_code)
                    .await?
                    .ok_or_else(|| BusinessError::ParentNotFound(code.to_string()));
            }
        };

        if !account.contains_code(code) {
            return Err(BusinessError::CodeOutsideParent {
                code: code.to_string(),
                parent: account.code,
            });
        }
        Ok(account)
    }

    /// Create a sub-account with an explicit code
    pub async fn create_subaccount(&self, request: CreateSubAccount) -> BusinessResult<SubAccount> {
        let code = request.code.trim();
        if code.is_empty() {
            return Err(BusinessError::EmptyCode);
        }

        let exercise = self.require_exercise(&request.exercise_code).await?;
        if !exercise.fits_code(code) {
            return Err(BusinessError::invalid_code_length(
                code,
                exercise.subaccount_code_length,
                code_len(code),
            ));
        }

        if SubAccountRepo::exists(self.ctx.pool(), code, &exercise.code).await? {
            return Err(BusinessError::duplicate_code(code, &exercise.code));
        }

        let parent = self
            .resolve_parent(&request.parent, code, &exercise.code)
            .await?;

        let new = NewSubAccount::under(&parent, code, request.description.as_deref());
        let row = SubAccountRepo::insert(self.ctx.pool(), &new)
            .await
            .map_err(|e| {
                if e.is_already_exists() {
                    BusinessError::duplicate_code(code, &exercise.code)
                } else {
                    e.into()
                }
            })?;

        tracing::info!(
            code = %row.code,
            id = row.id,
            parent = %parent.code,
            exercise = %exercise.code,
            "Created sub-account"
        );
        Ok(row.into())
    }

    /// Allocate the next free code under `parent_code` and create it.
    ///
    /// Allocations under the same parent and exercise are serialized. If
    /// another writer still takes the code first, the allocation is retried
    /// up to `allocation_retries` times.
    pub async fn allocate_subaccount(
        &self,
        parent_code: &str,
        exercise_code: &str,
        description: Option<&str>,
    ) -> BusinessResult<SubAccount> {
        self.require_exercise(exercise_code).await?;
        if AccountRepo::find(self.ctx.pool(), parent_code, exercise_code)
            .await?
            .is_none()
        {
            return Err(BusinessError::ParentNotFound(parent_code.to_string()));
        }

        let lock = self
            .ctx
            .locks()
            .lock_for(&format!("{}:{}", exercise_code, parent_code));
        let _guard = lock.lock().await;

        let retries = self.ctx.config().allocation_retries;
        let mut attempt = 0;
        loop {
            let code = self
                .next_free_code(parent_code, exercise_code)
                .await?
                .ok_or_else(|| BusinessError::ParentNotFound(parent_code.to_string()))?;

            let request = CreateSubAccount {
                code,
                description: description.map(str::to_string),
                parent: ParentRef::Code(parent_code.to_string()),
                exercise_code: exercise_code.to_string(),
            };

            match self.create_subaccount(request).await {
                Err(err) if err.is_duplicate_code() && attempt < retries => {
                    attempt += 1;
                    tracing::warn!(
                        parent = %parent_code,
                        attempt,
                        error = %err,
                        "Allocated code taken concurrently, retrying"
                    );
                }
                result => return result,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcreate_core::{NewAccount, QuickCreateConfig};
    use quickcreate_persistence::init_memory_database;

    async fn setup(code_length: usize) -> ServiceContext {
        setup_with(code_length, QuickCreateConfig::default()).await
    }

    async fn setup_with(code_length: usize, config: QuickCreateConfig) -> ServiceContext {
        let pool = init_memory_database().await.unwrap();
        ExerciseRepo::insert(&pool, &Exercise::new("2026", "2026", code_length))
            .await
            .unwrap();
        ServiceContext::from_parts(pool, config)
    }

    async fn add_account(ctx: &ServiceContext, code: &str, description: &str) -> i64 {
        AccountRepo::insert(ctx.pool(), &NewAccount::new(code, "2026", description))
            .await
            .unwrap()
    }

    fn request(code: &str, parent: ParentRef) -> CreateSubAccount {
        CreateSubAccount {
            code: code.to_string(),
            description: None,
            parent,
            exercise_code: "2026".to_string(),
        }
    }

    #[tokio::test]
    async fn test_next_free_code_without_children() {
        let ctx = setup(10).await;
        add_account(&ctx, "629", "Otros servicios").await;
        let service = SubAccountService::new(&ctx);

        let code = service.next_free_code("629", "2026").await.unwrap();
        assert_eq!(code.as_deref(), Some("6290000001"));
    }

    #[tokio::test]
    async fn test_next_free_code_skips_taken() {
        let ctx = setup(10).await;
        add_account(&ctx, "430", "Clientes").await;
        let service = SubAccountService::new(&ctx);

        for code in ["4300000001", "4300000002", "4300000003"] {
            service
                .create_subaccount(request(code, ParentRef::Code("430".to_string())))
                .await
                .unwrap();
        }

        let code = service.next_free_code("430", "2026").await.unwrap();
        assert_eq!(code.as_deref(), Some("4300000004"));
    }

    #[tokio::test]
    async fn test_next_free_code_fills_gaps() {
        let ctx = setup(6).await;
        add_account(&ctx, "43", "Clientes").await;
        let service = SubAccountService::new(&ctx);

        for code in ["430001", "430003"] {
            service
                .create_subaccount(request(code, ParentRef::Resolve))
                .await
                .unwrap();
        }

        let code = service.next_free_code("43", "2026").await.unwrap();
        assert_eq!(code.as_deref(), Some("430002"));
    }

    #[tokio::test]
    async fn test_next_free_code_missing_exercise_or_account() {
        let ctx = setup(10).await;
        add_account(&ctx, "629", "Otros servicios").await;
        let service = SubAccountService::new(&ctx);

        assert_eq!(service.next_free_code("629", "1999").await.unwrap(), None);
        assert_eq!(service.next_free_code("628", "2026").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_next_free_code_exhausted() {
        let config = QuickCreateConfig {
            max_suffix: 5,
            ..QuickCreateConfig::default()
        };
        let ctx = setup_with(8, config).await;
        add_account(&ctx, "572", "Bancos").await;
        let service = SubAccountService::new(&ctx);

        for _ in 0..5 {
            service.allocate_subaccount("572", "2026", None).await.unwrap();
        }

        let err = service.next_free_code("572", "2026").await.unwrap_err();
        assert!(matches!(err, BusinessError::CodeSpaceExhausted { .. }));

        let err = service.allocate_subaccount("572", "2026", None).await.unwrap_err();
        assert!(matches!(err, BusinessError::CodeSpaceExhausted { .. }));
    }

    #[tokio::test]
    async fn test_next_free_code_parent_too_long() {
        let ctx = setup(4).await;
        add_account(&ctx, "5720", "Bancos").await;
        add_account(&ctx, "572", "Bancos").await;
        let service = SubAccountService::new(&ctx);

        // No sub-account exists, but no suffix fits after "5720"
        let err = service.next_free_code("5720", "2026").await.unwrap_err();
        assert!(matches!(err, BusinessError::ParentCodeTooLong { length: 4, .. }));
        assert_eq!(err.message_key(), "account-code-too-long");

        // One character left: suffixes 1-9 only
        assert_eq!(
            service.next_free_code("572", "2026").await.unwrap().as_deref(),
            Some("5721")
        );
    }

    #[tokio::test]
    async fn test_resolve_parent_strips_progressively() {
        let ctx = setup(10).await;
        add_account(&ctx, "43", "Clientes (grupo)").await;
        add_account(&ctx, "430", "Clientes").await;
        let service = SubAccountService::new(&ctx);

        let parent = service
            .resolve_parent_by_stripping_suffix("4300000001", "2026")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(parent.code, "430");

        let parent = service
            .resolve_parent_by_stripping_suffix("4399999999", "2026")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(parent.code, "43");

        assert!(service
            .resolve_parent_by_stripping_suffix("6290000001", "2026")
            .await
            .unwrap()
            .is_none());
        assert!(service
            .resolve_parent_by_stripping_suffix("4300000001", "2025")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_resolve_parent_never_matches_two_char_strip_only() {
        let ctx = setup(10).await;
        // Account equal to the code minus one character is not a candidate
        add_account(&ctx, "430000000", "Too long").await;
        let service = SubAccountService::new(&ctx);

        assert!(service
            .resolve_parent_by_stripping_suffix("4300000001", "2026")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_create_subaccount_validations() {
        let ctx = setup(10).await;
        add_account(&ctx, "570", "Caja").await;
        let service = SubAccountService::new(&ctx);

        let err = service
            .create_subaccount(request("  ", ParentRef::Resolve))
            .await
            .unwrap_err();
        assert!(matches!(err, BusinessError::EmptyCode));

        let err = service
            .create_subaccount(request("570001", ParentRef::Resolve))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            BusinessError::InvalidCodeLength { expected: 10, actual: 6, .. }
        ));

        let mut bad_exercise = request("5700000001", ParentRef::Resolve);
        bad_exercise.exercise_code = "1999".to_string();
        let err = service.create_subaccount(bad_exercise).await.unwrap_err();
        assert!(matches!(err, BusinessError::ExerciseNotFound(_)));

        let err = service
            .create_subaccount(request("6290000001", ParentRef::Resolve))
            .await
            .unwrap_err();
        assert!(matches!(err, BusinessError::ParentNotFound(_)));
    }

    #[tokio::test]
    async fn test_create_subaccount_duplicate() {
        let ctx = setup(10).await;
        add_account(&ctx, "570", "Caja").await;
        let service = SubAccountService::new(&ctx);

        let created = service
            .create_subaccount(request("5700000001", ParentRef::Resolve))
            .await
            .unwrap();
        assert_eq!(created.description, "Caja");
        assert_eq!(created.account_code, "570");

        let err = service
            .create_subaccount(request("5700000001", ParentRef::Resolve))
            .await
            .unwrap_err();
        assert!(err.is_duplicate_code());
    }

    #[tokio::test]
    async fn test_create_subaccount_parent_by_id() {
        let ctx = setup(10).await;
        let bank_id = add_account(&ctx, "572", "Bancos").await;
        let service = SubAccountService::new(&ctx);

        let mut req = request("5720000001", ParentRef::Id(bank_id));
        req.description = Some("Banco Sabadell".to_string());
        let created = service.create_subaccount(req).await.unwrap();
        assert_eq!(created.account_id, bank_id);
        assert_eq!(created.description, "Banco Sabadell");

        let err = service
            .create_subaccount(request("5700000001", ParentRef::Id(bank_id)))
            .await
            .unwrap_err();
        assert!(matches!(err, BusinessError::CodeOutsideParent { .. }));

        let err = service
            .create_subaccount(request("5720000002", ParentRef::Id(bank_id + 100)))
            .await
            .unwrap_err();
        assert!(matches!(err, BusinessError::ParentNotFound(_)));
    }

    #[tokio::test]
    async fn test_parent_id_from_other_exercise_is_rejected() {
        let ctx = setup(10).await;
        ExerciseRepo::insert(ctx.pool(), &Exercise::new("2025", "2025", 10))
            .await
            .unwrap();
        let old_bank = AccountRepo::insert(ctx.pool(), &NewAccount::new("572", "2025", "Bancos"))
            .await
            .unwrap();
        let service = SubAccountService::new(&ctx);

        let err = service
            .create_subaccount(request("5720000001", ParentRef::Id(old_bank)))
            .await
            .unwrap_err();
        assert!(matches!(err, BusinessError::ParentNotFound(_)));
    }

    #[tokio::test]
    async fn test_allocate_sequence() {
        let ctx = setup(10).await;
        add_account(&ctx, "629", "Otros servicios").await;
        let service = SubAccountService::new(&ctx);

        let first = service
            .allocate_subaccount("629", "2026", Some("Hosting"))
            .await
            .unwrap();
        let second = service.allocate_subaccount("629", "2026", None).await.unwrap();

        assert_eq!(first.code, "6290000001");
        assert_eq!(first.description, "Hosting");
        assert_eq!(second.code, "6290000002");
        assert_eq!(second.description, "Otros servicios");

        let err = service.allocate_subaccount("628", "2026", None).await.unwrap_err();
        assert!(matches!(err, BusinessError::ParentNotFound(_)));
        let err = service.allocate_subaccount("629", "1999", None).await.unwrap_err();
        assert!(matches!(err, BusinessError::ExerciseNotFound(_)));
    }
}
