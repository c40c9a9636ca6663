//! Quick-create API
//!
//! Action-dispatched request/response contract used by the surrounding
//! controller. Requests are explicit structs per action; every response is
//! an `{ok, message, data}` envelope plus a status class the caller maps to
//! its transport.
//!
//! ```json
//! {"action": "next-free-code", "parentAccountId": 12}
//! {"ok": true, "message": "ok", "data": {"code": "6290000001", "parentCode": "629", "description": "Otros servicios"}}
//! ```

use crate::allocator::{CreateSubAccount, ParentRef, SubAccountService};
use crate::error::{BusinessError, BusinessResult};
use crate::product::{CreateProduct, ProductService};
use crate::search::SearchService;
use crate::services::ServiceContext;
use quickcreate_core::code::transform;
use quickcreate_core::{Account, Exercise};
use quickcreate_persistence::AccountRepo;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// Requests
// ============================================================================

/// One API call, tagged by its `action` name
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum ApiRequest {
    SearchSubaccounts(SearchRequest),
    SearchAccounts(SearchRequest),
    NextFreeCode(NextFreeCodeRequest),
    CreateSubaccount(CreateSubaccountRequest),
    CreateAccount(CreateAccountRequest),
    CreateProduct(CreateProductRequest),
    GetProductOptions,
}

impl ApiRequest {
    pub fn action(&self) -> &'static str {
        match self {
            ApiRequest::SearchSubaccounts(_) => "search-subaccounts",
            ApiRequest::SearchAccounts(_) => "search-accounts",
            ApiRequest::NextFreeCode(_) => "next-free-code",
            ApiRequest::CreateSubaccount(_) => "create-subaccount",
            ApiRequest::CreateAccount(_) => "create-account",
            ApiRequest::CreateProduct(_) => "create-product",
            ApiRequest::GetProductOptions => "get-product-options",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub query: String,
    pub exercise_code: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextFreeCodeRequest {
    pub parent_account_id: i64,
}

/// Sub-account under a known parent. `code` may use dot notation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubaccountRequest {
    pub parent_account_id: i64,
    pub code: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Defaults to the parent account's exercise
    #[serde(default)]
    pub exercise_code: Option<String>,
}

/// Sub-account from a full code; the parent is found by prefix.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountRequest {
    pub code: String,
    #[serde(default)]
    pub description: Option<String>,
    pub exercise_code: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub reference: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: Decimal,
    #[serde(default)]
    pub family: Option<String>,
    #[serde(default)]
    pub manufacturer: Option<String>,
    #[serde(default)]
    pub tax: Option<String>,
    #[serde(default)]
    pub vat_exception: Option<String>,
}

// ============================================================================
// Responses
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NextFreeCode {
    pub code: String,
    pub parent_code: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubaccountCreated {
    pub code: String,
    pub id: i64,
    pub description: String,
    pub exercise_code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountCreated {
    pub code: String,
    pub id: i64,
    pub description: String,
}

/// Outcome class of a call, for the caller to map onto its transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApiStatus {
    #[default]
    Ok,
    BadRequest,
    NotFound,
    Conflict,
    Internal,
}

impl ApiStatus {
    /// Equivalent HTTP status code
    pub fn http_code(&self) -> u16 {
        match self {
            ApiStatus::Ok => 200,
            ApiStatus::BadRequest => 400,
            ApiStatus::NotFound => 404,
            ApiStatus::Conflict => 409,
            ApiStatus::Internal => 500,
        }
    }

    fn for_error(err: &BusinessError) -> Self {
        match err {
            BusinessError::EmptyCode
            | BusinessError::InvalidCodeLength { .. }
            | BusinessError::CodeOutsideParent { .. }
            | BusinessError::ParentCodeTooLong { .. }
            | BusinessError::ReferenceRequired
            | BusinessError::UnknownLookup { .. } => ApiStatus::BadRequest,
            BusinessError::ParentNotFound(_)
            | BusinessError::ParentNotFoundInExercise { .. }
            | BusinessError::ExerciseNotFound(_) => ApiStatus::NotFound,
            BusinessError::DuplicateCode { .. }
            | BusinessError::DuplicateReference(_)
            | BusinessError::CodeSpaceExhausted { .. } => ApiStatus::Conflict,
            BusinessError::Persistence(_)
            | BusinessError::Core(_)
            | BusinessError::Serialization(_) => ApiStatus::Internal,
        }
    }
}

/// `{ok, message, data}` envelope
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse {
    pub ok: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip)]
    pub status: ApiStatus,
}

impl ApiResponse {
    pub fn success(message: &str, data: Value) -> Self {
        Self {
            ok: true,
            message: message.to_string(),
            data: Some(data),
            status: ApiStatus::Ok,
        }
    }

    pub fn failure(status: ApiStatus, message: &str) -> Self {
        Self {
            ok: false,
            message: message.to_string(),
            data: None,
            status,
        }
    }

    pub fn from_error(err: &BusinessError) -> Self {
        Self::failure(ApiStatus::for_error(err), err.message_key())
    }
}

// ============================================================================
// Dispatcher
// ============================================================================

/// Entry point for the controller layer
pub struct QuickCreateApi {
    ctx: ServiceContext,
}

impl QuickCreateApi {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &ServiceContext {
        &self.ctx
    }

    /// Parse a JSON request body and handle it. Unknown actions and malformed
    /// bodies are a `BadRequest` with message `invalid-action`.
    pub async fn handle_json(&self, body: &str) -> ApiResponse {
        match serde_json::from_str::<ApiRequest>(body) {
            Ok(request) => self.handle(request).await,
            Err(err) => {
                tracing::debug!(error = %err, "Rejected API request");
                ApiResponse::failure(ApiStatus::BadRequest, "invalid-action")
            }
        }
    }

    pub async fn handle(&self, request: ApiRequest) -> ApiResponse {
        let action = request.action();
        let result = match request {
            ApiRequest::SearchSubaccounts(req) => self.search_subaccounts(req).await,
            ApiRequest::SearchAccounts(req) => self.search_accounts(req).await,
            ApiRequest::NextFreeCode(req) => self.next_free_code(req).await,
            ApiRequest::CreateSubaccount(req) => self.create_subaccount(req).await,
            ApiRequest::CreateAccount(req) => self.create_account(req).await,
            ApiRequest::CreateProduct(req) => self.create_product(req).await,
            ApiRequest::GetProductOptions => self.product_options().await,
        };

        match result {
            Ok((message, data)) => ApiResponse::success(message, data),
            Err(err) => {
                let response = ApiResponse::from_error(&err);
                if response.status == ApiStatus::Internal {
                    tracing::error!(action, error = %err, "API request failed");
                } else {
                    tracing::debug!(action, error = %err, "API request refused");
                }
                response
            }
        }
    }

    async fn parent_account(&self, id: i64) -> BusinessResult<Account> {
        AccountRepo::find_by_id(self.ctx.pool(), id)
            .await?
            .map(Account::from)
            .ok_or_else(|| BusinessError::ParentNotFound(format!("account id {}", id)))
    }

    async fn exercise(&self, exercise_code: &str) -> BusinessResult<Exercise> {
        SubAccountService::new(&self.ctx)
            .exercise(exercise_code)
            .await?
            .ok_or_else(|| BusinessError::ExerciseNotFound(exercise_code.to_string()))
    }

    async fn search_subaccounts(&self, req: SearchRequest) -> BusinessResult<(&'static str, Value)> {
        let search = SearchService::new(&self.ctx)
            .search_subaccounts(&req.query, &req.exercise_code)
            .await?;
        Ok(("ok", serde_json::to_value(search)?))
    }

    async fn search_accounts(&self, req: SearchRequest) -> BusinessResult<(&'static str, Value)> {
        let accounts = SearchService::new(&self.ctx)
            .search_accounts(&req.query, &req.exercise_code)
            .await?;
        Ok(("ok", serde_json::to_value(accounts)?))
    }

    async fn next_free_code(
        &self,
        req: NextFreeCodeRequest,
    ) -> BusinessResult<(&'static str, Value)> {
        let account = self.parent_account(req.parent_account_id).await?;
        let code = SubAccountService::new(&self.ctx)
            .next_free_code(&account.code, &account.exercise_code)
            .await?
            .ok_or_else(|| BusinessError::ExerciseNotFound(account.exercise_code.clone()))?;

        let data = NextFreeCode {
            code,
            parent_code: account.code,
            description: account.description,
        };
        Ok(("ok", serde_json::to_value(data)?))
    }

    async fn create_subaccount(
        &self,
        req: CreateSubaccountRequest,
    ) -> BusinessResult<(&'static str, Value)> {
        let account = self.parent_account(req.parent_account_id).await?;
        let exercise_code = req
            .exercise_code
            .map(|code| code.trim().to_string())
            .filter(|code| !code.is_empty())
            .unwrap_or_else(|| account.exercise_code.clone());
        let exercise = self.exercise(&exercise_code).await?;

        // The parent may have been picked in another exercise: use the
        // account with the same code in the target one.
        let parent = if exercise.code == account.exercise_code {
            ParentRef::Id(account.id)
        } else {
            if AccountRepo::find(self.ctx.pool(), &account.code, &exercise.code)
                .await?
                .is_none()
            {
                return Err(BusinessError::parent_not_found_in_exercise(
                    &account.code,
                    &exercise.code,
                ));
            }
            ParentRef::Code(account.code.clone())
        };

        let subaccount = SubAccountService::new(&self.ctx)
            .create_subaccount(CreateSubAccount {
                code: transform(&req.code, exercise.subaccount_code_length),
                description: req.description,
                parent,
                exercise_code,
            })
            .await?;

        let data = SubaccountCreated {
            code: subaccount.code,
            id: subaccount.id,
            description: subaccount.description,
            exercise_code: subaccount.exercise_code,
        };
        Ok(("account-created", serde_json::to_value(data)?))
    }

    async fn create_account(
        &self,
        req: CreateAccountRequest,
    ) -> BusinessResult<(&'static str, Value)> {
        let exercise = self.exercise(&req.exercise_code).await?;

        let subaccount = SubAccountService::new(&self.ctx)
            .create_subaccount(CreateSubAccount {
                code: transform(&req.code, exercise.subaccount_code_length),
                description: req.description,
                parent: ParentRef::Resolve,
                exercise_code: req.exercise_code,
            })
            .await?;

        let data = AccountCreated {
            code: subaccount.code,
            id: subaccount.id,
            description: subaccount.description,
        };
        Ok(("account-created", serde_json::to_value(data)?))
    }

    async fn create_product(
        &self,
        req: CreateProductRequest,
    ) -> BusinessResult<(&'static str, Value)> {
        let created = ProductService::new(&self.ctx)
            .create_product(CreateProduct {
                reference: req.reference,
                description: req.description,
                price: req.price,
                family: req.family,
                manufacturer: req.manufacturer,
                tax: req.tax,
                vat_exception: req.vat_exception,
            })
            .await?;
        Ok(("product-created", serde_json::to_value(created)?))
    }

    async fn product_options(&self) -> BusinessResult<(&'static str, Value)> {
        let options = ProductService::new(&self.ctx).product_options().await?;
        Ok(("ok", serde_json::to_value(options)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcreate_core::{NewAccount, QuickCreateConfig};
    use quickcreate_persistence::{init_memory_database, ExerciseRepo, SubAccountRepo};
    use serde_json::json;

    async fn setup() -> (QuickCreateApi, i64) {
        let pool = init_memory_database().await.unwrap();
        ExerciseRepo::insert(&pool, &Exercise::new("2026", "2026", 10))
            .await
            .unwrap();
        let services = AccountRepo::insert(&pool, &NewAccount::new("629", "2026", "Otros servicios"))
            .await
            .unwrap();
        let ctx = ServiceContext::from_parts(pool, QuickCreateConfig::default());
        (QuickCreateApi::new(ctx), services)
    }

    #[test]
    fn test_request_parsing() {
        let request: ApiRequest = serde_json::from_value(json!({
            "action": "create-subaccount",
            "parentAccountId": 3,
            "code": "629.1"
        }))
        .unwrap();
        assert_eq!(request.action(), "create-subaccount");
        match request {
            ApiRequest::CreateSubaccount(req) => {
                assert_eq!(req.parent_account_id, 3);
                assert_eq!(req.description, None);
                assert_eq!(req.exercise_code, None);
            }
            other => panic!("unexpected request {:?}", other),
        }

        let request: ApiRequest =
            serde_json::from_value(json!({ "action": "get-product-options" })).unwrap();
        assert_eq!(request.action(), "get-product-options");

        let request: ApiRequest = serde_json::from_value(json!({
            "action": "create-product",
            "reference": "HAM-01",
            "price": "12.50"
        }))
        .unwrap();
        assert_eq!(request.action(), "create-product");
    }

    #[tokio::test]
    async fn test_invalid_action() {
        let (api, _) = setup().await;

        let response = api.handle_json(r#"{"action": "drop-tables"}"#).await;
        assert!(!response.ok);
        assert_eq!(response.message, "invalid-action");
        assert_eq!(response.status.http_code(), 400);

        let response = api.handle_json("not json").await;
        assert_eq!(response.status, ApiStatus::BadRequest);
    }

    #[tokio::test]
    async fn test_next_free_code_and_create() {
        let (api, services) = setup().await;

        let response = api
            .handle(ApiRequest::NextFreeCode(NextFreeCodeRequest {
                parent_account_id: services,
            }))
            .await;
        assert!(response.ok);
        assert_eq!(
            response.data,
            Some(json!({
                "code": "6290000001",
                "parentCode": "629",
                "description": "Otros servicios"
            }))
        );

        let response = api
            .handle_json(&format!(
                r#"{{"action": "create-subaccount", "parentAccountId": {}, "code": "629.1", "description": "Hosting"}}"#,
                services
            ))
            .await;
        assert!(response.ok, "{:?}", response);
        assert_eq!(response.message, "account-created");
        let data = response.data.unwrap();
        assert_eq!(data["code"], "6290000001");
        assert_eq!(data["description"], "Hosting");
        assert_eq!(data["exerciseCode"], "2026");

        let response = api
            .handle(ApiRequest::CreateSubaccount(CreateSubaccountRequest {
                parent_account_id: services,
                code: "6290000001".to_string(),
                description: None,
                exercise_code: Some("2026".to_string()),
            }))
            .await;
        assert!(!response.ok);
        assert_eq!(response.message, "account-already-exists");
        assert_eq!(response.status, ApiStatus::Conflict);
    }

    #[tokio::test]
    async fn test_next_free_code_unknown_parent() {
        let (api, services) = setup().await;

        let response = api
            .handle(ApiRequest::NextFreeCode(NextFreeCodeRequest {
                parent_account_id: services + 1,
            }))
            .await;
        assert!(!response.ok);
        assert_eq!(response.message, "parent-account-not-found");
        assert_eq!(response.status, ApiStatus::NotFound);
    }

    #[tokio::test]
    async fn test_create_subaccount_in_other_exercise() {
        let (api, _) = setup().await;
        let pool = api.context().pool();
        ExerciseRepo::insert(pool, &Exercise::new("2025", "2025", 10))
            .await
            .unwrap();
        let services_2025 = AccountRepo::insert(pool, &NewAccount::new("629", "2025", "Otros servicios"))
            .await
            .unwrap();
        let supplies_2025 = AccountRepo::insert(pool, &NewAccount::new("602", "2025", "Compras"))
            .await
            .unwrap();

        // Parent picked in 2025, sub-account created under 629 of 2026
        let response = api
            .handle(ApiRequest::CreateSubaccount(CreateSubaccountRequest {
                parent_account_id: services_2025,
                code: "629.1".to_string(),
                description: None,
                exercise_code: Some("2026".to_string()),
            }))
            .await;
        assert!(response.ok, "{:?}", response);
        let data = response.data.unwrap();
        assert_eq!(data["code"], "6290000001");
        assert_eq!(data["exerciseCode"], "2026");

        let stored = SubAccountRepo::codes_with_prefix(pool, "2026", "629").await.unwrap();
        assert_eq!(stored, vec!["6290000001".to_string()]);
        assert!(SubAccountRepo::codes_with_prefix(pool, "2025", "629")
            .await
            .unwrap()
            .is_empty());

        // 602 only exists in 2025
        let response = api
            .handle(ApiRequest::CreateSubaccount(CreateSubaccountRequest {
                parent_account_id: supplies_2025,
                code: "602.1".to_string(),
                description: None,
                exercise_code: Some("2026".to_string()),
            }))
            .await;
        assert!(!response.ok);
        assert_eq!(response.message, "parent-account-not-found-in-exercise");
        assert_eq!(response.status, ApiStatus::NotFound);

        // Blank exercise code falls back to the parent's exercise
        let response = api
            .handle(ApiRequest::CreateSubaccount(CreateSubaccountRequest {
                parent_account_id: supplies_2025,
                code: "602.1".to_string(),
                description: None,
                exercise_code: Some("  ".to_string()),
            }))
            .await;
        assert!(response.ok, "{:?}", response);
        assert_eq!(response.data.unwrap()["exerciseCode"], "2025");
    }

    #[tokio::test]
    async fn test_create_account_from_code() {
        let (api, _) = setup().await;

        let response = api
            .handle(ApiRequest::CreateAccount(CreateAccountRequest {
                code: "6290000005".to_string(),
                description: None,
                exercise_code: "2026".to_string(),
            }))
            .await;
        assert!(response.ok);
        let data = response.data.unwrap();
        assert_eq!(data["code"], "6290000005");
        assert_eq!(data["description"], "Otros servicios");

        let response = api
            .handle(ApiRequest::CreateAccount(CreateAccountRequest {
                code: "62900005".to_string(),
                description: None,
                exercise_code: "2026".to_string(),
            }))
            .await;
        assert_eq!(response.message, "account-code-wrong-length");
        assert_eq!(response.status, ApiStatus::BadRequest);

        let response = api
            .handle(ApiRequest::CreateAccount(CreateAccountRequest {
                code: "700.1".to_string(),
                description: None,
                exercise_code: "2026".to_string(),
            }))
            .await;
        assert_eq!(response.message, "parent-account-not-found");

        let response = api
            .handle(ApiRequest::CreateAccount(CreateAccountRequest {
                code: "629.1".to_string(),
                description: None,
                exercise_code: "1999".to_string(),
            }))
            .await;
        assert_eq!(response.message, "exercise-not-found");
    }

    #[tokio::test]
    async fn test_search_subaccounts_envelope() {
        let (api, _) = setup().await;

        let response = api
            .handle_json(r#"{"action": "search-subaccounts", "query": "629", "exerciseCode": "2026"}"#)
            .await;
        assert!(response.ok);
        assert_eq!(
            response.data,
            Some(json!({ "results": [], "suggestedCode": "6290000001" }))
        );

        let response = api
            .handle_json(r#"{"action": "search-accounts", "query": "servicios", "exerciseCode": "2026"}"#)
            .await;
        let data = response.data.unwrap();
        assert_eq!(data[0]["code"], "629");
    }

    #[tokio::test]
    async fn test_product_actions() {
        let (api, _) = setup().await;

        let response = api
            .handle_json(r#"{"action": "create-product", "reference": "HAM-01", "description": "Martillo", "price": "9.90"}"#)
            .await;
        assert!(response.ok, "{:?}", response);
        assert_eq!(response.message, "product-created");
        assert_eq!(response.data.as_ref().unwrap()["reference"], "HAM-01");

        let response = api
            .handle_json(r#"{"action": "create-product", "reference": ""}"#)
            .await;
        assert_eq!(response.message, "reference-required");

        let response = api.handle(ApiRequest::GetProductOptions).await;
        assert!(response.ok);
        assert_eq!(response.data.unwrap()["vatExceptions"].as_array().unwrap().len(), 6);
    }

    #[test]
    fn test_envelope_serialization() {
        let response = ApiResponse::failure(ApiStatus::NotFound, "exercise-not-found");
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json, json!({ "ok": false, "message": "exercise-not-found" }));
    }
}
