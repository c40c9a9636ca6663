//! Integration tests for sub-account allocation
//!
//! These tests run the services against a file-backed SQLite database with a
//! real connection pool, including concurrent writers.

use quickcreate_business::{
    BusinessError, CreateSubAccount, ParentRef, QuickCreateApi, SearchService, ServiceContext,
    SubAccountService,
};
use quickcreate_core::{Account, Exercise, NewAccount, NewSubAccount, QuickCreateConfig};
use quickcreate_persistence::{AccountRepo, Database, ExerciseRepo, SubAccountRepo};
use std::collections::HashSet;
use tempfile::TempDir;

async fn open(temp_dir: &TempDir) -> Database {
    let path = temp_dir.path().join("quickcreate.db");
    let db = Database::init(&format!("sqlite:{}", path.display()))
        .await
        .unwrap();

    ExerciseRepo::insert(db.pool(), &Exercise::new("2026", "Ejercicio 2026", 10))
        .await
        .unwrap();
    for (code, description) in [("629", "Otros servicios"), ("430", "Clientes")] {
        AccountRepo::insert(db.pool(), &NewAccount::new(code, "2026", description))
            .await
            .unwrap();
    }
    db
}

/// Test: allocate twice under 629, then search sees both
#[tokio::test]
async fn test_allocation_workflow() {
    let temp_dir = TempDir::new().unwrap();
    let db = open(&temp_dir).await;
    let ctx = ServiceContext::new(&db, QuickCreateConfig::default());
    let service = SubAccountService::new(&ctx);

    // 1. Nothing under 629 yet
    assert_eq!(
        service.next_free_code("629", "2026").await.unwrap().as_deref(),
        Some("6290000001")
    );

    // 2. Allocate twice
    let first = service
        .allocate_subaccount("629", "2026", Some("Hosting"))
        .await
        .unwrap();
    let second = service.allocate_subaccount("629", "2026", None).await.unwrap();
    assert_eq!(first.code, "6290000001");
    assert_eq!(first.description, "Hosting");
    assert_eq!(second.code, "6290000002");
    assert_eq!(second.description, "Otros servicios");
    assert_eq!(second.account_code, "629");

    // 3. Search finds both and suggests the third
    let search = SearchService::new(&ctx)
        .search_subaccounts("629", "2026")
        .await
        .unwrap();
    let found: Vec<_> = search.results.iter().map(|hit| hit.code.as_str()).collect();
    assert_eq!(found, vec!["6290000001", "6290000002"]);
    assert_eq!(search.suggested_code.as_deref(), Some("6290000003"));

    db.close().await;
}

/// Test: concurrent allocations under one parent never share a code
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_allocation_distinct_codes() {
    let temp_dir = TempDir::new().unwrap();
    let db = open(&temp_dir).await;
    let ctx = ServiceContext::new(&db, QuickCreateConfig::default());

    let mut handles = Vec::new();
    for _ in 0..12 {
        let ctx = ctx.clone();
        handles.push(tokio::spawn(async move {
            SubAccountService::new(&ctx)
                .allocate_subaccount("629", "2026", None)
                .await
        }));
    }

    let mut codes = HashSet::new();
    for handle in handles {
        let subaccount = handle.await.unwrap().unwrap();
        assert!(codes.insert(subaccount.code));
    }

    let expected: HashSet<String> = (1..=12).map(|n| format!("629{:07}", n)).collect();
    assert_eq!(codes, expected);
    assert_eq!(SubAccountRepo::count(db.pool()).await.unwrap(), 12);

    db.close().await;
}

/// Test: two writers racing for the same explicit code
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_create_same_code() {
    let temp_dir = TempDir::new().unwrap();
    let db = open(&temp_dir).await;
    let ctx = ServiceContext::new(&db, QuickCreateConfig::default());

    let mut handles = Vec::new();
    for _ in 0..2 {
        let ctx = ctx.clone();
        handles.push(tokio::spawn(async move {
            SubAccountService::new(&ctx)
                .create_subaccount(CreateSubAccount {
                    code: "4300000007".to_string(),
                    description: None,
                    parent: ParentRef::Code("430".to_string()),
                    exercise_code: "2026".to_string(),
                })
                .await
        }));
    }

    let mut created = 0;
    let mut duplicates = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => created += 1,
            Err(BusinessError::DuplicateCode { .. }) => duplicates += 1,
            Err(other) => panic!("unexpected error {:?}", other),
        }
    }
    assert_eq!((created, duplicates), (1, 1));

    db.close().await;
}

/// Test: all 999 suffixes taken
#[tokio::test]
async fn test_code_space_exhausted() {
    let temp_dir = TempDir::new().unwrap();
    let db = open(&temp_dir).await;
    let ctx = ServiceContext::new(&db, QuickCreateConfig::default());

    let row = AccountRepo::find(db.pool(), "629", "2026")
        .await
        .unwrap()
        .unwrap();
    let parent = Account::from(row);
    for n in 1..=999 {
        let code = format!("629{:07}", n);
        SubAccountRepo::insert(db.pool(), &NewSubAccount::under(&parent, &code, None))
            .await
            .unwrap();
    }

    let service = SubAccountService::new(&ctx);
    let err = service.next_free_code("629", "2026").await.unwrap_err();
    assert!(matches!(err, BusinessError::CodeSpaceExhausted { .. }));

    let err = service
        .allocate_subaccount("629", "2026", None)
        .await
        .unwrap_err();
    assert!(matches!(err, BusinessError::CodeSpaceExhausted { .. }));

    // Search degrades to no suggestion
    let search = SearchService::new(&ctx)
        .search_subaccounts("629", "2026")
        .await
        .unwrap();
    assert_eq!(search.suggested_code, None);
    assert_eq!(search.results.len(), 15);

    db.close().await;
}

/// Test: JSON in, envelope out
#[tokio::test]
async fn test_api_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let db = open(&temp_dir).await;
    let api = QuickCreateApi::new(ServiceContext::new(&db, QuickCreateConfig::default()));

    let response = api
        .handle_json(r#"{"action": "create-account", "code": "430.12", "exerciseCode": "2026"}"#)
        .await;
    assert!(response.ok, "{:?}", response);
    let body = serde_json::to_value(&response).unwrap();
    assert_eq!(body["message"], "account-created");
    assert_eq!(body["data"]["code"], "4300000012");
    assert_eq!(body["data"]["description"], "Clientes");

    let response = api
        .handle_json(r#"{"action": "create-account", "code": "430.12", "exerciseCode": "2026"}"#)
        .await;
    assert!(!response.ok);
    assert_eq!(response.message, "account-already-exists");
    assert_eq!(response.status.http_code(), 409);

    let response = api
        .handle_json(r#"{"action": "search-subaccounts", "query": "430.12", "exerciseCode": "2026"}"#)
        .await;
    let body = serde_json::to_value(&response).unwrap();
    assert_eq!(body["data"]["results"][0]["code"], "4300000012");
    assert!(body["data"]["suggestedCode"].is_null());

    db.close().await;
}
