//! Raw API dispatch

use anyhow::Result;
use quickcreate_business::QuickCreateApi;
use std::path::Path;

use super::open_context;

/// Handle one JSON request and print the response envelope
pub async fn dispatch(db_path: &Path, config: Option<&Path>, body: &str) -> Result<()> {
    let (db, ctx) = open_context(db_path, config).await?;
    let api = QuickCreateApi::new(ctx);

    let response = api.handle_json(body).await;
    tracing::info!(
        ok = response.ok,
        status = response.status.http_code(),
        message = %response.message,
        "API response"
    );
    println!("{}", serde_json::to_string_pretty(&response)?);

    db.close().await;
    Ok(())
}
