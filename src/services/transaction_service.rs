use tracing::{debug, info};

use crate::api::ApiError;
use crate::app::AppContext;
use crate::models::{NewTransaction, Severity, TransactionFilter, TransactionPatch, TransactionRecord};
use crate::utils::short_id;

pub const CREATED_MESSAGE: &str = "Transaccion creada y procesada exitosamente";

/// Create and process a transaction in one request.
///
/// The returned record goes to the top of the list straight away.
pub async fn create_now(
    ctx: &AppContext,
    token: &str,
    new: &NewTransaction,
) -> Result<TransactionRecord, ApiError> {
    let record = ctx.api.create_transaction(token, new).await?;
    info!("Created transaction {} ({})", record.id, record.status);

    ctx.store.lock().await.insert_newest(record.clone());
    ctx.notify(Severity::Success, CREATED_MESSAGE).await;
    Ok(record)
}

/// Queue a transaction for background processing.
///
/// A pending record is shown immediately; the live channel patches it once
/// the worker finishes, and a delayed refresh replaces it with the server's
/// copy either way.
pub async fn enqueue(
    ctx: &AppContext,
    token: &str,
    new: &NewTransaction,
) -> Result<TransactionRecord, ApiError> {
    let response = ctx.api.create_async_transaction(token, new).await?;

    let id = match response.transaction_id {
        Some(id) => id,
        None => {
            let placeholder = TransactionRecord::placeholder_id();
            debug!("Queue response had no transaction id, using {}", placeholder);
            placeholder
        }
    };
    let task_id = response.task_id.unwrap_or_default();
    let mut record = TransactionRecord::provisional(id, Some(task_id.clone()).filter(|t| !t.is_empty()));
    if let Some(status) = response.status {
        record.status = status;
    }
    info!(
        "Queued transaction {} as task {}: {}",
        record.id,
        task_id,
        response.message.as_deref().unwrap_or("-")
    );

    ctx.store.lock().await.insert_newest(record.clone());
    ctx.notify(
        Severity::Info,
        format!("Transaccion encolada. Task ID: {}...", short_id(&task_id, 8)),
    )
    .await;

    schedule_refresh(ctx, TransactionFilter::default());
    Ok(record)
}

/// Fetch the list and replace the local copy.
///
/// On failure the previous contents stay and the error is kept on the store.
pub async fn refresh(
    ctx: &AppContext,
    token: &str,
    filter: &TransactionFilter,
) -> Result<usize, ApiError> {
    ctx.store.lock().await.set_loading();

    match ctx.api.list_transactions(token, filter).await {
        Ok(records) => {
            let count = records.len();
            ctx.store.lock().await.replace_all(records);
            debug!("Loaded {} transactions", count);
            Ok(count)
        }
        Err(e) => {
            ctx.store.lock().await.set_error(e.to_string());
            Err(e)
        }
    }
}

/// Refresh after the configured delay, using whatever session is current then
pub fn schedule_refresh(ctx: &AppContext, filter: TransactionFilter) {
    let ctx = ctx.clone();
    let delay = ctx.config.timings.refetch_delay;
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        let Ok(token) = ctx.require_token().await else {
            debug!("Skipping delayed refresh, no session");
            return;
        };
        if let Err(e) = refresh(&ctx, &token, &filter).await {
            ctx.report_api_error(&e).await;
        }
    });
}

/// Fetch one transaction and fold the server's copy into the list
pub async fn fetch_one(ctx: &AppContext, token: &str, id: &str) -> Result<TransactionRecord, ApiError> {
    let record = ctx.api.get_transaction(token, id).await?;

    let mut store = ctx.store.lock().await;
    if store.get(&record.id).is_some() {
        let mut patch = TransactionPatch::new(record.id.clone()).status(record.status);
        patch.updated_at = record.updated_at;
        patch.processed_at = record.processed_at;
        patch.error_message = record.error_message.clone();
        store.patch_by_id(&patch);
    }
    Ok(record)
}
