use rust_decimal::Decimal;
use std::str::FromStr;

use super::CommandResult;
use crate::app::AppContext;
use crate::models::{NewTransaction, TransactionFilter, TransactionKind, TransactionRecord, TransactionStatus};
use crate::services::transaction_service;
use crate::utils::time::format_short;
use crate::utils::{short_id, Table};

const CREATE_USAGE: &str = "Uso: create <user_id> <monto> <deposito|retiro|transferencia>";
const QUEUE_USAGE: &str = "Uso: queue <user_id> <monto> <deposito|retiro|transferencia>";

/// Parse `<user_id> <monto> <tipo>` into a request body
pub fn parse_new_transaction(args: &[&str], usage: &str) -> Result<NewTransaction, String> {
    let [user_id, amount, kind] = args else {
        return Err(usage.to_string());
    };

    let amount = Decimal::from_str(&amount.replace(',', "."))
        .map_err(|_| format!("Monto invalido: {}", amount))?;
    let kind = TransactionKind::parse(kind).ok_or_else(|| format!("Tipo invalido: {}", kind))?;

    Ok(NewTransaction {
        user_id: user_id.to_string(),
        amount,
        kind,
    })
}

/// Parse `[user_id|-] [estado]`; `-` skips the user filter
pub fn parse_filter(args: &[&str]) -> Result<TransactionFilter, String> {
    let mut filter = TransactionFilter::default();

    match args {
        [] => {}
        [single] => match TransactionStatus::parse(single) {
            Some(status) => filter.status = Some(status),
            None => filter.user_id = user_arg(single),
        },
        [user, status] => {
            filter.user_id = user_arg(user);
            filter.status = Some(
                TransactionStatus::parse(status).ok_or_else(|| format!("Estado invalido: {}", status))?,
            );
        }
        _ => return Err("Uso: list [user_id|-] [pendiente|procesado|fallido]".to_string()),
    }

    Ok(filter)
}

fn user_arg(arg: &str) -> Option<String> {
    Some(arg.to_string()).filter(|a| a != "-")
}

pub fn render_records(records: &[TransactionRecord]) -> String {
    let mut table = Table::new(vec!["ID", "Usuario", "Monto", "Tipo", "Estado", "Creada", "Error"]);
    for record in records {
        let id = if record.is_placeholder() {
            "(en cola)".to_string()
        } else {
            short_id(&record.id, 8)
        };
        table.add_row(vec![
            id,
            record.user_id.as_deref().map(|u| short_id(u, 8)).unwrap_or_else(|| "-".to_string()),
            record.amount.map(|a| a.to_string()).unwrap_or_else(|| "-".to_string()),
            record.kind.map(|k| k.to_string()).unwrap_or_else(|| "-".to_string()),
            record.status.to_string(),
            format_short(record.created_at.as_ref()),
            record.error_message.clone().unwrap_or_default(),
        ]);
    }
    table.render()
}

pub async fn create(ctx: &AppContext, args: &[&str]) -> CommandResult {
    let token = ctx.require_token().await?;
    let new = parse_new_transaction(args, CREATE_USAGE)?;
    transaction_service::create_now(ctx, &token, &new).await?;
    Ok(())
}

pub async fn queue(ctx: &AppContext, args: &[&str]) -> CommandResult {
    let token = ctx.require_token().await?;
    let new = parse_new_transaction(args, QUEUE_USAGE)?;
    transaction_service::enqueue(ctx, &token, &new).await?;
    Ok(())
}

pub async fn list(ctx: &AppContext, args: &[&str]) -> CommandResult {
    let token = ctx.require_token().await?;
    let filter = parse_filter(args)?;
    transaction_service::refresh(ctx, &token, &filter).await?;
    print_store(ctx).await;
    Ok(())
}

pub async fn refresh(ctx: &AppContext) -> CommandResult {
    let token = ctx.require_token().await?;
    transaction_service::refresh(ctx, &token, &TransactionFilter::default()).await?;
    print_store(ctx).await;
    Ok(())
}

pub async fn show(ctx: &AppContext, args: &[&str]) -> CommandResult {
    let token = ctx.require_token().await?;
    let [id] = args else {
        return Err("Uso: show <id>".into());
    };

    let record = transaction_service::fetch_one(ctx, &token, id).await?;

    println!("ID:          {}", record.id);
    println!("Usuario:     {}", record.user_id.as_deref().unwrap_or("-"));
    println!("Monto:       {}", record.amount.map(|a| a.to_string()).unwrap_or_else(|| "-".to_string()));
    println!("Tipo:        {}", record.kind.map(|k| k.to_string()).unwrap_or_else(|| "-".to_string()));
    println!("Estado:      {}", record.status);
    println!("Creada:      {}", format_short(record.created_at.as_ref()));
    println!("Actualizada: {}", format_short(record.updated_at.as_ref()));
    println!("Procesada:   {}", format_short(record.processed_at.as_ref()));
    if let Some(task) = &record.celery_task_id {
        println!("Task ID:     {}", task);
    }
    if let Some(error) = &record.error_message {
        println!("Error:       {}", error);
    }
    Ok(())
}

async fn print_store(ctx: &AppContext) {
    let snapshot = ctx.store.lock().await.snapshot();
    if snapshot.is_empty() {
        println!("No hay transacciones");
        return;
    }
    print!("{}", render_records(&snapshot));
    println!("{} transacciones", snapshot.len());
}
