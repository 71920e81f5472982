use tracing::debug;

use super::CommandResult;
use crate::app::AppContext;

pub async fn execute(ctx: &AppContext) -> CommandResult {
    let backend = match ctx.api.health().await {
        Ok(_) => "ok".to_string(),
        Err(e) => {
            debug!("Health check failed: {}", e);
            format!("no disponible ({})", e)
        }
    };

    let user = ctx
        .session()
        .await
        .map(|s| s.user.display_name().to_string())
        .unwrap_or_else(|| "sin sesion".to_string());

    let (list, last_error) = {
        let store = ctx.store.lock().await;
        let list = if store.is_loading() {
            "cargando...".to_string()
        } else if store.is_empty() {
            format!("ninguna (version {})", store.version())
        } else {
            format!("{} (version {})", store.len(), store.version())
        };
        (list, store.last_error().map(str::to_string))
    };
    let notifications = ctx.feed.lock().await.len();
    let last_message = ctx
        .latest_message()
        .map(|value| value.to_string())
        .unwrap_or_else(|| "-".to_string());

    let stream = ctx.stream_diagnostics();

    println!("API:            {} ({})", ctx.api.base_url(), backend);
    println!("Tiempo real:    {}", ctx.connection_state());
    println!("Usuario:        {}", user);
    println!("Transacciones:  {}", list);
    println!("Notificaciones: {}", notifications);
    if let Some(error) = last_error {
        println!("Ultimo error:   {}", error);
    }
    println!(
        "Mensajes:       {} recibidos, {} ignorados, {} reconexiones",
        stream.messages, stream.ignored_payloads, stream.reconnects
    );
    println!("Ultimo mensaje: {}", last_message);
    println!(
        "Heartbeat:      {} enviados, {} omitidos, {} fallidos, {} respuestas",
        stream.heartbeats_sent, stream.heartbeats_skipped, stream.heartbeat_failures, stream.heartbeat_replies
    );
    Ok(())
}
