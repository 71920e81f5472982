use std::time::Instant;

use super::CommandResult;
use crate::app::AppContext;
use crate::utils::Table;

pub async fn list(ctx: &AppContext) -> CommandResult {
    let now = Instant::now();
    let mut feed = ctx.feed.lock().await;
    feed.expire(now);
    if feed.is_empty() {
        println!("Sin notificaciones");
        return Ok(());
    }

    let visible = feed.visible(now);

    let mut table = Table::new(vec!["ID", "Tipo", "Hora", "Mensaje"]).with_max_width(80);
    for entry in visible {
        table.add_row(vec![
            entry.id.to_string(),
            entry.severity.label().to_string(),
            entry.created_at.format("%H:%M:%S").to_string(),
            entry.message.clone(),
        ]);
    }
    print!("{}", table.render());
    Ok(())
}

pub async fn dismiss(ctx: &AppContext, args: &[&str]) -> CommandResult {
    let [id] = args else {
        return Err("Uso: dismiss <id>".into());
    };
    let id: u64 = id.parse().map_err(|_| format!("Id invalido: {}", id))?;

    // Dismissing something that already expired is not an error.
    ctx.feed.lock().await.dismiss(id);
    Ok(())
}
