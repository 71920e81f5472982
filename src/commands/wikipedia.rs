use super::CommandResult;
use crate::app::AppContext;
use crate::services::assistant_service;
use crate::utils::time::format_short;
use crate::utils::{Page, Table};

pub async fn search(ctx: &AppContext, args: &[&str]) -> CommandResult {
    let token = ctx.require_token().await?;
    let term = args.join(" ");
    if term.trim().is_empty() {
        return Err("Uso: wiki <termino>".into());
    }

    let response = assistant_service::search_wikipedia(ctx, &token, term.trim()).await?;

    println!("{}", response.search_term);
    if let Some(url) = &response.wikipedia_url {
        println!("{}", url);
    }
    println!();
    println!("{}", response.summary);
    let mut details = format!("modelo: {}", response.model_used.as_deref().unwrap_or("-"));
    if let Some(ms) = response.processing_time_ms {
        details.push_str(&format!(", {} ms", ms));
    }
    println!("({})", details);
    Ok(())
}

pub async fn history(ctx: &AppContext, args: &[&str]) -> CommandResult {
    let token = ctx.require_token().await?;
    let page = Page::parse(args.first().copied())?;

    let entries = assistant_service::wikipedia_history(ctx, &token, page).await?;
    if entries.is_empty() && page.is_first() {
        println!("Aun no hay busquedas");
        return Ok(());
    }

    let mut table = Table::new(vec!["Fecha", "Termino", "Resumen"]).with_max_width(60);
    for entry in &entries {
        table.add_row(vec![
            format_short(entry.created_at.as_ref()),
            entry.search_term.clone(),
            entry.summary.clone(),
        ]);
    }
    print!("{}", table.render());
    println!("{}", page.footer(entries.len()));
    Ok(())
}
