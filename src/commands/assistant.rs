use super::CommandResult;
use crate::app::AppContext;
use crate::models::AssistantLogEntry;
use crate::services::assistant_service;
use crate::utils::time::format_short;
use crate::utils::{Page, Table};

pub async fn summarize(ctx: &AppContext, args: &[&str]) -> CommandResult {
    let token = ctx.require_token().await?;
    let text = args.join(" ");
    if text.trim().is_empty() {
        return Err("Uso: summarize <texto>".into());
    }

    let response = assistant_service::summarize(ctx, &token, &text).await?;

    println!("{}", response.summary);
    let mut details = format!("modelo: {}", response.model_used);
    if let (Some(input), Some(output)) = (response.tokens_input, response.tokens_output) {
        details.push_str(&format!(", tokens: {} -> {}", input, output));
    }
    if let Some(ms) = response.processing_time_ms {
        details.push_str(&format!(", {} ms", ms));
    }
    println!("({})", details);
    Ok(())
}

pub async fn history(ctx: &AppContext, args: &[&str]) -> CommandResult {
    let token = ctx.require_token().await?;
    let page = Page::parse(args.first().copied())?;

    let entries = assistant_service::summary_history(ctx, &token, page).await?;
    if entries.is_empty() && page.is_first() {
        println!("Aun no hay resumenes");
        return Ok(());
    }

    print!("{}", render_history(&entries));
    println!("{}", page.footer(entries.len()));
    Ok(())
}

pub fn render_history(entries: &[AssistantLogEntry]) -> String {
    let mut table = Table::new(vec!["Fecha", "Modelo", "Texto", "Resumen"]).with_max_width(48);
    for entry in entries {
        table.add_row(vec![
            format_short(entry.created_at.as_ref()),
            entry.model_used.clone(),
            entry.original_text_preview.clone(),
            entry.summary.clone(),
        ]);
    }
    table.render()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_history_clips_long_text() {
        let entry: AssistantLogEntry = serde_json::from_str(
            r#"{
                "id": "s1",
                "summary": "Resumen breve",
                "original_text_preview": "Lorem ipsum dolor sit amet, consectetur adipiscing elit, sed do eiusmod",
                "model_used": "gpt-4o-mini",
                "created_at": "2024-05-02T10:00:00"
            }"#,
        )
        .expect("decode");

        let output = render_history(&[entry]);
        let row = output.lines().nth(2).expect("row");
        assert!(row.contains("gpt-4o-mini"));
        assert!(row.contains("Resumen breve"));
        assert!(row.contains("..."));
        assert!(!row.contains("eiusmod"));
    }
}
