//! Summarizer and Wikipedia panels

use tracing::info;

use crate::api::ApiError;
use crate::app::AppContext;
use crate::models::{
    AssistantLogEntry, SummarizeRequest, SummarizeResponse, WikipediaLogEntry,
    WikipediaSearchRequest, WikipediaSearchResponse,
};
use crate::utils::Page;

pub async fn summarize(ctx: &AppContext, token: &str, text: &str) -> Result<SummarizeResponse, ApiError> {
    let response = ctx
        .api
        .summarize(
            token,
            &SummarizeRequest {
                text: text.to_string(),
                max_tokens: None,
            },
        )
        .await?;
    info!("Summary {} generated by {}", response.id, response.model_used);
    Ok(response)
}

pub async fn summary_history(
    ctx: &AppContext,
    token: &str,
    page: Page,
) -> Result<Vec<AssistantLogEntry>, ApiError> {
    ctx.api.summary_history(token, page.skip(), page.limit()).await
}

pub async fn search_wikipedia(
    ctx: &AppContext,
    token: &str,
    term: &str,
) -> Result<WikipediaSearchResponse, ApiError> {
    let response = ctx
        .api
        .wikipedia_search(
            token,
            &WikipediaSearchRequest {
                search_term: term.to_string(),
                max_tokens: None,
            },
        )
        .await?;
    info!("Wikipedia lookup '{}' stored as {}", response.search_term, response.id);
    Ok(response)
}

pub async fn wikipedia_history(
    ctx: &AppContext,
    token: &str,
    page: Page,
) -> Result<Vec<WikipediaLogEntry>, ApiError> {
    ctx.api.wikipedia_history(token, page.skip(), page.limit()).await
}
