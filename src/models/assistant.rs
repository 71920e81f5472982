//! Assistant and Wikipedia panel models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::time;

#[derive(Debug, Clone, Serialize)]
pub struct SummarizeRequest {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

/// Fields the backend returns beyond these (full texts) are not read.
#[derive(Debug, Clone, Deserialize)]
pub struct SummarizeResponse {
    pub id: String,
    pub summary: String,
    pub model_used: String,
    #[serde(default)]
    pub tokens_input: Option<u32>,
    #[serde(default)]
    pub tokens_output: Option<u32>,
    #[serde(default)]
    pub processing_time_ms: Option<u64>,
}

/// One row of the summary history
#[derive(Debug, Clone, Deserialize)]
pub struct AssistantLogEntry {
    pub summary: String,
    pub original_text_preview: String,
    pub model_used: String,
    #[serde(default, with = "time::optional")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WikipediaSearchRequest {
    pub search_term: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WikipediaSearchResponse {
    pub id: String,
    pub search_term: String,
    #[serde(default)]
    pub wikipedia_url: Option<String>,
    pub summary: String,
    #[serde(default)]
    pub model_used: Option<String>,
    #[serde(default)]
    pub processing_time_ms: Option<u64>,
}

/// One row of the Wikipedia search history
#[derive(Debug, Clone, Deserialize)]
pub struct WikipediaLogEntry {
    pub search_term: String,
    pub summary: String,
    #[serde(default, with = "time::optional")]
    pub created_at: Option<DateTime<Utc>>,
}
