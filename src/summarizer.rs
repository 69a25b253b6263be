//! Per-article summarization through the LLM.
//!
//! For every ranked source the article page is fetched (falling back to the
//! feed description), sent to the model with a fixed JSON template, and the
//! reply is parsed into a [`SourceSummary`]. A source whose summary fails for
//! any reason is logged and left out of the bundle.

use crate::api::{AskAsync, CompletionError, CompletionRequest, ask_timed};
use crate::config::Settings;
use crate::models::{ScoredSourceItem, SourceItem, SourceSummary};
use crate::scrapers::FetchText;
use crate::scrapers::article::fetch_article_text;
use crate::utils::{looks_truncated, truncate_for_log};
use futures::stream::{self, StreamExt};
use itertools::Itertools;
use thiserror::Error;
use tracing::{info, instrument, warn};

pub const SYSTEM_PROMPT: &str = "You are a factual research summarizer. Extract key information and return structured JSON. Be precise and do NOT hallucinate.";

#[derive(Debug, Error)]
pub enum SummaryError {
    #[error(transparent)]
    Completion(#[from] CompletionError),
    #[error("model response was cut off before the JSON ended: {0}")]
    Truncated(serde_json::Error),
    #[error("model returned non-conforming JSON: {0}")]
    InvalidJson(serde_json::Error),
}

/// Build the user prompt for one article.
pub fn summary_prompt(item: &SourceItem, content: &str) -> String {
    format!(
        r#"Summarize this article:

Title: {title}
URL: {url}
Date: {date}

Content:
{content}

Return ONLY valid JSON with this exact structure:
{{
  "title": "string",
  "summary": "3-sentence summary",
  "keyFacts": ["fact1", "fact2", "fact3"],
  "quotes": [{{"text": "quote", "context": "context"}}],
  "source": "{source}",
  "url": "{url}",
  "date": "{date}",
  "reliability": 8
}}"#,
        title = item.title,
        url = item.url,
        date = item.published_at,
        source = item.source_name,
    )
}

/// Strip a surrounding Markdown code fence (```` ```json ... ``` ````), if any.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (e.g. `json`) on the opening line
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Parse the model's reply for `item`.
///
/// `source` and `url` always come from the collected item; `title` and `date`
/// are filled in when the model left them blank. Duplicate key facts are
/// removed.
pub fn parse_summary(raw: &str, item: &SourceItem) -> Result<SourceSummary, SummaryError> {
    let mut summary: SourceSummary =
        serde_json::from_str(strip_code_fence(raw)).map_err(|e| {
            if looks_truncated(&e) {
                SummaryError::Truncated(e)
            } else {
                SummaryError::InvalidJson(e)
            }
        })?;

    if summary.title.trim().is_empty() {
        summary.title = item.title.clone();
    }
    summary.source = item.source_name.clone();
    summary.url = item.url.clone();
    if summary.date.trim().is_empty() {
        summary.date = item.published_at.clone();
    }
    summary.key_facts = summary
        .key_facts
        .into_iter()
        .map(|f| f.trim().to_string())
        .filter(|f| !f.is_empty())
        .unique()
        .collect();

    Ok(summary)
}

/// Summarize one source. Returns `None` on any failure.
#[instrument(level = "info", skip_all, fields(url = %item.url))]
pub async fn summarize_source<F: FetchText, A: AskAsync>(
    fetcher: &F,
    llm: &A,
    item: &SourceItem,
    settings: &Settings,
) -> Option<SourceSummary> {
    let mut content = fetch_article_text(fetcher, &item.url, settings.article_char_limit).await;
    if content.is_empty() {
        info!("Using feed description in place of article text");
        content = item.description.clone();
    }

    let request = CompletionRequest::new(
        &settings.summarizer,
        SYSTEM_PROMPT,
        summary_prompt(item, &content),
    );

    let raw = match ask_timed(llm, &request).await {
        Ok(raw) => raw,
        Err(e) => {
            warn!(error = %e, "Summarization error; skipping source");
            return None;
        }
    };

    match parse_summary(&raw, item) {
        Ok(summary) => Some(summary),
        Err(e) => {
            warn!(
                error = %e,
                response_preview = %truncate_for_log(&raw, 300),
                "Could not parse summary; skipping source"
            );
            None
        }
    }
}

/// Summarize the ranked sources one after another, keeping input order.
#[instrument(level = "info", skip_all, fields(count = sources.len()))]
pub async fn summarize_all<F: FetchText, A: AskAsync>(
    fetcher: &F,
    llm: &A,
    sources: &[ScoredSourceItem],
    settings: &Settings,
) -> Vec<SourceSummary> {
    let total = sources.len();
    let summaries: Vec<SourceSummary> = stream::iter(sources.iter().enumerate())
        .then(|(i, scored)| async move {
            info!(
                progress = %format!("{}/{}", i + 1, total),
                title = %truncate_for_log(&scored.item.title, 60),
                "Summarizing"
            );
            summarize_source(fetcher, llm, &scored.item, settings).await
        })
        .filter_map(|opt| std::future::ready(opt))
        .collect()
        .await;

    info!(
        total,
        successful = summaries.len(),
        failed = total - summaries.len(),
        "Completed summarization"
    );
    summaries
}
