//! One end-to-end run: collect, rank, summarize, bundle, compose, check, save.
//!
//! Stages run strictly in order and nothing is carried over between runs.
//! Per-source failures are absorbed by the stages themselves; the run only
//! stops early when there is nothing left to work with or the post itself
//! could not be generated.

use crate::api::{AskAsync, CompletionError};
use crate::bundle::assemble_bundle;
use crate::composer::compose_post;
use crate::config::Config;
use crate::models::RunReport;
use crate::outputs::markdown::save_post;
use crate::quality::quality_check;
use crate::ranker::rank_sources;
use crate::scrapers::{FetchText, collect_sources};
use crate::summarizer::summarize_all;
use chrono::NaiveDateTime;
use thiserror::Error;
use tracing::{info, instrument};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no sources found")]
    NoSources,
    #[error("no summaries generated")]
    NoSummaries,
    #[error("blog generation failed: {0}")]
    Composition(#[from] CompletionError),
    #[error("failed to write blog post: {0}")]
    Write(#[from] std::io::Error),
}

/// Execute the whole pipeline once.
///
/// `now` is the local wall-clock time used for ranking, the bundle dates and
/// the output filename.
#[instrument(level = "info", skip_all)]
pub async fn run<F: FetchText, A: AskAsync>(
    config: &Config,
    fetcher: &F,
    llm: &A,
    now: NaiveDateTime,
) -> Result<RunReport, PipelineError> {
    let settings = &config.settings;

    info!("Fetching news sources");
    let sources = collect_sources(fetcher, config, now).await;
    if sources.is_empty() {
        return Err(PipelineError::NoSources);
    }

    info!("Filtering and scoring sources");
    let top_sources = rank_sources(&sources, now, &settings.ranking);

    info!("Summarizing articles");
    let summaries = summarize_all(fetcher, llm, &top_sources, settings).await;
    if summaries.is_empty() {
        return Err(PipelineError::NoSummaries);
    }
    let summary_count = summaries.len();

    let bundle = assemble_bundle(summaries, settings, now);

    info!("Generating blog post");
    let post = compose_post(llm, &bundle, &settings.composer).await?;

    info!("Running quality checks");
    let quality = quality_check(&post);
    quality.log();

    let path = save_post(&settings.output_dir, &post, now).await?;

    Ok(RunReport {
        path,
        quality,
        sources_collected: sources.len(),
        sources_ranked: top_sources.len(),
        summaries: summary_count,
    })
}
