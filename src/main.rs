//! # AI Research Blog
//!
//! Generates a cited, long-form Markdown blog post about recent AI/ML news.
//!
//! ## Features
//!
//! - Collects recent items from NewsAPI (optional) and RSS feeds (arXiv cs.AI,
//!   OpenAI blog by default)
//! - Ranks them with a recency/trust heuristic and keeps the top six
//! - Summarizes each article into structured JSON through an OpenAI-compatible
//!   LLM API (DeepSeek by default)
//! - Composes a full post with YAML frontmatter and numbered citations
//! - Reports structural quality issues without blocking the save
//!
//! ## Usage
//!
//! ```sh
//! DEEPSEEK_API_KEY=sk-... ai_research_blog -o ./blog
//! ```
//!
//! ## Architecture
//!
//! The application runs one sequential pipeline per invocation:
//! 1. **Collecting**: Poll each configured source
//! 2. **Ranking**: Score by recency, trusted outlet and headline keywords
//! 3. **Summarizing**: One LLM call per selected article
//! 4. **Composing**: One LLM call for the whole post
//! 5. **Output**: Quality report, then the Markdown file

use chrono::Local;
use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod bundle;
mod cli;
mod composer;
mod config;
mod models;
mod outputs;
mod pipeline;
mod quality;
mod ranker;
mod scrapers;
mod summarizer;
mod utils;

use api::ChatClient;
use cli::Cli;
use config::Config;
use scrapers::HttpFetcher;
use utils::ensure_writable_dir;

#[tokio::main(flavor = "current_thread")]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("ai_research_blog starting up");

    // Parse CLI and resolve configuration; a missing API key stops here
    let args = Cli::parse();
    let config = match Config::from_cli(&args) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return Err(e.into());
        }
    };
    debug!(?config, "Resolved configuration");
    if config.newsapi_key.is_none() {
        info!("NEWSAPI_KEY not set; only RSS feeds will be polled");
    }

    // Early check: ensure the output dir is writable
    if let Err(e) = ensure_writable_dir(&config.settings.output_dir).await {
        error!(
            path = %config.settings.output_dir.display(),
            error = %e,
            "Output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    let fetcher = HttpFetcher::new(config.settings.fetch_timeout())?;
    let llm = ChatClient::new(&config.settings.api_base_url, config.api_key.clone())?;

    let report = match pipeline::run(&config, &fetcher, &llm, Local::now().naive_local()).await {
        Ok(report) => report,
        Err(e) => {
            error!(error = %e, "Blog generation stopped; nothing was written");
            return Err(e.into());
        }
    };

    let elapsed = start_time.elapsed();
    info!(
        path = %report.path.display(),
        words = report.quality.word_count,
        citations = report.quality.citation_count,
        quality_passed = report.quality.passed,
        sources_collected = report.sources_collected,
        sources_ranked = report.sources_ranked,
        summaries = report.summaries,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Blog generation complete"
    );
    println!("{}", report.path.display());

    Ok(())
}
