//! Data models passed between pipeline stages.
//!
//! - [`SourceItem`]: a normalized reference to one external article
//! - [`ScoredSourceItem`]: a source item with its ranking score
//! - [`SourceSummary`]: the LLM-produced structured summary of one article
//! - [`ResearchBundle`]: every summary plus run metadata, sent to the composer
//! - [`QualityReport`]: structural diagnostics for the generated post
//!
//! The summary and bundle use camelCase on the wire to match the JSON schema
//! shown to the LLM in the prompts.

use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;

/// Reliability assumed when the model omits it.
pub const DEFAULT_RELIABILITY: u8 = 5;

/// A news item as produced by a collector, before enrichment.
///
/// `published_at` is kept verbatim (ISO-8601, RFC 2822, or empty); the ranker
/// is responsible for interpreting it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceItem {
    pub title: String,
    pub url: String,
    pub description: String,
    pub published_at: String,
    pub source_name: String,
}

/// How a [`SourceItem::published_at`] value was interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishedDate {
    /// Parsed wall-clock time, offset stripped.
    Parsed(chrono::NaiveDateTime),
    /// Empty or unparseable; the ranker assumes a fixed default age.
    Defaulted,
}

impl PublishedDate {
    pub fn is_defaulted(&self) -> bool {
        matches!(self, PublishedDate::Defaulted)
    }
}

/// A [`SourceItem`] with the score assigned by the ranker.
#[derive(Debug, Clone)]
pub struct ScoredSourceItem {
    pub item: SourceItem,
    pub score: f64,
    pub age_hours: f64,
    pub published: PublishedDate,
}

/// A quote pulled from an article by the summarizer.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Quote {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub context: String,
}

/// Structured summary of one article, as returned by the LLM.
///
/// `reliability` is self-reported by the model and not verified. Any numeric
/// value is rounded and clamped to 1..=10; anything else falls back to
/// [`DEFAULT_RELIABILITY`].
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceSummary {
    /// Blank when the model omitted it; the summarizer fills it in.
    #[serde(default)]
    pub title: String,
    pub summary: String,
    #[serde(default)]
    pub key_facts: Vec<String>,
    #[serde(default)]
    pub quotes: Vec<Quote>,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub date: String,
    #[serde(default = "default_reliability", deserialize_with = "lenient_reliability")]
    pub reliability: u8,
}

fn default_reliability() -> u8 {
    DEFAULT_RELIABILITY
}

/// Accepts integers, floats and numeric strings (`8`, `7.5`, `"8"`).
fn lenient_reliability<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let number = match &value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(number
        .filter(|n| n.is_finite())
        .map_or(DEFAULT_RELIABILITY, |n| n.round().clamp(1.0, 10.0) as u8))
}

/// Everything the composer needs to write a post.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchBundle {
    pub generated_date: String,
    pub generated_date_formatted: String,
    pub topic: String,
    pub sources: Vec<SourceSummary>,
    pub total_sources: usize,
    pub avg_reliability: f64,
    pub tags: Vec<String>,
}

/// Structural checks over the generated Markdown. Advisory only.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityReport {
    pub passed: bool,
    pub word_count: usize,
    pub citation_count: usize,
    pub has_references: bool,
    #[serde(rename = "hasTLDR")]
    pub has_tldr: bool,
    pub has_code_example: bool,
    pub issues: Vec<String>,
}

/// Outcome of a successful run, used for the final statistics.
#[derive(Debug)]
pub struct RunReport {
    pub path: PathBuf,
    pub quality: QualityReport,
    pub sources_collected: usize,
    pub sources_ranked: usize,
    pub summaries: usize,
}
