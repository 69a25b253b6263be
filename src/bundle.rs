//! Research bundle assembly.

use crate::config::Settings;
use crate::models::{ResearchBundle, SourceSummary};
use chrono::NaiveDateTime;
use itertools::Itertools;
use tracing::info;

/// Combine the summaries with run metadata.
///
/// `avg_reliability` is the mean self-reported reliability (0 when there are
/// no summaries). Tags keep their configured order with duplicates removed.
pub fn assemble_bundle(
    summaries: Vec<SourceSummary>,
    settings: &Settings,
    now: NaiveDateTime,
) -> ResearchBundle {
    let total_sources = summaries.len();
    let avg_reliability = if summaries.is_empty() {
        0.0
    } else {
        summaries
            .iter()
            .map(|s| f64::from(s.reliability))
            .sum::<f64>()
            / total_sources as f64
    };

    let bundle = ResearchBundle {
        generated_date: now.format("%Y-%m-%dT%H:%M:%S%.6f").to_string(),
        generated_date_formatted: now.format("%B %d, %Y").to_string(),
        topic: settings.topic.clone(),
        sources: summaries,
        total_sources,
        avg_reliability,
        tags: settings.tags.iter().cloned().unique().collect(),
    };

    info!(
        total_sources,
        avg_reliability = %format!("{avg_reliability:.1}"),
        "Aggregated summaries into research bundle"
    );
    bundle
}
