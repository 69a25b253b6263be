//! Recency/trust scoring of collected source items.
//!
//! Each item starts at `100 - age_hours / 24`, gains fixed boosts for trusted
//! outlets and headline keywords, and loses points once it is older than one
//! and two weeks. Items at or below [`RankingPolicy::min_score`] are dropped,
//! the rest are stably sorted by descending score and cut to
//! [`RankingPolicy::max_sources`].

use crate::models::{PublishedDate, ScoredSourceItem, SourceItem};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Deserialize;
use tracing::{debug, info, instrument};

/// Outlets whose items get [`TRUST_BOOST`]. Matched case-insensitively as a
/// substring of the source name.
pub const TRUSTED_SOURCES: [&str; 7] = [
    "Nature", "Science", "arXiv", "OpenAI", "Google", "MIT", "Stanford",
];

/// Headline keywords that earn [`KEYWORD_BOOST`].
pub const TITLE_KEYWORDS: [&str; 6] = [
    "breakthrough",
    "released",
    "announced",
    "open-source",
    "research",
    "state-of-the-art",
];

pub const TRUST_BOOST: f64 = 30.0;
pub const KEYWORD_BOOST: f64 = 15.0;

/// Age assumed for items whose date is missing or unparseable.
pub const DEFAULT_AGE_HOURS: f64 = 72.0;

const ONE_WEEK_HOURS: f64 = 168.0;
const TWO_WEEKS_HOURS: f64 = 336.0;
const ONE_WEEK_PENALTY: f64 = 30.0;
const TWO_WEEKS_PENALTY: f64 = 50.0;

/// Selection policy applied after scoring.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RankingPolicy {
    /// How many items survive ranking.
    pub max_sources: usize,
    /// Items scoring at or below this are discarded. Policy knob, kept at the
    /// historical `-20` so slightly stale items still make it through.
    pub min_score: f64,
}

impl Default for RankingPolicy {
    fn default() -> Self {
        Self {
            max_sources: 6,
            min_score: -20.0,
        }
    }
}

/// Interpret a publication timestamp.
///
/// Tries, in order: RFC 3339 (a trailing `Z` counts as `+00:00`), ISO
/// date-time with a colonless offset (`+0500`) or without seconds, naive ISO
/// date-time with `T` or space separator, bare ISO date, RFC 2822. Offsets are
/// stripped, keeping the wall-clock time as written.
pub fn parse_published(raw: &str) -> PublishedDate {
    let raw = raw.trim();
    if raw.is_empty() {
        return PublishedDate::Defaulted;
    }

    let iso = match raw.strip_suffix('Z') {
        Some(stripped) => format!("{stripped}+00:00"),
        None => raw.to_string(),
    };

    DateTime::parse_from_rfc3339(&iso)
        .map(|dt| dt.naive_local())
        .ok()
        .or_else(|| {
            ["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%dT%H:%M%:z", "%Y-%m-%dT%H:%M%z"]
                .into_iter()
                .find_map(|fmt| DateTime::parse_from_str(&iso, fmt).ok())
                .map(|dt| dt.naive_local())
        })
        .or_else(|| {
            ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
                .into_iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(&iso, fmt).ok())
        })
        .or_else(|| {
            NaiveDate::parse_from_str(&iso, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .or_else(|| DateTime::parse_from_rfc2822(raw).map(|dt| dt.naive_local()).ok())
        .map(PublishedDate::Parsed)
        .unwrap_or(PublishedDate::Defaulted)
}

/// Age in hours of `published` relative to `now`.
pub fn age_hours(published: PublishedDate, now: NaiveDateTime) -> f64 {
    match published {
        PublishedDate::Parsed(at) => (now - at).num_milliseconds() as f64 / 3_600_000.0,
        PublishedDate::Defaulted => DEFAULT_AGE_HOURS,
    }
}

fn is_trusted(source_name: &str) -> bool {
    let name = source_name.to_lowercase();
    TRUSTED_SOURCES
        .iter()
        .any(|t| name.contains(&t.to_lowercase()))
}

fn has_keyword(title: &str) -> bool {
    let title = title.to_lowercase();
    TITLE_KEYWORDS.iter().any(|k| title.contains(k))
}

/// Score a single item. Never fails: bad dates fall back to the default age.
pub fn score_source(item: &SourceItem, now: NaiveDateTime) -> ScoredSourceItem {
    let published = parse_published(&item.published_at);
    let age_hours = age_hours(published, now);

    let mut score = 100.0 - age_hours / 24.0;
    if is_trusted(&item.source_name) {
        score += TRUST_BOOST;
    }
    if has_keyword(&item.title) {
        score += KEYWORD_BOOST;
    }
    if age_hours > ONE_WEEK_HOURS {
        score -= ONE_WEEK_PENALTY;
    }
    if age_hours > TWO_WEEKS_HOURS {
        score -= TWO_WEEKS_PENALTY;
    }

    ScoredSourceItem {
        item: item.clone(),
        score,
        age_hours,
        published,
    }
}

/// Score, filter and select the best items.
///
/// The returned list holds at most `policy.max_sources` items, sorted by
/// descending score; equal scores keep their input order.
#[instrument(level = "info", skip_all, fields(input = items.len()))]
pub fn rank_sources(
    items: &[SourceItem],
    now: NaiveDateTime,
    policy: &RankingPolicy,
) -> Vec<ScoredSourceItem> {
    let mut scored: Vec<ScoredSourceItem> = items
        .iter()
        .map(|item| score_source(item, now))
        .inspect(|s| {
            debug!(
                title = %crate::utils::truncate_for_log(&s.item.title, 50),
                age_days = %format!("{:.1}", s.age_hours / 24.0),
                score = %format!("{:.1}", s.score),
                date_defaulted = s.published.is_defaulted(),
                "Scored source"
            )
        })
        .filter(|s| s.score > policy.min_score)
        .collect();

    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored.truncate(policy.max_sources);

    info!(
        input = items.len(),
        kept = scored.len(),
        "Filtered sources down to top sources"
    );
    scored
}
