//! Structural quality checks for the generated post.
//!
//! The checks are simple text scans and only ever produce a report; a post
//! that fails them is still saved.

use crate::models::QualityReport;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{info, warn};

static CITATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[\d+\]").unwrap());

const REFERENCE_HEADINGS: [&str; 2] = ["## 📚 References", "## References"];
const MIN_WORDS: usize = 1000;
const MIN_CITATIONS: usize = 3;

/// Run every check against `markdown`.
pub fn quality_check(markdown: &str) -> QualityReport {
    let word_count = markdown.split_whitespace().count();
    let citation_count = CITATION.find_iter(markdown).count();
    let has_references = REFERENCE_HEADINGS.iter().any(|h| markdown.contains(h));
    let has_tldr = markdown.contains("TL;DR");
    let has_code_example = markdown.contains("```");

    let mut issues = Vec::new();
    if !has_references {
        issues.push("Missing references section".to_string());
    }
    if !has_tldr {
        issues.push("Missing TL;DR".to_string());
    }
    if word_count < MIN_WORDS {
        issues.push(format!("Word count too low: {word_count}"));
    }
    if citation_count < MIN_CITATIONS {
        issues.push(format!("Too few citations: {citation_count}"));
    }

    QualityReport {
        passed: issues.is_empty(),
        word_count,
        citation_count,
        has_references,
        has_tldr,
        has_code_example,
        issues,
    }
}

impl QualityReport {
    /// Emit the report through tracing.
    pub fn log(&self) {
        info!(
            word_count = self.word_count,
            citations = self.citation_count,
            has_references = self.has_references,
            has_tldr = self.has_tldr,
            has_code_example = self.has_code_example,
            "Quality check"
        );
        if self.passed {
            info!("All quality checks passed");
        } else {
            warn!(issues = %self.issues.join(", "), "Quality issues found");
        }
    }
}
