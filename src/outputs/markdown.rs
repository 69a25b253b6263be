//! Writing the generated post to disk.
//!
//! Files are named `<YYYY-MM-DD>-<slug>.md`, where the slug comes from the
//! `title` in the post's YAML frontmatter.

use crate::utils::slugify_title;
use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, instrument};

/// Title used when the post does not carry one.
pub const FALLBACK_TITLE: &str = "AI Research Update";

static TITLE_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"title:\s*["'](.+?)["']"#).unwrap());

#[derive(Debug, Deserialize)]
struct Frontmatter {
    title: Option<String>,
}

/// The YAML block between a leading `---` line and the next `---` line.
fn frontmatter_block(markdown: &str) -> Option<&str> {
    let rest = markdown.trim_start().strip_prefix("---")?;
    let rest = rest.strip_prefix('\n').or_else(|| rest.strip_prefix("\r\n"))?;
    let end = rest.find("\n---")?;
    Some(&rest[..end])
}

/// Find the post title.
///
/// Parses the frontmatter with serde_yaml first; when the block is missing or
/// not valid YAML, falls back to the first quoted `title:` line anywhere in
/// the text, then to [`FALLBACK_TITLE`].
pub fn extract_title(markdown: &str) -> String {
    let from_yaml = frontmatter_block(markdown)
        .and_then(|block| serde_yaml::from_str::<Frontmatter>(block).ok())
        .and_then(|fm| fm.title)
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());

    if let Some(title) = from_yaml {
        return title;
    }

    debug!("No usable frontmatter title; scanning for a title line");
    TITLE_LINE
        .captures(markdown)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| FALLBACK_TITLE.to_string())
}

/// `<YYYY-MM-DD>-<slug>.md`
pub fn post_filename(title: &str, now: NaiveDateTime) -> String {
    format!("{}-{}.md", now.format("%Y-%m-%d"), slugify_title(title))
}

/// Write `markdown` into `output_dir` and return the file path.
#[instrument(level = "info", skip_all, fields(output_dir = %output_dir.display()))]
pub async fn save_post(
    output_dir: &Path,
    markdown: &str,
    now: NaiveDateTime,
) -> std::io::Result<PathBuf> {
    let title = extract_title(markdown);
    let path = output_dir.join(post_filename(&title, now));

    fs::create_dir_all(output_dir).await?;
    fs::write(&path, markdown).await?;
    info!(path = %path.display(), %title, "Blog post saved");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 5, 6)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_extract_title_from_frontmatter() {
        let post = "---\ntitle: \"New AI Model Beats Benchmark!\"\ndate: 2025-05-06\ntags: [\"ai\"]\n---\n\n## 🎯 TL;DR\n";
        assert_eq!(extract_title(post), "New AI Model Beats Benchmark!");
    }

    #[test]
    fn test_extract_title_unquoted_yaml() {
        let post = "---\ntitle: Agents Everywhere\n---\nBody";
        assert_eq!(extract_title(post), "Agents Everywhere");
    }

    #[test]
    fn test_extract_title_regex_fallback() {
        // Invalid YAML (unbalanced quote in summary) still yields the title line
        let post = "---\ntitle: \"Fallback Title\"\nsummary: \"broken\n---\nBody";
        assert_eq!(extract_title(post), "Fallback Title");

        let post = "Intro text\ntitle: 'Single Quoted'\n";
        assert_eq!(extract_title(post), "Single Quoted");
    }

    #[test]
    fn test_extract_title_default() {
        assert_eq!(extract_title("# Just a heading\n"), FALLBACK_TITLE);
        assert_eq!(extract_title("---\ndate: 2025-05-06\n---\n"), FALLBACK_TITLE);
    }

    #[test]
    fn test_post_filename() {
        assert_eq!(
            post_filename("New AI Model Beats Benchmark!", now()),
            "2025-05-06-new-ai-model-beats-benchmark.md"
        );
        assert_eq!(
            post_filename(FALLBACK_TITLE, now()),
            "2025-05-06-ai-research-update.md"
        );
    }

    #[tokio::test]
    async fn test_save_post_writes_file() {
        let dir = std::env::temp_dir().join(format!("ai_research_blog_md_{}", std::process::id()));
        let post = "---\ntitle: \"Saved Post\"\n---\nBody\n";

        let path = save_post(&dir, post, now()).await.unwrap();
        assert_eq!(path, dir.join("2025-05-06-saved-post.md"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), post);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
