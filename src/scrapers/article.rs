//! Best-effort article body extraction.
//!
//! The main content container is located in priority order: `<article>`,
//! `<main>`, then a `div` whose class mentions `article` or `post-content`.
//! Text inside `script`, `style`, `nav`, `footer` and `header` is dropped.
//! Pages without any container fall back to the concatenation of every `<p>`.

use super::FetchText;
use crate::utils::{collapse_whitespace, truncate_chars, truncate_for_log};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Node, Selector};
use tracing::{debug, instrument, warn};

const SKIPPED_TAGS: [&str; 5] = ["script", "style", "nav", "footer", "header"];

static CONTAINER_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    [
        "article",
        "main",
        r#"div[class*="article"], div[class*="post-content"]"#,
    ]
    .iter()
    .map(|s| Selector::parse(s).unwrap())
    .collect()
});

static PARAGRAPH: Lazy<Selector> = Lazy::new(|| Selector::parse("p").unwrap());

fn is_skipped(name: &str) -> bool {
    SKIPPED_TAGS.contains(&name)
}

/// Text of `element`, leaving out anything nested under a skipped tag.
fn visible_text(element: ElementRef<'_>) -> String {
    element
        .descendants()
        .filter_map(|node| {
            let text = match node.value() {
                Node::Text(text) => text.trim(),
                _ => return None,
            };
            let hidden = node.ancestors().any(|a| {
                a.value()
                    .as_element()
                    .is_some_and(|e| is_skipped(e.name()))
            });
            (!hidden && !text.is_empty()).then_some(text)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Extract readable text from an HTML document, cut to `limit` characters.
pub fn extract_article_text(html: &str, limit: usize) -> String {
    let document = Html::parse_document(html);

    let container = CONTAINER_SELECTORS
        .iter()
        .find_map(|selector| document.select(selector).next());

    let text = match container {
        Some(element) => visible_text(element),
        None => document
            .select(&PARAGRAPH)
            .map(visible_text)
            .collect::<Vec<_>>()
            .join(" "),
    };

    truncate_chars(&collapse_whitespace(&text), limit).to_string()
}

/// Fetch a page and extract its article text.
///
/// Any failure yields an empty string so the caller can fall back to the
/// feed description.
#[instrument(level = "info", skip_all, fields(%url))]
pub async fn fetch_article_text<F: FetchText>(fetcher: &F, url: &str, limit: usize) -> String {
    if url.trim().is_empty() {
        warn!("Source has no URL; skipping article fetch");
        return String::new();
    }
    match fetcher.fetch_text(url).await {
        Ok(html) => {
            let text = extract_article_text(&html, limit);
            debug!(chars = text.chars().count(), preview = %truncate_for_log(&text, 80), "Extracted article text");
            text
        }
        Err(e) => {
            warn!(error = %e, "Error fetching article");
            String::new()
        }
    }
}
