//! Source collectors and the article text extractor.
//!
//! Every network read goes through the [`FetchText`] capability so the
//! collectors can be exercised with canned documents in tests.
//!
//! # Supported Sources
//!
//! | Source | Module | Method | Notes |
//! |--------|--------|--------|-------|
//! | NewsAPI | [`newsapi`] | JSON API | Requires API key; skipped without one |
//! | arXiv cs.AI | [`rss`] | RSS 2.0 | First 3 entries by default |
//! | OpenAI Blog | [`rss`] | RSS 2.0 | First 2 entries by default |
//! | Article pages | [`article`] | HTML scraping | Best effort, truncated text |
//!
//! A collector that fails is logged and contributes nothing; the run only
//! stops if every collector comes back empty.

pub mod article;
pub mod newsapi;
pub mod rss;

use crate::config::Config;
use crate::models::SourceItem;
use chrono::NaiveDateTime;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

/// Browser-like User-Agent; several publishers reject the reqwest default.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected HTTP status {0}")]
    Status(StatusCode),
    #[error("invalid URL {url}: {source}")]
    Url {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("could not parse response: {0}")]
    Parse(String),
}

/// Capability to GET a URL and return its body as text.
pub trait FetchText {
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError>;
}

/// reqwest-backed [`FetchText`] with a fixed per-request timeout.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

impl FetchText for HttpFetcher {
    #[instrument(level = "debug", skip_all, fields(%url))]
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }
        Ok(response.text().await?)
    }
}

/// Poll every configured source, in order, and concatenate the results.
///
/// NewsAPI runs first when a key is configured, followed by each RSS feed.
#[instrument(level = "info", skip_all)]
pub async fn collect_sources<F: FetchText>(
    fetcher: &F,
    config: &Config,
    now: NaiveDateTime,
) -> Vec<SourceItem> {
    let mut sources = Vec::new();
    let settings = &config.settings;

    match &config.newsapi_key {
        Some(key) => match newsapi::collect(fetcher, key, &settings.newsapi, now).await {
            Ok(items) => sources.extend(items),
            Err(e) => error!(error = %e, "NewsAPI error"),
        },
        None => info!("No NewsAPI key configured; skipping NewsAPI"),
    }

    for feed in &settings.feeds {
        match rss::collect(fetcher, feed).await {
            Ok(items) => sources.extend(items),
            Err(e) => error!(feed = %feed.name, url = %feed.url, error = %e, "RSS feed error"),
        }
    }

    if sources.is_empty() {
        warn!("No sources collected from any provider");
    } else {
        info!(count = sources.len(), "Collected sources");
    }
    sources
}

/// Reduce an HTML fragment to its text content.
pub(crate) fn html_to_text(fragment: &str) -> String {
    let parsed = scraper::Html::parse_fragment(fragment);
    let text = parsed.root_element().text().collect::<Vec<_>>().join(" ");
    crate::utils::collapse_whitespace(&text)
}

#[cfg(test)]
pub(crate) mod fake {
    //! Canned-response [`FetchText`] implementation for tests.

    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Serves fixed bodies keyed by URL prefix; anything else is a 404.
    #[derive(Default)]
    pub struct FakeFetcher {
        pages: HashMap<String, String>,
        pub requested: Mutex<Vec<String>>,
    }

    impl FakeFetcher {
        pub fn page(mut self, url_prefix: &str, body: &str) -> Self {
            self.pages.insert(url_prefix.to_string(), body.to_string());
            self
        }
    }

    impl FetchText for FakeFetcher {
        async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
            self.requested.lock().unwrap().push(url.to_string());
            self.pages
                .iter()
                .find(|(prefix, _)| url.starts_with(prefix.as_str()))
                .map(|(_, body)| body.clone())
                .ok_or(FetchError::Status(StatusCode::NOT_FOUND))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fake::FakeFetcher;
    use super::*;
    use crate::config::{FeedConfig, Settings};
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 5, 20)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn config(newsapi_key: Option<&str>) -> Config {
        let mut settings = Settings::default();
        settings.feeds = vec![
            FeedConfig {
                name: "arXiv".to_string(),
                url: "https://feeds.test/arxiv".to_string(),
                limit: 3,
            },
            FeedConfig {
                name: "Broken".to_string(),
                url: "https://feeds.test/broken".to_string(),
                limit: 2,
            },
        ];
        settings.newsapi.endpoint = "https://news.test/v2/everything".to_string();
        Config {
            settings,
            api_key: "sk-test".to_string(),
            newsapi_key: newsapi_key.map(String::from),
        }
    }

    const FEED: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel><title>cs.AI</title>
<item><title>Paper one</title><link>https://arxiv.org/abs/1</link><description>First</description><pubDate>Tue, 20 May 2025 08:00:00 GMT</pubDate></item>
</channel></rss>"#;

    const NEWS: &str = r#"{"status":"ok","articles":[
        {"source":{"name":"The Verge"},"title":"Model launch","url":"https://verge.test/a","description":"d","publishedAt":"2025-05-20T09:00:00Z"}
    ]}"#;

    #[test]
    fn test_html_to_text() {
        assert_eq!(
            html_to_text("<p>Hello <b>world</b></p>\n<p>again</p>"),
            "Hello world again"
        );
        assert_eq!(html_to_text("plain text"), "plain text");
    }

    #[tokio::test]
    async fn test_collect_skips_failed_feed_and_missing_key() {
        let fetcher = FakeFetcher::default().page("https://feeds.test/arxiv", FEED);
        let sources = collect_sources(&fetcher, &config(None), now()).await;

        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].source_name, "arXiv");
        let requested = fetcher.requested.lock().unwrap();
        assert!(!requested.iter().any(|u| u.starts_with("https://news.test")));
    }

    #[tokio::test]
    async fn test_collect_newsapi_first() {
        let fetcher = FakeFetcher::default()
            .page("https://feeds.test/arxiv", FEED)
            .page("https://news.test/", NEWS);
        let sources = collect_sources(&fetcher, &config(Some("key")), now()).await;

        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].source_name, "The Verge");
        assert_eq!(sources[1].source_name, "arXiv");
    }

    #[tokio::test]
    async fn test_collect_all_failing_is_empty() {
        let fetcher = FakeFetcher::default();
        let sources = collect_sources(&fetcher, &config(Some("key")), now()).await;
        assert!(sources.is_empty());
    }
}
