//! NewsAPI `everything` endpoint collector.
//!
//! Requests recent English-language articles matching the configured query,
//! sorted by publication time, and keeps the first few.

use super::{FetchError, FetchText};
use crate::config::NewsApiSettings;
use crate::models::SourceItem;
use chrono::{Duration, NaiveDateTime};
use serde::Deserialize;
use tracing::{info, instrument};
use url::Url;

#[derive(Debug, Deserialize)]
struct NewsResponse {
    #[serde(default)]
    articles: Vec<NewsArticle>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewsArticle {
    source: Option<NewsSource>,
    title: Option<String>,
    url: Option<String>,
    description: Option<String>,
    published_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NewsSource {
    name: Option<String>,
}

/// Build the request URL, including the API key.
pub fn request_url(
    settings: &NewsApiSettings,
    api_key: &str,
    now: NaiveDateTime,
) -> Result<Url, FetchError> {
    let from = (now - Duration::days(settings.lookback_days))
        .format("%Y-%m-%dT%H:%M:%S")
        .to_string();
    let page_size = settings.page_size.to_string();

    Url::parse_with_params(
        &settings.endpoint,
        &[
            ("q", settings.query.as_str()),
            ("sortBy", "publishedAt"),
            ("pageSize", page_size.as_str()),
            ("language", settings.language.as_str()),
            ("from", from.as_str()),
            ("apiKey", api_key),
        ],
    )
    .map_err(|source| FetchError::Url {
        url: settings.endpoint.clone(),
        source,
    })
}

/// Turn a NewsAPI response body into source items.
pub fn parse_articles(body: &str, keep: usize) -> Result<Vec<SourceItem>, FetchError> {
    let response: NewsResponse =
        serde_json::from_str(body).map_err(|e| FetchError::Parse(e.to_string()))?;

    Ok(response
        .articles
        .into_iter()
        .take(keep)
        .map(|a| SourceItem {
            title: a.title.unwrap_or_default(),
            url: a.url.unwrap_or_default(),
            description: a.description.unwrap_or_default(),
            published_at: a.published_at.unwrap_or_default(),
            source_name: a
                .source
                .and_then(|s| s.name)
                .unwrap_or_else(|| "Unknown".to_string()),
        })
        .collect())
}

#[instrument(level = "info", skip_all)]
pub async fn collect<F: FetchText>(
    fetcher: &F,
    api_key: &str,
    settings: &NewsApiSettings,
    now: NaiveDateTime,
) -> Result<Vec<SourceItem>, FetchError> {
    let url = request_url(settings, api_key, now)?;
    let body = fetcher.fetch_text(url.as_str()).await?;
    let items = parse_articles(&body, settings.keep)?;
    info!(count = items.len(), "Fetched articles from NewsAPI");
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 5, 20)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_request_url_params() {
        let url = request_url(&NewsApiSettings::default(), "secret", now()).unwrap();
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        assert!(url.as_str().starts_with("https://newsapi.org/v2/everything?"));
        assert!(pairs.contains(&(
            "q".to_string(),
            "artificial intelligence OR machine learning OR data science".to_string()
        )));
        assert!(pairs.contains(&("pageSize".to_string(), "10".to_string())));
        assert!(pairs.contains(&("from".to_string(), "2025-05-18T12:00:00".to_string())));
        assert!(pairs.contains(&("apiKey".to_string(), "secret".to_string())));
    }

    #[test]
    fn test_request_url_rejects_bad_endpoint() {
        let settings = NewsApiSettings {
            endpoint: "not a url".to_string(),
            ..NewsApiSettings::default()
        };
        assert!(matches!(
            request_url(&settings, "k", now()),
            Err(FetchError::Url { .. })
        ));
    }

    #[test]
    fn test_parse_articles_handles_nulls_and_limit() {
        let body = r#"{"status":"ok","totalResults":7,"articles":[
            {"source":{"id":null,"name":"Wired"},"title":"A","url":"https://a","description":null,"publishedAt":"2025-05-20T10:00:00Z"},
            {"source":{"id":null,"name":null},"title":null,"url":"https://b","description":"b","publishedAt":null},
            {"source":null,"title":"C","url":"https://c","description":"c","publishedAt":"2025-05-19T10:00:00Z"},
            {"source":{"name":"D"},"title":"D","url":"https://d","description":"d","publishedAt":""},
            {"source":{"name":"E"},"title":"E","url":"https://e","description":"e","publishedAt":""},
            {"source":{"name":"F"},"title":"F","url":"https://f","description":"f","publishedAt":""}
        ]}"#;

        let items = parse_articles(body, 5).unwrap();
        assert_eq!(items.len(), 5);
        assert_eq!(items[0].source_name, "Wired");
        assert_eq!(items[0].description, "");
        assert_eq!(items[0].published_at, "2025-05-20T10:00:00Z");
        assert_eq!(items[1].title, "");
        assert_eq!(items[1].source_name, "Unknown");
        assert_eq!(items[1].published_at, "");
        assert_eq!(items[2].source_name, "Unknown");
    }

    #[test]
    fn test_parse_articles_error_payload() {
        let body = r#"{"status":"error","code":"apiKeyInvalid","message":"bad key"}"#;
        assert!(parse_articles(body, 5).unwrap().is_empty());
        assert!(matches!(parse_articles("<html>", 5), Err(FetchError::Parse(_))));
    }
}
