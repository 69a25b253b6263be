//! Syndication feed collector (arXiv listings, company blogs).
//!
//! RSS 2.0, RSS 1.0 (RDF) and Atom documents are deserialized with
//! quick-xml's serde support; the root element picks the format. Only the
//! fields the pipeline needs are modeled; everything else in the document is
//! ignored.

use super::{FetchError, FetchText, html_to_text};
use crate::config::FeedConfig;
use crate::models::SourceItem;
use quick_xml::de::from_str;
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use serde::Deserialize;
use tracing::{info, instrument};

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    items: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    description: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
}

/// RSS 1.0: items are siblings of the channel under `rdf:RDF`.
#[derive(Debug, Deserialize)]
struct Rdf {
    #[serde(rename = "item", default)]
    items: Vec<RdfItem>,
}

#[derive(Debug, Deserialize)]
struct RdfItem {
    title: Option<String>,
    link: Option<String>,
    description: Option<String>,
    /// `dc:date`; element prefixes are not part of the key.
    date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(rename = "entry", default)]
    entries: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    title: Option<AtomText>,
    #[serde(rename = "link", default)]
    links: Vec<AtomLink>,
    published: Option<String>,
    updated: Option<String>,
    summary: Option<AtomText>,
    content: Option<AtomText>,
}

/// Text construct; the `type` attribute is ignored and HTML is flattened later.
#[derive(Debug, Deserialize)]
struct AtomText {
    #[serde(rename = "$text", default)]
    value: String,
}

#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href")]
    href: Option<String>,
    #[serde(rename = "@rel")]
    rel: Option<String>,
}

impl AtomEntry {
    /// The `alternate` link (an unlabeled link counts), else the first one.
    fn url(&self) -> Option<&str> {
        self.links
            .iter()
            .find(|l| l.rel.as_deref().is_none_or(|rel| rel == "alternate"))
            .or_else(|| self.links.first())
            .and_then(|l| l.href.as_deref())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FeedFormat {
    Rss,
    Rdf,
    Atom,
}

/// Detect the feed format from the document's root element.
fn feed_format(xml: &str) -> Result<FeedFormat, FetchError> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                return match e.local_name().as_ref() {
                    b"rss" => Ok(FeedFormat::Rss),
                    b"RDF" => Ok(FeedFormat::Rdf),
                    b"feed" => Ok(FeedFormat::Atom),
                    other => Err(FetchError::Parse(format!(
                        "unsupported feed root element <{}>",
                        String::from_utf8_lossy(other)
                    ))),
                };
            }
            Ok(Event::Eof) => return Err(FetchError::Parse("empty feed document".to_string())),
            Err(e) => return Err(FetchError::Parse(e.to_string())),
            Ok(_) => {}
        }
    }
}

fn entry_item(
    title: Option<String>,
    link: Option<String>,
    description: Option<String>,
    published_at: Option<String>,
    source_name: &str,
) -> SourceItem {
    SourceItem {
        title: title.map(|t| t.trim().to_string()).unwrap_or_default(),
        url: link.map(|l| l.trim().to_string()).unwrap_or_default(),
        description: description.as_deref().map(html_to_text).unwrap_or_default(),
        published_at: published_at.map(|d| d.trim().to_string()).unwrap_or_default(),
        source_name: source_name.to_string(),
    }
}

/// Replace HTML-only named entities that are not valid in XML.
fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
        .replace("&hellip;", "...")
}

/// Parse a feed document, keeping the first `limit` entries.
///
/// Atom entries use `published`, falling back to `updated`, and `summary`,
/// falling back to `content`.
pub fn parse_feed(xml: &str, source_name: &str, limit: usize) -> Result<Vec<SourceItem>, FetchError> {
    let xml = scrub_html_entities_for_xml(xml);
    let parse_err = |e: quick_xml::DeError| FetchError::Parse(e.to_string());

    let items = match feed_format(&xml)? {
        FeedFormat::Rss => {
            let rss: Rss = from_str(&xml).map_err(parse_err)?;
            rss.channel
                .items
                .into_iter()
                .take(limit)
                .map(|it| entry_item(it.title, it.link, it.description, it.pub_date, source_name))
                .collect()
        }
        FeedFormat::Rdf => {
            let rdf: Rdf = from_str(&xml).map_err(parse_err)?;
            rdf.items
                .into_iter()
                .take(limit)
                .map(|it| entry_item(it.title, it.link, it.description, it.date, source_name))
                .collect()
        }
        FeedFormat::Atom => {
            let feed: AtomFeed = from_str(&xml).map_err(parse_err)?;
            feed.entries
                .into_iter()
                .take(limit)
                .map(|entry| {
                    let link = entry.url().map(String::from);
                    let description = entry.summary.or(entry.content).map(|t| t.value);
                    entry_item(
                        entry.title.map(|t| t.value),
                        link,
                        description,
                        entry.published.or(entry.updated),
                        source_name,
                    )
                })
                .collect()
        }
    };
    Ok(items)
}

#[instrument(level = "info", skip_all, fields(feed = %feed.name))]
pub async fn collect<F: FetchText>(
    fetcher: &F,
    feed: &FeedConfig,
) -> Result<Vec<SourceItem>, FetchError> {
    let xml = fetcher.fetch_text(&feed.url).await?;
    let items = parse_feed(&xml, &feed.name, feed.limit)?;
    info!(count = items.len(), url = %feed.url, "Fetched feed entries");
    Ok(items)
}
