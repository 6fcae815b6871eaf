// src/ingest/providers/rss.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use quick_xml::de::from_str;
use serde::Deserialize;
use std::time::Duration;
use time::{format_description::well_known::Rfc2822, OffsetDateTime, UtcOffset};

use crate::ingest::types::{ContentSource, FetchRequest};
use crate::ingest::{clean_text, join_title_body};
use crate::model::{ContentItem, Source};

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
}

fn parse_rfc2822_to_unix(ts: &str) -> Option<u64> {
    OffsetDateTime::parse(ts.trim(), &Rfc2822)
        .ok()
        .map(|dt| dt.to_offset(UtcOffset::UTC).unix_timestamp())
        .and_then(|x| u64::try_from(x).ok())
}

enum Feed {
    Fixture(String),
    Url { http: reqwest::Client, url: String },
}

/// News items from an RSS 2.0 feed, kept when the title or description
/// mentions the query (case-insensitive). A blank query keeps everything.
pub struct RssSource {
    name: &'static str,
    feed: Feed,
}

impl RssSource {
    /// Parse a fixed XML document (tests, offline runs).
    pub fn from_fixture(name: &'static str, content: &str) -> Self {
        Self {
            name,
            feed: Feed::Fixture(content.to_string()),
        }
    }

    pub fn from_url(name: &'static str, url: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(10))
            .build()
            .context("building rss http client")?;
        Ok(Self {
            name,
            feed: Feed::Url {
                http,
                url: url.to_string(),
            },
        })
    }

    async fn load(&self) -> Result<String> {
        match &self.feed {
            Feed::Fixture(s) => Ok(s.clone()),
            Feed::Url { http, url } => http
                .get(url)
                .send()
                .await
                .with_context(|| format!("GET {url}"))?
                .error_for_status()?
                .text()
                .await
                .context("reading rss body"),
        }
    }
}

/// Parse an RSS document into news items matching `query`.
pub fn parse_feed(xml: &str, query: &str, limit: usize) -> Result<Vec<ContentItem>> {
    let rss: Rss = from_str(xml).context("parsing rss xml")?;
    let needle = query.trim().to_lowercase();

    let mut out = Vec::new();
    for it in rss.channel.item {
        if out.len() >= limit {
            break;
        }
        let text = clean_text(&join_title_body(
            it.title.as_deref(),
            it.description.as_deref(),
        ));
        if text.is_empty() || (!needle.is_empty() && !text.to_lowercase().contains(&needle)) {
            continue;
        }
        let mut item = ContentItem::new(Source::News, text);
        item.title = it.title.map(|t| clean_text(&t)).filter(|t| !t.is_empty());
        item.url = it.link;
        item.published_at = it.pub_date.as_deref().and_then(parse_rfc2822_to_unix);
        out.push(item);
    }
    Ok(out)
}

#[async_trait]
impl ContentSource for RssSource {
    async fn fetch(&self, req: &FetchRequest) -> Result<Vec<ContentItem>> {
        let xml = self.load().await?;
        let mut items = parse_feed(&xml, &req.query, req.limit)?;
        if let Some(loc) = &req.location {
            for it in &mut items {
                it.location = Some(loc.formatted_address.clone());
            }
        }
        Ok(items)
    }

    fn name(&self) -> &'static str {
        self.name
    }
}
