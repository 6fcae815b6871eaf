// src/ingest/providers/news_api.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::Deserialize;
use std::time::Duration;

use crate::geo::location_query;
use crate::ingest::types::{ContentSource, FetchRequest};
use crate::ingest::{clean_text, join_title_body};
use crate::model::{ContentItem, Source};

const NEWS_API_URL: &str = "https://newsapi.org/v2/everything";
/// Look-back window for `from`.
const LOOKBACK_DAYS: i64 = 7;
const TOP_GENERAL: usize = 10;
const TOP_LOCATION: usize = 15;

#[derive(Debug, Deserialize)]
struct Response {
    #[serde(default)]
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    articles: Vec<Article>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Article {
    title: Option<String>,
    description: Option<String>,
    url: Option<String>,
    published_at: Option<String>,
    source: Option<ArticleSource>,
}

#[derive(Debug, Deserialize)]
struct ArticleSource {
    name: Option<String>,
}

/// NewsAPI `/v2/everything`: English articles from the last week, by relevancy.
pub struct NewsApiSource {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl NewsApiSource {
    pub fn new(api_key: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(10))
            .user_agent(concat!("opinion-pulse/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("building news http client")?;
        Ok(Self {
            http,
            api_key: api_key.to_string(),
            base_url: NEWS_API_URL.to_string(),
        })
    }
}

/// `q` and the article cap for a request; `None` when a location gave no place terms.
fn shape_query(req: &FetchRequest) -> Option<(String, usize)> {
    match &req.location {
        Some(loc) => location_query(&req.query, loc).map(|q| (q, TOP_LOCATION.min(req.limit))),
        None => Some((req.query.clone(), TOP_GENERAL.min(req.limit))),
    }
}

fn date_from(now: DateTime<Utc>) -> String {
    (now - ChronoDuration::days(LOOKBACK_DAYS))
        .format("%Y-%m-%d")
        .to_string()
}

/// Turn a NewsAPI response body into items. In location mode articles
/// without a description are skipped.
fn parse_articles(body: &str, take: usize, place: Option<&str>) -> Result<Vec<ContentItem>> {
    let resp: Response = serde_json::from_str(body).context("parsing newsapi json")?;
    if resp.status == "error" {
        anyhow::bail!(
            "newsapi error: {}",
            resp.message.unwrap_or_else(|| "unknown".into())
        );
    }

    let mut out = Vec::new();
    for a in resp.articles.into_iter().take(take) {
        let has_description = a.description.as_deref().is_some_and(|d| !d.trim().is_empty());
        if place.is_some() && !has_description {
            continue;
        }
        let text = clean_text(&join_title_body(a.title.as_deref(), a.description.as_deref()));
        if text.is_empty() {
            continue;
        }
        let mut item = ContentItem::new(Source::News, text);
        item.title = a.title.map(|t| clean_text(&t));
        item.url = a.url;
        item.location = place.map(str::to_string);
        item.published_at = a
            .published_at
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .and_then(|d| u64::try_from(d.timestamp()).ok());
        if let Some(name) = a.source.and_then(|s| s.name) {
            item = item.with_extra("outlet", serde_json::Value::String(name));
        }
        out.push(item);
    }
    Ok(out)
}

#[async_trait]
impl ContentSource for NewsApiSource {
    async fn fetch(&self, req: &FetchRequest) -> Result<Vec<ContentItem>> {
        let Some((q, take)) = shape_query(req) else {
            return Ok(Vec::new());
        };
        let from = date_from(Utc::now());

        let body = self
            .http
            .get(&self.base_url)
            .query(&[
                ("q", q.as_str()),
                ("from", from.as_str()),
                ("sortBy", "relevancy"),
                ("language", "en"),
            ])
            .header("X-Api-Key", &self.api_key)
            .send()
            .await
            .context("newsapi request")?
            .text()
            .await
            .context("newsapi body")?;

        let place = req.location.as_ref().map(|l| l.formatted_address.as_str());
        parse_articles(&body, take, place)
    }

    fn name(&self) -> &'static str {
        "newsapi"
    }
}
