// src/ingest/providers/reddit.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use crate::geo::location_subreddits;
use crate::ingest::types::{ContentSource, FetchRequest};
use crate::ingest::{clean_text, join_title_body};
use crate::model::{ContentItem, Source};

const REDDIT_URL: &str = "https://www.reddit.com";
/// Posts asked from each subreddit in location mode.
const PER_SUBREDDIT: usize = 15;

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<Child>,
}

#[derive(Debug, Deserialize)]
struct Child {
    data: Post,
}

#[derive(Debug, Deserialize)]
struct Post {
    title: Option<String>,
    #[serde(default)]
    selftext: String,
    permalink: Option<String>,
    #[serde(default)]
    score: i64,
    subreddit: Option<String>,
    created_utc: Option<f64>,
}

/// Reddit public search. `r/all` in general mode, location subreddits otherwise.
pub struct RedditSource {
    http: reqwest::Client,
    base_url: String,
}

impl RedditSource {
    pub fn new(user_agent: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()
            .context("building reddit http client")?;
        Ok(Self {
            http,
            base_url: REDDIT_URL.to_string(),
        })
    }

    async fn search(&self, subreddit: Option<&str>, query: &str, limit: usize) -> Result<String> {
        let url = match subreddit {
            Some(sr) => format!("{}/r/{sr}/search.json", self.base_url),
            None => format!("{}/search.json", self.base_url),
        };
        let limit = limit.to_string();
        let mut params = vec![("q", query), ("sort", "relevance"), ("limit", limit.as_str())];
        if subreddit.is_some() {
            params.push(("restrict_sr", "on"));
        }

        self.http
            .get(&url)
            .query(&params)
            .send()
            .await
            .with_context(|| format!("GET {url}"))?
            .error_for_status()?
            .text()
            .await
            .context("reading reddit body")
    }
}

/// Parse a search listing into social items.
fn parse_listing(body: &str, place: Option<&str>) -> Result<Vec<ContentItem>> {
    let listing: Listing = serde_json::from_str(body).context("parsing reddit json")?;
    let mut out = Vec::new();
    for Child { data: p } in listing.data.children {
        let text = clean_text(&join_title_body(p.title.as_deref(), Some(p.selftext.as_str())));
        if text.is_empty() {
            continue;
        }
        let mut item = ContentItem::new(Source::Social, text)
            .with_extra("score", serde_json::Value::from(p.score));
        item.title = p.title;
        item.url = p.permalink.map(|l| format!("https://reddit.com{l}"));
        item.location = place.map(str::to_string);
        item.published_at = p.created_utc.filter(|t| *t >= 0.0).map(|t| t as u64);
        if let Some(sr) = p.subreddit {
            item = item.with_extra("subreddit", serde_json::Value::String(sr));
        }
        out.push(item);
    }
    Ok(out)
}

#[async_trait]
impl ContentSource for RedditSource {
    async fn fetch(&self, req: &FetchRequest) -> Result<Vec<ContentItem>> {
        let Some(loc) = &req.location else {
            let body = self.search(None, &req.query, req.limit).await?;
            return parse_listing(&body, None);
        };

        let subs = location_subreddits(loc);
        let per = PER_SUBREDDIT.min(req.limit);
        let calls = subs.iter().map(|sr| self.search(Some(sr.as_str()), &req.query, per));
        let place = Some(loc.formatted_address.as_str());

        let mut out = Vec::new();
        for (sr, res) in subs.iter().zip(futures::future::join_all(calls).await) {
            // Many generated names do not exist; a miss is not worth a warning.
            match res.and_then(|body| parse_listing(&body, place)) {
                Ok(items) => out.extend(items),
                Err(e) => tracing::debug!(target: "sources", subreddit = %sr, error = %e, "subreddit skipped"),
            }
        }
        out.truncate(req.limit);
        Ok(out)
    }

    fn name(&self) -> &'static str {
        "reddit"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = r#"{"kind":"Listing","data":{"after":null,"children":[
        {"kind":"t3","data":{"title":"Acme battery is amazing","selftext":"Two days per charge.",
          "permalink":"/r/gadgets/comments/abc/acme/","score":412,"subreddit":"gadgets","created_utc":1756720800.0}},
        {"kind":"t3","data":{"title":"","selftext":"","permalink":"/r/x/1","score":1}},
        {"kind":"t3","data":{"title":"Acme support?","permalink":"/r/help/2","score":-3}}
    ]}}"#;

    #[test]
    fn parses_posts_and_drops_empty_ones() {
        let items = parse_listing(BODY, None).unwrap();
        assert_eq!(items.len(), 2);

        let first = &items[0];
        assert_eq!(first.source, Source::Social);
        assert_eq!(first.text, "Acme battery is amazing Two days per charge.");
        assert_eq!(
            first.url.as_deref(),
            Some("https://reddit.com/r/gadgets/comments/abc/acme/")
        );
        assert_eq!(first.published_at, Some(1_756_720_800));
        assert_eq!(first.extra["score"], 412);
        assert_eq!(first.extra["subreddit"], "gadgets");

        assert_eq!(items[1].text, "Acme support?");
        assert_eq!(items[1].extra["score"], -3);
    }

    #[test]
    fn place_is_stamped() {
        let items = parse_listing(BODY, Some("Lima, Peru")).unwrap();
        assert!(items.iter().all(|i| i.location.as_deref() == Some("Lima, Peru")));
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(parse_listing("<html>rate limited</html>", None).is_err());
    }
}
