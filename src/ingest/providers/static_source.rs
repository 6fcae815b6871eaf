// src/ingest/providers/static_source.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::ingest::clean_text;
use crate::ingest::types::{ContentSource, FetchRequest};
use crate::model::{ContentItem, Source};

/// One exported app-store review. Unknown fields (stars, app version, ...)
/// land in `extra`.
#[derive(Debug, Deserialize)]
struct ReviewRecord {
    #[serde(alias = "content")]
    text: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    published_at: Option<u64>,
    #[serde(flatten)]
    extra: BTreeMap<String, serde_json::Value>,
}

/// Fixed list of items, e.g. app-store reviews exported to JSON.
/// Ignores the query; honors `limit` and stamps the location in location mode.
#[derive(Debug, Clone)]
pub struct StaticSource {
    name: &'static str,
    items: Vec<ContentItem>,
}

impl StaticSource {
    pub fn new(name: &'static str, items: Vec<ContentItem>) -> Self {
        Self { name, items }
    }

    /// Load a JSON array of `ContentItem`.
    pub fn from_json_file<P: AsRef<Path>>(name: &'static str, path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("reading items from {}", path.display()))?;
        let items: Vec<ContentItem> = serde_json::from_str(&data)
            .with_context(|| format!("parsing items json {}", path.display()))?;
        Ok(Self::new(name, items))
    }

    /// Load a JSON array of exported reviews as [`Source::Review`] items
    /// named `"reviews"`. Blank reviews are dropped.
    pub fn reviews_from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("reading reviews from {}", path.display()))?;
        let records: Vec<ReviewRecord> = serde_json::from_str(&data)
            .with_context(|| format!("parsing reviews json {}", path.display()))?;

        let items = records
            .into_iter()
            .filter_map(|r| {
                let text = clean_text(&r.text);
                if text.is_empty() {
                    return None;
                }
                let mut item = ContentItem::new(Source::Review, text);
                item.title = r.title;
                item.url = r.url;
                item.published_at = r.published_at;
                item.extra = r.extra;
                Some(item)
            })
            .collect();
        Ok(Self::new("reviews", items))
    }
}

#[async_trait]
impl ContentSource for StaticSource {
    async fn fetch(&self, req: &FetchRequest) -> Result<Vec<ContentItem>> {
        let place = req.location.as_ref().map(|l| l.formatted_address.clone());
        Ok(self
            .items
            .iter()
            .take(req.limit)
            .cloned()
            .map(|mut it| {
                if it.location.is_none() {
                    it.location = place.clone();
                }
                it
            })
            .collect())
    }

    fn name(&self) -> &'static str {
        self.name
    }
}
