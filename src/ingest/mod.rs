// src/ingest/mod.rs
pub mod providers;
pub mod types;

use crate::ingest::types::{ContentSource, FetchRequest};
use crate::metrics::{ensure_described, ITEMS_FETCHED_TOTAL, SOURCE_ERRORS_TOTAL};
use crate::model::ContentItem;
use metrics::counter;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use std::time::Duration;

/// Longest item text kept, in chars.
pub const MAX_ITEM_CHARS: usize = 4000;

static RE_TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)</?[^>]+>").expect("tag regex"));
static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("ws regex"));

/// Clean provider text: decode entities, strip tags, ASCII quotes, collapse
/// whitespace, cap length. Sentence punctuation is kept for aspect splitting.
pub fn clean_text(s: &str) -> String {
    let decoded = html_escape::decode_html_entities(s);
    let stripped = RE_TAGS.replace_all(&decoded, " ");

    let quoted = stripped
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    let out = RE_WS.replace_all(&quoted, " ");
    let out = out.trim();

    if out.chars().count() > MAX_ITEM_CHARS {
        out.chars().take(MAX_ITEM_CHARS).collect()
    } else {
        out.to_string()
    }
}

/// `"<title> <body>"`, skipping whichever half is missing.
pub fn join_title_body(title: Option<&str>, body: Option<&str>) -> String {
    let title = title.map(str::trim).filter(|t| !t.is_empty());
    let body = body.map(str::trim).filter(|b| !b.is_empty());
    match (title, body) {
        (Some(t), Some(b)) => format!("{t} {b}"),
        (Some(t), None) => t.to_string(),
        (None, Some(b)) => b.to_string(),
        (None, None) => String::new(),
    }
}

/// Fetch from every source concurrently and concatenate in registration order.
///
/// A source that errors or exceeds `timeout` contributes nothing. Items with
/// blank text are dropped.
pub async fn fetch_all(
    sources: &[Arc<dyn ContentSource>],
    req: &FetchRequest,
    timeout: Duration,
) -> Vec<ContentItem> {
    ensure_described();

    let calls = sources.iter().map(|s| async move {
        let res = match tokio::time::timeout(timeout, s.fetch(req)).await {
            Ok(r) => r,
            Err(_) => Err(anyhow::anyhow!("timed out after {} ms", timeout.as_millis())),
        };
        (s.name(), res)
    });

    let mut out = Vec::new();
    for (name, res) in futures::future::join_all(calls).await {
        match res {
            Ok(items) => {
                let before = items.len();
                out.extend(items.into_iter().filter(|it| !it.text.trim().is_empty()));
                tracing::debug!(target: "sources", provider = name, fetched = before, "source done");
            }
            Err(e) => {
                tracing::warn!(target: "sources", error = ?e, provider = name, "provider error");
                counter!(SOURCE_ERRORS_TOTAL).increment(1);
            }
        }
    }

    counter!(ITEMS_FETCHED_TOTAL).increment(out.len() as u64);
    out
}
