//! model.rs: shared data shapes for items, per-item results and the final report.
//!
//! Everything here is plain data: built by the pipeline, serialized by the API,
//! never persisted.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Where a content item came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    News,
    Social,
    Review,
}

/// One fetched piece of text. Read-only once a source hands it over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub source: Source,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Unix seconds, when the provider knows it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<u64>,
    /// Provider-specific leftovers (subreddit, upvotes, app version, ...).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl ContentItem {
    pub fn new(source: Source, text: impl Into<String>) -> Self {
        Self {
            source,
            title: None,
            text: text.into(),
            url: None,
            location: None,
            published_at: None,
            extra: BTreeMap::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_extra(mut self, key: &str, value: serde_json::Value) -> Self {
        self.extra.insert(key.to_string(), value);
        self
    }
}

/// Coarse sentiment bucket derived from a 0..=100 score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Label {
    Negative,
    Neutral,
    Positive,
}

impl Label {
    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Negative => "Negative",
            Label::Neutral => "Neutral",
            Label::Positive => "Positive",
        }
    }
}

/// Raw estimator outputs, both in [-1, 1].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RawScores {
    pub primary: f64,
    pub secondary: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentResult {
    pub score: u8,
    pub label: Label,
    pub raw: RawScores,
}

/// Sentence-level evidence for one aspect inside one item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AspectResult {
    pub avg_score: f64,
    pub mention_count: usize,
    pub sample_text: Option<String>,
}

/// Aspect name → evidence. A missing key means "no evidence".
pub type AspectMap = BTreeMap<String, AspectResult>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrendDirection {
    Upward,
    Downward,
    Stable,
    InsufficientData,
}

impl TrendDirection {
    /// Wording used in report summaries.
    pub fn as_str(&self) -> &'static str {
        match self {
            TrendDirection::Upward => "Upward",
            TrendDirection::Downward => "Downward",
            TrendDirection::Stable => "Stable",
            TrendDirection::InsufficientData => "Insufficient data",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendResult {
    pub direction: TrendDirection,
    pub confidence: f64,
}

impl TrendResult {
    pub fn insufficient() -> Self {
        Self {
            direction: TrendDirection::InsufficientData,
            confidence: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionResult {
    pub emotion: String,
    pub confidence: f64,
}

impl EmotionResult {
    /// Fallback used whenever the classifier is unavailable, slow or wrong.
    pub fn neutral() -> Self {
        Self {
            emotion: "neutral".to_string(),
            confidence: 1.0,
        }
    }
}

/// A content item plus everything the pipeline derived from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzedItem {
    #[serde(flatten)]
    pub item: ContentItem,
    pub sentiment: SentimentResult,
    pub emotion: EmotionResult,
    pub aspects: AspectMap,
}

/// Normalized place record produced by a location resolver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationInfo {
    pub input_location: String,
    pub formatted_address: String,
    pub country: Option<String>,
    pub country_code: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    /// `(latitude, longitude)`
    pub coordinates: Option<(f64, f64)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverallSentiment {
    pub score: f64,
    pub label: Label,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AspectAggregate {
    pub avg_score: f64,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceCounts {
    pub news: usize,
    pub social: usize,
    pub review: usize,
}

impl SourceCounts {
    pub fn tally<'a>(sources: impl IntoIterator<Item = &'a Source>) -> Self {
        let mut c = Self::default();
        for s in sources {
            match s {
                Source::News => c.news += 1,
                Source::Social => c.social += 1,
                Source::Review => c.review += 1,
            }
        }
        c
    }

    pub fn total(&self) -> usize {
        self.news + self.social + self.review
    }
}

/// Final output of one query. Built once, returned, dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_info: Option<LocationInfo>,
    pub items: Vec<AnalyzedItem>,
    pub overall: OverallSentiment,
    pub dominant_emotion: String,
    pub trend: TrendResult,
    pub aspects: BTreeMap<String, AspectAggregate>,
    pub sources: SourceCounts,
    pub summary: String,
    /// Set when the query could not produce any analysis (no content, unknown place).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AnalysisReport {
    /// Empty report carrying an explanation instead of results.
    pub fn failed(query: &str, error: String, summary: &str) -> Self {
        Self {
            query: query.to_string(),
            location_info: None,
            items: Vec::new(),
            overall: OverallSentiment {
                score: 50.0,
                label: Label::Neutral,
            },
            dominant_emotion: EmotionResult::neutral().emotion,
            trend: TrendResult::insufficient(),
            aspects: BTreeMap::new(),
            sources: SourceCounts::default(),
            summary: summary.to_string(),
            error: Some(error),
        }
    }

    /// Items ordered by distance from the neutral midpoint, strongest first.
    /// Ties keep fetch order.
    pub fn top_by_impact(&self, n: usize) -> Vec<&AnalyzedItem> {
        let mut v: Vec<&AnalyzedItem> = self.items.iter().collect();
        v.sort_by_key(|it| std::cmp::Reverse((i16::from(it.sentiment.score) - 50).abs()));
        v.truncate(n);
        v
    }
}
