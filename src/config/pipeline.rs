// src/config/pipeline.rs
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, path::PathBuf};

use crate::dedup::DEFAULT_DUP_THRESHOLD;
use crate::normalize::NormalizerMode;
use crate::sentiment::EnsembleWeights;
use crate::trend::{DEFAULT_DELTA_THRESHOLD, DEFAULT_WINDOW};

pub const DEFAULT_PIPELINE_CONFIG_PATH: &str = "config/pipeline.toml";

pub const ENV_PIPELINE_CONFIG_PATH: &str = "PIPELINE_CONFIG_PATH";
pub const ENV_PIPELINE_WORKERS: &str = "PIPELINE_WORKERS";
pub const ENV_PIPELINE_DEDUP_THRESHOLD: &str = "PIPELINE_DEDUP_THRESHOLD";
pub const ENV_PIPELINE_TREND_WINDOW: &str = "PIPELINE_TREND_WINDOW";
/// Comma-separated paths to app-review JSON exports.
pub const ENV_PIPELINE_REVIEW_FILES: &str = "PIPELINE_REVIEW_FILES";
/// Comma-separated RSS feed URLs.
pub const ENV_PIPELINE_RSS_FEEDS: &str = "PIPELINE_RSS_FEEDS";

const DEFAULT_WORKERS: usize = 5;
const MAX_WORKERS: usize = 32;
const DEFAULT_CALL_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_FETCH_LIMIT: usize = 50;
/// ~512 model tokens at four characters each.
const DEFAULT_SUMMARY_MAX_CHARS: usize = 2048;

/// Everything tunable about one pipeline instance. Passed in at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub weights: EnsembleWeights,
    pub normalizer: NormalizerMode,
    /// Cosine similarity above which a later item counts as a duplicate.
    pub dedup_threshold: f64,
    pub trend_window: usize,
    /// Dead band for the rolling-mean delta.
    pub trend_delta: f64,
    /// Upper bound on concurrent per-item analyses.
    pub workers: usize,
    /// Timeout for every external call (fetch, classify, summarize).
    pub call_timeout_ms: u64,
    /// Items requested from each content source.
    pub fetch_limit: usize,
    pub summary_max_chars: usize,
    pub summary_min_words: usize,
    pub summary_min_overlap: usize,
    pub default_aspects: Vec<String>,
    pub location_aspects: Vec<String>,
    /// App-review exports served as review content on every query.
    pub review_files: Vec<PathBuf>,
    /// RSS 2.0 feeds searched as extra news sources.
    pub rss_feeds: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            weights: EnsembleWeights::default(),
            normalizer: NormalizerMode::default(),
            dedup_threshold: DEFAULT_DUP_THRESHOLD,
            trend_window: DEFAULT_WINDOW,
            trend_delta: DEFAULT_DELTA_THRESHOLD,
            workers: DEFAULT_WORKERS,
            call_timeout_ms: DEFAULT_CALL_TIMEOUT_MS,
            fetch_limit: DEFAULT_FETCH_LIMIT,
            summary_max_chars: DEFAULT_SUMMARY_MAX_CHARS,
            summary_min_words: 5,
            summary_min_overlap: 5,
            default_aspects: to_strings(&["price", "features", "reliability", "support"]),
            location_aspects: to_strings(&["impact", "local_response", "public_opinion", "concerns"]),
            review_files: Vec::new(),
            rss_feeds: Vec::new(),
        }
    }
}

fn to_strings(v: &[&str]) -> Vec<String> {
    v.iter().map(|s| s.to_string()).collect()
}

impl PipelineConfig {
    /// Load using `PIPELINE_CONFIG_PATH` or `config/pipeline.toml`.
    /// A missing file means defaults; a malformed one is an error.
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var(ENV_PIPELINE_CONFIG_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_PIPELINE_CONFIG_PATH));

        let mut cfg = if path.exists() {
            Self::load_from_file(&path)?
        } else {
            tracing::info!(path = %path.display(), "pipeline config not found; using defaults");
            Self::default()
        };

        cfg.apply_env_overrides();
        cfg.sanitize();
        Ok(cfg)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading pipeline config from {}", path.display()))?;
        let mut cfg = Self::from_toml_str(&data)
            .with_context(|| format!("parsing pipeline config {}", path.display()))?;
        cfg.sanitize();
        Ok(cfg)
    }

    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Env wins over file values; unparsable env values are ignored.
    pub fn apply_env_overrides(&mut self) {
        if let Some(w) = parse_env::<usize>(ENV_PIPELINE_WORKERS) {
            self.workers = w;
        }
        if let Some(t) = parse_env::<f64>(ENV_PIPELINE_DEDUP_THRESHOLD) {
            self.dedup_threshold = t;
        }
        if let Some(w) = parse_env::<usize>(ENV_PIPELINE_TREND_WINDOW) {
            self.trend_window = w;
        }
        if let Some(files) = parse_env_list(ENV_PIPELINE_REVIEW_FILES) {
            self.review_files = files.into_iter().map(PathBuf::from).collect();
        }
        if let Some(feeds) = parse_env_list(ENV_PIPELINE_RSS_FEEDS) {
            self.rss_feeds = feeds;
        }
    }

    /// Replace out-of-range values with defaults.
    pub fn sanitize(&mut self) {
        let d = Self::default();
        if !(0.0..=1.0).contains(&self.dedup_threshold) {
            self.dedup_threshold = d.dedup_threshold;
        }
        if !self.trend_delta.is_finite() || self.trend_delta < 0.0 {
            self.trend_delta = d.trend_delta;
        }
        if self.trend_window == 0 {
            self.trend_window = d.trend_window;
        }
        if self.workers == 0 {
            self.workers = d.workers;
        }
        self.workers = self.workers.min(MAX_WORKERS);
        if self.call_timeout_ms == 0 {
            self.call_timeout_ms = d.call_timeout_ms;
        }
        if self.summary_max_chars == 0 {
            self.summary_max_chars = d.summary_max_chars;
        }
        if !self.weights.primary.is_finite() || !self.weights.secondary.is_finite() {
            self.weights = d.weights;
        }
        self.rss_feeds.retain(|u| !u.trim().is_empty());
        self.review_files.retain(|p| !p.as_os_str().is_empty());
    }

    pub fn call_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.call_timeout_ms)
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse::<T>().ok())
}

/// Comma-separated list; blank entries are skipped. Unset means "keep file value".
fn parse_env_list(key: &str) -> Option<Vec<String>> {
    let raw = std::env::var(key).ok()?;
    Some(
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
    )
}
