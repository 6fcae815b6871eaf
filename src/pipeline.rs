//! # Pipeline
//! One query end to end: resolve location (optional) → fetch → deduplicate →
//! per-item analysis on a bounded worker pool → aggregate → summarize → trend.
//!
//! Nothing here fails outward. Collaborator errors and timeouts degrade to
//! defaults (empty fetch, neutral emotion, error text in the summary) and the
//! caller always gets a complete [`AnalysisReport`].

use metrics::{counter, gauge, histogram};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;

use crate::analyze::summarizer::{build_prompt, truncated_corpus, validate_summary};
use crate::analyze::{
    DisabledSummarizer, EmotionClassifier, GeminiSummarizer, GenerativeSummarizer,
    HuggingFaceEmotion, KeywordEmotion,
};
use crate::aspects::aspect_sentiment;
use crate::config::{CollaboratorConfig, PipelineConfig};
use crate::dedup::deduplicate_with;
use crate::geo::{location_context, LocationResolver, NominatimResolver};
use crate::ingest::providers::{NewsApiSource, RedditSource, RssSource, StaticSource};
use crate::ingest::types::{ContentSource, FetchRequest};
use crate::ingest::fetch_all;
use crate::metrics::{
    ensure_described, ANALYZE_MS, EMOTION_FALLBACK_TOTAL, ITEMS_DEDUPED_TOTAL, LAST_RUN_TS,
    QUERIES_TOTAL, SUMMARY_REJECTED_TOTAL,
};
use crate::model::{AnalysisReport, AnalyzedItem, ContentItem, EmotionResult, LocationInfo, SourceCounts};
use crate::report::{
    aggregate_aspects, annotate_summary, dominant_emotion, overall_sentiment, NO_CONTENT_SUMMARY,
};
use crate::sentiment::SentimentScorer;
use crate::trend::predict_trend_with;

/// Short stable id for log lines; raw text never goes to the logs.
pub(crate) fn anon_hash(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let digest = Sha256::digest(text.as_bytes());
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

/// Query orchestrator. Cheap to share behind an `Arc`; holds no per-query state.
pub struct Pipeline {
    config: PipelineConfig,
    scorer: Arc<SentimentScorer>,
    sources: Vec<Arc<dyn ContentSource>>,
    emotion: Arc<dyn EmotionClassifier>,
    summarizer: Arc<dyn GenerativeSummarizer>,
    resolver: Option<Arc<dyn LocationResolver>>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("config", &self.config)
            .field("sources", &self.sources.iter().map(|s| s.name()).collect::<Vec<_>>())
            .field("emotion", &self.emotion.name())
            .field("summarizer", &self.summarizer.name())
            .field("resolver", &self.resolver.as_ref().map(|r| r.name()))
            .finish()
    }
}

impl Pipeline {
    /// Bare pipeline with keyword emotions and a disabled summarizer; add
    /// sources with [`with_source`](Self::with_source).
    pub fn new(config: PipelineConfig) -> Self {
        let scorer = SentimentScorer::new(config.weights, config.normalizer);
        Self {
            config,
            scorer: Arc::new(scorer),
            sources: Vec::new(),
            emotion: Arc::new(KeywordEmotion),
            summarizer: Arc::new(DisabledSummarizer),
            resolver: None,
        }
    }

    /// Wire the networked adapters whose credentials are present, plus the
    /// configured RSS feeds and review exports.
    pub fn from_collaborators(
        config: PipelineConfig,
        collab: &CollaboratorConfig,
    ) -> anyhow::Result<Self> {
        let rss_feeds = config.rss_feeds.clone();
        let review_files = config.review_files.clone();
        let mut p = Self::new(config);

        if let Some(key) = &collab.news_api_key {
            p = p.with_source(Arc::new(NewsApiSource::new(key)?));
        } else {
            tracing::warn!(target: "collab", "NEWS_API_KEY not set; news source disabled");
        }
        p = p.with_source(Arc::new(RedditSource::new(&collab.reddit_user_agent)?));

        for url in &rss_feeds {
            p = p.with_source(Arc::new(RssSource::from_url("rss", url)?));
        }
        for path in &review_files {
            match StaticSource::reviews_from_json_file(path) {
                Ok(reviews) => p = p.with_source(Arc::new(reviews)),
                Err(e) => tracing::warn!(
                    target: "collab",
                    path = %path.display(),
                    error = %e,
                    "review file unreadable; skipping"
                ),
            }
        }

        if let Some(key) = &collab.gemini_api_key {
            p = p.with_summarizer(Arc::new(GeminiSummarizer::new(key)?));
        }
        if let Some(token) = &collab.hf_api_token {
            p = p.with_emotion(Arc::new(HuggingFaceEmotion::new(token)?));
        }
        p = p.with_resolver(Arc::new(NominatimResolver::new(&collab.geocoder_user_agent)?));

        tracing::info!(target: "collab", pipeline = ?p, "collaborators wired");
        Ok(p)
    }

    /// Sources are fetched concurrently but concatenated in the order added.
    pub fn with_source(mut self, source: Arc<dyn ContentSource>) -> Self {
        self.sources.push(source);
        self
    }

    pub fn with_emotion(mut self, emotion: Arc<dyn EmotionClassifier>) -> Self {
        self.emotion = emotion;
        self
    }

    pub fn with_summarizer(mut self, summarizer: Arc<dyn GenerativeSummarizer>) -> Self {
        self.summarizer = summarizer;
        self
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn LocationResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn with_scorer(mut self, scorer: SentimentScorer) -> Self {
        self.scorer = Arc::new(scorer);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn scorer(&self) -> &SentimentScorer {
        &self.scorer
    }

    /// Analyze `query`, optionally scoped to a place, with the default aspects
    /// of the mode.
    pub async fn analyze(&self, query: &str, location: Option<&str>) -> AnalysisReport {
        self.analyze_with_aspects(query, location, None).await
    }

    pub async fn analyze_with_aspects(
        &self,
        query: &str,
        location: Option<&str>,
        aspects: Option<&[String]>,
    ) -> AnalysisReport {
        ensure_described();
        counter!(QUERIES_TOTAL).increment(1);
        let t0 = Instant::now();

        let report = self.run(query.trim(), location, aspects).await;

        histogram!(ANALYZE_MS).record(t0.elapsed().as_secs_f64() * 1_000.0);
        gauge!(LAST_RUN_TS).set(chrono::Utc::now().timestamp() as f64);
        tracing::info!(
            target: "pipeline",
            query_id = %anon_hash(&report.query),
            items = report.items.len(),
            overall = report.overall.score,
            error = report.error.as_deref().unwrap_or(""),
            "query analyzed"
        );
        report
    }

    async fn run(
        &self,
        query: &str,
        location: Option<&str>,
        aspects: Option<&[String]>,
    ) -> AnalysisReport {
        let timeout = self.config.call_timeout();

        // 1) location
        let location = location.map(str::trim).filter(|l| !l.is_empty());
        let mut location_info: Option<LocationInfo> = None;
        if let Some(loc) = location {
            match &self.resolver {
                Some(r) => match tokio::time::timeout(timeout, r.resolve(loc)).await {
                    Ok(Some(info)) => location_info = Some(info),
                    Ok(None) => {
                        return AnalysisReport::failed(
                            query,
                            format!("Could not find location information for {loc}"),
                            "",
                        );
                    }
                    Err(_) => {
                        tracing::warn!(target: "collab", resolver = r.name(), "location lookup timed out; treating input as country");
                        location_info = Some(LocationInfo::unresolved(loc));
                    }
                },
                None => {
                    tracing::warn!(target: "pipeline", "location given but no resolver attached; running general analysis");
                }
            }
        }

        // 2) fetch
        let mut req = FetchRequest::new(query, self.config.fetch_limit);
        if let Some(info) = &location_info {
            req = req.with_location(info.clone());
        }
        let fetched = fetch_all(&self.sources, &req, timeout).await;

        // 3) dedup
        let texts: Vec<&str> = fetched.iter().map(|i| i.text.as_str()).collect();
        let keep = deduplicate_with(&texts, self.config.dedup_threshold);
        counter!(ITEMS_DEDUPED_TOTAL).increment((fetched.len() - keep.len()) as u64);
        let mut items: Vec<ContentItem> = Vec::with_capacity(keep.len());
        let mut fetched: Vec<Option<ContentItem>> = fetched.into_iter().map(Some).collect();
        for i in keep {
            if let Some(it) = fetched[i].take() {
                items.push(it);
            }
        }

        if items.is_empty() {
            let error = match &location_info {
                Some(info) => format!("No content found for {query} in {}", info.input_location),
                None => format!("No content found for {query}"),
            };
            let mut report = AnalysisReport::failed(query, error, NO_CONTENT_SUMMARY);
            report.location_info = location_info;
            return report;
        }

        if let Some(info) = &location_info {
            for it in &mut items {
                it.location = Some(info.formatted_address.clone());
            }
        }

        // 4) per-item analysis
        let aspect_names: Vec<String> = match (aspects, &location_info) {
            (Some(a), _) => a.to_vec(),
            (None, Some(_)) => self.config.location_aspects.clone(),
            (None, None) => self.config.default_aspects.clone(),
        };
        let analyzed = self.analyze_items(items, &aspect_names).await;

        // 5) aggregate + trend
        let overall = overall_sentiment(&analyzed);
        let dominant = dominant_emotion(&analyzed);
        let scores: Vec<u8> = analyzed.iter().map(|a| a.sentiment.score).collect();
        let trend = predict_trend_with(&scores, self.config.trend_window, self.config.trend_delta);
        let aspect_aggs = aggregate_aspects(&analyzed, &aspect_names);
        let sources = SourceCounts::tally(analyzed.iter().map(|a| &a.item.source));

        // 6) summary
        let body = self.summary_body(&analyzed).await;
        let mut summary = annotate_summary(&body, &overall, &dominant, &trend);
        if let Some(info) = &location_info {
            summary = format!("{}\n\n{summary}", location_context(info));
        }

        AnalysisReport {
            query: query.to_string(),
            location_info,
            items: analyzed,
            overall,
            dominant_emotion: dominant,
            trend,
            aspects: aspect_aggs,
            sources,
            summary,
            error: None,
        }
    }

    /// Fan out over at most `workers` tasks; results come back in input order.
    async fn analyze_items(&self, items: Vec<ContentItem>, aspects: &[String]) -> Vec<AnalyzedItem> {
        let sem = Arc::new(Semaphore::new(self.config.workers.max(1)));
        let aspects: Arc<Vec<String>> = Arc::new(aspects.to_vec());
        let timeout = self.config.call_timeout();

        let handles: Vec<_> = items
            .iter()
            .cloned()
            .map(|item| {
                let sem = Arc::clone(&sem);
                let scorer = Arc::clone(&self.scorer);
                let emotion = Arc::clone(&self.emotion);
                let aspects = Arc::clone(&aspects);
                tokio::spawn(async move {
                    // the semaphore is never closed
                    let _permit = sem.acquire_owned().await.ok();
                    analyze_item(item, &scorer, emotion.as_ref(), &aspects, timeout).await
                })
            })
            .collect();

        let joined = futures::future::join_all(handles).await;
        joined
            .into_iter()
            .zip(items)
            .map(|(res, item)| match res {
                Ok(done) => done,
                Err(e) => {
                    tracing::warn!(target: "pipeline", error = %e, item_id = %anon_hash(&item.text), "item worker failed; degrading");
                    counter!(EMOTION_FALLBACK_TOTAL).increment(1);
                    degraded_item(item, &self.scorer, &aspects)
                }
            })
            .collect()
    }

    async fn summary_body(&self, items: &[AnalyzedItem]) -> String {
        let corpus = truncated_corpus(
            items.iter().map(|a| a.item.text.as_str()),
            self.config.summary_max_chars,
        );
        let prompt = build_prompt(&corpus);
        let timeout = self.config.call_timeout();

        match tokio::time::timeout(timeout, self.summarizer.summarize(&prompt)).await {
            Ok(Ok(text)) => match validate_summary(
                &text,
                &corpus,
                self.config.summary_min_words,
                self.config.summary_min_overlap,
            ) {
                Ok(accepted) => accepted,
                Err(reason) => {
                    counter!(SUMMARY_REJECTED_TOTAL).increment(1);
                    tracing::info!(target: "pipeline", summarizer = self.summarizer.name(), reason, "summary rejected");
                    reason.to_string()
                }
            },
            Ok(Err(e)) => {
                tracing::warn!(target: "collab", error = ?e, summarizer = self.summarizer.name(), "summarizer error");
                format!("Error generating summary: {e}")
            }
            Err(_) => {
                tracing::warn!(target: "collab", summarizer = self.summarizer.name(), "summarizer timed out");
                format!("Error generating summary: timed out after {} ms", timeout.as_millis())
            }
        }
    }
}

async fn analyze_item(
    item: ContentItem,
    scorer: &SentimentScorer,
    emotion: &dyn EmotionClassifier,
    aspects: &[String],
    timeout: Duration,
) -> AnalyzedItem {
    let sentiment = scorer.score(&item.text);
    let aspect_map = aspect_sentiment(scorer, &item.text, aspects);

    let emotion = match tokio::time::timeout(timeout, emotion.classify(&item.text)).await {
        Ok(Ok(e)) => e,
        Ok(Err(e)) => {
            tracing::warn!(target: "collab", error = ?e, classifier = emotion.name(), item_id = %anon_hash(&item.text), "emotion error; using neutral");
            counter!(EMOTION_FALLBACK_TOTAL).increment(1);
            EmotionResult::neutral()
        }
        Err(_) => {
            tracing::warn!(target: "collab", classifier = emotion.name(), item_id = %anon_hash(&item.text), "emotion timed out; using neutral");
            counter!(EMOTION_FALLBACK_TOTAL).increment(1);
            EmotionResult::neutral()
        }
    };

    AnalyzedItem {
        item,
        sentiment,
        emotion,
        aspects: aspect_map,
    }
}

/// Local-only analysis for an item whose worker died.
fn degraded_item(item: ContentItem, scorer: &SentimentScorer, aspects: &[String]) -> AnalyzedItem {
    let sentiment = scorer.score(&item.text);
    let aspect_map = aspect_sentiment(scorer, &item.text, aspects);
    AnalyzedItem {
        item,
        sentiment,
        emotion: EmotionResult::neutral(),
        aspects: aspect_map,
    }
}
