// tests/pipeline_e2e.rs
//
// Whole-pipeline runs over in-memory sources and fake collaborators.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;

use opinion_pulse::analyze::summarizer::{SUMMARY_IRRELEVANT, SUMMARY_TOO_SHORT};
use opinion_pulse::analyze::{EmotionClassifier, NeutralEmotion, StaticSummarizer};
use opinion_pulse::geo::{LocationResolver, StaticResolver};
use opinion_pulse::ingest::providers::StaticSource;
use opinion_pulse::ingest::types::{ContentSource, FetchRequest};
use opinion_pulse::model::{ContentItem, EmotionResult, LocationInfo, Source};
use opinion_pulse::report::NO_CONTENT_SUMMARY;
use opinion_pulse::sentiment::label_for;
use opinion_pulse::{Pipeline, PipelineConfig};

const TEXTS: [&str; 10] = [
    "The Acme phone battery lasts two full days and charging is fast.",
    "Shipping took three weeks and the box arrived damaged.",
    "The Acme phone battery lasts two full days and charging is really fast.",
    "Customer support answered my ticket within an hour, very helpful.",
    "The camera struggles in low light and photos look grainy.",
    "The Acme phone battery lasts two full days, and charging is fast!",
    "Price is fair compared to rival flagships this year.",
    "The latest software update broke bluetooth pairing with my car.",
    "Screen brightness outdoors is excellent even at noon.",
    "I love the compact size, it fits in any pocket.",
];

/// Indices of `TEXTS` that survive deduplication (2 and 5 repeat 0).
const KEPT: [usize; 8] = [0, 1, 3, 4, 6, 7, 8, 9];

const RELEVANT_SUMMARY: &str =
    "The Acme phone battery lasts two full days while shipping took three weeks.";

fn items(source: Source, idx: std::ops::Range<usize>) -> Vec<ContentItem> {
    idx.map(|i| ContentItem::new(source, TEXTS[i]).with_title(format!("item {i}")))
        .collect()
}

fn fixture_pipeline(config: PipelineConfig) -> Pipeline {
    Pipeline::new(config)
        .with_source(Arc::new(StaticSource::new("news", items(Source::News, 0..4))))
        .with_source(Arc::new(StaticSource::new("social", items(Source::Social, 4..7))))
        .with_source(Arc::new(StaticSource::new("reviews", items(Source::Review, 7..10))))
}

fn fast_config() -> PipelineConfig {
    PipelineConfig {
        call_timeout_ms: 50,
        ..PipelineConfig::default()
    }
}

fn austin() -> LocationInfo {
    LocationInfo {
        input_location: "Austin".into(),
        formatted_address: "Austin, Travis County, Texas, United States".into(),
        country: Some("United States".into()),
        country_code: Some("US".into()),
        city: Some("Austin".into()),
        state: Some("Texas".into()),
        coordinates: Some((30.2672, -97.7431)),
    }
}

// ---- fakes ----

struct FailingEmotion;

#[async_trait]
impl EmotionClassifier for FailingEmotion {
    async fn classify(&self, _text: &str) -> Result<EmotionResult> {
        bail!("model unavailable")
    }
    fn name(&self) -> &'static str {
        "failing"
    }
}

struct SlowEmotion;

#[async_trait]
impl EmotionClassifier for SlowEmotion {
    async fn classify(&self, _text: &str) -> Result<EmotionResult> {
        tokio::time::sleep(Duration::from_millis(500)).await;
        Ok(EmotionResult {
            emotion: "joy".into(),
            confidence: 0.9,
        })
    }
    fn name(&self) -> &'static str {
        "slow"
    }
}

/// Panics on the camera review, answers "surprise" otherwise.
struct PanickyEmotion;

#[async_trait]
impl EmotionClassifier for PanickyEmotion {
    async fn classify(&self, text: &str) -> Result<EmotionResult> {
        if text.contains("camera") {
            panic!("classifier blew up");
        }
        Ok(EmotionResult {
            emotion: "surprise".into(),
            confidence: 0.7,
        })
    }
    fn name(&self) -> &'static str {
        "panicky"
    }
}

/// Shorter texts finish later, so completion order differs from input order.
struct JitterEmotion;

#[async_trait]
impl EmotionClassifier for JitterEmotion {
    async fn classify(&self, text: &str) -> Result<EmotionResult> {
        let delay = 80u64.saturating_sub(text.len() as u64);
        tokio::time::sleep(Duration::from_millis(delay)).await;
        Ok(EmotionResult::neutral())
    }
    fn name(&self) -> &'static str {
        "jitter"
    }
}

struct BrokenSource;

#[async_trait]
impl ContentSource for BrokenSource {
    async fn fetch(&self, _req: &FetchRequest) -> Result<Vec<ContentItem>> {
        bail!("upstream 503")
    }
    fn name(&self) -> &'static str {
        "broken"
    }
}

struct SlowResolver;

#[async_trait]
impl LocationResolver for SlowResolver {
    async fn resolve(&self, _location: &str) -> Option<LocationInfo> {
        tokio::time::sleep(Duration::from_millis(500)).await;
        Some(austin())
    }
    fn name(&self) -> &'static str {
        "slow"
    }
}

// ---- general mode ----

#[tokio::test]
async fn near_duplicates_are_dropped_and_counts_follow() {
    let p = fixture_pipeline(PipelineConfig::default()).with_emotion(Arc::new(NeutralEmotion));
    let r = p.analyze("acme phone", None).await;

    assert!(r.error.is_none(), "{:?}", r.error);
    let texts: Vec<&str> = r.items.iter().map(|a| a.item.text.as_str()).collect();
    let expected: Vec<&str> = KEPT.iter().map(|&i| TEXTS[i]).collect();
    assert_eq!(texts, expected);

    assert_eq!(r.sources.news, 3);
    assert_eq!(r.sources.social, 2);
    assert_eq!(r.sources.review, 3);
    assert_eq!(r.sources.total(), r.items.len());
}

#[tokio::test]
async fn overall_is_the_mean_of_item_scores() {
    let r = fixture_pipeline(PipelineConfig::default())
        .analyze("acme phone", None)
        .await;

    let mean = r
        .items
        .iter()
        .map(|a| f64::from(a.sentiment.score))
        .sum::<f64>()
        / r.items.len() as f64;
    assert!((r.overall.score - mean).abs() < 1e-9);
    assert_eq!(r.overall.label, label_for(mean));
    assert!(r.items.iter().all(|a| a.sentiment.score <= 100));
    assert!((0.0..=1.0).contains(&r.trend.confidence));
}

#[tokio::test]
async fn aspect_keys_follow_the_general_defaults() {
    let r = fixture_pipeline(PipelineConfig::default())
        .analyze("acme phone", None)
        .await;

    let keys: Vec<String> = r.aspects.keys().cloned().collect();
    let mut expected = PipelineConfig::default().default_aspects;
    expected.sort();
    assert_eq!(keys, expected);

    // "Price is fair ..." is the only item mentioning price
    let price = &r.aspects["price"];
    assert_eq!(price.count, 1);
    assert!(price.avg_score > 0.0);
    assert_eq!(r.aspects["reliability"].count, 0);
}

#[tokio::test]
async fn results_keep_input_order_under_concurrency() {
    let config = PipelineConfig {
        workers: 8,
        ..PipelineConfig::default()
    };
    let r = fixture_pipeline(config)
        .with_emotion(Arc::new(JitterEmotion))
        .analyze("acme phone", None)
        .await;

    let texts: Vec<&str> = r.items.iter().map(|a| a.item.text.as_str()).collect();
    let expected: Vec<&str> = KEPT.iter().map(|&i| TEXTS[i]).collect();
    assert_eq!(texts, expected);
}

#[tokio::test]
async fn failing_classifier_falls_back_to_neutral() {
    let r = fixture_pipeline(fast_config())
        .with_emotion(Arc::new(FailingEmotion))
        .analyze("acme phone", None)
        .await;

    assert_eq!(r.items.len(), KEPT.len());
    assert!(r.items.iter().all(|a| a.emotion == EmotionResult::neutral()));
    assert_eq!(r.dominant_emotion, "neutral");
}

#[tokio::test]
async fn slow_classifier_times_out_to_neutral() {
    let r = fixture_pipeline(fast_config())
        .with_emotion(Arc::new(SlowEmotion))
        .analyze("acme phone", None)
        .await;

    assert!(r.items.iter().all(|a| a.emotion == EmotionResult::neutral()));
}

#[tokio::test]
async fn panicked_worker_degrades_only_its_item() {
    let p = fixture_pipeline(PipelineConfig::default()).with_emotion(Arc::new(PanickyEmotion));
    let r = p.analyze("acme phone", None).await;

    assert_eq!(r.items.len(), KEPT.len());
    for a in &r.items {
        if a.item.text.contains("camera") {
            assert_eq!(a.emotion, EmotionResult::neutral());
            assert_eq!(a.sentiment, p.scorer().score(&a.item.text));
        } else {
            assert_eq!(a.emotion.emotion, "surprise");
        }
    }
    assert_eq!(r.dominant_emotion, "surprise");
}

#[tokio::test]
async fn failing_source_does_not_block_the_others() {
    let r = Pipeline::new(fast_config())
        .with_source(Arc::new(BrokenSource))
        .with_source(Arc::new(StaticSource::new("news", items(Source::News, 6..9))))
        .analyze("acme phone", None)
        .await;

    assert!(r.error.is_none());
    assert_eq!(r.items.len(), 3);
    assert_eq!(r.sources.news, 3);
}

#[tokio::test]
async fn exported_reviews_are_counted_as_reviews() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("reviews.json");
    std::fs::write(
        &path,
        r#"[
            {"content":"Checkout keeps crashing since the last update","score":1},
            {"content":"Fast delivery tracking and a clean, friendly design","score":5}
        ]"#,
    )
    .expect("write reviews");

    let r = Pipeline::new(fast_config())
        .with_source(Arc::new(
            StaticSource::reviews_from_json_file(&path).expect("load reviews"),
        ))
        .with_emotion(Arc::new(NeutralEmotion))
        .analyze("acme app", None)
        .await;

    assert!(r.error.is_none(), "{:?}", r.error);
    assert_eq!(r.sources.review, 2);
    assert_eq!(r.sources.news + r.sources.social, 0);
    assert!(r.items.iter().all(|a| a.item.source == Source::Review));
}

#[tokio::test]
async fn only_failing_sources_means_no_content() {
    let r = Pipeline::new(fast_config())
        .with_source(Arc::new(BrokenSource))
        .analyze("acme phone", None)
        .await;

    assert_eq!(r.error.as_deref(), Some("No content found for acme phone"));
    assert_eq!(r.summary, NO_CONTENT_SUMMARY);
    assert_eq!(r.overall.score, 50.0);
}

// ---- summaries ----

#[tokio::test]
async fn relevant_summary_is_kept_and_annotated() {
    let r = fixture_pipeline(PipelineConfig::default())
        .with_emotion(Arc::new(NeutralEmotion))
        .with_summarizer(Arc::new(StaticSummarizer::new(RELEVANT_SUMMARY)))
        .analyze("acme phone", None)
        .await;

    assert!(r.summary.starts_with(RELEVANT_SUMMARY), "{}", r.summary);
    let expected_tail = format!(
        "\n\nOverall Sentiment: {} ({:.1}/100)\nDominant Emotion: Neutral\nTrend: {} (Confidence: {:.2})",
        r.overall.label.as_str(),
        r.overall.score,
        r.trend.direction.as_str(),
        r.trend.confidence,
    );
    assert!(r.summary.ends_with(&expected_tail), "{}", r.summary);
}

#[tokio::test]
async fn irrelevant_summary_is_replaced_by_error_text() {
    let r = fixture_pipeline(PipelineConfig::default())
        .with_summarizer(Arc::new(StaticSummarizer::new(
            "Quantum chromodynamics describes gluon interactions inside hadrons.",
        )))
        .analyze("acme phone", None)
        .await;

    assert!(r.summary.starts_with(SUMMARY_IRRELEVANT), "{}", r.summary);
    assert!(r.summary.contains("\nDominant Emotion: "));
}

#[tokio::test]
async fn short_summary_is_replaced_by_error_text() {
    let r = fixture_pipeline(PipelineConfig::default())
        .with_summarizer(Arc::new(StaticSummarizer::new("Acme phone.")))
        .analyze("acme phone", None)
        .await;

    assert!(r.summary.starts_with(SUMMARY_TOO_SHORT), "{}", r.summary);
}

#[tokio::test]
async fn disabled_summarizer_reports_the_failure() {
    let r = fixture_pipeline(PipelineConfig::default())
        .analyze("acme phone", None)
        .await;

    assert!(
        r.summary
            .starts_with("Error generating summary: summarizer disabled"),
        "{}",
        r.summary
    );
    assert!(r.summary.contains("\n\nOverall Sentiment: "));
    assert!(r.summary.contains("\nTrend: "));
}

// ---- location mode ----

#[tokio::test]
async fn known_location_scopes_the_report() {
    let p = fixture_pipeline(PipelineConfig::default())
        .with_resolver(Arc::new(StaticResolver::new().with("austin", austin())))
        .with_summarizer(Arc::new(StaticSummarizer::new(RELEVANT_SUMMARY)));
    let r = p.analyze("acme phone", Some("Austin")).await;

    assert!(r.error.is_none());
    assert_eq!(r.location_info, Some(austin()));
    assert!(r
        .items
        .iter()
        .all(|a| a.item.location.as_deref() == Some("Austin, Travis County, Texas, United States")));
    assert!(r.summary.starts_with(
        "The following summary is based on content from Austin, Travis County, Texas, United States."
    ));
    assert!(r.summary.contains(RELEVANT_SUMMARY));

    let keys: Vec<String> = r.aspects.keys().cloned().collect();
    let mut expected = p.config().location_aspects.clone();
    expected.sort();
    assert_eq!(keys, expected);
    for a in &r.items {
        assert!(a.aspects.keys().all(|k| expected.contains(k)));
    }
}

#[tokio::test]
async fn unknown_location_is_an_error_report() {
    let r = fixture_pipeline(PipelineConfig::default())
        .with_resolver(Arc::new(StaticResolver::new().with("austin", austin())))
        .analyze("acme phone", Some("Atlantis"))
        .await;

    assert_eq!(
        r.error.as_deref(),
        Some("Could not find location information for Atlantis")
    );
    assert_eq!(r.summary, "");
    assert!(r.items.is_empty());
    assert!(r.location_info.is_none());
}

#[tokio::test]
async fn location_without_content_names_the_place() {
    let r = Pipeline::new(PipelineConfig::default())
        .with_resolver(Arc::new(StaticResolver::new().with("austin", austin())))
        .analyze("acme phone", Some("Austin"))
        .await;

    assert_eq!(
        r.error.as_deref(),
        Some("No content found for acme phone in Austin")
    );
    assert_eq!(r.summary, NO_CONTENT_SUMMARY);
    assert_eq!(r.location_info, Some(austin()));
}

#[tokio::test]
async fn slow_resolver_treats_input_as_country() {
    let r = fixture_pipeline(fast_config())
        .with_resolver(Arc::new(SlowResolver))
        .analyze("acme phone", Some("Norway"))
        .await;

    let info = r.location_info.expect("location info");
    assert_eq!(info.input_location, "Norway");
    assert_eq!(info.country.as_deref(), Some("Norway"));
    assert!(info.city.is_none());
    assert!(r.items.iter().all(|a| a.item.location.as_deref() == Some("Norway")));
}
