//! Emotion classification for single items.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use crate::model::EmotionResult;

const HF_MODEL_URL: &str =
    "https://api-inference.huggingface.co/models/j-hartmann/emotion-english-distilroberta-base";
/// The model sees at most 512 tokens; no point sending more.
const MAX_INPUT_CHARS: usize = 2000;

#[async_trait]
pub trait EmotionClassifier: Send + Sync {
    async fn classify(&self, text: &str) -> Result<EmotionResult>;
    fn name(&self) -> &'static str;
}

// ---------- Hugging Face inference API ----------

#[derive(Debug, Deserialize)]
struct LabelScore {
    label: String,
    score: f64,
}

/// The API answers `[[{label, score}, ...]]` for single inputs, but some
/// deployments drop the outer array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum HfResponse {
    Nested(Vec<Vec<LabelScore>>),
    Flat(Vec<LabelScore>),
}

fn top_label(resp: HfResponse) -> Option<EmotionResult> {
    let scores = match resp {
        HfResponse::Nested(v) => v.into_iter().next()?,
        HfResponse::Flat(v) => v,
    };
    scores
        .into_iter()
        .filter(|s| s.score.is_finite())
        .max_by(|a, b| a.score.total_cmp(&b.score))
        .map(|s| EmotionResult {
            emotion: s.label.to_lowercase(),
            confidence: s.score.clamp(0.0, 1.0),
        })
}

pub struct HuggingFaceEmotion {
    http: reqwest::Client,
    token: String,
    url: String,
}

impl HuggingFaceEmotion {
    pub fn new(token: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("opinion-pulse/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(10))
            .build()
            .context("building emotion http client")?;
        Ok(Self {
            http,
            token: token.to_string(),
            url: HF_MODEL_URL.to_string(),
        })
    }
}

#[async_trait]
impl EmotionClassifier for HuggingFaceEmotion {
    async fn classify(&self, text: &str) -> Result<EmotionResult> {
        let input: String = text.chars().take(MAX_INPUT_CHARS).collect();
        let resp = self
            .http
            .post(&self.url)
            .bearer_auth(&self.token)
            .json(&serde_json::json!({ "inputs": input }))
            .send()
            .await
            .context("emotion request")?;

        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("emotion model returned {status}");
        }
        let body: HfResponse = resp.json().await.context("emotion json")?;
        top_label(body).ok_or_else(|| anyhow::anyhow!("emotion model returned no labels"))
    }

    fn name(&self) -> &'static str {
        "huggingface"
    }
}

// ---------- Local keyword fallback ----------

/// Cue words per label, in tie-break order.
const CUES: &[(&str, &[&str])] = &[
    (
        "joy",
        &[
            "love", "happy", "great", "awesome", "amazing", "excellent", "glad", "delighted",
            "enjoy", "fantastic", "wonderful", "excited", "pleased", "best",
        ],
    ),
    (
        "anger",
        &[
            "angry", "furious", "hate", "outraged", "annoyed", "annoying", "rage", "mad",
            "ridiculous", "unacceptable", "scam", "worst",
        ],
    ),
    (
        "sadness",
        &[
            "sad", "disappointed", "disappointing", "unhappy", "miss", "sorry", "regret",
            "depressing", "heartbreaking", "tragic", "lost",
        ],
    ),
    (
        "fear",
        &[
            "afraid", "scared", "fear", "worried", "worry", "anxious", "panic", "threat",
            "danger", "dangerous", "risk", "concern", "concerns",
        ],
    ),
    (
        "surprise",
        &["surprised", "surprising", "unexpected", "shocked", "shocking", "wow", "sudden"],
    ),
    (
        "disgust",
        &["disgusting", "gross", "awful", "horrible", "nasty", "filthy", "sick", "terrible"],
    ),
];

/// Keyword counting over seven labels (the six above plus neutral). Used when
/// no model token is configured. No cue words means neutral.
#[derive(Debug, Clone, Default)]
pub struct KeywordEmotion;

impl KeywordEmotion {
    pub fn detect(text: &str) -> EmotionResult {
        let lowered = text.to_lowercase();
        let words: Vec<&str> = lowered
            .split(|c: char| !c.is_alphanumeric() && c != '\'')
            .filter(|w| !w.is_empty())
            .collect();

        let hits: Vec<usize> = CUES
            .iter()
            .map(|(_, cues)| words.iter().filter(|w| cues.contains(*w)).count())
            .collect();
        let total: usize = hits.iter().sum();
        if total == 0 {
            return EmotionResult::neutral();
        }

        // first maximum wins ties
        let (best, best_hits) = hits
            .iter()
            .enumerate()
            .fold((0, 0), |acc, (i, &h)| if h > acc.1 { (i, h) } else { acc });
        EmotionResult {
            emotion: CUES[best].0.to_string(),
            confidence: best_hits as f64 / total as f64,
        }
    }
}

#[async_trait]
impl EmotionClassifier for KeywordEmotion {
    async fn classify(&self, text: &str) -> Result<EmotionResult> {
        Ok(Self::detect(text))
    }
    fn name(&self) -> &'static str {
        "keyword"
    }
}

/// Always `{neutral, 1.0}`.
#[derive(Debug, Clone, Default)]
pub struct NeutralEmotion;

#[async_trait]
impl EmotionClassifier for NeutralEmotion {
    async fn classify(&self, _text: &str) -> Result<EmotionResult> {
        Ok(EmotionResult::neutral())
    }
    fn name(&self) -> &'static str {
        "neutral"
    }
}
