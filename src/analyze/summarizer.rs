//! Narrative summaries: generator abstraction, prompt shaping and the checks a
//! generated summary has to pass before it reaches a report.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

pub const SUMMARY_TOO_SHORT: &str = "Error: Summary is too short or irrelevant.";
pub const SUMMARY_IRRELEVANT: &str = "Error: Summary appears irrelevant to input text.";

const GEMINI_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent";

const INSTRUCTIONS: &str = "Please summarize the following content in 3-5 lines, focusing on the key points. \
Ensure the summary is concise and covers the main aspects of the text. \
Do not generate content outside the context of the text.";

#[async_trait]
pub trait GenerativeSummarizer: Send + Sync {
    async fn summarize(&self, prompt: &str) -> Result<String>;
    fn name(&self) -> &'static str;
}

/// Space-joined item texts cut to `max_chars` characters.
pub fn truncated_corpus<'a>(texts: impl IntoIterator<Item = &'a str>, max_chars: usize) -> String {
    let joined = texts.into_iter().collect::<Vec<_>>().join(" ");
    joined.chars().take(max_chars).collect()
}

pub fn build_prompt(corpus: &str) -> String {
    format!("{INSTRUCTIONS}\n\n{corpus}")
}

/// Accept a generated summary only if it has at least `min_words` words and
/// shares at least `min_overlap` distinct lowercase tokens with `corpus`.
/// Otherwise returns the matching error string.
pub fn validate_summary(
    summary: &str,
    corpus: &str,
    min_words: usize,
    min_overlap: usize,
) -> std::result::Result<String, &'static str> {
    let summary = summary.trim();
    if summary.split_whitespace().count() < min_words {
        return Err(SUMMARY_TOO_SHORT);
    }

    let input: HashSet<String> = corpus.split_whitespace().map(str::to_lowercase).collect();
    let shared = summary
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<HashSet<_>>()
        .intersection(&input)
        .count();
    if shared < min_overlap {
        return Err(SUMMARY_IRRELEVANT);
    }
    Ok(summary.to_string())
}

// ---------- Gemini ----------

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}
#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}
#[derive(Serialize)]
struct GenerateReq<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Deserialize)]
struct GenerateResp {
    #[serde(default)]
    candidates: Vec<Candidate>,
}
#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}
#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<RespPart>,
}
#[derive(Deserialize)]
struct RespPart {
    #[serde(default)]
    text: String,
}

/// Google Gemini `generateContent` over REST.
pub struct GeminiSummarizer {
    http: reqwest::Client,
    api_key: String,
    url: String,
}

impl GeminiSummarizer {
    pub fn new(api_key: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("opinion-pulse/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(20))
            .build()
            .context("building gemini http client")?;
        Ok(Self {
            http,
            api_key: api_key.to_string(),
            url: GEMINI_URL.to_string(),
        })
    }
}

fn first_candidate_text(body: GenerateResp) -> Option<String> {
    let text: String = body
        .candidates
        .into_iter()
        .next()?
        .content?
        .parts
        .into_iter()
        .map(|p| p.text)
        .collect::<Vec<_>>()
        .join("");
    let text = text.trim().to_string();
    (!text.is_empty()).then_some(text)
}

#[async_trait]
impl GenerativeSummarizer for GeminiSummarizer {
    async fn summarize(&self, prompt: &str) -> Result<String> {
        let req = GenerateReq {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        };
        let resp = self
            .http
            .post(&self.url)
            .header("x-goog-api-key", &self.api_key)
            .json(&req)
            .send()
            .await
            .context("gemini request")?;

        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("gemini returned {status}");
        }
        let body: GenerateResp = resp.json().await.context("gemini json")?;
        first_candidate_text(body).ok_or_else(|| anyhow::anyhow!("gemini returned no text"))
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}

/// Always fails; used when no generator is configured.
pub struct DisabledSummarizer;

#[async_trait]
impl GenerativeSummarizer for DisabledSummarizer {
    async fn summarize(&self, _prompt: &str) -> Result<String> {
        anyhow::bail!("summarizer disabled")
    }
    fn name(&self) -> &'static str {
        "disabled"
    }
}

/// Returns a fixed text; for tests and offline runs.
#[derive(Debug, Clone)]
pub struct StaticSummarizer {
    pub fixed: String,
}

impl StaticSummarizer {
    pub fn new(fixed: impl Into<String>) -> Self {
        Self {
            fixed: fixed.into(),
        }
    }
}

#[async_trait]
impl GenerativeSummarizer for StaticSummarizer {
    async fn summarize(&self, _prompt: &str) -> Result<String> {
        Ok(self.fixed.clone())
    }
    fn name(&self) -> &'static str {
        "static"
    }
}
