// src/config/collab.rs
use std::{env, fmt};

pub const ENV_NEWS_API_KEY: &str = "NEWS_API_KEY";
pub const ENV_GEMINI_API_KEY: &str = "GEMINI_API_KEY";
pub const ENV_HF_API_TOKEN: &str = "HF_API_TOKEN";
pub const ENV_REDDIT_USER_AGENT: &str = "REDDIT_USER_AGENT";
pub const ENV_GEOCODER_USER_AGENT: &str = "GEOCODER_USER_AGENT";
pub const ENV_STRICT_CREDENTIALS: &str = "PIPELINE_STRICT_CREDENTIALS";

const DEFAULT_USER_AGENT: &str = concat!("opinion-pulse/", env!("CARGO_PKG_VERSION"));

/// Credentials and identities for the external collaborators.
/// Every key is optional; a missing key selects the local fallback adapter.
#[derive(Clone, Default)]
pub struct CollaboratorConfig {
    pub news_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub hf_api_token: Option<String>,
    pub reddit_user_agent: String,
    pub geocoder_user_agent: String,
    /// Missing news key is fatal when set.
    pub strict: bool,
}

impl CollaboratorConfig {
    /// Read from the process environment (after `.env`, if present).
    pub fn from_env() -> anyhow::Result<Self> {
        let _ = dotenvy::dotenv();

        let cfg = Self {
            news_api_key: non_empty_var(ENV_NEWS_API_KEY),
            gemini_api_key: non_empty_var(ENV_GEMINI_API_KEY),
            hf_api_token: non_empty_var(ENV_HF_API_TOKEN),
            reddit_user_agent: non_empty_var(ENV_REDDIT_USER_AGENT)
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            geocoder_user_agent: non_empty_var(ENV_GEOCODER_USER_AGENT)
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            strict: matches!(
                env::var(ENV_STRICT_CREDENTIALS).ok().as_deref().map(str::trim),
                Some("1") | Some("true") | Some("TRUE")
            ),
        };

        if cfg.strict {
            cfg.require_all()?;
        }
        Ok(cfg)
    }

    /// Fail when the credentials a production deployment needs are absent.
    pub fn require_all(&self) -> anyhow::Result<()> {
        if self.news_api_key.is_none() {
            anyhow::bail!("Missing {ENV_NEWS_API_KEY} env var");
        }
        Ok(())
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn redact(v: &Option<String>) -> &'static str {
    if v.is_some() {
        "<set>"
    } else {
        "<unset>"
    }
}

impl fmt::Debug for CollaboratorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollaboratorConfig")
            .field("news_api_key", &redact(&self.news_api_key))
            .field("gemini_api_key", &redact(&self.gemini_api_key))
            .field("hf_api_token", &redact(&self.hf_api_token))
            .field("reddit_user_agent", &self.reddit_user_agent)
            .field("geocoder_user_agent", &self.geocoder_user_agent)
            .field("strict", &self.strict)
            .finish()
    }
}
