use std::fmt;

use vader_sentiment::SentimentIntensityAnalyzer;

use super::SentimentEstimator;

/// Rule-based compound polarity (primary estimator).
///
/// VADER over the normalized text: valence lexicon, boosters and dampeners,
/// negation, contrastive "but". The compound score is already in `[-1, 1]`.
pub struct RuleBased {
    analyzer: SentimentIntensityAnalyzer<'static>,
}

impl RuleBased {
    pub fn new() -> Self {
        Self {
            analyzer: SentimentIntensityAnalyzer::new(),
        }
    }
}

impl Default for RuleBased {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RuleBased {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleBased").finish_non_exhaustive()
    }
}

impl SentimentEstimator for RuleBased {
    fn polarity(&self, normalized: &str) -> f64 {
        if normalized.trim().is_empty() {
            return 0.0;
        }
        let scores = self.analyzer.polarity_scores(normalized);
        scores
            .get("compound")
            .copied()
            .unwrap_or(0.0)
            .clamp(-1.0, 1.0)
    }

    fn name(&self) -> &'static str {
        "rule_based"
    }
}
