//! Ensemble sentiment scorer.
//!
//! Two independent estimators run over the normalized text:
//! - [`RuleBased`]: VADER compound polarity (negation, boosters, "but" handling).
//! - [`LexiconAverage`]: mean polarity of the sentiment words found.
//!
//! `ensemble = w_primary * A + w_secondary * B`, then
//! `score = floor((ensemble + 1) * 50)` clamped to `0..=100`.
//! Labels use strict inequalities: `< 35` Negative, `> 65` Positive, else Neutral.

mod lexicon_avg;
mod rule_based;

pub use lexicon_avg::LexiconAverage;
pub use rule_based::RuleBased;

use crate::model::{Label, RawScores, SentimentResult};
use crate::normalize::{normalize_with, NormalizerMode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Scores strictly below this are Negative.
pub const NEGATIVE_BELOW: f64 = 35.0;
/// Scores strictly above this are Positive.
pub const POSITIVE_ABOVE: f64 = 65.0;
/// Neutral midpoint returned for empty input.
pub const MIDPOINT: u8 = 50;

/// A polarity estimator over already-normalized text.
pub trait SentimentEstimator: Send + Sync {
    /// Polarity in `[-1, 1]`. `0.0` when nothing sentiment-bearing was found.
    fn polarity(&self, normalized: &str) -> f64;
    fn name(&self) -> &'static str;
}

/// Ensemble weights. Tunable constants, not learned.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnsembleWeights {
    pub primary: f64,
    pub secondary: f64,
}

impl Default for EnsembleWeights {
    fn default() -> Self {
        Self {
            primary: 0.6,
            secondary: 0.4,
        }
    }
}

/// Label for a (possibly fractional) 0..=100 score.
pub fn label_for(score: f64) -> Label {
    if score < NEGATIVE_BELOW {
        Label::Negative
    } else if score > POSITIVE_ABOVE {
        Label::Positive
    } else {
        Label::Neutral
    }
}

/// Map an ensemble polarity in `[-1, 1]` onto `0..=100`.
pub fn score_from_ensemble(ensemble: f64) -> u8 {
    if !ensemble.is_finite() {
        return MIDPOINT;
    }
    ((ensemble + 1.0) * 50.0).floor().clamp(0.0, 100.0) as u8
}

#[derive(Clone)]
pub struct SentimentScorer {
    primary: Arc<dyn SentimentEstimator>,
    secondary: Arc<dyn SentimentEstimator>,
    weights: EnsembleWeights,
    mode: NormalizerMode,
}

impl std::fmt::Debug for SentimentScorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SentimentScorer")
            .field("primary", &self.primary.name())
            .field("secondary", &self.secondary.name())
            .field("weights", &self.weights)
            .field("mode", &self.mode)
            .finish()
    }
}

impl Default for SentimentScorer {
    fn default() -> Self {
        Self::new(EnsembleWeights::default(), NormalizerMode::default())
    }
}

impl SentimentScorer {
    /// Rule-based + lexicon-average ensemble with the given weights.
    pub fn new(weights: EnsembleWeights, mode: NormalizerMode) -> Self {
        Self::with_estimators(
            Arc::new(RuleBased::new()),
            Arc::new(LexiconAverage::new()),
            weights,
            mode,
        )
    }

    pub fn with_estimators(
        primary: Arc<dyn SentimentEstimator>,
        secondary: Arc<dyn SentimentEstimator>,
        weights: EnsembleWeights,
        mode: NormalizerMode,
    ) -> Self {
        Self {
            primary,
            secondary,
            weights,
            mode,
        }
    }

    /// Score a text. Empty text yields the neutral midpoint.
    pub fn score(&self, text: &str) -> SentimentResult {
        let cleaned = normalize_with(text, self.mode);
        if cleaned.is_empty() {
            return neutral_result();
        }

        let a = self.primary.polarity(&cleaned).clamp(-1.0, 1.0);
        let b = self.secondary.polarity(&cleaned).clamp(-1.0, 1.0);
        let ensemble = self.weights.primary * a + self.weights.secondary * b;
        let score = score_from_ensemble(ensemble);

        SentimentResult {
            score,
            label: label_for(f64::from(score)),
            raw: RawScores {
                primary: a,
                secondary: b,
            },
        }
    }

    /// Same as [`score`](Self::score); a missing text is treated as empty.
    pub fn score_opt(&self, text: Option<&str>) -> SentimentResult {
        self.score(text.unwrap_or_default())
    }
}

fn neutral_result() -> SentimentResult {
    SentimentResult {
        score: MIDPOINT,
        label: Label::Neutral,
        raw: RawScores::default(),
    }
}
