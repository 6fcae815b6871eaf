use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt;

use vader_sentiment::SentimentIntensityAnalyzer;

use super::SentimentEstimator;

/// Adjective/adverb polarities in [-1, 1]. Checked before the general lexicon.
static POLARITY: Lazy<HashMap<String, f64>> = Lazy::new(|| {
    let raw = include_str!("../../lexicons/polarity.json");
    serde_json::from_str::<HashMap<String, f64>>(raw).expect("valid polarity lexicon")
});

/// Negated words keep half their strength with the opposite sign.
const NEGATION_FACTOR: f64 = -0.5;

/// Lexicon-averaging polarity (secondary estimator).
///
/// Mean of the polarities of known words. A word's polarity comes from the
/// curated adjective list, else from its single-word VADER compound.
/// Intensifiers multiply the next known word, a negator flips it; both reset
/// at the next ordinary word.
pub struct LexiconAverage {
    analyzer: SentimentIntensityAnalyzer<'static>,
}

impl LexiconAverage {
    pub fn new() -> Self {
        Self {
            analyzer: SentimentIntensityAnalyzer::new(),
        }
    }

    fn word_polarity(&self, tok: &str) -> Option<f64> {
        if let Some(p) = POLARITY.get(tok) {
            return Some(*p);
        }
        let compound = self
            .analyzer
            .polarity_scores(tok)
            .get("compound")
            .copied()
            .unwrap_or(0.0);
        (compound != 0.0).then_some(compound)
    }
}

impl Default for LexiconAverage {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for LexiconAverage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LexiconAverage")
            .field("curated_words", &POLARITY.len())
            .finish_non_exhaustive()
    }
}

impl SentimentEstimator for LexiconAverage {
    fn polarity(&self, normalized: &str) -> f64 {
        let mut assessed: Vec<f64> = Vec::new();
        let mut intensity = 1.0f64;
        let mut negate = false;

        for tok in normalized.split_whitespace() {
            if let Some(m) = intensifier(tok) {
                intensity *= m;
                continue;
            }
            if is_negator(tok) {
                negate = true;
                continue;
            }
            if let Some(p) = self.word_polarity(tok) {
                let mut v = p * intensity;
                if negate {
                    v *= NEGATION_FACTOR;
                }
                assessed.push(v.clamp(-1.0, 1.0));
            }
            intensity = 1.0;
            negate = false;
        }

        if assessed.is_empty() {
            return 0.0;
        }
        let mean = assessed.iter().sum::<f64>() / assessed.len() as f64;
        mean.clamp(-1.0, 1.0)
    }

    fn name(&self) -> &'static str {
        "lexicon_average"
    }
}

fn intensifier(tok: &str) -> Option<f64> {
    match tok {
        "very" | "really" | "extremely" | "super" | "so" | "totally" | "incredibly" => Some(1.3),
        "absolutely" | "completely" | "utterly" => Some(1.5),
        "quite" | "pretty" => Some(1.1),
        "slightly" | "somewhat" | "barely" => Some(0.5),
        _ => None,
    }
}

/// Negators, including contraction stems left behind once apostrophes are stripped
/// ("don't" → "don" or "dont").
fn is_negator(tok: &str) -> bool {
    matches!(
        tok,
        "not"
            | "no"
            | "never"
            | "none"
            | "nobody"
            | "nothing"
            | "neither"
            | "nor"
            | "nowhere"
            | "cannot"
            | "without"
            | "aint"
            | "cant"
            | "dont"
            | "don"
            | "doesnt"
            | "doesn"
            | "didnt"
            | "didn"
            | "isnt"
            | "isn"
            | "wasnt"
            | "wasn"
            | "arent"
            | "aren"
            | "werent"
            | "weren"
            | "wont"
            | "wouldnt"
            | "wouldn"
            | "shouldnt"
            | "shouldn"
            | "couldnt"
            | "couldn"
            | "hasnt"
            | "hasn"
            | "havent"
            | "haven"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn averages_known_words_only() {
        let la = LexiconAverage::new();
        // good 0.7, bad -0.7 -> 0.0
        assert!(la.polarity("good chair bad").abs() < 1e-9);
        assert!((la.polarity("good table") - 0.7).abs() < 1e-9);
    }

    #[test]
    fn negation_halves_and_flips() {
        let la = LexiconAverage::new();
        assert!((la.polarity("not good") + 0.35).abs() < 1e-9);
    }

    #[test]
    fn intensifier_multiplies_next_word() {
        let la = LexiconAverage::new();
        assert!((la.polarity("very good") - 0.91).abs() < 1e-9);
        assert_eq!(la.polarity("absolutely perfect"), 1.0);
    }

    #[test]
    fn words_outside_curated_list_still_count() {
        let la = LexiconAverage::new();
        assert!(la.polarity("fans celebrated victory") > 0.0);
        assert!(la.polarity("residents grieving destroyed homes") < 0.0);
    }

    #[test]
    fn unknown_text_is_zero() {
        assert_eq!(LexiconAverage::new().polarity("window table"), 0.0);
    }
}
