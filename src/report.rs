//! Report assembly: cross-item aggregates and the annotated summary text.

use serde_json::{json, Value};
use std::collections::BTreeMap;

use crate::model::{
    AnalysisReport, AnalyzedItem, AspectAggregate, EmotionResult, OverallSentiment, TrendResult,
};
use crate::sentiment::label_for;

pub const NO_CONTENT_SUMMARY: &str = "No content available for summary generation.";

/// Mean of the per-item scores with its label. No items reads as the neutral midpoint.
pub fn overall_sentiment(items: &[AnalyzedItem]) -> OverallSentiment {
    if items.is_empty() {
        return OverallSentiment {
            score: 50.0,
            label: label_for(50.0),
        };
    }
    let mean = items
        .iter()
        .map(|i| f64::from(i.sentiment.score))
        .sum::<f64>()
        / items.len() as f64;
    OverallSentiment {
        score: mean,
        label: label_for(mean),
    }
}

/// Most frequent emotion label; ties go to the label seen first.
pub fn dominant_emotion(items: &[AnalyzedItem]) -> String {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for it in items {
        let e = it.emotion.emotion.as_str();
        match counts.iter_mut().find(|(name, _)| *name == e) {
            Some((_, n)) => *n += 1,
            None => counts.push((e, 1)),
        }
    }
    counts
        .iter()
        .fold(None::<(&str, usize)>, |best, &(name, n)| match best {
            Some((_, b)) if b >= n => best,
            _ => Some((name, n)),
        })
        .map(|(name, _)| name.to_string())
        .unwrap_or_else(|| EmotionResult::neutral().emotion)
}

/// Per-aspect mean of item `avg_score` over items that mention the aspect.
///
/// Only scores `> 0` are counted, so an item whose aspect sentences all
/// scored exactly 0 is left out of both the mean and the count. Aspects with
/// no such item report `{0.0, 0}`.
pub fn aggregate_aspects<S: AsRef<str>>(
    items: &[AnalyzedItem],
    aspects: &[S],
) -> BTreeMap<String, AspectAggregate> {
    let mut out = BTreeMap::new();
    for aspect in aspects {
        let name = aspect.as_ref();
        if name.trim().is_empty() {
            continue;
        }
        let scores: Vec<f64> = items
            .iter()
            .filter_map(|it| it.aspects.get(name))
            .map(|r| r.avg_score)
            .filter(|s| *s > 0.0)
            .collect();
        let agg = if scores.is_empty() {
            AspectAggregate {
                avg_score: 0.0,
                count: 0,
            }
        } else {
            AspectAggregate {
                avg_score: scores.iter().sum::<f64>() / scores.len() as f64,
                count: scores.len(),
            }
        };
        out.insert(name.to_string(), agg);
    }
    out
}

/// "sadness" -> "Sadness", "very_happy" -> "Very_Happy".
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for c in s.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}

/// Summary body followed by the sentiment, emotion and trend lines.
pub fn annotate_summary(
    body: &str,
    overall: &OverallSentiment,
    dominant_emotion: &str,
    trend: &TrendResult,
) -> String {
    format!(
        "{body}\n\nOverall Sentiment: {} ({:.1}/100)\nDominant Emotion: {}\nTrend: {} (Confidence: {:.2})",
        overall.label.as_str(),
        overall.score,
        title_case(dominant_emotion),
        trend.direction.as_str(),
        trend.confidence,
    )
}

/// JSON form of a report for HTTP and CLI output. Non-finite floats become `null`.
pub fn to_json_value(report: &AnalysisReport) -> Value {
    match serde_json::to_value(report) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(target: "pipeline", error = %e, "report serialization failed");
            json!({ "query": report.query, "error": format!("report serialization failed: {e}") })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        AspectMap, AspectResult, ContentItem, Label, RawScores, SentimentResult, Source,
        TrendDirection,
    };

    fn item(score: u8, emotion: &str, aspects: &[(&str, f64)]) -> AnalyzedItem {
        let mut map = AspectMap::new();
        for (name, avg) in aspects {
            map.insert(
                name.to_string(),
                AspectResult {
                    avg_score: *avg,
                    mention_count: 1,
                    sample_text: None,
                },
            );
        }
        AnalyzedItem {
            item: ContentItem::new(Source::Review, "t"),
            sentiment: SentimentResult {
                score,
                label: label_for(f64::from(score)),
                raw: RawScores::default(),
            },
            emotion: EmotionResult {
                emotion: emotion.to_string(),
                confidence: 0.9,
            },
            aspects: map,
        }
    }

    #[test]
    fn overall_is_mean_with_matching_label() {
        let items = vec![item(80, "joy", &[]), item(70, "joy", &[]), item(30, "anger", &[])];
        let o = overall_sentiment(&items);
        assert!((o.score - 60.0).abs() < 1e-9);
        assert_eq!(o.label, Label::Neutral);

        let o = overall_sentiment(&[item(90, "joy", &[]), item(70, "joy", &[])]);
        assert_eq!(o.label, Label::Positive);
    }

    #[test]
    fn dominant_emotion_ties_go_to_first_seen() {
        let items = vec![
            item(50, "fear", &[]),
            item(50, "joy", &[]),
            item(50, "joy", &[]),
            item(50, "fear", &[]),
        ];
        assert_eq!(dominant_emotion(&items), "fear");
        assert_eq!(dominant_emotion(&items[1..]), "joy");
        assert_eq!(dominant_emotion(&[]), "neutral");
    }

    #[test]
    fn aspect_aggregate_skips_zero_scores() {
        let items = vec![
            item(50, "joy", &[("price", 80.0)]),
            item(50, "joy", &[("price", 0.0)]),
            item(50, "joy", &[("price", 40.0), ("support", 20.0)]),
            item(50, "joy", &[]),
        ];
        let agg = aggregate_aspects(&items, &["price", "support", "shipping"]);
        assert_eq!(agg["price"].count, 2);
        assert!((agg["price"].avg_score - 60.0).abs() < 1e-9);
        assert_eq!(agg["support"].count, 1);
        assert_eq!(
            agg["shipping"],
            AspectAggregate {
                avg_score: 0.0,
                count: 0
            }
        );
    }

    #[test]
    fn summary_lines_follow_the_body() {
        let overall = OverallSentiment {
            score: 72.345,
            label: Label::Positive,
        };
        let trend = TrendResult {
            direction: TrendDirection::Upward,
            confidence: 0.456,
        };
        let s = annotate_summary("Users like it.", &overall, "joy", &trend);
        assert_eq!(
            s,
            "Users like it.\n\nOverall Sentiment: Positive (72.3/100)\nDominant Emotion: Joy\nTrend: Upward (Confidence: 0.46)"
        );

        let s = annotate_summary("x", &overall, "neutral", &TrendResult::insufficient());
        assert!(s.ends_with("Trend: Insufficient data (Confidence: 0.00)"));
    }

    #[test]
    fn title_case_words() {
        assert_eq!(title_case("sadness"), "Sadness");
        assert_eq!(title_case("JOY"), "Joy");
        assert_eq!(title_case("very_happy mood"), "Very_Happy Mood");
    }

    #[test]
    fn json_maps_nan_to_null() {
        let mut r = AnalysisReport::failed("q", "e".into(), NO_CONTENT_SUMMARY);
        r.overall.score = f64::NAN;
        let v = to_json_value(&r);
        assert!(v["overall"]["score"].is_null());
        assert_eq!(v["error"], "e");
        assert_eq!(v["trend"]["direction"], "InsufficientData");
    }
}
