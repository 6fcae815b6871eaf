//! Aspect-based sentiment: which sentences talk about "price", "support", ...
//! and how do they feel about it.
//!
//! Matching is a case-insensitive substring test, no stemming or synonyms.
//! An aspect with no matching sentence is left out of the map entirely.

use crate::model::{AspectMap, AspectResult};
use crate::sentiment::SentimentScorer;

/// Split text into sentences on `.`, `!`, `?` (followed by whitespace or end)
/// and on line breaks. Sentences are trimmed; empty ones are dropped.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0usize;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        let boundary = match c {
            '\n' | '\r' => Some(i),
            '.' | '!' | '?' => {
                // swallow runs like "?!" or "..."
                let mut end = i + c.len_utf8();
                while let Some(&(j, n)) = chars.peek() {
                    if matches!(n, '.' | '!' | '?') {
                        end = j + n.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                match chars.peek() {
                    None => Some(end),
                    Some(&(_, n)) if n.is_whitespace() => Some(end),
                    _ => None,
                }
            }
            _ => None,
        };

        if let Some(end) = boundary {
            push_trimmed(&mut out, &text[start..end]);
            start = end;
        }
    }
    push_trimmed(&mut out, &text[start..]);
    out
}

fn push_trimmed<'a>(out: &mut Vec<&'a str>, s: &'a str) {
    let t = s.trim();
    if !t.is_empty() {
        out.push(t);
    }
}

/// Per-aspect sentiment for one text. Blank aspect names are ignored.
pub fn aspect_sentiment<S: AsRef<str>>(
    scorer: &SentimentScorer,
    text: &str,
    aspects: &[S],
) -> AspectMap {
    let sentences = split_sentences(text);
    let lowered: Vec<String> = sentences.iter().map(|s| s.to_lowercase()).collect();
    let mut out = AspectMap::new();

    for aspect in aspects {
        let name = aspect.as_ref();
        let needle = name.trim().to_lowercase();
        if needle.is_empty() {
            continue;
        }

        let relevant: Vec<&str> = sentences
            .iter()
            .zip(&lowered)
            .filter(|(_, low)| low.contains(&needle))
            .map(|(s, _)| *s)
            .collect();
        if relevant.is_empty() {
            continue;
        }

        let total: f64 = relevant
            .iter()
            .map(|s| f64::from(scorer.score(s).score))
            .sum();
        out.insert(
            name.to_string(),
            AspectResult {
                avg_score: total / relevant.len() as f64,
                mention_count: relevant.len(),
                sample_text: relevant.first().map(|s| s.to_string()),
            },
        );
    }
    out
}
