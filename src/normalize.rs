//! Text normalizer shared by the scorer and the aspect extractor.
//!
//! Two flavours:
//! - [`NormalizerMode::Basic`]: strip URLs/mentions/hashtags/punctuation, lowercase,
//!   drop short tokens. A fixed point on its own output.
//! - [`NormalizerMode::EntityAware`]: additionally drops stop-words, but keeps
//!   anything that looks like a named entity or a content-bearing word.
//!
//! There is no statistical tagger here. Entities are guessed from casing in the
//! raw text (capitalized mid-sentence, or all-caps acronyms) and content-bearing
//! stop-words come from a fixed list.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizerMode {
    Basic,
    #[default]
    EntityAware,
}

static RE_NOISE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"http\S+|@\w+|#\w+").expect("noise regex"));
static RE_PUNCT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s]").expect("punct regex"));
static RE_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+").expect("word regex"));

/// Minimum token length that survives without special treatment.
const MIN_TOKEN_CHARS: usize = 3;

static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "a", "about", "above", "after", "again", "against", "all", "almost", "along",
        "already", "also", "although", "always", "am", "among", "an", "and", "another",
        "any", "anyhow", "anyone", "anything", "anyway", "are", "around", "as", "at",
        "back", "be", "became", "because", "become", "been", "before", "being", "below",
        "beside", "between", "both", "but", "by", "call", "can", "cannot", "could", "did",
        "do", "does", "doing", "done", "down", "due", "during", "each", "either", "else",
        "enough", "even", "ever", "every", "few", "first", "for", "from", "full",
        "further", "get", "give", "go", "had", "has", "have", "having", "he", "her",
        "here", "hers", "herself", "him", "himself", "his", "how", "however", "i", "if",
        "in", "into", "is", "it", "its", "itself", "just", "keep", "last", "least",
        "less", "made", "make", "many", "may", "me", "might", "more", "most", "mostly",
        "much", "must", "my", "myself", "neither", "never", "nevertheless", "next", "no",
        "nobody", "none", "nor", "not", "nothing", "now", "of", "off", "often", "on",
        "once", "one", "only", "onto", "or", "other", "others", "otherwise", "our",
        "ours", "ourselves", "out", "over", "own", "part", "per", "perhaps", "please",
        "put", "quite", "rather", "really", "regarding", "same", "say", "see", "seem",
        "seemed", "seems", "serious", "several", "she", "should", "show", "since", "so",
        "some", "somehow", "someone", "something", "sometimes", "still", "such", "take",
        "than", "that", "the", "their", "theirs", "them", "themselves", "then", "there",
        "these", "they", "this", "those", "though", "through", "thus", "to", "together",
        "too", "top", "toward", "under", "until", "up", "upon", "us", "used", "using",
        "various", "very", "via", "was", "we", "well", "were", "what", "whatever", "when",
        "where", "whether", "which", "while", "who", "whole", "whom", "whose", "why",
        "will", "with", "within", "without", "would", "yet", "you", "your", "yours",
        "yourself", "yourselves",
    ]
    .into_iter()
    .collect()
});

/// Stop-words that usually act as adjectives, verbs, nouns or adverbs, plus
/// negators, boosters and the contrastive "but". These survive the stop-word
/// filter, short ones included.
static CONTENT_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "again", "almost", "always", "back", "become", "but", "call", "enough", "even", "ever",
        "few", "first", "full", "give", "keep", "last", "least", "less", "made", "make",
        "many", "more", "most", "much", "never", "no", "nor", "not", "nothing", "often",
        "only", "quite", "rather", "really", "say", "see", "seem", "serious", "several",
        "show", "so", "still", "take", "too", "top", "very", "well", "whole", "without",
    ]
    .into_iter()
    .collect()
});

/// Canonical normalizer (basic flavour).
pub fn normalize(text: &str) -> String {
    normalize_with(text, NormalizerMode::Basic)
}

/// Normalize with an explicit flavour. Never fails; empty in → empty out.
pub fn normalize_with(text: &str, mode: NormalizerMode) -> String {
    if text.trim().is_empty() {
        return String::new();
    }
    let decoded = html_escape::decode_html_entities(text);
    let stripped = RE_NOISE.replace_all(&decoded, "");

    match mode {
        NormalizerMode::Basic => {
            let no_punct = RE_PUNCT.replace_all(&stripped, "");
            no_punct
                .split_whitespace()
                .filter(|t| t.chars().count() >= MIN_TOKEN_CHARS)
                .map(|t| t.to_lowercase())
                .collect::<Vec<_>>()
                .join(" ")
        }
        NormalizerMode::EntityAware => entity_aware_tokens(&stripped).join(" "),
    }
}

fn entity_aware_tokens(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    for m in RE_WORD.find_iter(text) {
        let raw = m.as_str();
        let lower = raw.to_lowercase();
        let entity = looks_like_entity(raw, sentence_initial(text, m.start()));
        let content = CONTENT_WORDS.contains(lower.as_str());
        let plain = lower.chars().count() >= MIN_TOKEN_CHARS && !STOP_WORDS.contains(lower.as_str());
        if entity || content || plain {
            out.push(lower);
        }
    }
    out
}

/// True when the word at `pos` opens a sentence (or the whole text).
fn sentence_initial(text: &str, pos: usize) -> bool {
    match text[..pos].trim_end().chars().last() {
        None => true,
        Some(c) => matches!(c, '.' | '!' | '?'),
    }
}

fn looks_like_entity(raw: &str, at_sentence_start: bool) -> bool {
    let letters: Vec<char> = raw.chars().filter(|c| c.is_alphabetic()).collect();
    if letters.is_empty() {
        return false;
    }
    // Acronyms: "NASA", "EU", "iOS" is not one.
    if letters.len() >= 2 && letters.iter().all(|c| c.is_uppercase()) {
        return true;
    }
    !at_sentence_start && raw.chars().next().is_some_and(|c| c.is_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_urls_mentions_hashtags_and_punct() {
        let s = "Loving the new update!!! https://t.co/xyz @devteam #blessed so smooth";
        assert_eq!(normalize(s), "loving the new update smooth");
    }

    #[test]
    fn basic_is_idempotent() {
        let s = "Battery life is AWFUL, can't believe it... see http://x.io";
        let once = normalize(s);
        assert_eq!(normalize(&once), once);
    }

    #[test]
    fn empty_and_whitespace_yield_empty() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   \n"), "");
        assert_eq!(normalize_with("", NormalizerMode::EntityAware), "");
    }

    #[test]
    fn entity_aware_drops_stop_words_but_keeps_entities() {
        let s = "The app from Google is very good but it is not fast";
        let out = normalize_with(s, NormalizerMode::EntityAware);
        assert_eq!(out, "app google very good but not fast");
    }

    #[test]
    fn entity_aware_keeps_short_sentiment_modifiers() {
        let out = normalize_with("It is so slow, but no crash", NormalizerMode::EntityAware);
        assert_eq!(out, "so slow but no crash");
    }

    #[test]
    fn entity_aware_keeps_short_acronyms() {
        let out = normalize_with("Prices in the EU went up", NormalizerMode::EntityAware);
        assert!(out.split(' ').any(|t| t == "eu"), "got: {out}");
        assert!(out.contains("prices"));
    }

    #[test]
    fn html_entities_are_decoded_before_cleaning() {
        assert_eq!(normalize("Tom &amp; Jerry rock"), "tom jerry rock");
    }
}
