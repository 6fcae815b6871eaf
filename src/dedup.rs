//! Near-duplicate filter over one batch of texts.
//!
//! TF-IDF vectors are fit on the batch itself (nothing is persisted), then a
//! greedy forward scan keeps item `i` iff its cosine similarity to every item
//! kept so far is `<= threshold`. The earliest item of a near-duplicate group
//! always wins, so input order matters. Survivors are pairwise below the
//! threshold under this batch's fit; re-running on the survivors refits idf
//! and may drop more.
//!
//! Weighting: raw term counts × `1 + log10((1 + n) / (1 + df))`, rows L2-normalized.

use anyhow::{bail, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

pub const DEFAULT_DUP_THRESHOLD: f64 = 0.8;

static RE_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?u)\b\w+\b").expect("token regex"));

/// Indices (ascending) of the texts to keep, using the default threshold.
pub fn deduplicate<S: AsRef<str>>(texts: &[S]) -> Vec<usize> {
    deduplicate_with(texts, DEFAULT_DUP_THRESHOLD)
}

/// Indices (ascending) of the texts to keep. Never fails: degenerate batches
/// keep everything.
pub fn deduplicate_with<S: AsRef<str>>(texts: &[S], threshold: f64) -> Vec<usize> {
    let n = texts.len();
    if n == 0 {
        return Vec::new();
    }
    if n < 2 || texts.iter().all(|t| t.as_ref().trim().is_empty()) {
        return (0..n).collect();
    }

    let matrix = match TfIdfMatrix::fit(texts) {
        Ok(m) => m,
        Err(e) => {
            tracing::debug!(target: "pipeline", error = %e, "tf-idf fit failed; keeping all items");
            return (0..n).collect();
        }
    };

    let mut kept: Vec<usize> = Vec::with_capacity(n);
    for i in 0..n {
        let unique = kept
            .iter()
            .all(|&j| matrix.cosine(i, j) <= threshold);
        if unique {
            kept.push(i);
        }
    }
    kept
}

/// Sparse, L2-normalized TF-IDF rows.
#[derive(Debug)]
struct TfIdfMatrix {
    rows: Vec<HashMap<usize, f64>>,
}

impl TfIdfMatrix {
    fn fit<S: AsRef<str>>(texts: &[S]) -> Result<Self> {
        let mut vocab: HashMap<String, usize> = HashMap::new();
        let mut counts: Vec<HashMap<usize, f64>> = Vec::with_capacity(texts.len());

        for t in texts {
            let mut row: HashMap<usize, f64> = HashMap::new();
            for m in RE_TOKEN.find_iter(t.as_ref()) {
                let term = m.as_str().to_lowercase();
                let next = vocab.len();
                let id = *vocab.entry(term).or_insert(next);
                *row.entry(id).or_insert(0.0) += 1.0;
            }
            counts.push(row);
        }

        if vocab.is_empty() {
            bail!("empty vocabulary");
        }

        let mut df = vec![0usize; vocab.len()];
        for row in &counts {
            for &id in row.keys() {
                df[id] += 1;
            }
        }

        let n = texts.len() as f64;
        let idf: Vec<f64> = df
            .iter()
            .map(|&d| 1.0 + ((1.0 + n) / (1.0 + d as f64)).log10())
            .collect();

        let rows = counts
            .into_iter()
            .map(|row| {
                let mut weighted: HashMap<usize, f64> =
                    row.into_iter().map(|(id, tf)| (id, tf * idf[id])).collect();
                let norm = weighted.values().map(|w| w * w).sum::<f64>().sqrt();
                if norm > 0.0 {
                    for w in weighted.values_mut() {
                        *w /= norm;
                    }
                }
                weighted
            })
            .collect();

        Ok(Self { rows })
    }

    /// Cosine similarity of two rows. Empty rows are similar to nothing.
    fn cosine(&self, i: usize, j: usize) -> f64 {
        let (a, b) = (&self.rows[i], &self.rows[j]);
        let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
        small
            .iter()
            .filter_map(|(id, w)| large.get(id).map(|v| w * v))
            .sum()
    }
}
