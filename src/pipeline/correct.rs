//! Fuzzy correction of OCR output against a domain vocabulary.
//!
//! OCR engines reliably mangle brand and product names — a stroke read as
//! the wrong jamo turns "웰컴저축은행" into something no search index will
//! match. This stage compares each recognized fragment against a small
//! dictionary of canonical strings and substitutes the closest entry when
//! the similarity clears a threshold, leaving everything else untouched.
//!
//! ## Scoring
//!
//! Similarity is the Sørensen–Dice coefficient over character bigrams:
//! `2 × |bigrams(a) ∩ bigrams(b)| / (|bigrams(a)| + |bigrams(b)|)`, giving a
//! score in 0.0–1.0 with 1.0 for identical strings. The function is total
//! and deterministic: identical input and dictionary always yield identical
//! output, and ties go to the earlier dictionary entry.

use std::collections::HashMap;
use tracing::debug;

/// A fixed, ordered set of canonical domain strings.
///
/// Loaded once at process start and read-only at request time; correction
/// candidates are scored in insertion order, which also defines tie-breaking.
#[derive(Debug, Clone)]
pub struct Dictionary {
    entries: Vec<String>,
}

impl Default for Dictionary {
    fn default() -> Self {
        Self {
            entries: vec![
                "웰컴저축은행".to_string(),
                "웰컴금융그룹".to_string(),
                "웰컴디지털뱅크".to_string(),
            ],
        }
    }
}

impl Dictionary {
    /// Build a dictionary from canonical strings, preserving order.
    pub fn new(entries: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            entries: entries.into_iter().map(Into::into).collect(),
        }
    }

    /// An empty dictionary; correction becomes a no-op.
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The outcome of correcting a single fragment.
///
/// Produced once per fragment and not retained beyond the request.
#[derive(Debug, Clone, PartialEq)]
pub struct Correction {
    /// The text as the OCR stage produced it.
    pub original: String,
    /// The dictionary entry if one qualified, otherwise the original.
    pub corrected: String,
    /// Similarity score of the best dictionary candidate (0.0 when the
    /// dictionary is empty).
    pub score: f64,
}

impl Correction {
    /// Whether a substitution actually happened.
    pub fn substituted(&self) -> bool {
        self.original != self.corrected
    }
}

/// Correct one fragment against the dictionary.
///
/// Scores every entry, takes the maximum (first wins on ties), and
/// substitutes it when `score >= threshold`. Never fails; a below-threshold
/// best match simply passes the original through.
pub fn correct(text: &str, dictionary: &Dictionary, threshold: f64) -> Correction {
    let mut best_score = 0.0_f64;
    let mut best_entry: Option<&str> = None;

    for entry in dictionary.entries() {
        let score = similarity(text, entry);
        // Strict comparison keeps the first-encountered entry on ties.
        if score > best_score {
            best_score = score;
            best_entry = Some(entry);
        }
    }

    let corrected = match best_entry {
        Some(entry) if best_score >= threshold => {
            if entry != text {
                debug!(original = text, corrected = entry, score = best_score, "substituted dictionary entry");
            }
            entry.to_string()
        }
        _ => text.to_string(),
    };

    Correction {
        original: text.to_string(),
        corrected,
        score: best_score,
    }
}

/// Sørensen–Dice similarity over character bigrams, in 0.0–1.0.
///
/// Identical strings score 1.0 even when shorter than one bigram; a string
/// with no bigrams (0 or 1 characters) otherwise scores 0.0 against
/// everything.
pub fn similarity(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }

    let a_bigrams = bigrams(a);
    let b_bigrams = bigrams(b);
    if a_bigrams.is_empty() || b_bigrams.is_empty() {
        return 0.0;
    }

    let mut counts: HashMap<(char, char), usize> = HashMap::new();
    for bg in &a_bigrams {
        *counts.entry(*bg).or_insert(0) += 1;
    }

    let mut intersection = 0usize;
    for bg in &b_bigrams {
        if let Some(n) = counts.get_mut(bg) {
            if *n > 0 {
                *n -= 1;
                intersection += 1;
            }
        }
    }

    (2.0 * intersection as f64) / (a_bigrams.len() + b_bigrams.len()) as f64
}

/// Consecutive character pairs of `s`.
fn bigrams(s: &str) -> Vec<(char, char)> {
    let chars: Vec<char> = s.chars().collect();
    chars.windows(2).map(|w| (w[0], w[1])).collect()
}
