//! Deterministic lexical scorer.
//!
//! Weighted keyword hits, a question mark bonus, a bonus for long numbers
//! (protocol / ticket ids) and two length adjustments are combined into a raw
//! score, then squashed into a confidence in `[0, 1]`.

use std::sync::LazyLock;

use regex::Regex;

use crate::pipeline::signals::{Polarity, signal_terms};
use crate::pipeline::types::{Category, MAX_TERMS, RuleResult};

/// At or above: requires action.
pub const ACTION_THRESHOLD: f64 = 0.55;
/// At or below: no action needed.
pub const NO_ACTION_THRESHOLD: f64 = 0.45;

const QUESTION_BONUS: f64 = 1.0;
const NUMBER_BONUS: f64 = 0.5;
const LENGTH_ADJUSTMENT: f64 = 0.4;
const DESCRIPTIVE_MIN_WORDS: usize = 8;
const TERSE_MAX_WORDS: usize = 5;

static LONG_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{3,}\b").expect("valid regex"));

/// Raw signal tallies before squashing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignalScore {
    pub positive: f64,
    pub negative: f64,
    pub positive_terms: Vec<&'static str>,
    pub negative_terms: Vec<&'static str>,
    pub has_question: bool,
    pub has_number: bool,
    /// Word count of the combined normalized text, at least 1.
    pub length: usize,
}

impl SignalScore {
    pub fn raw(&self) -> f64 {
        self.positive - self.negative
    }
}

/// Lowercase and collapse whitespace. Punctuation and stopwords stay.
fn normalize(text: &str) -> String {
    text.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Tally signals for a subject/body pair.
pub fn score_signals(subject: &str, body: &str) -> SignalScore {
    let subject_norm = normalize(subject);
    let body_norm = normalize(body);
    let haystack = format!("{body_norm} {subject_norm}");

    let mut score = SignalScore::default();
    for term in signal_terms() {
        if !haystack.contains(term.keyword) {
            continue;
        }
        match term.kind.polarity() {
            Polarity::Positive => {
                score.positive += term.weight();
                score.positive_terms.push(term.keyword);
            }
            Polarity::Negative => {
                score.negative += term.weight();
                score.negative_terms.push(term.keyword);
            }
        }
    }

    score.has_question = subject.contains('?') || body.contains('?');
    score.has_number = LONG_NUMBER.is_match(body) || LONG_NUMBER.is_match(subject);
    if score.has_question {
        score.positive += QUESTION_BONUS;
    }
    if score.has_number {
        score.positive += NUMBER_BONUS;
    }

    score.length = haystack.split_whitespace().count().max(1);
    if score.length > DESCRIPTIVE_MIN_WORDS && (score.has_question || score.positive > 0.0) {
        score.positive += LENGTH_ADJUSTMENT;
    }
    if score.length < TERSE_MAX_WORDS && score.negative > 0.0 && score.positive == 0.0 {
        score.negative += LENGTH_ADJUSTMENT;
    }

    score
}

/// Logistic squash of a raw score into `(0, 1)`.
pub fn squash(raw: f64) -> f64 {
    1.0 / (1.0 + (-raw).exp())
}

/// Category for a confidence, using the tallies inside the ambiguous band.
///
/// A 0–0 tie lands on `RequiresAction`.
pub fn category_for(confidence: f64, positive: f64, negative: f64) -> Category {
    if confidence >= ACTION_THRESHOLD {
        Category::RequiresAction
    } else if confidence <= NO_ACTION_THRESHOLD {
        Category::NoActionNeeded
    } else if positive >= negative {
        Category::RequiresAction
    } else {
        Category::NoActionNeeded
    }
}

/// Score a message with the local heuristic.
pub fn heuristic_score(subject: &str, body: &str) -> RuleResult {
    let signals = score_signals(subject, body);
    let confidence = squash(signals.raw());
    let category = category_for(confidence, signals.positive, signals.negative);

    let owned = |terms: &[&str]| -> Vec<String> {
        terms.iter().take(MAX_TERMS).map(|t| t.to_string()).collect()
    };
    RuleResult {
        category,
        confidence,
        positive_terms: owned(&signals.positive_terms),
        negative_terms: owned(&signals.negative_terms),
    }
}
