//! Public classification entry point.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::pipeline::arbiter::ArbitrationBridge;
use crate::pipeline::scorer::heuristic_score;
use crate::pipeline::types::Classification;

static SUBJECT_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)^subject:[ \t]*(.+)$").expect("valid regex"));

/// Scores a message locally and arbitrates ambiguous results.
pub struct Classifier {
    bridge: ArbitrationBridge,
}

impl Classifier {
    pub fn new(bridge: ArbitrationBridge) -> Self {
        Self { bridge }
    }

    /// Classify `raw_text`.
    ///
    /// Without an explicit `subject`, a `Subject:` line in the text is used.
    /// Scoring always runs on the raw text, not normalized tokens.
    pub async fn classify(&self, raw_text: &str, subject: Option<&str>) -> Classification {
        let subject = resolve_subject(raw_text, subject);
        let result = heuristic_score(&subject, raw_text);
        debug!(
            category = result.category.label(),
            confidence = result.confidence,
            terms = ?result.terms(),
            "Heuristic score"
        );
        self.bridge.arbitrate(&subject, raw_text, result).await
    }
}

fn resolve_subject(raw_text: &str, subject: Option<&str>) -> String {
    match subject.map(str::trim).filter(|s| !s.is_empty()) {
        Some(subject) => subject.to_string(),
        None => SUBJECT_LINE
            .captures(raw_text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_default(),
    }
}
