//! Shared types for the triage pipeline.

use serde::{Deserialize, Serialize};

use crate::text::Language;

// ── Category ────────────────────────────────────────────────────────

/// Triage decision for a message.
///
/// Wire labels are the Portuguese names consumers already expect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    /// Needs follow-up: a question, a request, a status check, documents.
    #[serde(rename = "Produtivo")]
    RequiresAction,
    /// Greetings, thanks, social messages.
    #[serde(rename = "Improdutivo")]
    NoActionNeeded,
}

impl Category {
    /// Wire label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::RequiresAction => "Produtivo",
            Self::NoActionNeeded => "Improdutivo",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// ── Rule result ─────────────────────────────────────────────────────

/// Upper bound on terms reported per result.
pub const MAX_TERMS: usize = 6;

/// Outcome of the lexical scorer.
///
/// Matched keywords of both sides are kept so the reported terms always
/// follow the final category, even after arbitration flips it.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleResult {
    pub category: Category,
    /// Confidence that the message requires action, in `[0, 1]`.
    pub confidence: f64,
    pub(crate) positive_terms: Vec<String>,
    pub(crate) negative_terms: Vec<String>,
}

impl RuleResult {
    /// Terms supporting the current category, at most [`MAX_TERMS`].
    pub fn terms(&self) -> &[String] {
        let side = match self.category {
            Category::RequiresAction => &self.positive_terms,
            Category::NoActionNeeded => &self.negative_terms,
        };
        &side[..side.len().min(MAX_TERMS)]
    }
}

// ── Decision source ─────────────────────────────────────────────────

/// Why the arbitrator could not be used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    /// Arbitration is enabled but no provider is configured.
    NoCredentials,
    /// The provider failed (auth, network, retries exhausted).
    ProviderFailed(String),
    /// The call exceeded its time budget.
    Timeout,
    /// The reply was not a recognised label.
    MalformedLabel(String),
}

impl std::fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoCredentials => f.write_str("no credentials configured"),
            Self::ProviderFailed(e) => write!(f, "provider failed: {e}"),
            Self::Timeout => f.write_str("timed out"),
            Self::MalformedLabel(label) => write!(f, "unrecognised label {label:?}"),
        }
    }
}

/// Which path produced the final decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecisionSource {
    /// Local scorer only; arbitration was disabled or not needed.
    Heuristic,
    /// The external arbitrator settled an ambiguous score.
    Arbiter,
    /// Arbitration was attempted and failed; the scorer's result stands.
    HeuristicFallback { reason: FallbackReason },
}

/// Final classification of one message.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub result: RuleResult,
    pub source: DecisionSource,
}

// ── Batch request / response ────────────────────────────────────────

/// One uploaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// A batch to triage: uploaded files and/or pasted text.
#[derive(Debug, Clone, Default)]
pub struct ProcessRequest {
    pub files: Vec<Upload>,
    pub text: Option<String>,
    /// Free-form attendant notes passed to the reply generator.
    pub extra_instructions: Option<String>,
}

/// Result for one text part of a batch.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessedEmail {
    #[serde(rename = "categoria")]
    pub category: Category,
    /// Rounded to four decimal places.
    #[serde(rename = "confianca")]
    pub confidence: f64,
    #[serde(rename = "resposta")]
    pub reply: String,
    #[serde(rename = "termos_relevantes")]
    pub terms: Vec<String>,
    #[serde(rename = "linguagem")]
    pub language: Language,
    /// Token count of the normalized text.
    pub tokens: usize,
    #[serde(skip)]
    pub source: DecisionSource,
}

/// Response body for a processed batch.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessBatch {
    #[serde(rename = "resultados")]
    pub results: Vec<ProcessedEmail>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_wire_labels() {
        assert_eq!(
            serde_json::to_string(&Category::RequiresAction).unwrap(),
            "\"Produtivo\""
        );
        assert_eq!(
            serde_json::from_str::<Category>("\"Improdutivo\"").unwrap(),
            Category::NoActionNeeded
        );
    }

    #[test]
    fn terms_follow_category_and_cap() {
        let mut result = RuleResult {
            category: Category::RequiresAction,
            confidence: 0.9,
            positive_terms: (0..8).map(|i| format!("p{i}")).collect(),
            negative_terms: vec!["obrigado".into()],
        };
        assert_eq!(result.terms().len(), MAX_TERMS);
        assert_eq!(result.terms()[0], "p0");

        result.category = Category::NoActionNeeded;
        assert_eq!(result.terms(), ["obrigado".to_string()]);
    }

    #[test]
    fn processed_email_serializes_portuguese_fields() {
        let row = ProcessedEmail {
            category: Category::NoActionNeeded,
            confidence: 0.2689,
            reply: "Olá!".into(),
            terms: vec!["bom dia".into()],
            language: Language::Pt,
            tokens: 4,
            source: DecisionSource::Heuristic,
        };
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["categoria"], "Improdutivo");
        assert_eq!(json["confianca"], 0.2689);
        assert_eq!(json["termos_relevantes"][0], "bom dia");
        assert_eq!(json["linguagem"], "pt");
        assert_eq!(json["tokens"], 4);
        assert!(json.get("source").is_none());
    }
}
