//! Hands ambiguous scores to an external classifier.
//!
//! Only results whose confidence falls in the ambiguous band are sent out.
//! A positive answer pulls confidence up to at least 0.62, a negative one
//! down to at most 0.38. Any failure leaves the scorer's result untouched
//! and is recorded as [`DecisionSource::HeuristicFallback`].

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::llm::retry::with_retry;
use crate::llm::{ChatMessage, CompletionRequest, LlmProvider, RetryPolicy};
use crate::pipeline::scorer::{ACTION_THRESHOLD, NO_ACTION_THRESHOLD};
use crate::pipeline::types::{
    Category, Classification, DecisionSource, FallbackReason, RuleResult,
};

/// Floor applied to confidence when the arbiter says "requires action".
pub const POSITIVE_PULL: f64 = 0.62;
/// Ceiling applied to confidence when the arbiter says "no action needed".
pub const NEGATIVE_PULL: f64 = 0.38;

/// One-word answers need only a few tokens.
const ARBITRATION_MAX_TOKENS: u32 = 3;
const ARBITRATION_TEMPERATURE: f32 = 0.0;
/// Covers every retry attempt.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const SYSTEM_PROMPT: &str = "Você é um classificador. Responda apenas uma palavra: \
    'Produtivo' ou 'Improdutivo'. Produtivo = requer ação, informação específica, \
    acompanhamento, status, envio de documentos. Improdutivo = felicitações, \
    agradecimentos, mensagens sociais sem ação.";

/// Bridge between the scorer and an external arbitrator.
pub struct ArbitrationBridge {
    provider: Option<Arc<dyn LlmProvider>>,
    enabled: bool,
    retry: RetryPolicy,
    timeout: Duration,
}

impl ArbitrationBridge {
    /// `provider` is `None` when no credentials are configured.
    pub fn new(provider: Option<Arc<dyn LlmProvider>>, enabled: bool) -> Self {
        Self {
            provider,
            enabled,
            retry: RetryPolicy::default(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// A bridge that never calls out.
    pub fn disabled() -> Self {
        Self::new(None, false)
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Whether `confidence` falls in the band that warrants arbitration.
    pub fn is_ambiguous(confidence: f64) -> bool {
        (NO_ACTION_THRESHOLD..=ACTION_THRESHOLD).contains(&confidence)
    }

    /// Settle `result` with the arbitrator when it is ambiguous.
    pub async fn arbitrate(&self, subject: &str, body: &str, result: RuleResult) -> Classification {
        if !self.enabled || !Self::is_ambiguous(result.confidence) {
            return Classification {
                result,
                source: DecisionSource::Heuristic,
            };
        }

        let Some(provider) = &self.provider else {
            return fallback(result, FallbackReason::NoCredentials);
        };

        debug!(
            confidence = result.confidence,
            model = provider.model_name(),
            "Ambiguous score, asking arbitrator"
        );

        let call = with_retry(&self.retry, provider.model_name(), || {
            provider.complete(build_request(subject, body))
        });
        let response = match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => return fallback(result, FallbackReason::ProviderFailed(e.to_string())),
            Err(_) => return fallback(result, FallbackReason::Timeout),
        };

        match parse_label(&response.content) {
            Some(category) => {
                let confidence = match category {
                    Category::RequiresAction => result.confidence.max(POSITIVE_PULL),
                    Category::NoActionNeeded => result.confidence.min(NEGATIVE_PULL),
                };
                info!(
                    category = category.label(),
                    from = result.confidence,
                    to = confidence,
                    "Arbitrator settled ambiguous score"
                );
                Classification {
                    result: RuleResult {
                        category,
                        confidence,
                        ..result
                    },
                    source: DecisionSource::Arbiter,
                }
            }
            None => fallback(
                result,
                FallbackReason::MalformedLabel(response.content.trim().to_string()),
            ),
        }
    }
}

fn fallback(result: RuleResult, reason: FallbackReason) -> Classification {
    warn!(
        reason = %reason,
        category = result.category.label(),
        confidence = result.confidence,
        "Arbitration unavailable, keeping heuristic result"
    );
    Classification {
        result,
        source: DecisionSource::HeuristicFallback { reason },
    }
}

fn build_request(subject: &str, body: &str) -> CompletionRequest {
    CompletionRequest::new(vec![
        ChatMessage::system(SYSTEM_PROMPT),
        ChatMessage::user(format!("Assunto: {subject}\n\nCorpo:\n{body}\n\nResponda:")),
    ])
    .with_temperature(ARBITRATION_TEMPERATURE)
    .with_max_tokens(ARBITRATION_MAX_TOKENS)
}

/// Map an arbitrator reply to a category.
///
/// "improdut" is checked first since it contains "produt".
fn parse_label(reply: &str) -> Option<Category> {
    let label = reply.trim().to_lowercase();
    if label.contains("improdut") {
        Some(Category::NoActionNeeded)
    } else if label.contains("produt") {
        Some(Category::RequiresAction)
    } else {
        None
    }
}
