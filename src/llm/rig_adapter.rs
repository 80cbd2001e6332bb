//! Bridges rig's `CompletionModel` to our `LlmProvider` trait.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use rig::completion::CompletionModel;
use rig::completion::message::AssistantContent;

use crate::error::LlmError;
use crate::llm::provider::{CompletionRequest, CompletionResponse, LlmProvider, Role};

/// `401`/`403` only as an HTTP status, not inside ids or byte counts.
static AUTH_STATUS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\b(?:status(?: code)?|http)[\s:=]*(?:401|403)\b)|\b(?:401|403)\s+(?:unauthorized|forbidden)\b")
        .expect("valid regex")
});
static RATE_LIMIT_STATUS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\b(?:status(?: code)?|http)[\s:=]*429\b)|\b429\s+too many requests\b")
        .expect("valid regex")
});

/// Wraps any rig completion model.
pub struct RigAdapter<M> {
    model: M,
    model_name: String,
}

impl<M> RigAdapter<M> {
    pub fn new(model: M, model_name: &str) -> Self {
        Self {
            model,
            model_name: model_name.to_string(),
        }
    }
}

#[async_trait]
impl<M> LlmProvider for RigAdapter<M>
where
    M: CompletionModel + Send + Sync + 'static,
{
    fn model_name(&self) -> &str {
        &self.model_name
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let (preamble, prompt) = split_prompt(&request);

        let mut builder = self.model.completion_request(prompt);
        if !preamble.is_empty() {
            builder = builder.preamble(preamble);
        }
        if let Some(temperature) = request.temperature {
            builder = builder.temperature(f64::from(temperature));
        }
        if let Some(max_tokens) = request.max_tokens {
            builder = builder.max_tokens(u64::from(max_tokens));
        }

        let response = builder
            .send()
            .await
            .map_err(|e| classify_provider_error(&self.model_name, &e.to_string()))?;

        let content: String = response
            .choice
            .iter()
            .filter_map(|c| match c {
                AssistantContent::Text(text) => Some(text.text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("");

        Ok(CompletionResponse { content })
    }
}

/// System messages become the preamble; everything else is the prompt.
fn split_prompt(request: &CompletionRequest) -> (String, String) {
    let mut preamble = Vec::new();
    let mut prompt = Vec::new();
    for message in &request.messages {
        match message.role {
            Role::System => preamble.push(message.content.as_str()),
            Role::User => prompt.push(message.content.as_str()),
        }
    }
    (preamble.join("\n\n"), prompt.join("\n\n"))
}

/// Map a provider error message onto our error taxonomy.
///
/// rig flattens HTTP failures into strings, so the status is recovered from
/// the message text.
pub(crate) fn classify_provider_error(provider: &str, message: &str) -> LlmError {
    let lower = message.to_lowercase();
    if AUTH_STATUS.is_match(&lower)
        || lower.contains("unauthorized")
        || lower.contains("forbidden")
        || lower.contains("invalid_api_key")
        || lower.contains("invalid api key")
        || lower.contains("authentication")
    {
        LlmError::AuthFailed {
            provider: provider.to_string(),
        }
    } else if RATE_LIMIT_STATUS.is_match(&lower)
        || lower.contains("rate limit")
        || lower.contains("quota")
    {
        LlmError::RateLimited {
            provider: provider.to_string(),
            retry_after: None,
        }
    } else {
        LlmError::RequestFailed {
            provider: provider.to_string(),
            reason: message.to_string(),
        }
    }
}
