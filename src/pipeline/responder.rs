//! Suggested replies.
//!
//! With a provider configured the reply is generated by the model and
//! trimmed to two sentences; otherwise, or on any failure, a fixed template
//! for the category is returned.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::llm::retry::with_retry;
use crate::llm::{ChatMessage, CompletionRequest, LlmProvider, RetryPolicy};
use crate::pipeline::types::Category;

const REPLY_MAX_TOKENS: u32 = 110;
const REPLY_TEMPERATURE: f32 = 0.4;
/// Longest message excerpt sent to the model, in characters.
const MAX_INPUT_CHARS: usize = 3500;
/// Longest attendant note included in the instruction, in characters.
const MAX_INSTRUCTION_CHARS: usize = 300;
const MAX_SENTENCES: usize = 2;

pub const TEMPLATE_REQUIRES_ACTION: &str = "Olá! Obrigado pela mensagem. Poderia confirmar o \
    número do protocolo ou anexar os documentos necessários para seguirmos?";
pub const TEMPLATE_NO_ACTION: &str =
    "Olá! Agradecemos a sua mensagem. Permanecemos à disposição para apoiar no que precisar.";

/// Fixed reply for a category.
pub fn template_for(category: Category) -> &'static str {
    match category {
        Category::RequiresAction => TEMPLATE_REQUIRES_ACTION,
        Category::NoActionNeeded => TEMPLATE_NO_ACTION,
    }
}

pub struct Responder {
    provider: Option<Arc<dyn LlmProvider>>,
    retry: RetryPolicy,
}

impl Responder {
    pub fn new(provider: Option<Arc<dyn LlmProvider>>) -> Self {
        Self {
            provider,
            retry: RetryPolicy::default(),
        }
    }

    /// A responder that only uses templates.
    pub fn templates_only() -> Self {
        Self::new(None)
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Suggest a short reply to `text`. Never fails.
    pub async fn suggest_reply(
        &self,
        text: &str,
        category: Category,
        extra_instructions: Option<&str>,
    ) -> String {
        let Some(provider) = &self.provider else {
            return template_for(category).to_string();
        };

        let request = CompletionRequest::new(vec![
            ChatMessage::system(system_instruction(category, extra_instructions)),
            ChatMessage::user(format!(
                "E-mail do cliente:\n{}\n\nResponda apenas a mensagem ao cliente.",
                truncate_chars(text.trim(), MAX_INPUT_CHARS)
            )),
        ])
        .with_temperature(REPLY_TEMPERATURE)
        .with_max_tokens(REPLY_MAX_TOKENS);

        let result = with_retry(&self.retry, provider.model_name(), || {
            provider.complete(request.clone())
        })
        .await;

        match result {
            Ok(response) => {
                let reply = clean_reply(&response.content);
                if reply.is_empty() {
                    debug!("Empty model reply, using template");
                    template_for(category).to_string()
                } else {
                    reply
                }
            }
            Err(e) => {
                warn!(error = %e, "Reply generation failed, using template");
                template_for(category).to_string()
            }
        }
    }
}

fn system_instruction(category: Category, extra: Option<&str>) -> String {
    let mut instruction = String::from(
        "Você é um assistente de e-mails. \
         Responda SEMPRE em português, de forma curta, cordial e objetiva (máximo 2 frases). \
         Se a categoria for Produtivo, peça um próximo passo prático (ex.: confirmar protocolo, \
         anexar documento, autorizar acesso). \
         Se a categoria for Improdutivo, agradeça e encerre cordialmente. ",
    );
    if let Some(extra) = extra.map(str::trim).filter(|e| !e.is_empty()) {
        let extra: String = extra.chars().take(MAX_INSTRUCTION_CHARS).collect();
        instruction.push_str(&format!("Instruções do atendente: {extra} "));
    }
    instruction.push_str(&format!("Categoria: {}.", category.label()));
    instruction
}

/// First `max` characters of `text`, with `…` appended when cut.
fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}…", &text[..cut]),
        None => text.to_string(),
    }
}

/// Drop a leading `Resposta:` label and keep at most two sentences.
fn clean_reply(raw: &str) -> String {
    let mut reply = raw.trim();
    if reply
        .get(..9)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("resposta:"))
    {
        reply = reply[9..].trim_start();
    }
    first_sentences(reply, MAX_SENTENCES).trim().to_string()
}

/// Prefix of `text` holding its first `n` sentences.
///
/// A sentence ends at a run of `.`, `!` or `?` followed by whitespace or the
/// end of the text.
fn first_sentences(text: &str, n: usize) -> &str {
    let mut seen = 0;
    let mut chars = text.char_indices().peekable();
    while let Some((_, c)) = chars.next() {
        if !matches!(c, '.' | '!' | '?') {
            continue;
        }
        while let Some(&(_, next)) = chars.peek() {
            if matches!(next, '.' | '!' | '?') {
                chars.next();
            } else {
                break;
            }
        }
        match chars.peek() {
            Some(&(idx, next)) if next.is_whitespace() => {
                seen += 1;
                if seen == n {
                    return &text[..idx];
                }
            }
            None => return text,
            _ => {}
        }
    }
    text
}
