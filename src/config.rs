//! Configuration types, built from environment variables.

use crate::error::ConfigError;
use crate::llm::{LlmBackend, LlmConfig};

/// Default per-file upload limit: 10 MiB.
pub const DEFAULT_MAX_BYTES: usize = 10 * 1024 * 1024;

/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 8000;

/// Default model for both arbitration and reply drafting.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Service configuration.
#[derive(Debug, Clone)]
pub struct TriageConfig {
    /// HTTP listen port.
    pub port: u16,
    /// Maximum accepted size of a single uploaded file.
    pub max_upload_bytes: usize,
    /// Whether indeterminate scores are sent to the external classifier.
    pub arbitration_enabled: bool,
    /// LLM used for arbitration. `None` when no credential is configured.
    pub classifier_llm: Option<LlmConfig>,
    /// LLM used for reply drafting. `None` when no credential is configured.
    pub reply_llm: Option<LlmConfig>,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            max_upload_bytes: DEFAULT_MAX_BYTES,
            arbitration_enabled: false,
            classifier_llm: None,
            reply_llm: None,
        }
    }
}

impl TriageConfig {
    /// Build config from environment variables.
    ///
    /// Unparseable numeric values fall back to their defaults.
    pub fn from_env() -> Self {
        let port: u16 = std::env::var("MAIL_TRIAGE_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let max_upload_bytes: usize = std::env::var("MAX_BYTES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_MAX_BYTES);

        let arbitration_enabled = std::env::var("USE_OPENAI_CLASSIFIER")
            .map(|v| parse_flag(&v))
            .unwrap_or(false);

        let backend = std::env::var("LLM_BACKEND")
            .ok()
            .and_then(|s| parse_backend(&s))
            .unwrap_or(LlmBackend::OpenAi);

        let key_var = match backend {
            LlmBackend::OpenAi => "OPENAI_API_KEY",
            LlmBackend::Anthropic => "ANTHROPIC_API_KEY",
        };
        let api_key = std::env::var(key_var).ok().filter(|k| !k.trim().is_empty());

        let reply_model =
            std::env::var("OPENAI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let classifier_model =
            std::env::var("OPENAI_CLASSIFIER_MODEL").unwrap_or_else(|_| reply_model.clone());

        let (classifier_llm, reply_llm) = match api_key {
            Some(key) => (
                Some(LlmConfig {
                    backend,
                    api_key: secrecy::SecretString::from(key.clone()),
                    model: classifier_model,
                }),
                Some(LlmConfig {
                    backend,
                    api_key: secrecy::SecretString::from(key),
                    model: reply_model,
                }),
            ),
            None => (None, None),
        };

        Self {
            port,
            max_upload_bytes,
            arbitration_enabled,
            classifier_llm,
            reply_llm,
        }
    }
}

impl TriageConfig {
    /// Reject settings the service cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_upload_bytes == 0 {
            return Err(ConfigError::InvalidValue {
                key: "MAX_BYTES".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

/// Accepts the same truthy spellings the service has always honoured.
pub fn parse_flag(value: &str) -> bool {
    matches!(value, "1" | "true" | "True")
}

fn parse_backend(value: &str) -> Option<LlmBackend> {
    match value.trim().to_ascii_lowercase().as_str() {
        "openai" => Some(LlmBackend::OpenAi),
        "anthropic" => Some(LlmBackend::Anthropic),
        _ => None,
    }
}
