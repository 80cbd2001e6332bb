//! Error types for mail-triage.

use std::time::Duration;

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Extraction error: {0}")]
    Extract(#[from] ExtractError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// LLM provider errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Provider {provider} rate limited, retry after {retry_after:?}")]
    RateLimited {
        provider: String,
        retry_after: Option<Duration>,
    },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("Authentication failed for provider {provider}")]
    AuthFailed { provider: String },

    #[error("Provider {provider} gave up after {attempts} attempts: {last}")]
    RetriesExhausted {
        provider: String,
        attempts: u32,
        last: String,
    },
}

impl LlmError {
    /// Whether a retry could plausibly succeed.
    ///
    /// Credential failures are permanent; everything else (rate limits,
    /// network trouble, odd responses) is worth another attempt.
    pub fn is_transient(&self) -> bool {
        !matches!(self, Self::AuthFailed { .. } | Self::RetriesExhausted { .. })
    }
}

/// MIME extraction errors.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("Message could not be parsed as MIME: {0}")]
    Unparseable(String),

    #[error("PDF extraction failed: {0}")]
    Pdf(String),
}

/// Batch processing errors surfaced to the caller.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Envie arquivo(s) .txt/.pdf/.eml ou cole o texto.")]
    MissingInput,

    #[error("Arquivo muito grande: {filename}.")]
    PayloadTooLarge { filename: String, limit: usize },

    #[error("Não foi possível extrair texto válido.")]
    NoExtractableText,

    #[error("Invalid upload: {0}")]
    Upload(String),
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, Error>;
