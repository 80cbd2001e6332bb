//! Batch processor: turns uploads and pasted text into triage results.
//!
//! Flow per request:
//! 1. Collect text parts from files (`.txt`, `.pdf`, `.eml` with its
//!    attachments) and the pasted text
//! 2. Normalize each part and guess its language
//! 3. Classify (scorer, then arbitration when ambiguous)
//! 4. Suggest a reply

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::TriageConfig;
use crate::error::{self, PipelineError};
use crate::extract::document_text;
use crate::llm::{LlmConfig, LlmProvider, create_provider};
use crate::mime::{decode_text, extract_eml};
use crate::pipeline::arbiter::ArbitrationBridge;
use crate::pipeline::classifier::Classifier;
use crate::pipeline::responder::Responder;
use crate::pipeline::types::{ProcessBatch, ProcessRequest, ProcessedEmail, Upload};
use crate::text::{detect_language, preprocess};

/// A piece of text to triage, with the subject it came with.
#[derive(Debug, Clone, PartialEq, Eq)]
struct TextPart {
    text: String,
    subject: Option<String>,
}

impl TextPart {
    fn bare(text: String) -> Self {
        Self {
            text,
            subject: None,
        }
    }
}

/// Processes triage batches.
///
/// Holds no per-request state; share one instance across requests.
pub struct MessageProcessor {
    classifier: Classifier,
    responder: Responder,
    max_upload_bytes: usize,
}

impl MessageProcessor {
    pub fn new(classifier: Classifier, responder: Responder, max_upload_bytes: usize) -> Self {
        Self {
            classifier,
            responder,
            max_upload_bytes,
        }
    }

    /// Validate `config` and build a processor with its providers.
    ///
    /// Providers are created here once; a role without credentials runs
    /// heuristic-only or with templates.
    pub fn from_config(config: &TriageConfig) -> error::Result<Self> {
        config.validate()?;
        let classifier_llm = build_provider(config.classifier_llm.as_ref())?;
        let reply_llm = build_provider(config.reply_llm.as_ref())?;

        Ok(Self::new(
            Classifier::new(ArbitrationBridge::new(
                classifier_llm,
                config.arbitration_enabled,
            )),
            Responder::new(reply_llm),
            config.max_upload_bytes,
        ))
    }

    /// Process every file and the pasted text of `request`.
    ///
    /// Fails when the request carries no input, a file exceeds the upload
    /// limit, or nothing yields usable text.
    pub async fn process(&self, request: ProcessRequest) -> Result<ProcessBatch, PipelineError> {
        let has_text = request.text.as_deref().is_some_and(|t| !t.trim().is_empty());
        if request.files.is_empty() && !has_text {
            return Err(PipelineError::MissingInput);
        }

        info!(
            files = request.files.len(),
            has_text, "Processing triage batch"
        );

        let parts = self.collect_parts(&request)?;
        let extra = request.extra_instructions.as_deref();

        let mut results = Vec::with_capacity(parts.len());
        for part in parts.into_iter().filter(|p| !p.text.trim().is_empty()) {
            results.push(self.process_part(&part, extra).await);
        }

        if results.is_empty() {
            return Err(PipelineError::NoExtractableText);
        }

        info!(results = results.len(), "Triage batch complete");
        Ok(ProcessBatch { results })
    }

    async fn process_part(&self, part: &TextPart, extra: Option<&str>) -> ProcessedEmail {
        let language = detect_language(&part.text);
        let normalized = preprocess(&part.text);
        let classification = self
            .classifier
            .classify(&part.text, part.subject.as_deref())
            .await;

        let result = &classification.result;
        let terms = if result.terms().is_empty() {
            normalized.top_terms.clone()
        } else {
            result.terms().to_vec()
        };
        let reply = self
            .responder
            .suggest_reply(&part.text, result.category, extra)
            .await;

        debug!(
            category = result.category.label(),
            confidence = result.confidence,
            source = ?classification.source,
            "Classified text part"
        );

        ProcessedEmail {
            category: result.category,
            confidence: round4(result.confidence),
            reply,
            terms,
            language,
            tokens: normalized.token_count(),
            source: classification.source,
        }
    }

    /// Text parts in upload order, pasted text last.
    fn collect_parts(&self, request: &ProcessRequest) -> Result<Vec<TextPart>, PipelineError> {
        let mut parts = Vec::new();

        for upload in &request.files {
            if upload.filename.trim().is_empty() || upload.bytes.is_empty() {
                debug!(filename = %upload.filename, "Skipping empty upload");
                continue;
            }
            if upload.bytes.len() > self.max_upload_bytes {
                return Err(PipelineError::PayloadTooLarge {
                    filename: upload.filename.clone(),
                    limit: self.max_upload_bytes,
                });
            }
            parts.extend(self.upload_parts(upload));
        }

        if let Some(text) = request.text.as_deref().filter(|t| !t.trim().is_empty()) {
            parts.push(TextPart::bare(text.to_string()));
        }

        Ok(parts)
    }

    fn upload_parts(&self, upload: &Upload) -> Vec<TextPart> {
        let name = upload.filename.to_lowercase();
        if !name.ends_with(".eml") {
            return match document_text(&name, &upload.bytes) {
                Some(text) => vec![TextPart::bare(text)],
                None => {
                    debug!(filename = %upload.filename, "Ignoring unsupported file type");
                    Vec::new()
                }
            };
        }

        let extraction = match extract_eml(&upload.bytes) {
            Ok(extraction) => extraction,
            Err(e) => {
                warn!(
                    filename = %upload.filename,
                    error = %e,
                    "Unparseable .eml, treating raw bytes as text"
                );
                return vec![TextPart::bare(decode_text(&upload.bytes))];
            }
        };

        let mut parts = Vec::with_capacity(1 + extraction.attachments.len());
        if !extraction.body.is_empty() {
            parts.push(TextPart {
                text: extraction.body,
                subject: extraction.subject,
            });
        }
        for attachment in &extraction.attachments {
            if let Some(text) = document_text(&attachment.filename, &attachment.bytes) {
                parts.push(TextPart::bare(text));
            }
        }
        parts
    }
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

fn build_provider(config: Option<&LlmConfig>) -> error::Result<Option<Arc<dyn LlmProvider>>> {
    Ok(config.map(create_provider).transpose()?)
}
