//! Plain text from uploaded documents.

use tracing::{debug, warn};

use crate::error::ExtractError;
use crate::mime::decode_text;

/// Extract text from a PDF held in memory.
///
/// `pdf-extract` can panic on malformed input, so the call is isolated with
/// `catch_unwind`.
pub fn extract_pdf_text(bytes: &[u8]) -> Result<String, ExtractError> {
    let result = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes));
    match result {
        Ok(Ok(text)) => {
            debug!(chars = text.len(), "Extracted PDF text");
            Ok(text)
        }
        Ok(Err(e)) => Err(ExtractError::Pdf(e.to_string())),
        Err(_) => Err(ExtractError::Pdf(
            "PDF extraction panicked (malformed file)".to_string(),
        )),
    }
}

/// PDF text, or empty text when extraction fails.
pub fn pdf_text_or_empty(bytes: &[u8]) -> String {
    extract_pdf_text(bytes).unwrap_or_else(|e| {
        warn!(error = %e, "PDF extraction failed, treating as empty");
        String::new()
    })
}

/// Text of a document by file extension, or `None` for unsupported types.
///
/// `.txt` is decoded through the byte-decoding tiers, `.pdf` through
/// [`pdf_text_or_empty`].
pub fn document_text(filename: &str, bytes: &[u8]) -> Option<String> {
    let lower = filename.to_lowercase();
    if lower.ends_with(".txt") {
        Some(decode_text(bytes))
    } else if lower.ends_with(".pdf") {
        Some(pdf_text_or_empty(bytes))
    } else {
        None
    }
}
