//! Coarse language guess for reporting.

use serde::{Deserialize, Serialize};

/// Words common in Portuguese customer email.
const PORTUGUESE_MARKERS: &[&str] = &[
    "você",
    "obrigado",
    "segue",
    "anexo",
    "favor",
    "prazo",
    "atualização",
    "dúvida",
    "chamado",
];

/// Markers needed before text is reported as Portuguese.
const MIN_MARKERS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Pt,
    En,
}

/// `Pt` when at least two Portuguese markers appear as substrings, else `En`.
pub fn detect_language(text: &str) -> Language {
    let lower = text.to_lowercase();
    let hits = PORTUGUESE_MARKERS
        .iter()
        .filter(|marker| lower.contains(*marker))
        .count();
    if hits >= MIN_MARKERS {
        Language::Pt
    } else {
        Language::En
    }
}
