//! Text normalization: cleanup, tokenization, term ranking, language guess.

pub mod language;
pub mod normalizer;
pub mod stopwords;

pub use language::{Language, detect_language};
pub use normalizer::{NormalizedText, preprocess};
