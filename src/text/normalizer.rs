//! Text cleanup and term ranking ahead of classification.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::text::stopwords::is_stopword;

/// Number of ranked terms returned.
pub const TOP_TERMS: usize = 10;

/// A signature marker only truncates when its last occurrence starts after
/// this many characters.
const SIGNATURE_MIN_OFFSET: usize = 80;

/// Scanned in order; the first qualifying marker wins.
const SIGNATURE_MARKERS: &[&str] = &[
    "att,",
    "atenciosamente",
    "enviado do meu iphone",
    "confidencial",
    "esta mensagem e seus anexos",
    "este e-mail e confidencial",
];

static HEADER_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\A(?:from|de):").expect("valid regex"));
static BLANK_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\r?\n[ \t]*\r?\n").expect("valid regex"));
static URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)https?://\S+").expect("valid regex"));
static EMAIL_ADDRESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").expect("valid regex")
});
static DISALLOWED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9À-ÿ\n\s.,;:!?-]").expect("valid regex"));
static MULTI_WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s{2,}").expect("valid regex"));
static WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\w{2,}\b").expect("valid regex"));

/// Output of [`preprocess`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedText {
    /// Space-joined lowercase tokens, stopwords removed.
    pub clean: String,
    /// Up to ten most frequent tokens, ties broken alphabetically.
    pub top_terms: Vec<String>,
}

impl NormalizedText {
    pub fn token_count(&self) -> usize {
        self.clean.split_whitespace().count()
    }
}

/// Clean `raw` into tokens and rank its most frequent terms.
///
/// Pure and deterministic. Feeding `clean` back in returns the same tokens.
pub fn preprocess(raw: &str) -> NormalizedText {
    let text = strip_header_block(raw.trim());
    let text = URL.replace_all(text, " ");
    let text = EMAIL_ADDRESS.replace_all(&text, " ");
    let text = truncate_signature(&text);
    let text = transliterate(text);
    let text = DISALLOWED.replace_all(&text, " ");
    let text = MULTI_WHITESPACE.replace_all(&text, " ");
    let lowered = text.trim().to_lowercase();

    let tokens: Vec<&str> = WORD
        .find_iter(&lowered)
        .map(|m| m.as_str())
        .filter(|token| !is_stopword(token))
        .collect();

    NormalizedText {
        clean: tokens.join(" "),
        top_terms: rank_terms(&tokens),
    }
}

/// Drop a leading `From:` / `De:` block through the first blank line, or
/// just its first line when no blank line follows.
fn strip_header_block(text: &str) -> &str {
    if !HEADER_START.is_match(text) {
        return text;
    }
    match BLANK_LINE.find(text) {
        Some(m) => &text[m.end()..],
        None => text.find('\n').map_or("", |i| &text[i + 1..]),
    }
}

fn truncate_signature(text: &str) -> &str {
    // Char-for-char lowercase keeps character offsets aligned with `text`.
    let lowered: String = text
        .chars()
        .map(|c| c.to_lowercase().next().unwrap_or(c))
        .collect();

    for marker in SIGNATURE_MARKERS {
        let Some(byte_idx) = lowered.rfind(marker) else {
            continue;
        };
        let char_idx = lowered[..byte_idx].chars().count();
        if char_idx > SIGNATURE_MIN_OFFSET {
            let cut = text
                .char_indices()
                .nth(char_idx)
                .map_or(text.len(), |(i, _)| i);
            return &text[..cut];
        }
    }
    text
}

/// Map accented letters to their unaccented base.
pub fn transliterate(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.nfd().filter(|c| !is_combining_mark(*c)) {
        match c {
            'ß' => out.push_str("ss"),
            'æ' => out.push_str("ae"),
            'Æ' => out.push_str("AE"),
            'œ' => out.push_str("oe"),
            'Œ' => out.push_str("OE"),
            'ø' => out.push('o'),
            'Ø' => out.push('O'),
            '\u{2013}' | '\u{2014}' => out.push('-'),
            _ => out.push(c),
        }
    }
    out
}

fn rank_terms(tokens: &[&str]) -> Vec<String> {
    let mut freq: HashMap<&str, usize> = HashMap::new();
    for &token in tokens {
        *freq.entry(token).or_default() += 1;
    }
    let mut ranked: Vec<(&str, usize)> = freq.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked
        .into_iter()
        .take(TOP_TERMS)
        .map(|(term, _)| term.to_string())
        .collect()
}
