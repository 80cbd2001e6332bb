//! Byte-to-text decoding that never fails.
//!
//! Three tiers, tried in order:
//! 1. The declared charset, strictly.
//! 2. UTF-8 with invalid sequences dropped.
//! 3. Latin-1, where every byte maps to a character.

use tracing::debug;

/// Which tier produced the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeTier {
    Declared,
    LossyUtf8,
    Latin1,
}

/// Decoded text plus the tier that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub text: String,
    pub tier: DecodeTier,
}

/// Decode `bytes` using `charset` when given, degrading fidelity instead of
/// failing.
pub fn decode_bytes(bytes: &[u8], charset: Option<&str>) -> Decoded {
    let declared = charset.map(normalize_charset).unwrap_or("utf-8");

    if let Some(text) = decode_declared(bytes, declared) {
        return Decoded {
            text,
            tier: DecodeTier::Declared,
        };
    }

    let lossy = decode_utf8_dropping_invalid(bytes);
    if !lossy.is_empty() || bytes.is_empty() {
        debug!(charset = declared, "Declared charset failed, using lossy UTF-8");
        return Decoded {
            text: lossy,
            tier: DecodeTier::LossyUtf8,
        };
    }

    debug!(charset = declared, "Nothing recoverable as UTF-8, using Latin-1");
    Decoded {
        text: decode_latin1(bytes),
        tier: DecodeTier::Latin1,
    }
}

/// Decode as UTF-8, falling back through the lower tiers.
pub fn decode_text(bytes: &[u8]) -> String {
    decode_bytes(bytes, None).text
}

fn normalize_charset(charset: &str) -> &'static str {
    match charset.trim().trim_matches('"').to_ascii_lowercase().as_str() {
        "utf-8" | "utf8" => "utf-8",
        "us-ascii" | "ascii" => "us-ascii",
        "iso-8859-1" | "iso8859-1" | "latin1" | "latin-1" | "l1" => "iso-8859-1",
        "windows-1252" | "cp1252" => "windows-1252",
        _ => "unknown",
    }
}

fn decode_declared(bytes: &[u8], charset: &str) -> Option<String> {
    match charset {
        "utf-8" => std::str::from_utf8(bytes).ok().map(str::to_string),
        "us-ascii" => bytes
            .is_ascii()
            .then(|| bytes.iter().map(|&b| b as char).collect()),
        // windows-1252 differs from Latin-1 only in 0x80..0x9F; those land
        // as C1 controls and are stripped downstream.
        "iso-8859-1" | "windows-1252" => Some(decode_latin1(bytes)),
        _ => None,
    }
}

fn decode_utf8_dropping_invalid(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .chars()
        .filter(|&c| c != char::REPLACEMENT_CHARACTER)
        .collect()
}

fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}
