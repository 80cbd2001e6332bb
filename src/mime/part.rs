//! Owned MIME tree built from a `mail_parser` message.
//!
//! Each node is classified once into a [`PartKind`] so traversal matches on
//! variants rather than content-type strings.

use mail_parser::{Message, MessageParser, MimeHeaders, PartType};
use tracing::warn;

use crate::error::ExtractError;
use crate::mime::decode::decode_text;

/// Deepest nesting of containers and embedded messages that is followed.
pub const MAX_NESTING_DEPTH: usize = 50;

/// Most parts converted from a single raw message, nested messages included.
pub const MAX_PARTS: usize = 1_000;

/// Content-Disposition of a part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    None,
    Inline,
    Attachment,
    Other,
}

/// What a part is, decided from its content type and disposition.
#[derive(Debug, Clone, PartialEq)]
pub enum PartKind {
    /// Decoded text with invalid sequences dropped.
    PlainText(String),
    Html(String),
    NestedMessage(Box<MimeTree>),
    Multipart(Vec<MessagePart>),
    /// Non-text part with `Content-Disposition: attachment`.
    Attachment { filename: String, bytes: Vec<u8> },
    Other,
}

/// A node in the MIME tree.
#[derive(Debug, Clone, PartialEq)]
pub struct MessagePart {
    pub disposition: Disposition,
    pub kind: PartKind,
}

/// A parsed message: its subject and root part.
#[derive(Debug, Clone, PartialEq)]
pub struct MimeTree {
    pub subject: Option<String>,
    pub root: MessagePart,
}

/// Remaining allowance while converting one raw message.
struct Budget {
    parts_left: usize,
    exhausted_logged: bool,
}

impl Budget {
    fn take(&mut self) -> bool {
        if self.parts_left == 0 {
            if !self.exhausted_logged {
                warn!(max_parts = MAX_PARTS, "MIME part limit reached, ignoring remaining parts");
                self.exhausted_logged = true;
            }
            return false;
        }
        self.parts_left -= 1;
        true
    }
}

impl MimeTree {
    /// Parse raw RFC 822 bytes.
    ///
    /// Returns `Unparseable` when the bytes carry no recognisable message
    /// structure at all.
    pub fn parse(raw: &[u8]) -> Result<Self, ExtractError> {
        if raw.iter().all(u8::is_ascii_whitespace) {
            return Err(ExtractError::Unparseable("empty input".into()));
        }
        let message = MessageParser::default()
            .parse(raw)
            .ok_or_else(|| ExtractError::Unparseable("no headers or body found".into()))?;

        let mut budget = Budget {
            parts_left: MAX_PARTS,
            exhausted_logged: false,
        };
        Ok(Self::from_message(&message, 0, &mut budget))
    }

    fn from_message(message: &Message<'_>, depth: usize, budget: &mut Budget) -> Self {
        let root = if budget.take() {
            convert_part(message, message.root_part(), depth, budget)
        } else {
            MessagePart {
                disposition: Disposition::None,
                kind: PartKind::Other,
            }
        };
        Self {
            subject: message.subject().map(str::to_string),
            root,
        }
    }
}

fn convert_part(
    message: &Message<'_>,
    part: &mail_parser::MessagePart<'_>,
    depth: usize,
    budget: &mut Budget,
) -> MessagePart {
    let disposition = disposition_of(part);
    let kind = match &part.body {
        PartType::Multipart(ids) => {
            if depth >= MAX_NESTING_DEPTH {
                warn!(depth, "MIME nesting limit reached, skipping container");
                PartKind::Other
            } else {
                let mut children = Vec::with_capacity(ids.len());
                for id in ids {
                    if !budget.take() {
                        break;
                    }
                    if let Some(child) = message.part(*id) {
                        children.push(convert_part(message, child, depth + 1, budget));
                    }
                }
                PartKind::Multipart(children)
            }
        }
        PartType::Message(nested) => {
            if depth >= MAX_NESTING_DEPTH {
                warn!(depth, "MIME nesting limit reached, skipping embedded message");
                PartKind::Other
            } else {
                PartKind::NestedMessage(Box::new(MimeTree::from_message(
                    nested,
                    depth + 1,
                    budget,
                )))
            }
        }
        _ => leaf_kind(part, disposition),
    };
    MessagePart { disposition, kind }
}

fn leaf_kind(part: &mail_parser::MessagePart<'_>, disposition: Disposition) -> PartKind {
    let (ctype, subtype) = match part.content_type() {
        Some(ct) => (
            ct.ctype().to_ascii_lowercase(),
            ct.subtype().map(str::to_ascii_lowercase),
        ),
        // RFC 2045 default.
        None => ("text".to_string(), Some("plain".to_string())),
    };

    match (ctype.as_str(), subtype.as_deref()) {
        ("text", Some("plain")) => PartKind::PlainText(text_of(part)),
        ("text", Some("html")) => PartKind::Html(text_of(part)),
        _ if disposition == Disposition::Attachment => PartKind::Attachment {
            filename: part.attachment_name().unwrap_or_default().to_string(),
            bytes: part.contents().to_vec(),
        },
        _ => PartKind::Other,
    }
}

/// Charset-decoded text of a part.
///
/// mail-parser decodes unknown or broken charsets as lossy UTF-8; the
/// replacement characters it leaves behind are dropped here.
fn text_of(part: &mail_parser::MessagePart<'_>) -> String {
    match part.text_contents() {
        Some(text) => drop_replacement_chars(text),
        None => decode_text(part.contents()),
    }
}

fn drop_replacement_chars(text: &str) -> String {
    text.chars()
        .filter(|&c| c != char::REPLACEMENT_CHARACTER)
        .collect()
}

fn disposition_of(part: &mail_parser::MessagePart<'_>) -> Disposition {
    match part.content_disposition() {
        None => Disposition::None,
        Some(cd) if cd.is_attachment() => Disposition::Attachment,
        Some(cd) if cd.is_inline() => Disposition::Inline,
        Some(_) => Disposition::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_part_plain_is_leaf() {
        let raw = b"Subject: Oi\r\nContent-Type: text/plain; charset=utf-8\r\n\r\nCorpo\r\n";
        let tree = MimeTree::parse(raw).unwrap();
        assert_eq!(tree.subject.as_deref(), Some("Oi"));
        assert!(matches!(tree.root.kind, PartKind::PlainText(_)));
        assert_eq!(tree.root.disposition, Disposition::None);
    }

    #[test]
    fn multipart_children_are_classified() {
        let raw = concat!(
            "Subject: Misto\r\n",
            "MIME-Version: 1.0\r\n",
            "Content-Type: multipart/mixed; boundary=\"XX\"\r\n",
            "\r\n",
            "--XX\r\n",
            "Content-Type: text/plain; charset=utf-8\r\n",
            "\r\n",
            "texto\r\n",
            "--XX\r\n",
            "Content-Type: text/html; charset=utf-8\r\n",
            "\r\n",
            "<p>html</p>\r\n",
            "--XX\r\n",
            "Content-Type: application/pdf\r\n",
            "Content-Disposition: attachment; filename=\"boleto.pdf\"\r\n",
            "Content-Transfer-Encoding: base64\r\n",
            "\r\n",
            "JVBERi0=\r\n",
            "--XX\r\n",
            "Content-Type: image/png\r\n",
            "\r\n",
            "iVBORw0K\r\n",
            "--XX--\r\n",
        );
        let tree = MimeTree::parse(raw.as_bytes()).unwrap();
        let PartKind::Multipart(children) = &tree.root.kind else {
            panic!("Expected multipart root, got {:?}", tree.root.kind);
        };
        assert_eq!(children.len(), 4);
        assert!(matches!(children[0].kind, PartKind::PlainText(_)));
        assert!(matches!(children[1].kind, PartKind::Html(_)));
        match &children[2].kind {
            PartKind::Attachment { filename, bytes } => {
                assert_eq!(filename, "boleto.pdf");
                assert_eq!(bytes.as_slice(), b"%PDF-");
            }
            other => panic!("Expected attachment, got {:?}", other),
        }
        assert_eq!(children[2].disposition, Disposition::Attachment);
        assert_eq!(children[3].kind, PartKind::Other);
    }

    #[test]
    fn empty_input_is_unparseable() {
        assert!(matches!(
            MimeTree::parse(b"  \r\n"),
            Err(ExtractError::Unparseable(_))
        ));
    }

    #[test]
    fn deep_nesting_is_cut_off() {
        let mut raw = String::from("Content-Type: text/plain\r\n\r\nfundo\r\n");
        for _ in 0..(MAX_NESTING_DEPTH + 5) {
            raw = format!("Content-Type: message/rfc822\r\n\r\n{raw}");
        }
        let tree = MimeTree::parse(raw.as_bytes()).unwrap();

        let mut depth = 0;
        let mut node = &tree.root;
        while let PartKind::NestedMessage(inner) = &node.kind {
            depth += 1;
            node = &inner.root;
        }
        assert_eq!(depth, MAX_NESTING_DEPTH);
        assert_eq!(node.kind, PartKind::Other);
    }

    #[test]
    fn top_level_rfc822_is_nested_message() {
        let raw = b"Content-Type: message/rfc822\r\n\r\nContent-Type: text/plain\r\n\r\nPrazo hoje\r\n";
        let tree = MimeTree::parse(raw).unwrap();
        let PartKind::NestedMessage(inner) = &tree.root.kind else {
            panic!("Expected nested message root, got {:?}", tree.root.kind);
        };
        assert!(matches!(&inner.root.kind, PartKind::PlainText(text) if text.trim() == "Prazo hoje"));
    }

    #[test]
    fn unknown_charset_drops_invalid_bytes() {
        let raw = b"Content-Type: text/plain; charset=x-klingon\r\n\
                    Content-Transfer-Encoding: 8bit\r\n\r\n\
                    Prazo \xff\xfe hoje\r\n";
        let tree = MimeTree::parse(raw).unwrap();
        let PartKind::PlainText(text) = &tree.root.kind else {
            panic!("Expected plain text root, got {:?}", tree.root.kind);
        };
        assert!(!text.contains(char::REPLACEMENT_CHARACTER));
        assert!(text.starts_with("Prazo "));
        assert!(text.trim_end().ends_with(" hoje"));
    }

    #[test]
    fn replacement_chars_are_removed() {
        assert_eq!(drop_replacement_chars("ab\u{FFFD}c\u{FFFD}"), "abc");
    }
}
