//! Body and attachment extraction from a [`MimeTree`].

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::error::ExtractError;
use crate::mime::html::html_to_text;
use crate::mime::part::{Disposition, MessagePart, MimeTree, PartKind};

/// Attachment extensions whose bytes are surfaced to the caller.
const ALLOWED_ATTACHMENT_EXTENSIONS: &[&str] = &[".txt", ".pdf"];

static MULTI_WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s{2,}").expect("valid regex"));

/// An attachment kept for text extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// What an email yields: its body text, subject, and usable attachments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionResult {
    pub subject: Option<String>,
    /// Resolved body, possibly empty.
    pub body: String,
    /// `.txt` and `.pdf` attachments in document order.
    pub attachments: Vec<Attachment>,
}

/// Candidate bodies gathered during a walk.
#[derive(Default)]
struct Candidates {
    plain: Vec<String>,
    html: Vec<String>,
    attachments: Vec<Attachment>,
}

/// Parse raw `.eml` bytes and extract body text and attachments.
///
/// Fails only when the bytes cannot be parsed as a message at all.
pub fn extract_eml(raw: &[u8]) -> Result<ExtractionResult, ExtractError> {
    let tree = MimeTree::parse(raw)?;
    Ok(walk_tree(&tree))
}

/// Walk an already-parsed tree.
pub fn walk_tree(tree: &MimeTree) -> ExtractionResult {
    let mut candidates = Candidates::default();

    // A single-leaf message is its own body whatever its disposition.
    match &tree.root.kind {
        PartKind::PlainText(text) => candidates.plain.push(text.clone()),
        PartKind::Html(text) => candidates.html.push(text.clone()),
        _ => visit(&tree.root, &mut candidates),
    }

    debug!(
        plain = candidates.plain.len(),
        html = candidates.html.len(),
        attachments = candidates.attachments.len(),
        "MIME walk complete"
    );

    let body = select_body(&candidates.plain, &candidates.html);
    ExtractionResult {
        subject: tree.subject.clone(),
        body: MULTI_WHITESPACE.replace_all(&body, " ").trim().to_string(),
        attachments: candidates.attachments,
    }
}

fn visit(part: &MessagePart, candidates: &mut Candidates) {
    let text_disposition = matches!(
        part.disposition,
        Disposition::None | Disposition::Inline | Disposition::Attachment
    );

    match &part.kind {
        PartKind::Multipart(children) => {
            for child in children {
                visit(child, candidates);
            }
        }
        PartKind::NestedMessage(tree) => {
            let nested = walk_tree(tree);
            if !nested.body.is_empty() {
                candidates.plain.push(nested.body);
            }
            candidates.attachments.extend(nested.attachments);
        }
        PartKind::PlainText(text) if text_disposition => candidates.plain.push(text.clone()),
        PartKind::Html(text) if text_disposition => candidates.html.push(text.clone()),
        PartKind::Attachment { filename, bytes } => {
            if is_allowed_attachment(filename) {
                candidates.attachments.push(Attachment {
                    filename: filename.clone(),
                    bytes: bytes.clone(),
                });
            } else {
                debug!(filename = %filename, "Discarding attachment of unsupported type");
            }
        }
        _ => {}
    }
}

/// Longest plain candidate wins; otherwise the longest HTML one, rendered.
fn select_body(plain: &[String], html: &[String]) -> String {
    if let Some(best) = longest(plain) {
        return best.trim().to_string();
    }
    if let Some(best) = longest(html) {
        return html_to_text(best);
    }
    String::new()
}

/// First of the longest strings by character count.
fn longest(candidates: &[String]) -> Option<&String> {
    candidates
        .iter()
        .rev()
        .max_by_key(|text| text.chars().count())
}

fn is_allowed_attachment(filename: &str) -> bool {
    let lower = filename.to_lowercase();
    ALLOWED_ATTACHMENT_EXTENSIONS
        .iter()
        .any(|ext| lower.ends_with(ext))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(text: &str) -> MessagePart {
        MessagePart {
            disposition: Disposition::None,
            kind: PartKind::PlainText(text.to_string()),
        }
    }

    fn html(text: &str) -> MessagePart {
        MessagePart {
            disposition: Disposition::None,
            kind: PartKind::Html(text.to_string()),
        }
    }

    fn container(children: Vec<MessagePart>) -> MimeTree {
        MimeTree {
            subject: None,
            root: MessagePart {
                disposition: Disposition::None,
                kind: PartKind::Multipart(children),
            },
        }
    }

    #[test]
    fn single_part_plain_round_trip() {
        let raw = "Subject: Chamado\r\nContent-Type: text/plain; charset=utf-8\r\n\
                   Content-Transfer-Encoding: 8bit\r\n\r\n\
                   Olá, preciso do status do chamado 123456?\r\n";
        let result = extract_eml(raw.as_bytes()).unwrap();
        assert_eq!(result.body, "Olá, preciso do status do chamado 123456?");
        assert_eq!(result.subject.as_deref(), Some("Chamado"));
        assert!(result.attachments.is_empty());
    }

    #[test]
    fn nested_message_body_is_recovered() {
        let raw = concat!(
            "Subject: Fwd\r\n",
            "MIME-Version: 1.0\r\n",
            "Content-Type: multipart/mixed; boundary=\"outer\"\r\n",
            "\r\n",
            "--outer\r\n",
            "Content-Type: message/rfc822\r\n",
            "\r\n",
            "Subject: Original\r\n",
            "Content-Type: text/plain; charset=utf-8\r\n",
            "\r\n",
            "Anexo o protocolo 998877, favor validar.\r\n",
            "--outer--\r\n",
        );
        let result = extract_eml(raw.as_bytes()).unwrap();
        assert_eq!(result.body, "Anexo o protocolo 998877, favor validar.");
    }

    #[test]
    fn html_only_message_is_rendered() {
        let raw = concat!(
            "Subject: Prazo\r\n",
            "Content-Type: text/html; charset=utf-8\r\n",
            "\r\n",
            "<html><body><script>ignore</script><p>Prazo até sexta</p></body></html>\r\n",
        );
        let result = extract_eml(raw.as_bytes()).unwrap();
        assert_eq!(result.body, "Prazo até sexta");
    }

    #[test]
    fn longest_plain_candidate_wins() {
        let tree = container(vec![
            plain("curto"),
            plain("um texto bem mais longo"),
            html("<p>html ainda mais longo que todos os outros</p>"),
        ]);
        assert_eq!(walk_tree(&tree).body, "um texto bem mais longo");
    }

    #[test]
    fn ties_keep_first_candidate() {
        let tree = container(vec![plain("abc"), plain("xyz")]);
        assert_eq!(walk_tree(&tree).body, "abc");
    }

    #[test]
    fn html_used_only_without_plain() {
        let tree = container(vec![html("<p>Segue anexo</p>"), html("<b>x</b>")]);
        assert_eq!(walk_tree(&tree).body, "Segue anexo");
    }

    #[test]
    fn whitespace_runs_collapse() {
        let tree = container(vec![plain("  Bom   dia\n\n\nequipe  ")]);
        assert_eq!(walk_tree(&tree).body, "Bom dia equipe");
    }

    #[test]
    fn attachments_filtered_by_extension() {
        let tree = container(vec![
            plain("corpo"),
            MessagePart {
                disposition: Disposition::Attachment,
                kind: PartKind::Attachment {
                    filename: "Boleto.PDF".into(),
                    bytes: b"%PDF-".to_vec(),
                },
            },
            MessagePart {
                disposition: Disposition::Attachment,
                kind: PartKind::Attachment {
                    filename: "foto.jpg".into(),
                    bytes: vec![0xff, 0xd8],
                },
            },
        ]);
        let result = walk_tree(&tree);
        assert_eq!(result.attachments.len(), 1);
        assert_eq!(result.attachments[0].filename, "Boleto.PDF");
    }

    #[test]
    fn nested_attachments_merge_into_outer_result() {
        let inner = container(vec![
            plain("interno"),
            MessagePart {
                disposition: Disposition::Attachment,
                kind: PartKind::Attachment {
                    filename: "notas.txt".into(),
                    bytes: b"nota".to_vec(),
                },
            },
        ]);
        let tree = container(vec![
            plain("externo mais longo"),
            MessagePart {
                disposition: Disposition::None,
                kind: PartKind::NestedMessage(Box::new(inner)),
            },
        ]);
        let result = walk_tree(&tree);
        assert_eq!(result.body, "externo mais longo");
        assert_eq!(result.attachments.len(), 1);
        assert_eq!(result.attachments[0].filename, "notas.txt");
    }

    #[test]
    fn other_disposition_text_is_ignored() {
        let tree = container(vec![MessagePart {
            disposition: Disposition::Other,
            kind: PartKind::PlainText("form field".into()),
        }]);
        assert_eq!(walk_tree(&tree).body, "");
    }

    #[test]
    fn top_level_forwarded_message_body_is_recovered() {
        let raw = b"Subject: Fwd\r\nContent-Type: message/rfc822\r\n\r\n\
                    Subject: Original\r\nContent-Type: text/plain\r\n\r\n\
                    Prazo hoje\r\n";
        let result = extract_eml(raw).unwrap();
        assert_eq!(result.body, "Prazo hoje");
    }

    #[test]
    fn top_level_attachment_is_surfaced() {
        let tree = MimeTree {
            subject: None,
            root: MessagePart {
                disposition: Disposition::Attachment,
                kind: PartKind::Attachment {
                    filename: "pedido.txt".into(),
                    bytes: b"pedido".to_vec(),
                },
            },
        };
        let result = walk_tree(&tree);
        assert_eq!(result.body, "");
        assert_eq!(result.attachments.len(), 1);
    }

    #[test]
    fn unknown_charset_leaves_no_replacement_chars() {
        let raw = b"Content-Type: text/plain; charset=x-klingon\r\n\
                    Content-Transfer-Encoding: 8bit\r\n\r\n\
                    Prazo \xff\xfe hoje\r\n";
        let result = extract_eml(raw).unwrap();
        assert!(!result.body.contains(char::REPLACEMENT_CHARACTER));
        assert!(result.body.starts_with("Prazo"));
        assert!(result.body.ends_with("hoje"));
    }

    #[test]
    fn no_text_parts_yield_empty_body() {
        let tree = container(vec![MessagePart {
            disposition: Disposition::None,
            kind: PartKind::Other,
        }]);
        assert_eq!(walk_tree(&tree), ExtractionResult::default());
    }
}
