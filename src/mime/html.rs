//! HTML body to visible text.

use std::sync::LazyLock;

use html2text::render::TrivialDecorator;
use regex::Regex;
use tracing::warn;

/// Wide enough that html2text never wraps inside a word.
const RENDER_WIDTH: usize = 4096;

static INVISIBLE_ELEMENTS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<script\b.*?</script\s*>|<style\b.*?</style\s*>|<noscript\b.*?</noscript\s*>")
        .expect("valid regex")
});

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));

/// Convert HTML to visible text on a single line.
///
/// Script, style and noscript elements are dropped before rendering; block
/// boundaries become single spaces. Rendering is undecorated: no emphasis
/// markers, heading or list prefixes, or link footnotes.
pub fn html_to_text(html: &str) -> String {
    let visible = INVISIBLE_ELEMENTS.replace_all(html, " ");
    let rendered = match html2text::from_read_with_decorator(
        visible.as_bytes(),
        RENDER_WIDTH,
        TrivialDecorator::new(),
    ) {
        Ok(text) => text,
        Err(e) => {
            warn!(error = %e, "HTML rendering failed, stripping tags instead");
            TAG.replace_all(&visible, " ").into_owned()
        }
    };
    collapse_whitespace(&rendered)
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
