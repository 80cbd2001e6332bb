//! Email content extraction.
//!
//! Raw `.eml` bytes are parsed into an owned [`MimeTree`] (bounded in depth
//! and part count), then walked to pick a body and collect attachments:
//! 1. `MimeTree::parse()`: classify every part into a `PartKind`
//! 2. `walk_tree()`: gather plain / HTML candidates and attachments
//! 3. Body selection: longest plain text, else longest HTML rendered to text

pub mod decode;
pub mod html;
pub mod part;
pub mod walker;

pub use decode::{decode_bytes, decode_text};
pub use part::{Disposition, MessagePart, MimeTree, PartKind};
pub use walker::{Attachment, ExtractionResult, extract_eml, walk_tree};
