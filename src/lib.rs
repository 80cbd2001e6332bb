//! Mail Triage: email content extraction and rule-based triage.

pub mod api;
pub mod config;
pub mod error;
pub mod extract;
pub mod llm;
pub mod mime;
pub mod pipeline;
pub mod text;
