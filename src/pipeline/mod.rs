//! Triage pipeline.
//!
//! Every text part of a batch flows through:
//! 1. `preprocess()`: clean tokens and top terms
//! 2. `heuristic_score()`: lexical signals on the raw text
//! 3. `ArbitrationBridge::arbitrate()`: external label for ambiguous scores
//! 4. `Responder::suggest_reply()`: model reply or category template
//!
//! `MessageProcessor` drives the steps for a whole upload batch.

pub mod arbiter;
pub mod classifier;
pub mod processor;
pub mod responder;
pub mod scorer;
pub mod signals;
pub mod types;

pub use arbiter::ArbitrationBridge;
pub use classifier::Classifier;
pub use processor::MessageProcessor;
pub use responder::Responder;
pub use scorer::heuristic_score;
pub use types::{Category, Classification, DecisionSource, FallbackReason, RuleResult};
