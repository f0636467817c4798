//! Automod Classifiers
//!
//! The classifier adapter and the moderation pipeline:
//! - `HateSpeechClassifier` wraps a black-box text -> (label, confidence)
//!   inference call behind an explicit load-once lifecycle
//! - `BertHateClassifier` is the Candle-backed production implementation
//! - `ContentModerator` applies the classifier per field and aggregates
//!   verdicts into a single fail-open allow/block decision

pub mod bert;
pub mod classifier;
pub mod pipeline;

pub use bert::BertHateClassifier;
pub use classifier::{HateSpeechClassifier, Prediction};
pub use pipeline::ContentModerator;
