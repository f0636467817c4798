//! Classifier trait and prediction type

use async_trait::async_trait;
use automod_core::{Label, Result};

/// Trait for hate-speech classifiers.
///
/// Implementations wrap a black-box text -> (label, confidence) inference
/// call. `classify` must be idempotent and side-effect-free; loading of the
/// underlying resources is a separate, explicit `load` performed exactly
/// once at startup.
#[async_trait]
pub trait HateSpeechClassifier: Send + Sync {
    /// Acquire the model resources. Any failure here is fatal at startup;
    /// model loading is assumed deterministic, so there is no retry.
    async fn load(&self) -> Result<()>;

    /// Whether `load` has completed successfully
    fn is_ready(&self) -> bool;

    /// Classify the given text.
    ///
    /// Fails with `Error::NotReady` before a successful `load`, and with
    /// `Error::Inference` on any backend failure.
    async fn classify(&self, text: &str) -> Result<Prediction>;

    /// Get the classifier name
    fn name(&self) -> &str;
}

/// Result of a single classification call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    /// Predicted label
    pub label: Label,

    /// Confidence score (0.0-1.0)
    pub confidence: f32,
}

impl Prediction {
    /// Create a new prediction
    pub fn new(label: Label, confidence: f32) -> Self {
        Self { label, confidence }
    }
}
