//! Moderation pipeline: per-field classification with fail-open aggregation
//!
//! The pipeline applies the classifier to each eligible text field of a
//! content record in a fixed priority order, blocks on the first field whose
//! HATE confidence reaches the threshold, and converts every internal
//! failure into a safe allow decision.

use crate::classifier::HateSpeechClassifier;
use automod_core::{ContentRecord, Error, FieldVerdict, Label, ModerationResult, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Default field evaluation order: title before content
const DEFAULT_FIELD_ORDER: [&str; 2] = ["title", "content"];

/// The moderation pipeline.
///
/// `moderate` never fails: classifier errors become ERROR verdicts, and the
/// decision defaults to allow on any uncertainty. Blocking a legitimate
/// post is worse than letting one slip through while the service is
/// degraded.
pub struct ContentModerator {
    classifier: Arc<dyn HateSpeechClassifier>,
    confidence_threshold: f32,
    max_text_length: usize,
    classify_timeout: Duration,
    field_order: Vec<String>,
}

impl ContentModerator {
    /// Create a pipeline over the given classifier.
    ///
    /// Fails with a configuration error when the threshold is outside
    /// `[0, 1]` or `max_text_length` is zero; invalid configuration is
    /// fatal at startup, never discovered at request time.
    pub fn new(
        classifier: Arc<dyn HateSpeechClassifier>,
        confidence_threshold: f32,
        max_text_length: usize,
        classify_timeout: Duration,
    ) -> Result<Self> {
        if !(0.0..=1.0).contains(&confidence_threshold) {
            return Err(Error::config(format!(
                "confidence threshold must be between 0.0 and 1.0, got {confidence_threshold}"
            )));
        }
        if max_text_length == 0 {
            return Err(Error::config("max text length must be greater than zero"));
        }

        Ok(Self {
            classifier,
            confidence_threshold,
            max_text_length,
            classify_timeout,
            field_order: DEFAULT_FIELD_ORDER.iter().map(|s| s.to_string()).collect(),
        })
    }

    /// Override the field evaluation order
    pub fn with_field_order(mut self, fields: Vec<String>) -> Self {
        self.field_order = fields;
        self
    }

    /// Moderate one content record.
    ///
    /// Evaluates fields in priority order, short-circuiting on the first
    /// blocking verdict: a blocked title means the content field is never
    /// classified and does not appear in the predictions.
    pub async fn moderate(&self, record: &ContentRecord) -> ModerationResult {
        let mut predictions: Vec<(String, FieldVerdict)> = Vec::new();

        for field in &self.field_order {
            let Some(text) = record.text_field(field) else {
                continue;
            };
            if text.is_empty() {
                predictions.push((field.clone(), FieldVerdict::empty(text)));
                continue;
            }

            let text = truncate_chars(&text, self.max_text_length);
            let verdict = self.evaluate(&text).await;
            debug!(
                field = %field,
                label = ?verdict.label,
                confidence = verdict.confidence,
                should_block = verdict.should_block,
                "field evaluated"
            );

            let blocking = verdict.should_block;
            let confidence = verdict.confidence;
            predictions.push((field.clone(), verdict));

            if blocking {
                let reason =
                    format!("Inappropriate {field} detected (confidence: {confidence:.2})");
                return ModerationResult::blocked(reason, predictions);
            }
        }

        ModerationResult::allowed(predictions)
    }

    /// Classify one field's text, converting every failure into a
    /// fail-open ERROR verdict.
    async fn evaluate(&self, text: &str) -> FieldVerdict {
        let outcome = tokio::time::timeout(self.classify_timeout, self.classifier.classify(text))
            .await
            .map_err(|_| Error::Timeout)
            .and_then(|r| r);

        match outcome {
            Ok(prediction) => {
                let is_hate = prediction.label == Label::Hate;
                let should_block = is_hate && prediction.confidence >= self.confidence_threshold;
                FieldVerdict {
                    text: text.to_string(),
                    label: prediction.label,
                    confidence: prediction.confidence,
                    is_hate,
                    should_block,
                    error: None,
                }
            }
            Err(e) => {
                warn!(classifier = %self.classifier.name(), error = %e, "classification failed, failing open");
                FieldVerdict::error(text, e.to_string())
            }
        }
    }
}

/// Truncate to a fixed number of characters, respecting char boundaries
fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        text.chars().take(max_chars).collect()
    }
}
