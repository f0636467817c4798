//! Data model for moderation requests and decisions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Classification label for a text field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Label {
    /// Benign text
    NotHate,
    /// Hate speech detected
    Hate,
    /// Classification could not be performed
    Error,
}

/// A content record submitted for moderation.
///
/// A mapping of named text fields ("title", "content", ...) supplied by the
/// caller. Fields are optional; the record is immutable for the lifetime of
/// the request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentRecord(pub serde_json::Map<String, Value>);

impl ContentRecord {
    /// Look up a field and coerce it to trimmed text.
    ///
    /// Absent, null, or blank string fields yield `None` (the field is
    /// skipped entirely). Numbers and booleans are coerced to their text
    /// form. Values with no textual form (arrays, objects) yield an empty
    /// string, which the pipeline records as a zero-confidence verdict.
    pub fn text_field(&self, name: &str) -> Option<String> {
        let value = self.0.get(name)?;
        let text = match value {
            Value::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return None;
                }
                trimmed.to_string()
            }
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Null => return None,
            Value::Array(_) | Value::Object(_) => String::new(),
        };
        Some(text)
    }

    /// True if the record carries no fields at all
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The classification outcome for one named text field.
///
/// Created once per field evaluation and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldVerdict {
    /// The text that was evaluated, post-normalization and truncation
    pub text: String,

    /// Classification label
    pub label: Label,

    /// Classifier confidence in `[0.0, 1.0]`
    pub confidence: f32,

    /// Whether the label is HATE
    pub is_hate: bool,

    /// Whether this field triggers a block (HATE at or above threshold)
    pub should_block: bool,

    /// Error message when classification failed for this field
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FieldVerdict {
    /// Verdict for a field whose normalized text was empty
    pub fn empty(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            label: Label::NotHate,
            confidence: 0.0,
            is_hate: false,
            should_block: false,
            error: None,
        }
    }

    /// Fail-open verdict for a field whose classification failed
    pub fn error(text: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            label: Label::Error,
            confidence: 0.0,
            is_hate: false,
            should_block: false,
            error: Some(message.into()),
        }
    }
}

/// The aggregated moderation decision for one content record.
///
/// If `allowed` is false, `blocked_reason` is set and the last entry of
/// `predictions` is the (only) verdict with `should_block = true`; fields
/// after it were never evaluated. If `allowed` is true,
/// `overall_confidence` is the maximum confidence across all evaluated
/// verdicts (0.0 when none were evaluated).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModerationResult {
    /// Whether the content may be published
    pub allowed: bool,

    /// Human-readable reason when blocked
    pub blocked_reason: Option<String>,

    /// Field name -> verdict, in evaluation order
    #[serde(with = "verdict_map")]
    pub predictions: Vec<(String, FieldVerdict)>,

    /// Maximum confidence across evaluated verdicts when allowed
    pub overall_confidence: f32,

    /// When the decision was made
    pub timestamp: DateTime<Utc>,

    /// Set when an internal error forced a fail-open decision
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ModerationResult {
    /// Allowed result aggregating the given verdicts
    pub fn allowed(predictions: Vec<(String, FieldVerdict)>) -> Self {
        let overall_confidence = predictions
            .iter()
            .map(|(_, v)| v.confidence)
            .fold(0.0_f32, f32::max);
        Self {
            allowed: true,
            blocked_reason: None,
            predictions,
            overall_confidence,
            timestamp: Utc::now(),
            error: None,
        }
    }

    /// Blocked result, short-circuited at the last verdict in `predictions`
    pub fn blocked(reason: impl Into<String>, predictions: Vec<(String, FieldVerdict)>) -> Self {
        Self {
            allowed: false,
            blocked_reason: Some(reason.into()),
            predictions,
            overall_confidence: 0.0,
            timestamp: Utc::now(),
            error: None,
        }
    }

    /// Safe default returned on any internal failure: allow, record the error.
    ///
    /// A moderation failure must never make the surrounding application
    /// unusable, so callers always receive a parseable allow decision.
    pub fn fail_open(error: impl Into<String>) -> Self {
        Self {
            allowed: true,
            blocked_reason: None,
            predictions: Vec::new(),
            overall_confidence: 0.0,
            timestamp: Utc::now(),
            error: Some(error.into()),
        }
    }
}

/// Serialize `Vec<(String, FieldVerdict)>` as a JSON object keyed by field
/// name, preserving evaluation order in both directions.
mod verdict_map {
    use super::FieldVerdict;
    use serde::de::{MapAccess, Visitor};
    use serde::ser::SerializeMap;
    use serde::{Deserializer, Serializer};
    use std::fmt;

    pub fn serialize<S>(entries: &[(String, FieldVerdict)], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(entries.len()))?;
        for (field, verdict) in entries {
            map.serialize_entry(field, verdict)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<(String, FieldVerdict)>, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct VerdictMapVisitor;

        impl<'de> Visitor<'de> for VerdictMapVisitor {
            type Value = Vec<(String, FieldVerdict)>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of field name to verdict")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some(entry) = access.next_entry()? {
                    entries.push(entry);
                }
                Ok(entries)
            }
        }

        deserializer.deserialize_map(VerdictMapVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn label_wire_format() {
        assert_eq!(serde_json::to_string(&Label::NotHate).unwrap(), "\"NOT_HATE\"");
        assert_eq!(serde_json::to_string(&Label::Hate).unwrap(), "\"HATE\"");
        assert_eq!(serde_json::to_string(&Label::Error).unwrap(), "\"ERROR\"");
    }

    #[test]
    fn text_field_coercion() {
        let record: ContentRecord = serde_json::from_value(json!({
            "title": "  Hello  ",
            "blank": "   ",
            "missing_value": null,
            "count": 3,
            "flag": true,
            "nested": {"a": 1},
        }))
        .unwrap();

        assert_eq!(record.text_field("title").as_deref(), Some("Hello"));
        assert_eq!(record.text_field("blank"), None);
        assert_eq!(record.text_field("missing_value"), None);
        assert_eq!(record.text_field("absent"), None);
        assert_eq!(record.text_field("count").as_deref(), Some("3"));
        assert_eq!(record.text_field("flag").as_deref(), Some("true"));
        assert_eq!(record.text_field("nested").as_deref(), Some(""));
    }

    #[test]
    fn predictions_preserve_evaluation_order() {
        let result = ModerationResult::allowed(vec![
            ("title".to_string(), FieldVerdict::empty("a")),
            ("content".to_string(), FieldVerdict::empty("b")),
        ]);

        let encoded = serde_json::to_string(&result).unwrap();
        let title_at = encoded.find("\"title\"").unwrap();
        let content_at = encoded.find("\"content\"").unwrap();
        assert!(
            title_at < content_at,
            "title must precede content on the wire: {encoded}"
        );

        let decoded: ModerationResult = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded.predictions[0].0, "title");
        assert_eq!(decoded.predictions[1].0, "content");
    }

    #[test]
    fn allowed_aggregates_max_confidence() {
        let mut low = FieldVerdict::empty("a");
        low.confidence = 0.2;
        let mut high = FieldVerdict::empty("b");
        high.confidence = 0.8;

        let result =
            ModerationResult::allowed(vec![("title".into(), low), ("content".into(), high)]);
        assert!(result.allowed);
        assert_eq!(result.overall_confidence, 0.8);
    }

    #[test]
    fn empty_allowed_result_has_zero_confidence() {
        let result = ModerationResult::allowed(Vec::new());
        assert!(result.allowed);
        assert_eq!(result.overall_confidence, 0.0);
        assert!(result.predictions.is_empty());
    }

    #[test]
    fn fail_open_is_allowed_with_error() {
        let result = ModerationResult::fail_open("backend exploded");
        assert!(result.allowed);
        assert!(result.blocked_reason.is_none());
        assert_eq!(result.error.as_deref(), Some("backend exploded"));

        let encoded = serde_json::to_value(&result).unwrap();
        assert_eq!(encoded["allowed"], json!(true));
        assert!(encoded.get("error").is_some());
    }

    #[test]
    fn field_verdict_omits_absent_error() {
        let verdict = FieldVerdict::empty("hi");
        let encoded = serde_json::to_value(&verdict).unwrap();
        assert!(encoded.get("error").is_none());

        let verdict = FieldVerdict::error("hi", "boom");
        let encoded = serde_json::to_value(&verdict).unwrap();
        assert_eq!(encoded["label"], json!("ERROR"));
        assert_eq!(encoded["error"], json!("boom"));
    }
}
