//! Latency benchmarks for the moderation pipeline
//!
//! Measures pipeline overhead (field iteration, verdict aggregation,
//! short-circuiting) over a deterministic in-process classifier, so the
//! numbers reflect the pipeline rather than model inference.
//!
//! Run with: cargo bench -p automod-classifiers

use async_trait::async_trait;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;

use automod_classifiers::{ContentModerator, HateSpeechClassifier, Prediction};
use automod_core::{ContentRecord, Label, Result};

/// Deterministic classifier: "hate" in the text scores HATE at 0.9
struct LexiconClassifier;

#[async_trait]
impl HateSpeechClassifier for LexiconClassifier {
    async fn load(&self) -> Result<()> {
        Ok(())
    }

    fn is_ready(&self) -> bool {
        true
    }

    async fn classify(&self, text: &str) -> Result<Prediction> {
        if text.to_lowercase().contains("hate") {
            Ok(Prediction::new(Label::Hate, 0.9))
        } else {
            Ok(Prediction::new(Label::NotHate, 0.1))
        }
    }

    fn name(&self) -> &str {
        "lexicon"
    }
}

fn record(value: serde_json::Value) -> ContentRecord {
    serde_json::from_value(value).unwrap()
}

fn benchmark_pipeline(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let moderator = ContentModerator::new(
        Arc::new(LexiconClassifier),
        0.7,
        2048,
        Duration::from_secs(10),
    )
    .expect("valid pipeline configuration");

    let long_content = "Nice to meet you. ".repeat(120);
    let cases = vec![
        ("empty_record", record(serde_json::json!({}))),
        (
            "short_clean",
            record(serde_json::json!({
                "title": "Welcome to our community!",
                "content": "This is a safe space for everyone.",
            })),
        ),
        (
            "long_clean",
            record(serde_json::json!({
                "title": "Daily discussion",
                "content": long_content,
            })),
        ),
        (
            "blocked_title",
            record(serde_json::json!({
                "title": "I hate everyone here",
                "content": "never reached by the short-circuit",
            })),
        ),
    ];

    let mut group = c.benchmark_group("moderation_pipeline");
    group.sample_size(100);

    for (name, case) in cases {
        group.bench_with_input(BenchmarkId::new("moderate", name), &case, |b, case| {
            b.iter(|| rt.block_on(async { moderator.moderate(black_box(case)).await }));
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_pipeline);
criterion_main!(benches);
