//! Candle-based BERT hate-speech classifier
//!
//! Wraps a BERT sequence-classification checkpoint (e.g.
//! `irlab-udc/MetaHateBERT`): CLS embedding through a linear head, softmax
//! over the two logits. Label index 0 is NOT_HATE, index 1 is HATE.

use crate::classifier::{HateSpeechClassifier, Prediction};
use async_trait::async_trait;
use automod_core::{Error, Label, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::{Linear, Module, VarBuilder};
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokenizers::{Tokenizer, TruncationParams};
use tracing::info;

/// Token budget of the underlying model
const MAX_SEQ_LENGTH: usize = 512;

/// Hate-speech classifier backed by a Candle BERT model.
///
/// The model identifier is either a local directory containing
/// `config.json`, `tokenizer.json` and `model.safetensors`, or a Hugging
/// Face Hub repository id from which those files are downloaded.
///
/// The backend is not assumed safe for concurrent invocation, so inference
/// calls are serialized through a mutex.
pub struct BertHateClassifier {
    name: String,
    model_id: String,
    inner: RwLock<Option<Arc<LoadedBert>>>,
    inference: tokio::sync::Mutex<()>,
}

struct LoadedBert {
    model: BertModel,
    head: Linear,
    tokenizer: Tokenizer,
    device: Device,
}

impl BertHateClassifier {
    /// Create an unloaded classifier for the given model identifier
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            name: "hate-speech".to_string(),
            model_id: model_id.into(),
            inner: RwLock::new(None),
            inference: tokio::sync::Mutex::new(()),
        }
    }

    /// The configured model identifier
    pub fn model_id(&self) -> &str {
        &self.model_id
    }
}

#[async_trait]
impl HateSpeechClassifier for BertHateClassifier {
    async fn load(&self) -> Result<()> {
        if self.is_ready() {
            return Ok(());
        }

        info!(model = %self.model_id, "loading hate-speech model");
        let started = std::time::Instant::now();

        let model_id = self.model_id.clone();
        let loaded = tokio::task::spawn_blocking(move || load_model(&model_id))
            .await
            .map_err(|e| Error::model_load(format!("model load task failed: {e}")))??;

        *self.inner.write() = Some(Arc::new(loaded));
        info!(
            model = %self.model_id,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "hate-speech model loaded"
        );
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.inner.read().is_some()
    }

    async fn classify(&self, text: &str) -> Result<Prediction> {
        let loaded = self.inner.read().clone().ok_or(Error::NotReady)?;

        // Serialize access to the backend. The forward pass runs on the
        // blocking pool so the caller's deadline can elapse mid-inference
        // instead of stalling the reactor until the pass completes.
        let _permit = self.inference.lock().await;
        let text = text.to_string();
        tokio::task::spawn_blocking(move || loaded.predict(&text))
            .await
            .map_err(|e| Error::inference(format!("inference task failed: {e}")))?
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl LoadedBert {
    fn predict(&self, text: &str) -> Result<Prediction> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| Error::inference(format!("tokenization failed: {e}")))?;

        let input_ids = Tensor::new(encoding.get_ids(), &self.device)
            .and_then(|t| t.unsqueeze(0))
            .map_err(|e| Error::inference(format!("failed to build input tensor: {e}")))?;
        let token_type_ids = Tensor::new(encoding.get_type_ids(), &self.device)
            .and_then(|t| t.unsqueeze(0))
            .map_err(|e| Error::inference(format!("failed to build token type tensor: {e}")))?;

        let hidden = self
            .model
            .forward(&input_ids, &token_type_ids, None)
            .map_err(|e| Error::inference(format!("forward pass failed: {e}")))?;

        // [CLS] embedding -> classification head -> softmax probabilities
        let logits = hidden
            .narrow(1, 0, 1)
            .and_then(|t| t.squeeze(1))
            .and_then(|cls| self.head.forward(&cls))
            .map_err(|e| Error::inference(format!("classification head failed: {e}")))?;
        let probabilities = candle_nn::ops::softmax_last_dim(&logits)
            .and_then(|t| t.squeeze(0))
            .and_then(|t| t.to_vec1::<f32>())
            .map_err(|e| Error::inference(format!("softmax failed: {e}")))?;

        let (class, confidence) = probabilities
            .iter()
            .copied()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .ok_or_else(|| Error::inference("model produced no class scores"))?;

        let label = if class == 1 { Label::Hate } else { Label::NotHate };
        Ok(Prediction::new(label, confidence))
    }
}

/// Files required to instantiate the model
#[derive(Debug)]
struct ModelFiles {
    config: PathBuf,
    tokenizer: PathBuf,
    weights: PathBuf,
}

fn load_model(model_id: &str) -> Result<LoadedBert> {
    let files = resolve_model_files(model_id)?;
    let device = Device::Cpu;

    let mut tokenizer = Tokenizer::from_file(&files.tokenizer)
        .map_err(|e| Error::model_load(format!("failed to load tokenizer: {e}")))?;
    tokenizer
        .with_truncation(Some(TruncationParams {
            max_length: MAX_SEQ_LENGTH,
            ..Default::default()
        }))
        .map_err(|e| Error::model_load(format!("failed to configure truncation: {e}")))?;

    let config_text = std::fs::read_to_string(&files.config)
        .map_err(|e| Error::model_load(format!("failed to read model config: {e}")))?;
    let config: BertConfig = serde_json::from_str(&config_text)
        .map_err(|e| Error::model_load(format!("failed to parse model config: {e}")))?;

    let vb = unsafe {
        VarBuilder::from_mmaped_safetensors(&[files.weights], DType::F32, &device)
            .map_err(|e| Error::model_load(format!("failed to map model weights: {e}")))?
    };

    let model = BertModel::load(vb.pp("bert"), &config)
        .map_err(|e| Error::model_load(format!("failed to load BERT weights: {e}")))?;
    let head = candle_nn::linear(config.hidden_size, 2, vb.pp("classifier"))
        .map_err(|e| Error::model_load(format!("failed to load classification head: {e}")))?;

    Ok(LoadedBert {
        model,
        head,
        tokenizer,
        device,
    })
}

/// Resolve model files from a local directory or the Hugging Face Hub
fn resolve_model_files(model_id: &str) -> Result<ModelFiles> {
    let local = Path::new(model_id);
    if local.is_dir() {
        let files = ModelFiles {
            config: local.join("config.json"),
            tokenizer: local.join("tokenizer.json"),
            weights: local.join("model.safetensors"),
        };
        for path in [&files.config, &files.tokenizer, &files.weights] {
            if !path.exists() {
                return Err(Error::model_load(format!(
                    "model file not found: {}",
                    path.display()
                )));
            }
        }
        return Ok(files);
    }

    let api = hf_hub::api::sync::Api::new()
        .map_err(|e| Error::model_load(format!("failed to initialize Hugging Face API: {e}")))?;
    let repo = api.repo(hf_hub::Repo::model(model_id.to_string()));

    let fetch = |filename: &str| {
        repo.get(filename)
            .map_err(|e| Error::model_load(format!("failed to download {filename}: {e}")))
    };

    Ok(ModelFiles {
        config: fetch("config.json")?,
        tokenizer: fetch("tokenizer.json")?,
        weights: fetch("model.safetensors")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_unloaded() {
        let classifier = BertHateClassifier::new("irlab-udc/MetaHateBERT");
        assert!(!classifier.is_ready());
        assert_eq!(classifier.name(), "hate-speech");
        assert_eq!(classifier.model_id(), "irlab-udc/MetaHateBERT");
    }

    #[tokio::test]
    async fn classify_before_load_is_not_ready() {
        let classifier = BertHateClassifier::new("irlab-udc/MetaHateBERT");
        let err = classifier.classify("hello").await.unwrap_err();
        assert!(matches!(err, Error::NotReady));
    }

    #[test]
    fn missing_local_model_is_a_load_error() {
        // A path that exists as a directory but lacks the model files
        let dir = std::env::temp_dir();
        let err = resolve_model_files(dir.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, Error::ModelLoad(_)));
    }
}
