//! DistilBERT sequence classification
//!
//! Mirrors the Hugging Face `DistilBertForSequenceClassification` head: the
//! first-token hidden state goes through `pre_classifier`, a ReLU, and the
//! `classifier` projection. Weights are plain tensors, so there is no
//! gradient tracking, and dropout is never applied at inference.

use crate::classifier::SequenceClassifier;
use crate::device::device_label;
use crate::labels::LabelMapping;
use crate::model_config::{read_manifest, ModelManifest};
use crate::model_loader::{load_tokenizer, load_var_builder, ModelConfig};
use async_trait::async_trait;
use candle_core::{DType, Device, IndexOp, Tensor};
use candle_nn::{Linear, Module};
use candle_transformers::models::distilbert::{Config as DistilBertConfig, DistilBertModel};
use std::sync::Arc;
use tokenizers::Tokenizer;
use toxiscan_core::{Error, Result};

/// Fine-tuned DistilBERT classifier loaded from a local directory
pub struct DistilBertSequenceClassifier {
    name: String,
    labels: LabelMapping,
    network: Arc<Network>,
}

/// Tokenizer and weights, shared with blocking inference tasks
struct Network {
    tokenizer: Tokenizer,
    model: DistilBertModel,
    pre_classifier: Linear,
    classifier: Linear,
    device: Device,
}

impl DistilBertSequenceClassifier {
    /// Load tokenizer, manifest and weights. Any failure here is fatal for
    /// the caller; nothing is retried.
    pub fn load(config: &ModelConfig) -> Result<Self> {
        config.validate()?;
        let model_dir = config.model_dir.as_path();

        let device = config.device.resolve()?;

        let manifest_json = read_manifest(model_dir)?;
        let manifest = ModelManifest::from_json(&manifest_json)?;
        let distilbert_config: DistilBertConfig = serde_json::from_str(&manifest_json)
            .map_err(|e| Error::model(format!("Failed to parse DistilBERT config: {}", e)))?;

        let tokenizer = load_tokenizer(model_dir, config.max_length)?;
        let vb = load_var_builder(model_dir, &device)?;

        let model = DistilBertModel::load(vb.pp("distilbert"), &distilbert_config)
            .map_err(|e| Error::model(format!("Failed to load DistilBERT model: {}", e)))?;

        let hidden_size = manifest.hidden_size()?;
        let labels = manifest.labels();

        let pre_classifier = candle_nn::linear(hidden_size, hidden_size, vb.pp("pre_classifier"))
            .map_err(|e| Error::model(format!("Failed to load pre_classifier: {}", e)))?;
        let classifier = candle_nn::linear(hidden_size, labels.len(), vb.pp("classifier"))
            .map_err(|e| Error::model(format!("Failed to load classification head: {}", e)))?;

        tracing::info!(
            "Loaded DistilBERT classifier '{}' on {} ({} labels, hidden_size={})",
            manifest.display_name(),
            device_label(&device),
            labels.len(),
            hidden_size
        );

        Ok(Self {
            name: manifest.display_name().to_string(),
            labels,
            network: Arc::new(Network {
                tokenizer,
                model,
                pre_classifier,
                classifier,
                device,
            }),
        })
    }

    /// Device the weights live on
    pub fn device(&self) -> &Device {
        &self.network.device
    }
}

impl Network {
    fn forward(&self, text: &str) -> candle_core::Result<Vec<f32>> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| candle_core::Error::Msg(format!("Tokenization failed: {}", e)))?;

        let input_ids = Tensor::new(encoding.get_ids(), &self.device)?.unsqueeze(0)?;

        // DistilBERT masks positions where the mask is non-zero, so padding
        // is marked with 1.
        let padding_mask: Vec<u8> = encoding
            .get_attention_mask()
            .iter()
            .map(|&x| u8::from(x == 0))
            .collect();
        let padding_mask = Tensor::new(padding_mask.as_slice(), &self.device)?.unsqueeze(0)?;

        let hidden_states = self.model.forward(&input_ids, &padding_mask)?;
        let first_token = hidden_states.i((.., 0))?;
        let pooled = self.pre_classifier.forward(&first_token)?.relu()?;

        self.classifier
            .forward(&pooled)?
            .squeeze(0)?
            .to_dtype(DType::F32)?
            .to_vec1::<f32>()
    }
}

#[async_trait]
impl SequenceClassifier for DistilBertSequenceClassifier {
    /// Forward pass runs on the blocking pool
    async fn logits(&self, text: &str) -> Result<Vec<f32>> {
        let network = Arc::clone(&self.network);
        let text = text.to_owned();

        tokio::task::spawn_blocking(move || network.forward(&text))
            .await
            .map_err(|e| Error::internal(format!("Inference task failed: {}", e)))?
            .map_err(|e| Error::inference(format!("Forward pass failed: {}", e)))
    }

    fn labels(&self) -> &LabelMapping {
        &self.labels
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toxicity::{ToxicityClassifier, ToxicityOptions};
    use crate::DeviceSpec;
    use candle_nn::{VarBuilder, VarMap};
    use std::path::Path;

    const TINY_CONFIG: &str = r#"{
        "activation": "gelu", "dim": 8, "hidden_dim": 16, "n_heads": 2,
        "n_layers": 1, "vocab_size": 16, "max_position_embeddings": 16,
        "initializer_range": 0.02, "pad_token_id": 0,
        "position_embedding_type": "absolute", "use_cache": true,
        "model_type": "distilbert",
        "id2label": {"0": "non-toxic", "1": "toxic"}
    }"#;

    const TINY_VOCAB: &str = "[PAD]\n[UNK]\n[CLS]\n[SEP]\ni\nhate\nyou\nand\neveryone\nlike\n";

    /// Randomly initialised model with the same tensor layout as a
    /// fine-tuned checkpoint
    fn write_tiny_model(dir: &Path) {
        std::fs::write(dir.join("config.json"), TINY_CONFIG).unwrap();
        std::fs::write(dir.join("vocab.txt"), TINY_VOCAB).unwrap();

        let config: DistilBertConfig = serde_json::from_str(TINY_CONFIG).unwrap();
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);

        DistilBertModel::load(vb.pp("distilbert"), &config).unwrap();
        candle_nn::linear(8, 8, vb.pp("pre_classifier")).unwrap();
        candle_nn::linear(8, 2, vb.pp("classifier")).unwrap();

        varmap.save(dir.join("model.safetensors")).unwrap();
    }

    fn load_tiny(dir: &Path) -> DistilBertSequenceClassifier {
        let config = ModelConfig::from_local(dir)
            .with_device(DeviceSpec::Cpu)
            .with_max_length(12);
        DistilBertSequenceClassifier::load(&config).unwrap()
    }

    #[test]
    fn test_load_missing_directory_fails() {
        let config = ModelConfig::from_local("/no/such/model").with_device(DeviceSpec::Cpu);
        let err = DistilBertSequenceClassifier::load(&config).err().unwrap();
        assert!(matches!(err, Error::Model(_)));
    }

    #[test]
    fn test_load_without_weights_fails() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.json"), TINY_CONFIG).unwrap();
        std::fs::write(dir.path().join("vocab.txt"), TINY_VOCAB).unwrap();

        let config = ModelConfig::from_local(dir.path()).with_device(DeviceSpec::Cpu);
        let err = DistilBertSequenceClassifier::load(&config).err().unwrap();
        assert!(err.to_string().contains("No model weights found"));
    }

    #[tokio::test]
    async fn test_logits_has_one_value_per_label() {
        let dir = tempfile::tempdir().unwrap();
        write_tiny_model(dir.path());
        let model = load_tiny(dir.path());

        assert_eq!(model.labels().len(), 2);
        assert_eq!(device_label(model.device()), "cpu");

        let logits = model.logits("i hate you").await.unwrap();
        assert_eq!(logits.len(), 2);
        assert!(logits.iter().all(|x| x.is_finite()));
    }

    #[tokio::test]
    async fn test_text_longer_than_position_table_is_truncated() {
        let dir = tempfile::tempdir().unwrap();
        write_tiny_model(dir.path());
        let model = load_tiny(dir.path());

        // Far past max_position_embeddings; fails unless truncated first
        let text = "i hate you and everyone like you ".repeat(200);
        let logits = model.logits(&text).await.unwrap();
        assert_eq!(logits.len(), 2);
    }

    #[tokio::test]
    async fn test_repeated_text_scores_identically() {
        let dir = tempfile::tempdir().unwrap();
        write_tiny_model(dir.path());
        let classifier =
            ToxicityClassifier::new(Arc::new(load_tiny(dir.path())), ToxicityOptions::default());

        assert_eq!(classifier.toxic_index(), 1);

        let first = classifier.classify("you and everyone").await.unwrap();
        let second = classifier.classify("you and everyone").await.unwrap();

        assert!((0.0..=1.0).contains(&first.probability));
        assert_eq!(first.probability, second.probability);
        assert_eq!(first.label, second.label);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_forward_passes_agree() {
        let dir = tempfile::tempdir().unwrap();
        write_tiny_model(dir.path());
        let model = Arc::new(load_tiny(dir.path()));

        let expected = model.logits("i like everyone").await.unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let model = Arc::clone(&model);
                tokio::spawn(async move { model.logits("i like everyone").await })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), expected);
        }
    }
}
