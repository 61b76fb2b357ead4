//! Model artifact loading for Candle-based classifiers

use crate::device::DeviceSpec;
use candle_core::{DType, Device};
use candle_nn::VarBuilder;
use std::path::{Path, PathBuf};
use tokenizers::{PaddingParams, Tokenizer, TruncationParams};
use toxiscan_core::{Error, Result};

/// Directory the fine-tuned model is read from when nothing else is configured
pub const DEFAULT_MODEL_PATH: &str = "model/distilbert_final_model";

/// Maximum number of tokens fed to the model, special tokens included
pub const DEFAULT_MAX_LENGTH: usize = 128;

/// Configuration for loading a classifier from a local model directory
#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// Directory holding `config.json`, tokenizer files and weights
    pub model_dir: PathBuf,

    /// Device to run inference on
    pub device: DeviceSpec,

    /// Truncation length for tokenized input
    pub max_length: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from(DEFAULT_MODEL_PATH),
            device: DeviceSpec::Auto,
            max_length: DEFAULT_MAX_LENGTH,
        }
    }
}

impl ModelConfig {
    /// Create a new model configuration from a local directory
    pub fn from_local(path: impl Into<PathBuf>) -> Self {
        Self {
            model_dir: path.into(),
            ..Default::default()
        }
    }

    /// Set device
    pub fn with_device(mut self, device: DeviceSpec) -> Self {
        self.device = device;
        self
    }

    /// Set truncation length
    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }

    /// Check the configuration before touching any artifact
    pub fn validate(&self) -> Result<()> {
        if !self.model_dir.is_dir() {
            return Err(Error::model(format!(
                "Model directory not found: {}",
                self.model_dir.display()
            )));
        }
        if self.max_length == 0 {
            return Err(Error::config("max_length must be greater than zero"));
        }
        Ok(())
    }
}

/// Model weights file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFormat {
    /// SafeTensors format (recommended)
    SafeTensors,
    /// PyTorch format
    PyTorch,
}

impl ModelFormat {
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::SafeTensors => "model.safetensors",
            Self::PyTorch => "pytorch_model.bin",
        }
    }

    /// Locate the weights in a model directory, preferring SafeTensors
    pub fn detect(model_dir: &Path) -> Result<(Self, PathBuf)> {
        [Self::SafeTensors, Self::PyTorch]
            .into_iter()
            .map(|format| (format, model_dir.join(format.file_name())))
            .find(|(_, path)| path.is_file())
            .ok_or_else(|| {
                Error::model(format!(
                    "No model weights found in {} (tried model.safetensors, pytorch_model.bin)",
                    model_dir.display()
                ))
            })
    }
}

/// Load weights into a VarBuilder on the given device
pub fn load_var_builder(model_dir: &Path, device: &Device) -> Result<VarBuilder<'static>> {
    let (format, weights_path) = ModelFormat::detect(model_dir)?;
    tracing::debug!("Loading {:?} weights from {}", format, weights_path.display());

    let vb = match format {
        // SAFETY: the weights file is memory-mapped read-only and must not be
        // modified while the process runs.
        ModelFormat::SafeTensors => unsafe {
            VarBuilder::from_mmaped_safetensors(&[weights_path], DType::F32, device)
                .map_err(|e| Error::model(format!("Failed to load SafeTensors: {}", e)))?
        },
        ModelFormat::PyTorch => VarBuilder::from_pth(&weights_path, DType::F32, device)
            .map_err(|e| Error::model(format!("Failed to load PyTorch weights: {}", e)))?,
    };

    Ok(vb)
}

/// Load the tokenizer and configure truncation and padding.
///
/// Prefers `tokenizer.json`; falls back to building a BERT WordPiece
/// tokenizer from `vocab.txt`.
pub fn load_tokenizer(model_dir: &Path, max_length: usize) -> Result<Tokenizer> {
    let mut tokenizer = read_tokenizer(model_dir)?;

    tokenizer
        .with_truncation(Some(TruncationParams {
            max_length,
            ..Default::default()
        }))
        .map_err(|e| Error::tokenizer(format!("Failed to configure truncation: {}", e)))?;
    tokenizer.with_padding(Some(PaddingParams::default()));

    Ok(tokenizer)
}

fn read_tokenizer(model_dir: &Path) -> Result<Tokenizer> {
    let tokenizer_json_path = model_dir.join("tokenizer.json");
    if tokenizer_json_path.exists() {
        tracing::debug!("Loading tokenizer from tokenizer.json");
        return Tokenizer::from_file(&tokenizer_json_path)
            .map_err(|e| Error::tokenizer(format!("Failed to load tokenizer.json: {}", e)));
    }

    let vocab_path = model_dir.join("vocab.txt");
    if vocab_path.exists() {
        tracing::debug!("Building tokenizer from vocab.txt");

        use tokenizers::models::wordpiece::WordPiece;
        use tokenizers::normalizers::BertNormalizer;
        use tokenizers::pre_tokenizers::bert::BertPreTokenizer;
        use tokenizers::processors::bert::BertProcessing;

        let wordpiece = WordPiece::from_file(vocab_path.to_string_lossy().as_ref())
            .unk_token("[UNK]".to_string())
            .build()
            .map_err(|e| Error::tokenizer(format!("Failed to build WordPiece model: {}", e)))?;

        let mut tokenizer = Tokenizer::new(wordpiece);
        let special_id = |token: &str| {
            tokenizer.token_to_id(token).ok_or_else(|| {
                Error::tokenizer(format!("{} missing from {}", token, vocab_path.display()))
            })
        };
        let sep = ("[SEP]".to_string(), special_id("[SEP]")?);
        let cls = ("[CLS]".to_string(), special_id("[CLS]")?);

        tokenizer.with_normalizer(Some(BertNormalizer::default()));
        tokenizer.with_pre_tokenizer(Some(BertPreTokenizer));
        tokenizer.with_post_processor(Some(BertProcessing::new(sep, cls)));

        return Ok(tokenizer);
    }

    Err(Error::tokenizer(format!(
        "No tokenizer found in {} (tried tokenizer.json, vocab.txt)",
        model_dir.display()
    )))
}
