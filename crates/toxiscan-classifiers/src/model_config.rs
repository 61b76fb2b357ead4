//! Model manifest (`config.json`) parsing

use crate::labels::LabelMapping;
use serde::Deserialize;
use std::path::Path;
use toxiscan_core::{Error, Result};

/// File name of the manifest inside a model directory
pub const MANIFEST_FILE: &str = "config.json";

/// Number of classes assumed when a manifest declares neither labels nor a count
const DEFAULT_NUM_LABELS: usize = 2;

/// The subset of a Hugging Face `config.json` needed to serve a classifier
#[derive(Debug, Clone, Deserialize)]
pub struct ModelManifest {
    /// Name or path the model was saved from
    #[serde(default, rename = "_name_or_path")]
    pub name_or_path: Option<String>,

    #[serde(default)]
    pub architectures: Vec<String>,

    #[serde(default)]
    pub model_type: Option<String>,

    #[serde(default)]
    pub num_labels: Option<usize>,

    #[serde(default)]
    id2label: Option<LabelMapping>,

    /// DistilBERT hidden size
    #[serde(default)]
    dim: Option<usize>,

    /// BERT-style hidden size
    #[serde(default)]
    hidden_size: Option<usize>,
}

impl ModelManifest {
    /// Read `config.json` from a model directory
    pub fn from_dir(model_dir: impl AsRef<Path>) -> Result<Self> {
        Self::from_json(&read_manifest(model_dir)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::model(format!("Failed to parse {}: {}", MANIFEST_FILE, e)))
    }

    /// Label mapping, synthesized as `LABEL_n` when the manifest has none
    pub fn labels(&self) -> LabelMapping {
        match &self.id2label {
            Some(labels) if !labels.is_empty() => labels.clone(),
            _ => LabelMapping::placeholder(self.num_labels.unwrap_or(DEFAULT_NUM_LABELS)),
        }
    }

    /// Number of output classes
    pub fn num_labels(&self) -> usize {
        self.labels().len()
    }

    pub fn hidden_size(&self) -> Result<usize> {
        self.dim.or(self.hidden_size).ok_or_else(|| {
            Error::model(format!(
                "{} declares no hidden size (expected 'dim' or 'hidden_size')",
                MANIFEST_FILE
            ))
        })
    }

    /// Name used in logs and metrics
    pub fn display_name(&self) -> &str {
        self.name_or_path
            .as_deref()
            .filter(|name| !name.is_empty())
            .or(self.model_type.as_deref())
            .unwrap_or("unknown")
    }
}

/// Raw contents of a model directory's `config.json`
pub fn read_manifest(model_dir: impl AsRef<Path>) -> Result<String> {
    let path = model_dir.as_ref().join(MANIFEST_FILE);
    std::fs::read_to_string(&path)
        .map_err(|e| Error::model(format!("Failed to read {}: {}", path.display(), e)))
}
