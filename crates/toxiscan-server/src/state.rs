//! Application state shared by request handlers

use crate::config::ServerConfig;
use anyhow::Context;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use toxiscan_classifiers::{
    device_label, DistilBertSequenceClassifier, SequenceClassifier, ToxicityClassifier,
};
use tracing::info;

/// Loaded once at startup, cloned into every handler
#[derive(Clone)]
pub struct AppState {
    pub classifier: Arc<ToxicityClassifier>,

    /// Device the model runs on, for diagnostics
    pub device: String,

    pub metrics_handle: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(classifier: ToxicityClassifier, device: impl Into<String>) -> Self {
        Self {
            classifier: Arc::new(classifier),
            device: device.into(),
            metrics_handle: None,
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics_handle = Some(handle);
        self
    }

    /// Load the DistilBERT model described by `config`
    pub fn load(config: &ServerConfig) -> anyhow::Result<Self> {
        info!("Loading model from {}", config.model_path.display());

        let model = DistilBertSequenceClassifier::load(&config.model_config())
            .with_context(|| format!("Failed to load model from {}", config.model_path.display()))?;
        let device = device_label(model.device());

        info!("Using device: {}", device);
        info!("Number of labels: {}", model.labels().len());
        info!("Model name: {}", model.name());
        info!("Label mapping: {}", model.labels());

        let backend: Arc<dyn SequenceClassifier> = Arc::new(model);
        let classifier = ToxicityClassifier::new(backend, config.toxicity_options());
        info!("Detected toxic class index: {}", classifier.toxic_index());

        Ok(Self::new(classifier, device))
    }
}
