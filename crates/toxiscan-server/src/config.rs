//! Server configuration

use crate::cli::Cli;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use toxiscan_classifiers::{
    DeviceSpec, ModelConfig, ToxicityOptions, DEFAULT_MAX_LENGTH, DEFAULT_MODEL_PATH,
};

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Directory holding the fine-tuned model
    #[serde(default = "default_model_path")]
    pub model_path: PathBuf,

    /// Listen address
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Listen port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Compute device
    #[serde(default)]
    pub device: DeviceSpec,

    /// Maximum tokens per input
    #[serde(default = "default_max_length")]
    pub max_length: usize,

    /// Probability at or above which text is labelled toxic
    #[serde(default = "default_threshold")]
    pub threshold: f64,

    /// Log logits and probabilities for each prediction
    #[serde(default = "default_true")]
    pub log_scores: bool,
}

impl ServerConfig {
    /// Load configuration from file and CLI overrides
    pub fn load(config_path: &str, cli: &Cli) -> anyhow::Result<Self> {
        // Try to load from file, or use defaults
        let mut config = if Path::new(config_path).exists() {
            let content = std::fs::read_to_string(config_path)
                .with_context(|| format!("Failed to read {}", config_path))?;
            Self::from_yaml(&content).with_context(|| format!("Invalid config {}", config_path))?
        } else {
            tracing::debug!("No config file at {}, using defaults", config_path);
            Self::default()
        };

        config.apply_overrides(cli);
        config.validate()?;

        Ok(config)
    }

    pub fn from_yaml(content: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Apply CLI overrides
    pub fn apply_overrides(&mut self, cli: &Cli) {
        if let Some(model_path) = &cli.model_path {
            self.model_path = model_path.clone();
        }

        if let Some(listen) = &cli.listen {
            self.listen = listen.clone();
        }

        if let Some(port) = cli.port {
            self.port = port;
        }

        if let Some(device) = cli.device {
            self.device = device;
        }

        if let Some(max_length) = cli.max_length {
            self.max_length = max_length;
        }

        if cli.quiet_scores {
            self.log_scores = false;
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if !(0.0..=1.0).contains(&self.threshold) {
            anyhow::bail!("threshold must be within [0, 1], got {}", self.threshold);
        }
        if self.max_length == 0 {
            anyhow::bail!("max_length must be greater than zero");
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.listen, self.port)
            .parse()
            .with_context(|| format!("Invalid listen address {}:{}", self.listen, self.port))
    }

    pub fn model_config(&self) -> ModelConfig {
        ModelConfig::from_local(&self.model_path)
            .with_device(self.device)
            .with_max_length(self.max_length)
    }

    pub fn toxicity_options(&self) -> ToxicityOptions {
        ToxicityOptions {
            threshold: self.threshold,
            log_scores: self.log_scores,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            model_path: default_model_path(),
            listen: default_listen(),
            port: default_port(),
            device: DeviceSpec::default(),
            max_length: default_max_length(),
            threshold: default_threshold(),
            log_scores: true,
        }
    }
}

fn default_model_path() -> PathBuf {
    PathBuf::from(DEFAULT_MODEL_PATH)
}

fn default_listen() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_max_length() -> usize {
    DEFAULT_MAX_LENGTH
}

fn default_threshold() -> f64 {
    0.5
}

fn default_true() -> bool {
    true
}
