//! toxiscan Classifiers
//!
//! Model loading and toxicity scoring.
//!
//! A [`SequenceClassifier`] turns text into per-class logits. The bundled
//! implementation is [`DistilBertSequenceClassifier`], loaded once from a
//! fine-tuned model directory. [`ToxicityClassifier`] sits on top of any
//! backend, locates the toxic class in the label mapping and turns logits
//! into a rounded probability and a binary label.

pub mod classifier;
pub mod device;
pub mod distilbert;
pub mod labels;
pub mod model_config;
pub mod model_loader;
pub mod toxicity;

pub use classifier::SequenceClassifier;
pub use device::{device_label, DeviceSpec};
pub use distilbert::DistilBertSequenceClassifier;
pub use labels::{detect_toxic_index, LabelMapping, DEFAULT_TOXIC_INDEX};
pub use model_config::ModelManifest;
pub use model_loader::{ModelConfig, ModelFormat, DEFAULT_MAX_LENGTH, DEFAULT_MODEL_PATH};
pub use toxicity::{ToxicityClassifier, ToxicityOptions, ToxicityPrediction};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::classifier::SequenceClassifier;
    pub use crate::device::DeviceSpec;
    pub use crate::distilbert::DistilBertSequenceClassifier;
    pub use crate::labels::LabelMapping;
    pub use crate::model_loader::ModelConfig;
    pub use crate::toxicity::{ToxicityClassifier, ToxicityOptions, ToxicityPrediction};
}
