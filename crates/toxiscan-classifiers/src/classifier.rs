//! Classifier backend trait

use crate::labels::LabelMapping;
use async_trait::async_trait;
use toxiscan_core::Result;

/// A loaded sequence-classification model.
///
/// Implementations hold read-only weights and must be callable from many
/// requests at once.
#[async_trait]
pub trait SequenceClassifier: Send + Sync {
    /// Raw, un-normalized scores for a single input, one per class
    async fn logits(&self, text: &str) -> Result<Vec<f32>>;

    /// Class index to label name, in the order the model declares them
    fn labels(&self) -> &LabelMapping;

    /// Get the model name
    fn name(&self) -> &str;
}
