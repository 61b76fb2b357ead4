//! Toxicity scoring on top of a sequence classifier

use crate::classifier::SequenceClassifier;
use crate::labels::{detect_toxic_index, LabelMapping};
use candle_core::{Device, Tensor, D};
use std::sync::Arc;
use std::time::Instant;
use toxiscan_core::{Error, PredictResponse, Result, ToxicityLabel};

/// Scoring options
#[derive(Debug, Clone)]
pub struct ToxicityOptions {
    /// Probability at or above which text is labelled toxic
    pub threshold: f64,

    /// Log logits and probabilities for every call
    pub log_scores: bool,
}

impl Default for ToxicityOptions {
    fn default() -> Self {
        Self {
            threshold: 0.5,
            log_scores: true,
        }
    }
}

/// Outcome of scoring one text
#[derive(Debug, Clone)]
pub struct ToxicityPrediction {
    /// Toxic-class probability, rounded to 4 decimal places
    pub probability: f64,

    pub label: ToxicityLabel,

    pub logits: Vec<f32>,

    /// Softmax over all classes
    pub probabilities: Vec<f32>,

    /// Latency in microseconds
    pub latency_us: u64,
}

impl ToxicityPrediction {
    pub fn to_response(&self) -> PredictResponse {
        PredictResponse {
            toxicity_probability: self.probability,
            prediction: self.label,
        }
    }
}

/// Binary toxicity classifier over any [`SequenceClassifier`].
///
/// The toxic class is located once, at construction, from the backend's
/// label mapping.
pub struct ToxicityClassifier {
    backend: Arc<dyn SequenceClassifier>,
    toxic_index: usize,
    options: ToxicityOptions,
}

impl ToxicityClassifier {
    pub fn new(backend: Arc<dyn SequenceClassifier>, options: ToxicityOptions) -> Self {
        let labels = backend.labels();
        let toxic_index = detect_toxic_index(labels);

        if labels.get(toxic_index).is_none() {
            tracing::warn!(
                "Toxic index {} has no label in {}; predictions will fail if the model emits fewer classes",
                toxic_index,
                labels
            );
        }

        Self {
            backend,
            toxic_index,
            options,
        }
    }

    pub fn toxic_index(&self) -> usize {
        self.toxic_index
    }

    pub fn labels(&self) -> &LabelMapping {
        self.backend.labels()
    }

    pub fn name(&self) -> &str {
        self.backend.name()
    }

    pub fn options(&self) -> &ToxicityOptions {
        &self.options
    }

    /// Score a single text
    pub async fn classify(&self, text: &str) -> Result<ToxicityPrediction> {
        let start = Instant::now();

        let logits = self.backend.logits(text).await?;
        let probabilities = softmax(&logits)?;

        if self.options.log_scores {
            tracing::info!(?logits, ?probabilities, "Class scores");
        }

        let raw = probabilities.get(self.toxic_index).copied().ok_or_else(|| {
            Error::inference(format!(
                "toxic index {} out of range for {} classes",
                self.toxic_index,
                probabilities.len()
            ))
        })?;

        let probability = round_probability(f64::from(raw));
        let label = ToxicityLabel::from_probability(probability, self.options.threshold);

        Ok(ToxicityPrediction {
            probability,
            label,
            logits,
            probabilities,
            latency_us: start.elapsed().as_micros() as u64,
        })
    }
}

/// Softmax across the class dimension
pub fn softmax(logits: &[f32]) -> Result<Vec<f32>> {
    if logits.is_empty() {
        return Err(Error::inference("model returned no logits"));
    }

    let logits = Tensor::new(logits, &Device::Cpu)
        .map_err(|e| Error::inference(format!("Failed to create logits tensor: {}", e)))?;

    candle_nn::ops::softmax(&logits, D::Minus1)
        .and_then(|probs| probs.to_vec1::<f32>())
        .map_err(|e| Error::inference(format!("Softmax failed: {}", e)))
}

/// Round to 4 decimal places, clamped to [0, 1]
pub fn round_probability(probability: f64) -> f64 {
    ((probability * 10_000.0).round() / 10_000.0).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct FixedLogits {
        logits: Vec<f32>,
        labels: LabelMapping,
    }

    #[async_trait]
    impl SequenceClassifier for FixedLogits {
        async fn logits(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(self.logits.clone())
        }

        fn labels(&self) -> &LabelMapping {
            &self.labels
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    fn classifier(logits: Vec<f32>, labels: LabelMapping) -> ToxicityClassifier {
        ToxicityClassifier::new(
            Arc::new(FixedLogits { logits, labels }),
            ToxicityOptions::default(),
        )
    }

    #[test]
    fn test_softmax_sums_to_one() {
        let probs = softmax(&[1.0, 2.0, 3.0]).unwrap();
        let total: f32 = probs.iter().sum();

        assert!((total - 1.0).abs() < 1e-5);
        assert!(probs[2] > probs[1] && probs[1] > probs[0]);
    }

    #[test]
    fn test_softmax_is_stable_for_large_logits() {
        let probs = softmax(&[1000.0, 1000.0]).unwrap();
        assert!((probs[0] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_softmax_rejects_empty() {
        assert!(softmax(&[]).is_err());
    }

    #[test]
    fn test_round_probability() {
        assert_eq!(round_probability(0.123_456), 0.1235);
        assert_eq!(round_probability(0.999_99), 1.0);
        assert_eq!(round_probability(0.0), 0.0);
    }

    #[tokio::test]
    async fn test_toxic_prediction() {
        let labels = LabelMapping::new([(0, "clean"), (1, "toxic")]);
        let classifier = classifier(vec![-2.0, 3.0], labels);
        let prediction = classifier.classify("I hate you").await.unwrap();

        assert_eq!(prediction.label, ToxicityLabel::Toxic);
        assert!(prediction.probability > 0.99);
        assert_eq!(prediction.probabilities.len(), 2);
    }

    #[tokio::test]
    async fn test_reads_probability_at_detected_index() {
        let labels = LabelMapping::new([(0, "TOXIC"), (1, "clean")]);
        let classifier = classifier(vec![3.0, -2.0], labels);
        assert_eq!(classifier.toxic_index(), 0);

        let prediction = classifier.classify("you are awful").await.unwrap();
        assert_eq!(prediction.label, ToxicityLabel::Toxic);
        assert_eq!(prediction.to_response().prediction, ToxicityLabel::Toxic);
    }

    #[tokio::test]
    async fn test_equal_logits_hit_threshold() {
        let classifier = classifier(vec![0.0, 0.0], LabelMapping::placeholder(2));
        let prediction = classifier.classify("hello").await.unwrap();

        assert_eq!(prediction.probability, 0.5);
        assert_eq!(prediction.label, ToxicityLabel::Toxic);
    }

    #[tokio::test]
    async fn test_out_of_range_index_is_an_inference_error() {
        let classifier = classifier(vec![1.0], LabelMapping::placeholder(1));
        assert_eq!(classifier.toxic_index(), 1);

        let err = classifier.classify("hello").await.unwrap_err();
        assert!(matches!(err, Error::Inference(_)));
    }
}
