//! Request and response bodies for the HTTP surface

use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed payload returned by the liveness route
pub const STATUS_MESSAGE: &str = "Toxic Language Detection API is running";

/// Fixed message returned when a prediction request carries no usable text
pub const MISSING_TEXT_MESSAGE: &str = "Please provide 'text' in request body";

/// Binary outcome of a toxicity prediction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ToxicityLabel {
    #[serde(rename = "Toxic")]
    Toxic,
    #[serde(rename = "Non-Toxic")]
    NonToxic,
}

impl ToxicityLabel {
    /// Label a probability against a threshold (inclusive)
    pub fn from_probability(probability: f64, threshold: f64) -> Self {
        if probability >= threshold {
            Self::Toxic
        } else {
            Self::NonToxic
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Toxic => "Toxic",
            Self::NonToxic => "Non-Toxic",
        }
    }

    pub fn is_toxic(&self) -> bool {
        matches!(self, Self::Toxic)
    }
}

impl fmt::Display for ToxicityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of `POST /predict`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictRequest {
    pub text: String,
}

/// Successful prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictResponse {
    /// Probability of the toxic class, rounded to 4 decimal places
    pub toxicity_probability: f64,

    pub prediction: ToxicityLabel,
}

/// Body of `GET /`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}

impl StatusResponse {
    pub fn running() -> Self {
        Self {
            status: STATUS_MESSAGE.to_string(),
        }
    }
}

/// Error body shared by all failing routes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }

    pub fn missing_text() -> Self {
        Self::new(MISSING_TEXT_MESSAGE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_label_serialization() {
        assert_eq!(serde_json::to_value(ToxicityLabel::Toxic).unwrap(), json!("Toxic"));
        assert_eq!(
            serde_json::to_value(ToxicityLabel::NonToxic).unwrap(),
            json!("Non-Toxic")
        );
    }

    #[test]
    fn test_label_threshold_is_inclusive() {
        assert_eq!(ToxicityLabel::from_probability(0.5, 0.5), ToxicityLabel::Toxic);
        assert_eq!(
            ToxicityLabel::from_probability(0.4999, 0.5),
            ToxicityLabel::NonToxic
        );
    }

    #[test]
    fn test_predict_response_shape() {
        let response = PredictResponse {
            toxicity_probability: 0.9731,
            prediction: ToxicityLabel::Toxic,
        };

        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({ "toxicity_probability": 0.9731, "prediction": "Toxic" })
        );
    }

    #[test]
    fn test_fixed_payloads() {
        assert_eq!(
            serde_json::to_value(StatusResponse::running()).unwrap(),
            json!({ "status": "Toxic Language Detection API is running" })
        );
        assert_eq!(
            serde_json::to_value(ErrorResponse::missing_text()).unwrap(),
            json!({ "error": "Please provide 'text' in request body" })
        );
    }
}
