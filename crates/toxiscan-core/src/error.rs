//! Error types for toxiscan

/// Result type alias using toxiscan's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for toxiscan operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration errors (bad device string, unreadable config file)
    #[error("configuration error: {0}")]
    Config(String),

    /// Model artifact errors (missing directory, corrupt weights or manifest)
    #[error("model error: {0}")]
    Model(String),

    /// Tokenizer loading or encoding errors
    #[error("tokenizer error: {0}")]
    Tokenizer(String),

    /// Forward pass and post-processing errors
    #[error("inference error: {0}")]
    Inference(String),

    /// Filesystem errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic internal errors
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new model error
    pub fn model(msg: impl Into<String>) -> Self {
        Self::Model(msg.into())
    }

    /// Create a new tokenizer error
    pub fn tokenizer(msg: impl Into<String>) -> Self {
        Self::Tokenizer(msg.into())
    }

    /// Create a new inference error
    pub fn inference(msg: impl Into<String>) -> Self {
        Self::Inference(msg.into())
    }

    /// Create a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Short machine-readable name, used as a metrics label
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Model(_) => "model",
            Self::Tokenizer(_) => "tokenizer",
            Self::Inference(_) => "inference",
            Self::Io(_) => "io",
            Self::Serialization(_) => "serialization",
            Self::Internal(_) => "internal",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::inference("toxic index 3 out of range for 2 classes");
        assert_eq!(
            err.to_string(),
            "inference error: toxic index 3 out of range for 2 classes"
        );
        assert_eq!(err.kind(), "inference");
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "config.json");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
        assert_eq!(err.kind(), "io");
    }
}
