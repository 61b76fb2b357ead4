//! toxiscan Core
//!
//! Types shared by the toxiscan crates:
//! - The workspace error type and result alias
//! - Request and response bodies for the HTTP surface
//! - The binary toxicity label

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{
    ErrorResponse, PredictRequest, PredictResponse, StatusResponse, ToxicityLabel,
    MISSING_TEXT_MESSAGE, STATUS_MESSAGE,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::types::{PredictRequest, PredictResponse, ToxicityLabel};
}
