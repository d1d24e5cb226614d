//! Error types for the survival prediction service

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PredictionError>;

#[derive(Debug, Error)]
pub enum PredictionError {
    /// A raw passenger attribute is outside its domain. Raised before encoding,
    /// so the model is never called with such a record.
    #[error("invalid {field}: {reason}")]
    InvalidInput { field: &'static str, reason: String },

    /// The model artifact could not be loaded at startup
    #[error("failed to load model from {path}: {reason}")]
    ModelLoadFailure { path: String, reason: String },

    /// The classifier returned a label outside {0, 1}
    #[error("unexpected model output: {0}")]
    UnexpectedModelOutput(i64),

    /// The classifier failed while running
    #[error("inference failed: {0}")]
    Inference(String),

    /// Configured feature order does not describe the trained schema
    #[error("invalid feature schema: {0}")]
    Schema(String),
}

impl PredictionError {
    /// Short machine-readable kind, used in logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            PredictionError::InvalidInput { .. } => "invalid_input",
            PredictionError::ModelLoadFailure { .. } => "model_load_failure",
            PredictionError::UnexpectedModelOutput(_) => "unexpected_model_output",
            PredictionError::Inference(_) => "inference",
            PredictionError::Schema(_) => "schema",
        }
    }
}
