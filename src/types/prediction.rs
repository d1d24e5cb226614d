//! Prediction labels and the request/response messages exchanged over NATS

use super::passenger::RawPassengerRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Survival label produced by the classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionResult {
    Survived,
    DidNotSurvive,
}

impl PredictionResult {
    /// Map a raw model label. Anything other than 0 or 1 has no label.
    pub fn from_label(label: i64) -> Option<Self> {
        match label {
            1 => Some(PredictionResult::Survived),
            0 => Some(PredictionResult::DidNotSurvive),
            _ => None,
        }
    }

    pub fn label(self) -> u8 {
        match self {
            PredictionResult::Survived => 1,
            PredictionResult::DidNotSurvive => 0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PredictionResult::Survived => "Survived",
            PredictionResult::DidNotSurvive => "Did not survive",
        }
    }
}

impl fmt::Display for PredictionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a caller gets to render for one request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PredictionOutcome {
    Survived,
    DidNotSurvive,
    /// The model answered with something that is not a survival label
    Unexpected { raw: i64 },
    /// The passenger record was refused before reaching the model
    Rejected { reason: String },
    /// The classifier could not produce an answer
    Failed { reason: String },
}

impl PredictionOutcome {
    pub fn is_label(&self) -> bool {
        matches!(
            self,
            PredictionOutcome::Survived | PredictionOutcome::DidNotSurvive
        )
    }

    pub fn result(&self) -> Option<PredictionResult> {
        match self {
            PredictionOutcome::Survived => Some(PredictionResult::Survived),
            PredictionOutcome::DidNotSurvive => Some(PredictionResult::DidNotSurvive),
            _ => None,
        }
    }

    /// Short name used as a metrics key
    pub fn status(&self) -> &'static str {
        match self {
            PredictionOutcome::Survived => "survived",
            PredictionOutcome::DidNotSurvive => "did_not_survive",
            PredictionOutcome::Unexpected { .. } => "unexpected",
            PredictionOutcome::Rejected { .. } => "rejected",
            PredictionOutcome::Failed { .. } => "failed",
        }
    }
}

impl From<PredictionResult> for PredictionOutcome {
    fn from(result: PredictionResult) -> Self {
        match result {
            PredictionResult::Survived => PredictionOutcome::Survived,
            PredictionResult::DidNotSurvive => PredictionOutcome::DidNotSurvive,
        }
    }
}

impl fmt::Display for PredictionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PredictionOutcome::Survived => write!(f, "Prediction: Survived"),
            PredictionOutcome::DidNotSurvive => write!(f, "Prediction: Did not survive"),
            PredictionOutcome::Unexpected { raw } => {
                write!(f, "Unexpected prediction result: {}", raw)
            }
            PredictionOutcome::Rejected { reason } => write!(f, "Rejected: {}", reason),
            PredictionOutcome::Failed { reason } => write!(f, "Prediction failed: {}", reason),
        }
    }
}

/// Incoming prediction request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionRequest {
    /// Caller-chosen identifier, echoed back in the response
    #[serde(default = "new_request_id")]
    pub request_id: String,

    pub passenger: RawPassengerRecord,
}

fn new_request_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

impl PredictionRequest {
    pub fn new(passenger: RawPassengerRecord) -> Self {
        Self {
            request_id: new_request_id(),
            passenger,
        }
    }
}

/// Response published for every processed request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResponse {
    /// Unique response identifier
    pub response_id: String,

    /// Request this answers
    pub request_id: String,

    pub outcome: PredictionOutcome,

    /// Model label (0/1) when the outcome is a survival label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<u8>,

    /// Human-readable rendering of the outcome
    pub message: String,

    /// Name of the model that answered
    pub model: String,

    /// Time spent validating, encoding and classifying
    pub latency_us: u64,

    pub timestamp: DateTime<Utc>,
}

impl PredictionResponse {
    pub fn new(
        request_id: String,
        outcome: PredictionOutcome,
        model: String,
        latency_us: u64,
    ) -> Self {
        Self {
            response_id: uuid::Uuid::new_v4().to_string(),
            request_id,
            label: outcome.result().map(PredictionResult::label),
            message: outcome.to_string(),
            outcome,
            model,
            latency_us,
            timestamp: Utc::now(),
        }
    }
}
