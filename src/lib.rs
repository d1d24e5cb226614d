//! Titanic Survival Prediction Library
//!
//! Encodes raw passenger attributes into the feature row a trained classifier
//! expects, runs the classifier, and serves predictions over NATS.

pub mod config;
pub mod consumer;
pub mod error;
pub mod feature_encoder;
pub mod metrics;
pub mod models;
pub mod producer;
pub mod service;
pub mod types;

pub use config::AppConfig;
pub use consumer::RequestConsumer;
pub use error::PredictionError;
pub use feature_encoder::{FeatureEncoder, FeatureSchema, FeatureVector};
pub use models::inference::{OnnxClassifier, SurvivalClassifier};
pub use producer::ResponseProducer;
pub use service::PredictionService;
pub use types::{
    passenger::{Passenger, RawPassengerRecord},
    prediction::{PredictionOutcome, PredictionRequest, PredictionResponse, PredictionResult},
};
