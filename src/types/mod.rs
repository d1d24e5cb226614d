//! Type definitions for the survival prediction service

pub mod passenger;
pub mod prediction;

pub use passenger::{Passenger, PassengerClass, Port, RawPassengerRecord, Sex};
pub use prediction::{PredictionOutcome, PredictionRequest, PredictionResponse, PredictionResult};
