//! Survival classifier loading and inference

pub mod inference;
pub mod loader;

pub use inference::{OnnxClassifier, SurvivalClassifier};
pub use loader::{LoadedModel, ModelLoader};
