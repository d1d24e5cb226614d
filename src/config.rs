//! Configuration management for the survival prediction service

use crate::error::PredictionError;
use crate::feature_encoder::FeatureSchema;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// Environment variable naming an alternative config file
pub const CONFIG_PATH_ENV: &str = "TITANIC_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config/config.toml";

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub nats: NatsConfig,
    pub model: ModelConfig,
    pub pipeline: PipelineConfig,
    pub logging: LoggingConfig,
}

/// NATS connection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct NatsConfig {
    /// NATS server URL
    pub url: String,
    /// Subject for incoming prediction requests
    pub request_subject: String,
    /// Subject for responses to requests that carry no reply subject
    pub response_subject: String,
}

/// Classifier artifact configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// Path to the ONNX model file
    pub path: String,
    /// Name reported in responses and logs
    #[serde(default = "default_model_name")]
    pub name: String,
    /// Number of threads for ONNX inference (default: 1)
    #[serde(default = "default_onnx_threads")]
    pub onnx_threads: usize,
    /// Column order the artifact was trained with; built-in order when unset
    #[serde(default)]
    pub feature_order: Option<Vec<String>>,
}

fn default_onnx_threads() -> usize {
    1
}

fn default_model_name() -> String {
    "titanic".to_string()
}

fn default_metrics_interval() -> u64 {
    30
}

impl ModelConfig {
    /// Resolve the configured column order
    pub fn feature_schema(&self) -> std::result::Result<FeatureSchema, PredictionError> {
        match &self.feature_order {
            Some(names) => FeatureSchema::from_names(names.as_slice()),
            None => Ok(FeatureSchema::default()),
        }
    }
}

/// Pipeline configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Maximum requests processed concurrently
    pub workers: usize,
    /// Seconds between metrics summaries
    #[serde(default = "default_metrics_interval")]
    pub metrics_interval_secs: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl LoggingConfig {
    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

impl AppConfig {
    /// Load configuration from `TITANIC_CONFIG` or the default file
    pub fn load() -> Result<Self> {
        let path =
            std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from_path(path)
    }

    /// Load configuration from a specific path.
    ///
    /// `TITANIC__SECTION__KEY` environment variables override file values.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(Environment::with_prefix("TITANIC").separator("__"))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            nats: NatsConfig {
                url: "nats://localhost:4222".to_string(),
                request_subject: "titanic.passengers".to_string(),
                response_subject: "titanic.predictions".to_string(),
            },
            model: ModelConfig {
                path: "models/titanic.onnx".to_string(),
                name: default_model_name(),
                onnx_threads: 1,
                feature_order: None,
            },
            pipeline: PipelineConfig {
                workers: 4,
                metrics_interval_secs: default_metrics_interval(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature_encoder::FeatureName;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.nats.url, "nats://localhost:4222");
        assert_eq!(config.nats.request_subject, "titanic.passengers");
        assert_eq!(config.model.onnx_threads, 1);
        assert_eq!(config.pipeline.workers, 4);
        assert!(!config.logging.is_json());
    }

    #[test]
    fn test_shipped_config_file_matches_defaults() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config/config.toml");
        let config = AppConfig::load_from_path(path).unwrap();
        let defaults = AppConfig::default();
        assert_eq!(config.nats.url, defaults.nats.url);
        assert_eq!(config.nats.response_subject, defaults.nats.response_subject);
        assert_eq!(config.model.path, defaults.model.path);
        assert_eq!(config.model.name, defaults.model.name);
        assert_eq!(config.pipeline.metrics_interval_secs, 30);
        assert!(config.model.feature_order.is_none());
    }

    #[test]
    fn test_feature_schema_resolution() {
        let mut model = AppConfig::default().model;
        assert_eq!(model.feature_schema().unwrap(), FeatureSchema::default());

        let mut names: Vec<String> = FeatureName::ALL.iter().map(|n| n.to_string()).collect();
        names.swap(0, 1);
        model.feature_order = Some(names);
        let schema = model.feature_schema().unwrap();
        assert_eq!(schema.columns()[0], FeatureName::SibSp);

        model.feature_order = Some(vec!["Age".to_string()]);
        assert!(model.feature_schema().is_err());
    }
}
