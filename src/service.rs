//! Prediction service: validation, encoding and classification of one passenger

use crate::config::ModelConfig;
use crate::error::{PredictionError, Result};
use crate::feature_encoder::FeatureEncoder;
use crate::models::inference::{OnnxClassifier, SurvivalClassifier};
use crate::types::passenger::RawPassengerRecord;
use crate::types::prediction::{PredictionOutcome, PredictionResult};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Owns the loaded classifier and the encoder feeding it.
///
/// Immutable once built; share it behind an `Arc`.
pub struct PredictionService {
    encoder: FeatureEncoder,
    classifier: Arc<dyn SurvivalClassifier>,
}

impl PredictionService {
    /// Service using the default column order
    pub fn new(classifier: Arc<dyn SurvivalClassifier>) -> Self {
        Self::with_encoder(FeatureEncoder::new(), classifier)
    }

    pub fn with_encoder(encoder: FeatureEncoder, classifier: Arc<dyn SurvivalClassifier>) -> Self {
        Self {
            encoder,
            classifier,
        }
    }

    /// Load the ONNX artifact and column order described by the configuration
    pub fn from_config(config: &ModelConfig) -> Result<Self> {
        let schema = config.feature_schema()?;
        let classifier = OnnxClassifier::load(&config.path, &config.name, config.onnx_threads)?;

        info!(
            model = %config.name,
            features = schema.len(),
            custom_order = config.feature_order.is_some(),
            "Prediction service ready"
        );

        Ok(Self::with_encoder(
            FeatureEncoder::with_schema(schema),
            Arc::new(classifier),
        ))
    }

    pub fn model_name(&self) -> &str {
        self.classifier.name()
    }

    pub fn encoder(&self) -> &FeatureEncoder {
        &self.encoder
    }

    /// Predict survival for a raw record.
    ///
    /// Out-of-domain records fail with `InvalidInput` before the model is
    /// called; a model label outside {0, 1} fails with `UnexpectedModelOutput`.
    pub fn predict(&self, record: &RawPassengerRecord) -> Result<PredictionResult> {
        let passenger = record.validate()?;
        let row = self.encoder.encode_row(&passenger);

        let label = self.classifier.classify(&row)?;
        let result = PredictionResult::from_label(label)
            .ok_or(PredictionError::UnexpectedModelOutput(label))?;

        debug!(model = %self.model_name(), label = label, result = %result, "Prediction complete");
        Ok(result)
    }

    /// Predict and fold every failure into an outcome a caller can render
    pub fn outcome(&self, record: &RawPassengerRecord) -> PredictionOutcome {
        match self.predict(record) {
            Ok(result) => result.into(),
            Err(PredictionError::InvalidInput { field, reason }) => {
                warn!(field = field, reason = %reason, "Rejected passenger record");
                PredictionOutcome::Rejected {
                    reason: format!("invalid {}: {}", field, reason),
                }
            }
            Err(PredictionError::UnexpectedModelOutput(raw)) => {
                error!(model = %self.model_name(), raw = raw, "Model returned a value outside {{0, 1}}");
                PredictionOutcome::Unexpected { raw }
            }
            Err(e) => {
                error!(model = %self.model_name(), kind = e.kind(), error = %e, "Prediction failed");
                PredictionOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature_encoder::{FeatureName, FeatureSchema, FEATURE_COUNT};
    use crate::types::prediction::PredictionRequest;
    use std::sync::Mutex;

    /// Returns a fixed label and remembers the rows it was given
    struct StubClassifier {
        label: i64,
        rows: Mutex<Vec<Vec<f32>>>,
    }

    impl StubClassifier {
        fn returning(label: i64) -> Arc<Self> {
            Arc::new(Self {
                label,
                rows: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.rows.lock().unwrap().len()
        }
    }

    impl SurvivalClassifier for StubClassifier {
        fn name(&self) -> &str {
            "stub"
        }

        fn classify(&self, row: &[f32]) -> Result<i64> {
            self.rows.lock().unwrap().push(row.to_vec());
            Ok(self.label)
        }
    }

    struct FailingClassifier;

    impl SurvivalClassifier for FailingClassifier {
        fn name(&self) -> &str {
            "failing"
        }

        fn classify(&self, _row: &[f32]) -> Result<i64> {
            Err(PredictionError::Inference("session crashed".to_string()))
        }
    }

    fn passenger() -> RawPassengerRecord {
        RawPassengerRecord::new(1, "female", 38.0, 1, 0, 71.28, "C")
    }

    #[test]
    fn test_labels_map_to_results() {
        let service = PredictionService::new(StubClassifier::returning(1));
        assert_eq!(service.predict(&passenger()).unwrap(), PredictionResult::Survived);

        let service = PredictionService::new(StubClassifier::returning(0));
        assert_eq!(
            service.predict(&passenger()).unwrap(),
            PredictionResult::DidNotSurvive
        );
    }

    #[test]
    fn test_unexpected_model_output_is_never_a_label() {
        let service = PredictionService::new(StubClassifier::returning(2));
        assert!(matches!(
            service.predict(&passenger()),
            Err(PredictionError::UnexpectedModelOutput(2))
        ));
        assert_eq!(
            service.outcome(&passenger()),
            PredictionOutcome::Unexpected { raw: 2 }
        );
    }

    #[test]
    fn test_invalid_input_never_reaches_model() {
        let stub = StubClassifier::returning(1);
        let service = PredictionService::new(stub.clone());

        let mut record = passenger();
        record.pclass = 5.0;
        assert!(matches!(
            service.predict(&record),
            Err(PredictionError::InvalidInput { field: "Pclass", .. })
        ));
        match service.outcome(&record) {
            PredictionOutcome::Rejected { reason } => assert!(reason.contains("Pclass")),
            other => panic!("expected rejection, got {:?}", other),
        }
        assert_eq!(stub.calls(), 0);
    }

    #[test]
    fn test_model_receives_encoded_row() {
        let stub = StubClassifier::returning(1);
        let service = PredictionService::new(stub.clone());
        service.predict(&passenger()).unwrap();

        let rows = stub.rows.lock().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].len(), FEATURE_COUNT);
        assert_eq!(rows[0][0], 38.0); // Age
        assert_eq!(rows[0][3], 71.28); // Fare
    }

    #[test]
    fn test_custom_schema_is_applied() {
        let mut names: Vec<&str> = FeatureName::ALL.iter().map(|n| n.as_str()).collect();
        names.rotate_left(4);
        let encoder = FeatureEncoder::with_schema(FeatureSchema::from_names(&names).unwrap());
        let stub = StubClassifier::returning(0);
        let service = PredictionService::with_encoder(encoder, stub.clone());
        service.predict(&passenger()).unwrap();

        let rows = stub.rows.lock().unwrap();
        assert_eq!(rows[0][0], 2.0); // FamilySize
        assert_eq!(rows[0][26], 38.0); // Age
    }

    #[test]
    fn test_inference_failure_becomes_failed_outcome() {
        let service = PredictionService::new(Arc::new(FailingClassifier));
        assert!(matches!(
            service.predict(&passenger()),
            Err(PredictionError::Inference(_))
        ));
        match service.outcome(&passenger()) {
            PredictionOutcome::Failed { reason } => assert!(reason.contains("session crashed")),
            other => panic!("expected failure outcome, got {:?}", other),
        }
    }

    #[test]
    fn test_mistyped_request_is_rejected_not_dropped() {
        let stub = StubClassifier::returning(1);
        let service = PredictionService::new(stub.clone());

        let json = r#"{"request_id":"req_7","passenger":{"Pclass":1.5,"Sex":"female","Age":38,"SibSp":1,"Parch":0,"Fare":71.28,"Embarked":"C"}}"#;
        let request: PredictionRequest = serde_json::from_str(json).unwrap();
        match service.outcome(&request.passenger) {
            PredictionOutcome::Rejected { reason } => assert!(reason.contains("Pclass")),
            other => panic!("expected rejection, got {:?}", other),
        }

        let json = r#"{"passenger":{"Pclass":3,"Sex":"male","Age":22,"SibSp":2.5,"Parch":0,"Fare":7.25,"Embarked":"S"}}"#;
        let request: PredictionRequest = serde_json::from_str(json).unwrap();
        match service.outcome(&request.passenger) {
            PredictionOutcome::Rejected { reason } => assert!(reason.contains("SibSp")),
            other => panic!("expected rejection, got {:?}", other),
        }

        assert_eq!(stub.calls(), 0);
    }

    #[test]
    fn test_shared_service_across_threads() {
        let service = Arc::new(PredictionService::new(StubClassifier::returning(1)));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let service = service.clone();
                std::thread::spawn(move || service.predict(&passenger()).unwrap())
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), PredictionResult::Survived);
        }
    }

    #[test]
    fn test_missing_artifact_fails_startup() {
        let mut config = crate::config::AppConfig::default().model;
        config.path = "does/not/exist.onnx".to_string();
        assert!(matches!(
            PredictionService::from_config(&config),
            Err(PredictionError::ModelLoadFailure { .. })
        ));
    }
}
