//! Survival classifier boundary and its ONNX Runtime implementation

use crate::error::{PredictionError, Result};
use crate::models::loader::{LoadedModel, ModelLoader};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, warn};

/// A trained binary classifier.
///
/// Given one feature row in trained column order, return the raw predicted
/// class. Implementations must not map or clamp the class: callers rely on
/// seeing values outside {0, 1}.
pub trait SurvivalClassifier: Send + Sync {
    /// Name used in logs and responses
    fn name(&self) -> &str;

    /// Classify a single row
    fn classify(&self, row: &[f32]) -> Result<i64>;
}

/// Classifier backed by an ONNX Runtime session
pub struct OnnxClassifier {
    name: String,
    input_name: String,
    label_output: Option<String>,
    /// `Session::run` needs exclusive access
    session: Mutex<ort::session::Session>,
}

impl OnnxClassifier {
    /// Load a classifier from an ONNX file
    pub fn load<P: AsRef<Path>>(path: P, name: &str, onnx_threads: usize) -> Result<Self> {
        let model = ModelLoader::with_threads(onnx_threads).load_model(path, name)?;
        Ok(Self::from_loaded(model))
    }

    pub fn from_loaded(model: LoadedModel) -> Self {
        Self {
            name: model.name,
            input_name: model.input_name,
            label_output: model.label_output,
            session: Mutex::new(model.session),
        }
    }

    fn run(&self, row: &[f32]) -> anyhow::Result<i64> {
        use ort::value::Tensor;

        // Prepare input tensor - shape [1, num_features]
        let shape = vec![1_i64, row.len() as i64];
        let input_tensor = Tensor::from_array((shape, row.to_vec()))?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock error: {}", e))?;

        let outputs = session.run(ort::inputs![&self.input_name => input_tensor])?;

        // Predicted label tensor (sklearn-style exports)
        if let Some(label_name) = &self.label_output {
            if let Some(output) = outputs.get(label_name.as_str()) {
                if let Ok((_, data)) = output.try_extract_tensor::<i64>() {
                    let label = data
                        .first()
                        .copied()
                        .ok_or_else(|| anyhow::anyhow!("Empty label tensor"))?;
                    debug!(model = %self.name, label = label, "Extracted label tensor");
                    return Ok(label);
                }
            }
        }

        // Fallback: derive the class from a probability or score tensor
        for (name, output) in outputs.iter() {
            if name.contains("label") {
                continue;
            }
            if let Ok((shape, data)) = output.try_extract_tensor::<f32>() {
                let dims: Vec<i64> = shape.iter().copied().collect();
                if let Some(label) = class_from_scores(&dims, data) {
                    debug!(model = %self.name, output = %name, label = label, "Derived label from scores");
                    return Ok(label);
                }
            }
        }

        warn!(model = %self.name, "Model produced no usable output");
        Err(anyhow::anyhow!("No label or probability output found"))
    }
}

impl SurvivalClassifier for OnnxClassifier {
    fn name(&self) -> &str {
        &self.name
    }

    fn classify(&self, row: &[f32]) -> Result<i64> {
        self.run(row)
            .map_err(|e| PredictionError::Inference(format!("{}: {:#}", self.name, e)))
    }
}

/// Class index from a score tensor of a single-row batch.
///
/// `[1, k]` / `[k]` with k >= 2 is treated as per-class probabilities (argmax);
/// a single column is a positive-class probability cut at 0.5.
fn class_from_scores(dims: &[i64], data: &[f32]) -> Option<i64> {
    let width = match dims {
        [_, k] | [k] => *k as usize,
        _ => return None,
    };
    let row = data.get(..width)?;

    match width {
        0 => None,
        1 => Some(if row[0] >= 0.5 { 1 } else { 0 }),
        _ => row
            .iter()
            .enumerate()
            .fold(None, |best: Option<(usize, f32)>, (i, &p)| match best {
                Some((_, bp)) if bp >= p => best,
                _ => Some((i, p)),
            })
            .map(|(i, _)| i as i64),
    }
}
