use std::path::Path;
use std::time::Instant;

use log::info;
use tract_onnx::prelude::*;

use crate::config::IMAGE_SIZE;
use crate::error::{InferenceError, Result};
use crate::preprocess::{Batch, CHANNELS};

/// A loaded model that turns a batch into one score per class.
///
/// Implementations must be read-only after construction so a single
/// instance can serve every request of the process.
pub trait Classifier: Send + Sync {
    fn classify(&self, batch: &Batch) -> Result<Vec<f32>>;
}

/// Classifier backed by an ONNX export of the trained network, run with tract.
pub struct OnnxClassifier {
    model: SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>,
}

impl OnnxClassifier {
    pub fn load<P: AsRef<Path>>(model_path: P) -> Result<Self> {
        Self::load_with_size(model_path, IMAGE_SIZE)
    }

    pub fn load_with_size<P: AsRef<Path>>(model_path: P, image_size: u32) -> Result<Self> {
        let path = model_path.as_ref();
        let started = Instant::now();
        let side = image_size as usize;

        let model = tract_onnx::onnx()
            .model_for_path(path)
            .and_then(|model| {
                model.with_input_fact(
                    0,
                    InferenceFact::dt_shape(f32::datum_type(), tvec!(1, side, side, CHANNELS)),
                )
            })
            .and_then(|model| model.into_optimized())
            .and_then(|model| model.into_runnable())
            .map_err(|e| InferenceError::ModelLoad {
                path: path.to_path_buf(),
                reason: format!("{:#}", e),
            })?;

        info!(
            "Loaded model {} in {} ms",
            path.display(),
            started.elapsed().as_millis()
        );

        Ok(Self { model })
    }
}

impl Classifier for OnnxClassifier {
    fn classify(&self, batch: &Batch) -> Result<Vec<f32>> {
        let input: Tensor = batch.as_array().clone().into();
        let outputs = self.model.run(tvec!(input.into()))?;

        let first = outputs
            .first()
            .ok_or_else(|| InferenceError::Inference("model produced no output".to_string()))?;
        let scores = first.to_array_view::<f32>()?.iter().copied().collect();

        Ok(scores)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_artifact_fails_to_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.onnx");

        let err = OnnxClassifier::load(&path).err().unwrap();
        match &err {
            InferenceError::ModelLoad { path: p, reason } => {
                assert_eq!(p, &path);
                assert!(!reason.is_empty());
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(err.kind(), crate::ErrorKind::Startup);
    }

    #[test]
    fn corrupt_artifact_fails_to_load() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"\x00\x01 not a protobuf graph").unwrap();

        let err = OnnxClassifier::load(file.path()).err().unwrap();
        assert!(matches!(err, InferenceError::ModelLoad { .. }));
    }
}
