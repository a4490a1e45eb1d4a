//! Decode → resize → normalize → predict, shared by every front end.

use std::sync::Arc;

use log::{debug, error, info};
use once_cell::sync::OnceCell;

use crate::config::ModelConfig;
use crate::error::Result;
use crate::model::{Classifier, OnnxClassifier};
use crate::prediction::Prediction;
use crate::preprocess::Preprocessor;

/// A loaded classifier plus the preprocessing it was trained with.
///
/// Cloning shares the underlying model.
#[derive(Clone)]
pub struct Pipeline {
    classifier: Arc<dyn Classifier>,
    preprocessor: Preprocessor,
}

impl Pipeline {
    pub fn new(classifier: Arc<dyn Classifier>, preprocessor: Preprocessor) -> Self {
        Self {
            classifier,
            preprocessor,
        }
    }

    /// Loads the ONNX artifact named by `config`.
    pub fn load(config: &ModelConfig) -> Result<Self> {
        let classifier = OnnxClassifier::load_with_size(&config.model_path, config.image_size)?;
        Ok(Self::new(Arc::new(classifier), Preprocessor::from(config)))
    }

    pub fn from_env() -> Result<Self> {
        Self::load(&ModelConfig::from_env()?)
    }

    pub fn preprocessor(&self) -> &Preprocessor {
        &self.preprocessor
    }

    pub fn predict(&self, image_bytes: &[u8]) -> Result<Prediction> {
        let batch = self.preprocessor.preprocess(image_bytes)?;
        debug!("Running inference on batch {:?}", batch.shape());
        let scores = self.classifier.classify(&batch)?;
        Prediction::from_scores(scores)
    }
}

static PIPELINE: OnceCell<Pipeline> = OnceCell::new();

/// Process-wide pipeline, loaded from the environment on first use.
///
/// A failed load is not cached, so the next call retries it.
pub fn global() -> Result<&'static Pipeline> {
    PIPELINE.get_or_try_init(|| {
        info!("Cold start: loading model");
        Pipeline::from_env().map_err(|e| {
            error!("{}", e);
            e
        })
    })
}

/// Installs an already built pipeline as the process-wide one.
///
/// Returns `false` if one was already installed.
pub fn install(pipeline: Pipeline) -> bool {
    PIPELINE.set(pipeline).is_ok()
}
