//! Inference pipeline for the Intel scene classifier.
//!
//! Loads an ONNX export of the Xception-based model once per process and turns
//! encoded images into predictions over six scene classes. The HTTP API
//! (`scene-api`) and the serverless handler in [`serverless`] both go through
//! [`Pipeline`].

pub mod config;
pub mod error;
pub mod json;
pub mod labels;
pub mod model;
pub mod pipeline;
pub mod prediction;
pub mod preprocess;
pub mod serverless;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use config::ModelConfig;
pub use error::{ErrorKind, InferenceError, Result};
pub use labels::{class_name, CLASSES, NUM_CLASSES};
pub use model::{Classifier, OnnxClassifier};
pub use pipeline::Pipeline;
pub use prediction::{HttpPrediction, Prediction, ServerlessPrediction};
pub use preprocess::{Batch, Preprocessor};
pub use serverless::{handle_event, lambda_handler, Envelope};

/// Initializes `env_logger` the way every binary in this workspace does.
pub fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .format_module_path(false)
        .init();
}
