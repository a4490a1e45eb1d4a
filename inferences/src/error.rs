//! Error type shared by the pipeline and both front ends.

use std::path::PathBuf;

use thiserror::Error;

/// Everything that can go wrong between receiving an image and answering.
#[derive(Error, Debug)]
pub enum InferenceError {
    /// The request carried no image at all
    #[error("No image provided")]
    MissingImage,

    /// The request was not shaped the way the front end expects
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The image payload was not valid base64
    #[error("Invalid base64 image payload: {0}")]
    Base64(#[from] base64::DecodeError),

    /// The bytes could not be decoded as an image
    #[error("Cannot identify image: {0}")]
    Decode(#[from] image::ImageError),

    /// The model artifact is missing or unreadable
    #[error("Failed to load model from '{path}': {reason}")]
    ModelLoad { path: PathBuf, reason: String },

    /// The forward pass failed
    #[error("Inference failed: {0}")]
    Inference(String),

    /// The model produced the wrong number of scores
    #[error("Model returned {actual} scores, expected {expected}")]
    OutputShape { expected: usize, actual: usize },

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Coarse failure categories, collapsed to a status code at the edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MissingInput,
    Preprocess,
    Inference,
    Startup,
}

impl InferenceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            InferenceError::MissingImage => ErrorKind::MissingInput,
            InferenceError::InvalidRequest(_)
            | InferenceError::Base64(_)
            | InferenceError::Decode(_) => ErrorKind::Preprocess,
            InferenceError::Inference(_)
            | InferenceError::OutputShape { .. }
            | InferenceError::Serialization(_) => ErrorKind::Inference,
            InferenceError::ModelLoad { .. } | InferenceError::Config(_) => ErrorKind::Startup,
        }
    }

    /// HTTP-style status for this error. Only a missing input is the caller's fault.
    pub fn status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::MissingInput => 400,
            _ => 500,
        }
    }
}

impl From<anyhow::Error> for InferenceError {
    fn from(err: anyhow::Error) -> Self {
        InferenceError::Inference(format!("{:#}", err))
    }
}

/// Convenience Result type for inference operations
pub type Result<T> = std::result::Result<T, InferenceError>;
