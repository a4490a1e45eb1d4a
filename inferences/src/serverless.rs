//! Serverless function adapter.
//!
//! Takes an event of the form `{"image": "<base64>"}` and answers with a
//! `{"statusCode": int, "body": "<json string>"}` envelope instead of a native
//! HTTP response.

use std::time::Instant;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use log::{error, info};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{InferenceError, Result};
use crate::json;
use crate::pipeline::{self, Pipeline};
use crate::prediction::Prediction;

/// Event key holding the base64-encoded image.
pub const IMAGE_KEY: &str = "image";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub status_code: u16,
    pub body: String,
}

impl Envelope {
    pub fn ok(prediction: &Prediction) -> Self {
        match json::to_string(&prediction.to_serverless()) {
            Ok(body) => Self {
                status_code: 200,
                body,
            },
            Err(e) => Self::error(&InferenceError::from(e)),
        }
    }

    pub fn error(err: &InferenceError) -> Self {
        let message = err.to_string();
        Self {
            status_code: err.status_code(),
            body: json::to_string(&json!({ "error": message }))
                .unwrap_or_else(|_| r#"{"error": "internal error"}"#.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status_code == 200
    }
}

/// Handles one event against the given pipeline.
pub fn handle_event(pipeline: &Pipeline, event: &Value) -> Envelope {
    let started = Instant::now();

    match extract_image(event).and_then(|bytes| pipeline.predict(&bytes)) {
        Ok(prediction) => {
            info!(
                "Predicted {} ({:.3}) in {} ms",
                prediction.label,
                prediction.confidence,
                started.elapsed().as_millis()
            );
            Envelope::ok(&prediction)
        }
        Err(e) => {
            error!("Event failed after {} ms: {}", started.elapsed().as_millis(), e);
            Envelope::error(&e)
        }
    }
}

/// Entry point for the hosting platform: handles `event` with the process-wide
/// pipeline, loading the model on the first (cold) invocation.
pub fn lambda_handler(event: &Value) -> Envelope {
    match pipeline::global() {
        Ok(pipeline) => handle_event(pipeline, event),
        Err(e) => Envelope::error(&e),
    }
}

/// Pulls the image bytes out of an event.
///
/// An absent or empty `image` value is a missing input; anything else that is
/// not a base64 string is a malformed request.
pub fn extract_image(event: &Value) -> Result<Vec<u8>> {
    let object = event.as_object().ok_or_else(|| {
        InferenceError::InvalidRequest("event must be a JSON object".to_string())
    })?;

    match object.get(IMAGE_KEY) {
        None => Err(InferenceError::MissingImage),
        Some(value) if is_empty_value(value) => Err(InferenceError::MissingImage),
        Some(Value::String(encoded)) => decode_image_payload(encoded),
        Some(other) => Err(InferenceError::InvalidRequest(format!(
            "'{}' must be a base64 string, got {}",
            IMAGE_KEY,
            type_name(other)
        ))),
    }
}

/// Decodes a base64 payload, skipping anything outside the base64 alphabet
/// (line breaks from wrapped encoders, stray whitespace).
pub fn decode_image_payload(encoded: &str) -> Result<Vec<u8>> {
    let cleaned: Vec<u8> = encoded
        .bytes()
        .filter(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'/' | b'='))
        .collect();
    Ok(STANDARD.decode(cleaned)?)
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
