//! Arg-max selection and the two wire shapes a prediction is reported in.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::error::{InferenceError, Result};
use crate::labels::{CLASSES, NUM_CLASSES};

/// Scores for one image together with the winning class.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub scores: Vec<f32>,
    pub class_index: usize,
    pub label: &'static str,
    pub confidence: f32,
}

impl Prediction {
    pub fn from_scores(scores: Vec<f32>) -> Result<Self> {
        if scores.len() != NUM_CLASSES {
            return Err(InferenceError::OutputShape {
                expected: NUM_CLASSES,
                actual: scores.len(),
            });
        }

        let class_index = argmax(&scores);

        Ok(Self {
            class_index,
            label: CLASSES[class_index],
            confidence: scores[class_index],
            scores,
        })
    }

    /// `{"prediction": [[...]], "predicted_class", "confidence"}`
    pub fn to_http(&self) -> HttpPrediction {
        HttpPrediction {
            prediction: vec![self.scores.iter().map(|&p| p as f64).collect()],
            predicted_class: self.label.to_string(),
            confidence: self.confidence as f64,
        }
    }

    /// `{"predicted_class", "confidence", "all_predictions": {label: p}}`
    pub fn to_serverless(&self) -> ServerlessPrediction {
        ServerlessPrediction {
            predicted_class: self.label.to_string(),
            confidence: self.confidence as f64,
            all_predictions: LabelScores(self.scores.iter().map(|&p| p as f64).collect()),
        }
    }
}

/// Index of the largest score. Ties go to the lowest index.
pub fn argmax(scores: &[f32]) -> usize {
    let mut best = 0;
    for (i, &score) in scores.iter().enumerate().skip(1) {
        if score > scores[best] {
            best = i;
        }
    }
    best
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HttpPrediction {
    pub prediction: Vec<Vec<f64>>,
    pub predicted_class: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServerlessPrediction {
    pub predicted_class: String,
    pub confidence: f64,
    pub all_predictions: LabelScores,
}

/// Per-label scores serialized as a JSON object in label order.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelScores(Vec<f64>);

impl LabelScores {
    pub fn get(&self, label: &str) -> Option<f64> {
        CLASSES
            .iter()
            .position(|&c| c == label)
            .and_then(|i| self.0.get(i).copied())
    }
}

impl Serialize for LabelScores {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (label, score) in CLASSES.iter().zip(&self.0) {
            map.serialize_entry(label, score)?;
        }
        map.end()
    }
}
