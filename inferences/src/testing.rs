use std::io::Cursor;
use std::sync::Mutex;

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

use crate::error::{InferenceError, Result};
use crate::model::Classifier;
use crate::preprocess::Batch;

/// Returns the same scores for every batch and remembers the last shape seen.
#[derive(Debug)]
pub struct FixedClassifier {
    scores: Vec<f32>,
    last_shape: Mutex<Option<[usize; 4]>>,
}

impl FixedClassifier {
    pub fn new(scores: Vec<f32>) -> Self {
        Self {
            scores,
            last_shape: Mutex::new(None),
        }
    }

    pub fn last_shape(&self) -> Option<[usize; 4]> {
        *self.last_shape.lock().unwrap()
    }
}

impl Classifier for FixedClassifier {
    fn classify(&self, batch: &Batch) -> Result<Vec<f32>> {
        *self.last_shape.lock().unwrap() = Some(batch.shape());
        Ok(self.scores.clone())
    }
}

#[derive(Debug, Default)]
pub struct FailingClassifier;

impl Classifier for FailingClassifier {
    fn classify(&self, _batch: &Batch) -> Result<Vec<f32>> {
        Err(InferenceError::Inference(
            "simulated runtime failure".to_string(),
        ))
    }
}

pub fn solid_image(width: u32, height: u32, rgb: [u8; 3]) -> RgbImage {
    RgbImage::from_pixel(width, height, Rgb(rgb))
}

pub fn encode_png(image: &RgbImage) -> Vec<u8> {
    encode(image, ImageFormat::Png)
}

pub fn encode_jpeg(image: &RgbImage) -> Vec<u8> {
    encode(image, ImageFormat::Jpeg)
}

fn encode(image: &RgbImage, format: ImageFormat) -> Vec<u8> {
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(image.clone())
        .write_to(&mut Cursor::new(&mut bytes), format)
        .unwrap();
    bytes
}
