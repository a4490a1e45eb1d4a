//! Image decoding, resizing and normalization.
//!
//! Produces the NHWC batch the Xception-based classifier expects: one image,
//! `size × size` pixels, RGB channels last, each value scaled to `[-1, 1]`.

use image::imageops::{self, FilterType};
use image::RgbImage;
use log::debug;
use tract_onnx::prelude::tract_ndarray::Array4;

use crate::config::{ModelConfig, IMAGE_SIZE};
use crate::error::Result;

pub const CHANNELS: usize = 3;

/// Xception "tf" preprocessing: `[0, 255]` to `[-1, 1]`.
#[inline]
pub fn normalize(value: u8) -> f32 {
    value as f32 / 127.5 - 1.0
}

/// A single-image batch tensor of shape `(1, height, width, 3)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch(Array4<f32>);

impl Batch {
    pub fn shape(&self) -> [usize; 4] {
        let dims = self.0.shape();
        [dims[0], dims[1], dims[2], dims[3]]
    }

    pub fn as_array(&self) -> &Array4<f32> {
        &self.0
    }

    pub fn into_array(self) -> Array4<f32> {
        self.0
    }
}

/// Decodes any supported encoding (JPEG/PNG) into an RGB pixel grid.
///
/// Alpha is dropped and grayscale is expanded to three channels.
pub fn decode_rgb(bytes: &[u8]) -> Result<RgbImage> {
    let image = image::load_from_memory(bytes)?;
    debug!(
        "Decoded {}x{} image ({:?})",
        image.width(),
        image.height(),
        image.color()
    );
    Ok(image.to_rgb8())
}

#[derive(Debug, Clone, Copy)]
pub struct Preprocessor {
    pub size: u32,
    pub filter: FilterType,
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self {
            size: IMAGE_SIZE,
            filter: FilterType::Nearest,
        }
    }
}

impl From<&ModelConfig> for Preprocessor {
    fn from(config: &ModelConfig) -> Self {
        Self {
            size: config.image_size,
            filter: config.resize_filter,
        }
    }
}

impl Preprocessor {
    pub fn preprocess(&self, bytes: &[u8]) -> Result<Batch> {
        let rgb = decode_rgb(bytes)?;
        Ok(self.to_batch(&rgb))
    }

    /// Resizes an already decoded image and lays it out as a batch.
    pub fn to_batch(&self, rgb: &RgbImage) -> Batch {
        let resized = if rgb.dimensions() == (self.size, self.size) {
            rgb.clone()
        } else {
            imageops::resize(rgb, self.size, self.size, self.filter)
        };

        let side = self.size as usize;
        let tensor = Array4::from_shape_fn((1, side, side, CHANNELS), |(_, y, x, c)| {
            normalize(resized.get_pixel(x as u32, y as u32)[c])
        });

        Batch(tensor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{encode_jpeg, encode_png, solid_image};
    use image::Rgb;

    #[test]
    fn normalize_bounds() {
        assert_eq!(normalize(0), -1.0);
        assert_eq!(normalize(255), 1.0);
        assert!(normalize(128).abs() < 0.01);
    }

    #[test]
    fn shape_is_fixed_for_any_resolution() {
        let preprocessor = Preprocessor::default();
        for (w, h) in [(1, 1), (150, 150), (640, 480), (37, 913)] {
            let bytes = encode_png(&solid_image(w, h, [10, 20, 30]));
            let batch = preprocessor.preprocess(&bytes).unwrap();
            assert_eq!(batch.shape(), [1, 150, 150, 3], "input {w}x{h}");
        }
    }

    #[test]
    fn channels_are_rgb_last() {
        let bytes = encode_png(&solid_image(64, 48, [255, 0, 0]));
        let batch = Preprocessor::default().preprocess(&bytes).unwrap();
        let array = batch.as_array();
        assert_eq!(array[[0, 10, 20, 0]], 1.0);
        assert_eq!(array[[0, 10, 20, 1]], -1.0);
        assert_eq!(array[[0, 10, 20, 2]], -1.0);
    }

    #[test]
    fn values_stay_in_range() {
        let image = RgbImage::from_fn(90, 60, |x, y| {
            Rgb([(x * 3) as u8, (y * 4) as u8, ((x + y) % 256) as u8])
        });
        let batch = Preprocessor::default()
            .preprocess(&encode_jpeg(&image))
            .unwrap();
        assert!(batch
            .as_array()
            .iter()
            .all(|v| (-1.0..=1.0).contains(v)));
    }

    #[test]
    fn rgba_and_gray_become_three_channels() {
        let rgba = image::RgbaImage::from_pixel(20, 20, image::Rgba([0, 255, 0, 10]));
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgba8(rgba)
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        let decoded = decode_rgb(&bytes).unwrap();
        assert_eq!(decoded.get_pixel(3, 3), &Rgb([0, 255, 0]));

        let gray = image::GrayImage::from_pixel(8, 8, image::Luma([77]));
        let mut bytes = Vec::new();
        image::DynamicImage::ImageLuma8(gray)
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        let decoded = decode_rgb(&bytes).unwrap();
        assert_eq!(decoded.get_pixel(0, 0), &Rgb([77, 77, 77]));
    }

    #[test]
    fn rejects_non_image_bytes() {
        let err = Preprocessor::default()
            .preprocess(b"definitely not an image")
            .unwrap_err();
        assert_eq!(err.status_code(), 500);
        assert!(matches!(err, crate::InferenceError::Decode(_)));
    }

    #[test]
    fn repeated_runs_are_identical() {
        let bytes = encode_png(&solid_image(300, 200, [1, 2, 3]));
        let preprocessor = Preprocessor::default();
        assert_eq!(
            preprocessor.preprocess(&bytes).unwrap(),
            preprocessor.preprocess(&bytes).unwrap()
        );
    }
}
