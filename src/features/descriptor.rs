//! Image file → HOG feature vector

use crate::core::{FeatureVector, Result, SVMError};
use crate::features::hog::{compute_hog, HogParams};
use crate::features::{is_hidden, FeatureExtractor};
use image::imageops::{self, FilterType};
use image::DynamicImage;
use log::debug;
use std::path::Path;

/// Decodes an image, converts it to grayscale, resizes it to a fixed square
/// and describes it with HOG
#[derive(Debug, Clone)]
pub struct HogDescriptor {
    params: HogParams,
}

impl HogDescriptor {
    /// Create a descriptor, rejecting geometries that produce no blocks
    pub fn new(params: HogParams) -> Result<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    /// Descriptor geometry
    pub fn params(&self) -> &HogParams {
        &self.params
    }

    /// Describe an already decoded image
    pub fn describe(&self, image: &DynamicImage) -> Result<FeatureVector> {
        let size = self.params.image_size;
        let gray = image.to_luma8();
        let resized = imageops::resize(&gray, size, size, FilterType::Triangle);

        let pixels: Vec<f64> = resized
            .pixels()
            .map(|p| f64::from(p.0[0]) / 255.0)
            .collect();

        let values = compute_hog(&pixels, size as usize, size as usize, &self.params)?;
        Ok(FeatureVector::new(values))
    }
}

impl Default for HogDescriptor {
    fn default() -> Self {
        Self {
            params: HogParams::default(),
        }
    }
}

impl FeatureExtractor for HogDescriptor {
    fn extract(&self, path: &Path) -> Result<FeatureVector> {
        if is_hidden(path) {
            return Err(SVMError::InvalidParameter(format!(
                "Refusing to describe hidden file {}",
                path.display()
            )));
        }

        let image = image::open(path).map_err(|e| SVMError::DecodeError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        debug!(
            "Decoded {} ({}x{})",
            path.display(),
            image.width(),
            image.height()
        );

        self.describe(&image)
    }

    fn descriptor_len(&self) -> usize {
        self.params.descriptor_len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use std::fs;
    use tempfile::TempDir;

    fn checkerboard(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            if (x / 5 + y / 3) % 2 == 0 {
                Rgb([230, 40, 10])
            } else {
                Rgb([10, 60, 200])
            }
        }))
    }

    #[test]
    fn test_descriptor_len_independent_of_input_size() {
        let descriptor = HogDescriptor::default();

        for (w, h) in [(64, 64), (17, 90), (300, 41), (8, 8)] {
            let features = descriptor.describe(&checkerboard(w, h)).unwrap();
            assert_eq!(features.len(), 1764, "input {w}x{h}");
            assert_eq!(features.len(), descriptor.descriptor_len());
        }
    }

    #[test]
    fn test_custom_geometry() {
        let params = HogParams {
            image_size: 32,
            orientations: 6,
            pixels_per_cell: 8,
            cells_per_block: 1,
        };
        let descriptor = HogDescriptor::new(params).unwrap();
        let features = descriptor.describe(&checkerboard(50, 50)).unwrap();

        assert_eq!(features.len(), 4 * 4 * 6);
    }

    #[test]
    fn test_invalid_geometry_rejected() {
        // 8 px image: a single 8 px cell cannot hold a 2x2 block
        let too_small = HogParams {
            image_size: 8,
            ..HogParams::default()
        };
        assert!(matches!(
            HogDescriptor::new(too_small),
            Err(SVMError::InvalidParameter(_))
        ));

        let wide_block = HogParams {
            image_size: 16,
            cells_per_block: 3,
            ..HogParams::default()
        };
        assert!(HogDescriptor::new(wide_block).is_err());

        // Two cells per side still fit exactly one block
        let smallest = HogParams {
            image_size: 16,
            ..HogParams::default()
        };
        let descriptor = HogDescriptor::new(smallest).unwrap();
        assert_eq!(descriptor.descriptor_len(), 2 * 2 * 9);
    }

    #[test]
    fn test_extract_from_png() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sample.png");
        checkerboard(40, 30).save(&path).unwrap();

        let descriptor = HogDescriptor::default();
        let from_file = descriptor.extract(&path).unwrap();
        let in_memory = descriptor.describe(&checkerboard(40, 30)).unwrap();

        assert_eq!(from_file, in_memory);
    }

    #[test]
    fn test_extract_rejects_undecodable_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.png");
        fs::write(&path, b"definitely not a png").unwrap();

        let result = HogDescriptor::default().extract(&path);
        assert!(matches!(result, Err(SVMError::DecodeError { path: p, .. }) if p == path));
    }

    #[test]
    fn test_extract_rejects_hidden_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".DS_Store");
        fs::write(&path, b"metadata").unwrap();

        let result = HogDescriptor::default().extract(&path);
        assert!(matches!(result, Err(SVMError::InvalidParameter(_))));
    }
}
