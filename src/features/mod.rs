//! Image descriptors
//!
//! [`FeatureExtractor`] turns one image file into a fixed-length
//! [`FeatureVector`]; [`HogDescriptor`] is the implementation used by the
//! pipeline.

pub mod descriptor;
pub mod hog;

pub use self::descriptor::HogDescriptor;
pub use self::hog::{compute_hog, HogParams};

use crate::core::{FeatureVector, Result};
use std::path::Path;

/// Produces one feature vector per image file
///
/// Every vector returned by one extractor has length `descriptor_len()`.
pub trait FeatureExtractor: Send + Sync {
    /// Describe the image at `path`
    fn extract(&self, path: &Path) -> Result<FeatureVector>;

    /// Length of every vector this extractor produces
    fn descriptor_len(&self) -> usize;
}

/// Whether the final path component starts with a dot
pub fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_hidden() {
        assert!(is_hidden(Path::new("train/cats/.DS_Store")));
        assert!(is_hidden(Path::new(".hidden")));
        assert!(!is_hidden(Path::new("train/.cache/cat.1.jpg")));
        assert!(!is_hidden(Path::new("dog.2.jpg")));
    }
}
