//! Kernel trait definition

use crate::core::FeatureVector;

/// Kernel function trait
///
/// A kernel function K(x, y) maps a pair of feature vectors to a similarity
/// score. The SMO solver only ever sees kernels through this trait.
pub trait Kernel: Send + Sync {
    /// Compute kernel value K(x, y)
    fn compute(&self, x: &FeatureVector, y: &FeatureVector) -> f64;

    /// Optional: compute kernel value using precomputed squared norms
    /// This can be more efficient for some kernels (e.g., RBF)
    fn compute_with_norms(
        &self,
        x: &FeatureVector,
        y: &FeatureVector,
        x_norm_sq: f64,
        y_norm_sq: f64,
    ) -> f64 {
        let _ = (x_norm_sq, y_norm_sq);
        self.compute(x, y)
    }
}
