//! RBF (Radial Basis Function) kernel implementation
//!
//! The RBF kernel is defined as: K(x, y) = exp(-γ * ||x - y||²)
//! where γ (gamma) is a hyperparameter that controls the kernel width.

use crate::core::FeatureVector;
use crate::kernel::Kernel;

/// RBF (Radial Basis Function) kernel: K(x, y) = exp(-γ * ||x - y||²)
///
/// The gamma parameter controls the "reach" of each training example:
/// - High gamma: close points have high influence (potential overfitting)
/// - Low gamma: distant points have influence (potential underfitting)
///
/// For HOG descriptors the pipeline resolves gamma with
/// [`Gamma::Scale`](crate::kernel::Gamma::Scale), i.e. `1 / (n_features * X.var())`.
#[derive(Debug, Clone, Copy)]
pub struct RBFKernel {
    gamma: f64,
}

impl RBFKernel {
    /// Create a new RBF kernel with specified gamma parameter
    ///
    /// # Panics
    /// Panics if gamma is not positive
    pub fn new(gamma: f64) -> Self {
        assert!(gamma > 0.0, "Gamma must be positive, got: {}", gamma);
        Self { gamma }
    }

    /// Create RBF kernel with gamma = 1.0 / n_features
    pub fn with_auto_gamma(n_features: usize) -> Self {
        assert!(n_features > 0, "Number of features must be positive");
        Self::new(1.0 / n_features as f64)
    }

    /// Get the gamma parameter
    pub fn gamma(&self) -> f64 {
        self.gamma
    }
}

impl Default for RBFKernel {
    /// Default RBF kernel with gamma = 1.0
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl Kernel for RBFKernel {
    fn compute(&self, x: &FeatureVector, y: &FeatureVector) -> f64 {
        (-self.gamma * x.squared_distance(y)).exp()
    }

    fn compute_with_norms(
        &self,
        x: &FeatureVector,
        y: &FeatureVector,
        x_norm_sq: f64,
        y_norm_sq: f64,
    ) -> f64 {
        // ||x - y||² = ||x||² + ||y||² - 2*x^T*y
        let squared_distance = (x_norm_sq + y_norm_sq - 2.0 * x.dot(y)).max(0.0);
        (-self.gamma * squared_distance).exp()
    }
}
