//! Sigmoid (tanh) kernel implementation
//!
//! K(x, y) = tanh(γ * <x, y> + r)
//!
//! The kernel is not positive semi-definite for every (γ, r), so SMO steps
//! with a non-positive curvature are skipped by the solver.

use crate::core::FeatureVector;
use crate::kernel::traits::Kernel;

/// Sigmoid (hyperbolic tangent) kernel
#[derive(Debug, Clone, Copy)]
pub struct SigmoidKernel {
    /// Scaling parameter for the dot product (must be positive)
    pub gamma: f64,
    /// Bias/offset parameter (can be positive, negative, or zero)
    pub coef0: f64,
}

impl SigmoidKernel {
    /// Creates a new Sigmoid kernel with specified parameters
    ///
    /// # Panics
    /// Panics if gamma is not positive
    ///
    /// # Examples
    /// ```
    /// use hogsvm::kernel::SigmoidKernel;
    ///
    /// let kernel = SigmoidKernel::new(0.1, -1.0);
    /// assert_eq!(kernel.gamma, 0.1);
    /// assert_eq!(kernel.coef0, -1.0);
    /// ```
    pub fn new(gamma: f64, coef0: f64) -> Self {
        if gamma <= 0.0 {
            panic!("Gamma must be positive, got: {}", gamma);
        }
        Self { gamma, coef0 }
    }

    /// Sigmoid kernel with gamma = 1/n_features and zero offset
    pub fn with_auto_gamma(n_features: usize) -> Self {
        if n_features == 0 {
            panic!("Number of features must be positive");
        }
        Self::new(1.0 / n_features as f64, 0.0)
    }
}

impl Kernel for SigmoidKernel {
    fn compute(&self, x: &FeatureVector, y: &FeatureVector) -> f64 {
        (self.gamma * x.dot(y) + self.coef0).tanh()
    }
}
