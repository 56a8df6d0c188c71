//! Linear kernel implementation

use crate::core::FeatureVector;
use crate::kernel::Kernel;

/// Linear kernel: K(x, y) = x^T * y
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearKernel;

impl LinearKernel {
    /// Create a new linear kernel
    pub fn new() -> Self {
        Self
    }
}

impl Kernel for LinearKernel {
    fn compute(&self, x: &FeatureVector, y: &FeatureVector) -> f64 {
        x.dot(y)
    }
}
