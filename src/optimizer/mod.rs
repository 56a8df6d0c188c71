//! Optimization algorithms for SVM
//!
//! This module provides high-level optimization interfaces that integrate
//! kernels and solvers to provide complete SVM training functionality.

use crate::core::{
    Dataset, FeatureVector, OptimizationResult, OptimizerConfig, Prediction, Result, SVMError,
    SVMModel, Sample,
};
use crate::kernel::Kernel;
use crate::solver::SMOSolver;
use log::debug;
use std::sync::Arc;

/// High-level SVM optimizer that integrates kernel functions and solving algorithms
pub struct SVMOptimizer<K: Kernel> {
    kernel: Arc<K>,
    config: OptimizerConfig,
}

impl<K: Kernel> SVMOptimizer<K> {
    /// Create a new SVM optimizer with the given kernel and configuration
    pub fn new(kernel: K, config: OptimizerConfig) -> Self {
        Self {
            kernel: Arc::new(kernel),
            config,
        }
    }

    /// Create a new SVM optimizer with default configuration
    pub fn with_kernel(kernel: K) -> Self {
        Self::new(kernel, OptimizerConfig::default())
    }

    /// Train an SVM model on the given dataset
    pub fn train<D: Dataset>(&self, dataset: &D) -> Result<TrainedSVM<K>> {
        let samples: Vec<Sample> = (0..dataset.len()).map(|i| dataset.get_sample(i)).collect();
        self.train_samples(&samples)
    }

    /// Train an SVM model on a slice of samples
    pub fn train_samples(&self, samples: &[Sample]) -> Result<TrainedSVM<K>> {
        let solver = SMOSolver::new(Arc::clone(&self.kernel), self.config.clone());
        let result = solver.solve(samples)?;

        debug!(
            "Trained on {} samples: {} support vectors, objective {:.6}",
            samples.len(),
            result.support_vectors.len(),
            result.objective_value
        );

        Ok(TrainedSVM::new(Arc::clone(&self.kernel), samples, result))
    }

    /// Get the optimizer configuration
    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Get the kernel
    pub fn kernel(&self) -> &K {
        &self.kernel
    }
}

/// A trained SVM model that can make predictions
pub struct TrainedSVM<K: Kernel> {
    kernel: Arc<K>,
    support_vectors: Vec<Sample>,
    alpha: Vec<f64>,
    bias: f64,
    support_indices: Vec<usize>,
}

impl<K: Kernel> TrainedSVM<K> {
    /// Create a new trained SVM model
    pub(crate) fn new(
        kernel: Arc<K>,
        training_samples: &[Sample],
        optimization_result: OptimizationResult,
    ) -> Self {
        let mut support_vectors = Vec::with_capacity(optimization_result.support_vectors.len());
        let mut alpha_values = Vec::with_capacity(optimization_result.support_vectors.len());

        for &sv_idx in &optimization_result.support_vectors {
            support_vectors.push(training_samples[sv_idx].clone());
            alpha_values.push(optimization_result.alpha[sv_idx]);
        }

        Self {
            kernel,
            support_vectors,
            alpha: alpha_values,
            bias: optimization_result.b,
            support_indices: optimization_result.support_vectors,
        }
    }

    /// Rebuild a model from stored support vectors
    ///
    /// `alpha` holds the (non-negative) multiplier of each support vector; the
    /// sign comes from the support vector's label.
    pub fn from_parts(
        kernel: K,
        support_vectors: Vec<Sample>,
        alpha: Vec<f64>,
        bias: f64,
    ) -> Result<Self> {
        if support_vectors.len() != alpha.len() {
            return Err(SVMError::DimensionMismatch {
                expected: support_vectors.len(),
                actual: alpha.len(),
            });
        }
        if let Some(first) = support_vectors.first() {
            let dim = first.features.len();
            if let Some(bad) = support_vectors.iter().find(|sv| sv.features.len() != dim) {
                return Err(SVMError::DimensionMismatch {
                    expected: dim,
                    actual: bad.features.len(),
                });
            }
        }

        let support_indices = (0..support_vectors.len()).collect();
        Ok(Self {
            kernel: Arc::new(kernel),
            support_vectors,
            alpha,
            bias,
            support_indices,
        })
    }

    /// Decision function value for a feature vector
    pub fn decision_value(&self, features: &FeatureVector) -> f64 {
        let mut result = 0.0;

        for (alpha, support_vector) in self.alpha.iter().zip(self.support_vectors.iter()) {
            let kernel_value = self.kernel.compute(features, &support_vector.features);
            result += alpha * support_vector.label * kernel_value;
        }

        result + self.bias
    }

    /// Get the decision function value for a sample
    pub fn decision_function(&self, sample: &Sample) -> f64 {
        self.decision_value(&sample.features)
    }

    /// Get the kernel
    pub fn kernel(&self) -> &K {
        &self.kernel
    }

    /// Get the support vectors
    pub fn support_vectors(&self) -> &[Sample] {
        &self.support_vectors
    }

    /// Get the alpha values for support vectors
    pub fn alpha_values(&self) -> &[f64] {
        &self.alpha
    }

    /// Get the indices of support vectors in the original training set
    pub fn support_vector_indices(&self) -> &[usize] {
        &self.support_indices
    }

    /// Feature dimension expected by the model, if it has any support vectors
    pub fn dim(&self) -> Option<usize> {
        self.support_vectors.first().map(|sv| sv.features.len())
    }
}

impl<K: Kernel> SVMModel for TrainedSVM<K> {
    fn predict(&self, sample: &Sample) -> Prediction {
        let decision_value = self.decision_function(sample);
        let label = if decision_value >= 0.0 { 1.0 } else { -1.0 };
        Prediction::new(label, decision_value)
    }

    fn n_support_vectors(&self) -> usize {
        self.support_vectors.len()
    }

    fn bias(&self) -> f64 {
        self.bias
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::LinearKernel;

    fn sample(values: &[f64], label: f64) -> Sample {
        Sample::new(FeatureVector::new(values.to_vec()), label)
    }

    #[test]
    fn test_svm_optimizer_creation() {
        let kernel = LinearKernel::new();
        let config = OptimizerConfig::default();
        let optimizer = SVMOptimizer::new(kernel, config.clone());

        assert_eq!(optimizer.config().c, config.c);
        assert_eq!(optimizer.config().epsilon, config.epsilon);
    }

    #[test]
    fn test_svm_optimizer_with_kernel() {
        let optimizer = SVMOptimizer::with_kernel(LinearKernel::new());

        assert_eq!(optimizer.config().c, 1.0);
        assert_eq!(optimizer.config().epsilon, 0.001);
    }

    #[test]
    fn test_svm_training_simple_case() {
        let optimizer = SVMOptimizer::with_kernel(LinearKernel::new());

        let samples = vec![
            sample(&[2.0], 1.0),
            sample(&[-2.0], -1.0),
            sample(&[1.5], 1.0),
            sample(&[-1.5], -1.0),
        ];

        let model = optimizer
            .train_samples(&samples)
            .expect("Training should succeed");

        assert!(model.n_support_vectors() > 0);
        assert_eq!(model.alpha_values().len(), model.support_vectors().len());

        for sample in &samples {
            let prediction = model.predict(sample);
            assert_eq!(prediction.label, sample.label);
        }
    }

    #[test]
    fn test_trained_svm_decision_function() {
        let optimizer = SVMOptimizer::with_kernel(LinearKernel::new());

        let samples = vec![sample(&[1.0], 1.0), sample(&[-1.0], -1.0)];

        let model = optimizer
            .train_samples(&samples)
            .expect("Training should succeed");

        let decision_positive = model.decision_value(&FeatureVector::new(vec![0.5]));
        let decision_negative = model.decision_value(&FeatureVector::new(vec![-0.5]));

        assert!(decision_positive > 0.0);
        assert!(decision_negative < 0.0);
    }

    #[test]
    fn test_svm_model_trait_implementation() {
        let optimizer = SVMOptimizer::with_kernel(LinearKernel::new());

        let samples = vec![sample(&[1.0, 1.0], 1.0), sample(&[-1.0, -1.0], -1.0)];

        let model = optimizer
            .train_samples(&samples)
            .expect("Training should succeed");

        assert!(model.n_support_vectors() > 0);
        assert_eq!(model.dim(), Some(2));

        let test_samples = vec![sample(&[0.5, 0.5], 1.0), sample(&[-0.5, -0.5], -1.0)];

        let predictions = model.predict_batch(&test_samples);
        assert_eq!(predictions.len(), 2);
        assert_eq!(predictions[0].label, 1.0);
        assert_eq!(predictions[1].label, -1.0);
        for prediction in predictions {
            assert!(prediction.confidence() >= 0.0);
        }
    }

    #[test]
    fn test_support_vector_access() {
        let optimizer = SVMOptimizer::with_kernel(LinearKernel::new());

        let samples = vec![
            sample(&[2.0], 1.0),
            sample(&[-2.0], -1.0),
            sample(&[1.0], 1.0),
        ];

        let model = optimizer
            .train_samples(&samples)
            .expect("Training should succeed");

        let support_vectors = model.support_vectors();
        let alpha_values = model.alpha_values();
        let indices = model.support_vector_indices();

        assert_eq!(support_vectors.len(), alpha_values.len());
        assert_eq!(support_vectors.len(), indices.len());

        for &alpha in alpha_values {
            assert!(alpha > 0.0);
        }
        for &idx in indices {
            assert!(idx < samples.len());
        }
    }

    #[test]
    fn test_from_parts_matches_trained_model() {
        let optimizer = SVMOptimizer::with_kernel(LinearKernel::new());
        let samples = vec![sample(&[2.0, 0.5], 1.0), sample(&[-2.0, -0.5], -1.0)];
        let model = optimizer.train_samples(&samples).unwrap();

        let rebuilt = TrainedSVM::from_parts(
            LinearKernel::new(),
            model.support_vectors().to_vec(),
            model.alpha_values().to_vec(),
            model.bias(),
        )
        .unwrap();

        let query = FeatureVector::new(vec![0.3, -0.2]);
        assert_eq!(model.decision_value(&query), rebuilt.decision_value(&query));
    }

    #[test]
    fn test_from_parts_rejects_mismatched_alpha() {
        let result = TrainedSVM::from_parts(
            LinearKernel::new(),
            vec![sample(&[1.0], 1.0)],
            vec![0.5, 0.5],
            0.0,
        );
        assert!(matches!(result, Err(SVMError::DimensionMismatch { .. })));
    }

    #[test]
    fn test_model_without_support_vectors_uses_bias() {
        let optimizer = SVMOptimizer::with_kernel(LinearKernel::new());
        let samples = vec![sample(&[1.0], -1.0), sample(&[2.0], -1.0)];
        let model = optimizer.train_samples(&samples).unwrap();

        assert_eq!(model.n_support_vectors(), 0);
        assert_eq!(model.dim(), None);
        assert_eq!(model.predict(&sample(&[5.0], 1.0)).label, -1.0);
    }
}
