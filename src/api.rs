//! High-level API for training and using the classifiers
//!
//! This module provides a user-friendly interface over the optimizer, plus
//! [`train_classifier`], the entry point used by the pipeline to fit one
//! kernel variant on a feature table.
//!
//! # Quick Start
//!
//! ```rust
//! use hogsvm::api::SVM;
//! use hogsvm::core::{FeatureVector, Sample};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let samples = vec![
//!     Sample::new(FeatureVector::new(vec![2.0]), 1.0),
//!     Sample::new(FeatureVector::new(vec![-2.0]), -1.0),
//! ];
//!
//! let model = SVM::new()
//!     .with_c(1.0)
//!     .with_epsilon(0.001)
//!     .train_samples(&samples)?;
//!
//! let prediction = model.predict(&FeatureVector::new(vec![1.0]));
//! assert_eq!(prediction.label, 1.0);
//! # Ok(())
//! # }
//! ```

use crate::config::KernelSpec;
use crate::core::{
    to_solver_label, Dataset, FeatureVector, Label, OptimizerConfig, Prediction, Result,
    SVMError, SVMModel, Sample, WorkingSetStrategy,
};
use crate::kernel::{Kernel, KernelFunction, KernelKind, LinearKernel};
use crate::optimizer::{SVMOptimizer, TrainedSVM};
use log::{debug, info, warn};

/// High-level SVM interface with builder pattern
pub struct SVM<K: Kernel = LinearKernel> {
    kernel: K,
    config: OptimizerConfig,
}

impl SVM<LinearKernel> {
    /// Create a new SVM with linear kernel and default parameters
    pub fn new() -> Self {
        Self {
            kernel: LinearKernel::new(),
            config: OptimizerConfig::default(),
        }
    }
}

impl Default for SVM<LinearKernel> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Kernel> SVM<K> {
    /// Create SVM with custom kernel
    pub fn with_kernel(kernel: K) -> Self {
        Self {
            kernel,
            config: OptimizerConfig::default(),
        }
    }

    /// Replace the whole optimizer configuration
    pub fn with_config(mut self, config: OptimizerConfig) -> Self {
        self.config = config;
        self
    }

    /// Set regularization parameter C
    pub fn with_c(mut self, c: f64) -> Self {
        self.config.c = c;
        self
    }

    /// Set convergence tolerance
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.config.epsilon = epsilon;
        self
    }

    /// Set maximum number of iterations
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.config.max_iterations = max_iterations;
        self
    }

    /// Set kernel cache size in bytes
    pub fn with_cache_size(mut self, cache_size: usize) -> Self {
        self.config.cache_size = cache_size;
        self
    }

    /// Enable or disable shrinking
    pub fn with_shrinking(mut self, shrinking: bool) -> Self {
        self.config.shrinking = shrinking;
        self
    }

    /// Set the second-variable selection strategy
    pub fn with_working_set_strategy(mut self, strategy: WorkingSetStrategy) -> Self {
        self.config.working_set_strategy = strategy;
        self
    }

    /// Seed the solver RNG
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.config.seed = seed;
        self
    }

    /// Current optimizer configuration
    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Train on a dataset
    pub fn train<D: Dataset>(self, dataset: &D) -> Result<TrainedModel<K>> {
        let config = self.config.clone();
        let optimizer = SVMOptimizer::new(self.kernel, self.config);
        let model = optimizer.train(dataset)?;
        Ok(TrainedModel { model, config })
    }

    /// Train on samples
    pub fn train_samples(self, samples: &[Sample]) -> Result<TrainedModel<K>> {
        let config = self.config.clone();
        let optimizer = SVMOptimizer::new(self.kernel, self.config);
        let model = optimizer.train_samples(samples)?;
        Ok(TrainedModel { model, config })
    }
}

/// Trained SVM model with high-level prediction interface
pub struct TrainedModel<K: Kernel = KernelFunction> {
    model: TrainedSVM<K>,
    config: OptimizerConfig,
}

impl<K: Kernel> TrainedModel<K> {
    pub(crate) fn from_svm(model: TrainedSVM<K>, config: OptimizerConfig) -> Self {
        Self { model, config }
    }

    /// Optimizer settings the model was trained with, seed included
    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Predict one feature vector (label in {-1, +1})
    pub fn predict(&self, features: &FeatureVector) -> Prediction {
        let decision_value = self.model.decision_value(features);
        let label = if decision_value >= 0.0 { 1.0 } else { -1.0 };
        Prediction::new(label, decision_value)
    }

    /// Predict multiple feature vectors
    pub fn predict_batch(&self, features: &[FeatureVector]) -> Vec<Prediction> {
        features.iter().map(|f| self.predict(f)).collect()
    }

    /// Predict the class label (0 = cat, 1 = dog)
    pub fn predict_label(&self, features: &FeatureVector) -> Label {
        self.predict(features).class_label()
    }

    /// Predict from dataset
    pub fn predict_dataset<D: Dataset>(&self, dataset: &D) -> Vec<Prediction> {
        let samples: Vec<Sample> = (0..dataset.len()).map(|i| dataset.get_sample(i)).collect();
        self.model.predict_batch(&samples)
    }

    /// Evaluate accuracy on a dataset
    pub fn evaluate<D: Dataset>(&self, dataset: &D) -> f64 {
        if dataset.is_empty() {
            return 0.0;
        }
        let predictions = self.predict_dataset(dataset);
        let labels = dataset.get_labels();

        let correct = predictions
            .iter()
            .zip(labels.iter())
            .filter(|(pred, &actual)| pred.label == actual)
            .count();

        correct as f64 / labels.len() as f64
    }

    /// Get model information
    pub fn info(&self) -> ModelInfo {
        ModelInfo {
            n_support_vectors: self.model.n_support_vectors(),
            bias: self.model.bias(),
            support_vector_indices: self.model.support_vector_indices().to_vec(),
            dim: self.model.dim(),
        }
    }

    /// Get the underlying trained model
    pub fn inner(&self) -> &TrainedSVM<K> {
        &self.model
    }
}

impl TrainedModel<KernelFunction> {
    /// Kernel variant this model was trained with
    pub fn kind(&self) -> KernelKind {
        self.model.kernel().kind()
    }
}

/// Model information
#[derive(Debug, Clone)]
pub struct ModelInfo {
    pub n_support_vectors: usize,
    pub bias: f64,
    pub support_vector_indices: Vec<usize>,
    /// Feature dimension, `None` when the model has no support vectors
    pub dim: Option<usize>,
}

/// Fit one kernel variant on a feature table with class labels
///
/// `features[i]` is labelled by `labels[i]` (0 = cat, nonzero = dog). The
/// kernel's data-dependent parameters are resolved against `features` and the
/// solver RNG is seeded from `spec.seed`.
pub fn train_classifier(
    features: &[FeatureVector],
    labels: &[Label],
    spec: &KernelSpec,
    config: &OptimizerConfig,
) -> Result<TrainedModel> {
    if features.len() != labels.len() {
        return Err(SVMError::DimensionMismatch {
            expected: features.len(),
            actual: labels.len(),
        });
    }
    let first = features.first().ok_or(SVMError::EmptyDataset)?;
    let dim = first.len();
    if let Some(bad) = features.iter().find(|f| f.len() != dim) {
        return Err(SVMError::DimensionMismatch {
            expected: dim,
            actual: bad.len(),
        });
    }

    let kernel = spec.kind.resolve(spec.gamma, spec.coef0, features)?;
    match spec.seed {
        Some(seed) => debug!("{} solver seeded with {}", spec.kind, seed),
        None => debug!("{} solver is unseeded", spec.kind),
    }
    if let Some(gamma) = kernel.gamma() {
        debug!("{} kernel gamma = {:.6e}", spec.kind, gamma);
    }

    let samples: Vec<Sample> = features
        .iter()
        .zip(labels.iter())
        .map(|(f, &l)| Sample::new(f.clone(), to_solver_label(l)))
        .collect();

    let positives = samples.iter().filter(|s| s.label > 0.0).count();
    if positives == 0 || positives == samples.len() {
        warn!(
            "Training {} classifier on a single class; it will predict that class everywhere",
            spec.kind
        );
    }

    info!(
        "Training {} classifier on {} samples ({} features)",
        spec.kind,
        samples.len(),
        dim
    );

    let config = OptimizerConfig {
        seed: spec.seed,
        ..config.clone()
    };
    let model = SVM::with_kernel(kernel)
        .with_config(config)
        .train_samples(&samples)?;

    info!(
        "{} classifier: {} support vectors, bias {:.6}",
        spec.kind,
        model.info().n_support_vectors,
        model.info().bias
    );

    Ok(model)
}
