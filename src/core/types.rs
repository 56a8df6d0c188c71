//! Core type definitions for the classifier

use serde::{Deserialize, Serialize};

/// Class label as produced by the dataset loader: 0 is "cat", anything else is "dog"
pub type Label = i32;

/// Class label for the "cat" bucket
pub const CAT: Label = 0;

/// Class label for the "dog" bucket
pub const DOG: Label = 1;

/// Convert a class label into the solver's -1/+1 label space
pub fn to_solver_label(label: Label) -> f64 {
    if label == CAT {
        -1.0
    } else {
        1.0
    }
}

/// Convert a solver-space label back to a class label
pub fn from_solver_label(label: f64) -> Label {
    if label > 0.0 {
        DOG
    } else {
        CAT
    }
}

/// Prediction result containing label and decision value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    /// Predicted class label (+1 or -1)
    pub label: f64,
    /// Raw decision function value
    pub decision_value: f64,
}

impl Prediction {
    /// Create a new prediction
    pub fn new(label: f64, decision_value: f64) -> Self {
        Self {
            label,
            decision_value,
        }
    }

    /// Get confidence as absolute value of decision value
    pub fn confidence(&self) -> f64 {
        self.decision_value.abs()
    }

    /// Predicted label in class space (0 = cat, 1 = dog)
    pub fn class_label(&self) -> Label {
        from_solver_label(self.label)
    }
}

/// Dense feature vector, one per image
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureVector {
    values: Vec<f64>,
}

impl FeatureVector {
    /// Wrap raw descriptor values
    pub fn new(values: Vec<f64>) -> Self {
        Self { values }
    }

    /// Vector of `len` zeros
    pub fn zeros(len: usize) -> Self {
        Self {
            values: vec![0.0; len],
        }
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    /// Number of components
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Dot product; the shorter vector is implicitly zero-padded
    pub fn dot(&self, other: &FeatureVector) -> f64 {
        self.values
            .iter()
            .zip(other.values.iter())
            .map(|(a, b)| a * b)
            .sum()
    }

    /// Squared Euclidean distance ||x - y||²
    pub fn squared_distance(&self, other: &FeatureVector) -> f64 {
        let (long, short) = if self.len() >= other.len() {
            (&self.values, &other.values)
        } else {
            (&other.values, &self.values)
        };

        let overlap: f64 = short
            .iter()
            .zip(long.iter())
            .map(|(a, b)| (a - b) * (a - b))
            .sum();
        let tail: f64 = long[short.len()..].iter().map(|v| v * v).sum();

        overlap + tail
    }

    /// Compute squared L2 norm
    pub fn norm_squared(&self) -> f64 {
        self.values.iter().map(|&v| v * v).sum()
    }

    /// Compute L2 norm
    pub fn norm(&self) -> f64 {
        self.norm_squared().sqrt()
    }
}

impl From<Vec<f64>> for FeatureVector {
    fn from(values: Vec<f64>) -> Self {
        Self::new(values)
    }
}

/// Training sample with features and label
#[derive(Clone, Debug)]
pub struct Sample {
    /// Feature vector
    pub features: FeatureVector,
    /// Class label (+1 or -1 for binary classification)
    pub label: f64,
}

impl Sample {
    /// Create a new sample
    pub fn new(features: FeatureVector, label: f64) -> Self {
        Self { features, label }
    }
}

/// Result of optimization process
#[derive(Debug, Clone)]
pub struct OptimizationResult {
    /// Lagrange multipliers (alpha values)
    pub alpha: Vec<f64>,
    /// Bias term (b)
    pub b: f64,
    /// Indices of support vectors (where alpha > 0)
    pub support_vectors: Vec<usize>,
    /// Number of passes over the working set
    pub iterations: usize,
    /// Final objective value
    pub objective_value: f64,
}

/// Strategy used by SMO to pick the second multiplier of a pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorkingSetStrategy {
    /// Maximum |E_i - E_j|
    #[default]
    SMOHeuristic,
    /// Maximum KKT violation
    SteepestDescent,
    /// Uniform draw from the active set
    Random,
}

/// Configuration for optimizer
#[derive(Debug, Clone)]
pub struct OptimizerConfig {
    /// Regularization parameter (upper bound for alpha)
    pub c: f64,
    /// Tolerance for KKT conditions
    pub epsilon: f64,
    /// Maximum number of passes
    pub max_iterations: usize,
    /// Kernel cache size in bytes
    pub cache_size: usize,
    /// Enable shrinking heuristic
    pub shrinking: bool,
    /// Number of passes between shrinking (h in the paper)
    pub shrinking_iterations: usize,
    /// How the second multiplier is chosen
    pub working_set_strategy: WorkingSetStrategy,
    /// Seed for the solver RNG; `None` draws from entropy
    pub seed: Option<u64>,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            c: 1.0,
            epsilon: 0.001,
            max_iterations: 10000,
            cache_size: 100_000_000, // 100MB
            shrinking: true,
            shrinking_iterations: 100,
            working_set_strategy: WorkingSetStrategy::SMOHeuristic,
            seed: None,
        }
    }
}
