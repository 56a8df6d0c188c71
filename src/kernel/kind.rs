//! Kernel selection
//!
//! The pipeline trains one classifier per [`KernelKind`]. The concrete kernel
//! is resolved against the training table so that data-dependent parameters
//! such as `gamma = "scale"` can be computed.

use crate::core::{FeatureVector, Result, SVMError};
use crate::kernel::{Kernel, LinearKernel, RBFKernel, SigmoidKernel};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which kernel function a classifier variant uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KernelKind {
    #[serde(rename = "linear")]
    Linear,
    #[serde(rename = "rbf")]
    RadialBasis,
    #[serde(rename = "sigmoid")]
    Sigmoid,
}

impl KernelKind {
    /// All variants in their canonical order
    pub const ALL: [KernelKind; 3] = [
        KernelKind::Linear,
        KernelKind::RadialBasis,
        KernelKind::Sigmoid,
    ];

    /// Short identifier used in file names and on the command line
    pub fn as_str(&self) -> &'static str {
        match self {
            KernelKind::Linear => "linear",
            KernelKind::RadialBasis => "rbf",
            KernelKind::Sigmoid => "sigmoid",
        }
    }

    /// Whether the kernel reads `gamma` and `coef0`
    pub fn is_parameterized(&self) -> bool {
        !matches!(self, KernelKind::Linear)
    }

    /// Build the concrete kernel for this variant
    pub fn resolve(
        &self,
        gamma: Gamma,
        coef0: f64,
        training_features: &[FeatureVector],
    ) -> Result<KernelFunction> {
        match self {
            KernelKind::Linear => Ok(KernelFunction::Linear(LinearKernel::new())),
            KernelKind::RadialBasis => {
                let gamma = gamma.resolve(training_features)?;
                Ok(KernelFunction::RadialBasis(RBFKernel::new(gamma)))
            }
            KernelKind::Sigmoid => {
                let gamma = gamma.resolve(training_features)?;
                Ok(KernelFunction::Sigmoid(SigmoidKernel::new(gamma, coef0)))
            }
        }
    }
}

impl fmt::Display for KernelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KernelKind {
    type Err = SVMError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "linear" => Ok(KernelKind::Linear),
            "rbf" | "radial-basis" | "radial_basis" => Ok(KernelKind::RadialBasis),
            "sigmoid" | "tanh" => Ok(KernelKind::Sigmoid),
            other => Err(SVMError::InvalidParameter(format!(
                "Unknown kernel '{other}'. Use 'linear', 'rbf' or 'sigmoid'"
            ))),
        }
    }
}

/// Kernel coefficient for the RBF and sigmoid kernels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gamma {
    /// `1 / (n_features * X.var())`
    #[default]
    Scale,
    /// `1 / n_features`
    Auto,
    /// Fixed value
    Value(f64),
}

impl Gamma {
    /// Reject fixed values that can never resolve to a usable gamma
    pub fn validate(&self) -> Result<()> {
        match *self {
            Gamma::Value(value) if !(value > 0.0 && value.is_finite()) => {
                Err(SVMError::InvalidParameter(format!(
                    "Gamma must be positive and finite, got: {value}"
                )))
            }
            _ => Ok(()),
        }
    }

    /// Compute the numeric gamma for a training table
    pub fn resolve(&self, training_features: &[FeatureVector]) -> Result<f64> {
        let n_features = training_features.first().map(|f| f.len()).unwrap_or(0);

        let gamma = match *self {
            Gamma::Value(value) => value,
            Gamma::Auto | Gamma::Scale if n_features == 0 => {
                return Err(SVMError::EmptyDataset);
            }
            Gamma::Auto => 1.0 / n_features as f64,
            Gamma::Scale => {
                let variance = element_variance(training_features);
                if variance > 0.0 {
                    1.0 / (n_features as f64 * variance)
                } else {
                    1.0
                }
            }
        };

        if !(gamma > 0.0 && gamma.is_finite()) {
            return Err(SVMError::InvalidParameter(format!(
                "Gamma must be positive and finite, got: {gamma}"
            )));
        }
        Ok(gamma)
    }
}

/// Population variance over every element of the table
fn element_variance(features: &[FeatureVector]) -> f64 {
    let count: usize = features.iter().map(|f| f.len()).sum();
    if count == 0 {
        return 0.0;
    }

    let mean = features
        .iter()
        .flat_map(|f| f.as_slice())
        .sum::<f64>()
        / count as f64;

    features
        .iter()
        .flat_map(|f| f.as_slice())
        .map(|v| (v - mean) * (v - mean))
        .sum::<f64>()
        / count as f64
}

/// A resolved kernel, dispatching to the concrete implementation
#[derive(Debug, Clone, Copy)]
pub enum KernelFunction {
    Linear(LinearKernel),
    RadialBasis(RBFKernel),
    Sigmoid(SigmoidKernel),
}

impl KernelFunction {
    pub fn kind(&self) -> KernelKind {
        match self {
            KernelFunction::Linear(_) => KernelKind::Linear,
            KernelFunction::RadialBasis(_) => KernelKind::RadialBasis,
            KernelFunction::Sigmoid(_) => KernelKind::Sigmoid,
        }
    }

    /// Gamma of the kernel, if it has one
    pub fn gamma(&self) -> Option<f64> {
        match self {
            KernelFunction::Linear(_) => None,
            KernelFunction::RadialBasis(k) => Some(k.gamma()),
            KernelFunction::Sigmoid(k) => Some(k.gamma),
        }
    }

    /// Offset of the sigmoid kernel, if any
    pub fn coef0(&self) -> Option<f64> {
        match self {
            KernelFunction::Sigmoid(k) => Some(k.coef0),
            _ => None,
        }
    }
}

impl Kernel for KernelFunction {
    fn compute(&self, x: &FeatureVector, y: &FeatureVector) -> f64 {
        match self {
            KernelFunction::Linear(k) => k.compute(x, y),
            KernelFunction::RadialBasis(k) => k.compute(x, y),
            KernelFunction::Sigmoid(k) => k.compute(x, y),
        }
    }

    fn compute_with_norms(
        &self,
        x: &FeatureVector,
        y: &FeatureVector,
        x_norm_sq: f64,
        y_norm_sq: f64,
    ) -> f64 {
        match self {
            KernelFunction::RadialBasis(k) => k.compute_with_norms(x, y, x_norm_sq, y_norm_sq),
            other => other.compute(x, y),
        }
    }
}
