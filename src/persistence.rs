//! Model serialization and persistence
//!
//! Trained classifiers are stored as pretty-printed JSON so a run can be
//! evaluated again later (CLI `train` / `evaluate` / `info`).

use crate::api::TrainedModel;
use crate::core::{FeatureVector, OptimizerConfig, Result, SVMError, Sample};
use crate::features::HogParams;
use crate::kernel::{KernelFunction, KernelKind, LinearKernel, RBFKernel, SigmoidKernel};
use crate::optimizer::TrainedSVM;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Serializable representation of a trained SVM model
#[derive(Debug, Serialize, Deserialize)]
pub struct SerializableModel {
    /// Support vectors
    pub support_vectors: Vec<SerializableSample>,
    /// Alpha values times labels (alpha_i * y_i)
    pub alpha_y: Vec<f64>,
    /// Bias term
    pub bias: f64,
    /// Kernel variant
    pub kernel: KernelKind,
    /// Resolved gamma for the RBF and sigmoid kernels
    pub gamma: Option<f64>,
    /// Sigmoid offset
    pub coef0: Option<f64>,
    /// Model metadata
    pub metadata: ModelMetadata,
}

/// Serializable sample representation
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SerializableSample {
    /// Feature values
    pub values: Vec<f64>,
    /// Sample label (-1 or +1)
    pub label: f64,
}

/// Model metadata for tracking and validation
#[derive(Debug, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Library version used to create the model
    pub library_version: String,
    /// Number of support vectors
    pub n_support_vectors: usize,
    /// Descriptor length the model expects
    pub n_features: Option<usize>,
    /// Training parameters used
    pub training_params: TrainingParams,
    /// Descriptor geometry of the training images
    #[serde(default)]
    pub hog_params: Option<HogParams>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Training parameters for reference
#[derive(Debug, Serialize, Deserialize)]
pub struct TrainingParams {
    pub c: f64,
    pub epsilon: f64,
    pub max_iterations: usize,
    pub seed: Option<u64>,
}

impl From<&Sample> for SerializableSample {
    fn from(sample: &Sample) -> Self {
        Self {
            values: sample.features.as_slice().to_vec(),
            label: sample.label,
        }
    }
}

impl From<&SerializableSample> for Sample {
    fn from(s: &SerializableSample) -> Self {
        Sample::new(FeatureVector::new(s.values.clone()), s.label)
    }
}

impl SerializableModel {
    /// Create a serializable model from a trained model
    pub fn from_trained_model(model: &TrainedModel) -> Self {
        let info = model.info();
        let config = model.config();
        let inner = model.inner();
        let kernel = inner.kernel();

        let support_vectors: Vec<SerializableSample> = inner
            .support_vectors()
            .iter()
            .map(SerializableSample::from)
            .collect();

        let alpha_y: Vec<f64> = inner
            .alpha_values()
            .iter()
            .zip(inner.support_vectors().iter())
            .map(|(&alpha, sample)| alpha * sample.label)
            .collect();

        Self {
            support_vectors,
            alpha_y,
            bias: info.bias,
            kernel: kernel.kind(),
            gamma: kernel.gamma(),
            coef0: kernel.coef0(),
            metadata: ModelMetadata {
                library_version: crate::VERSION.to_string(),
                n_support_vectors: info.n_support_vectors,
                n_features: info.dim,
                training_params: TrainingParams {
                    c: config.c,
                    epsilon: config.epsilon,
                    max_iterations: config.max_iterations,
                    seed: config.seed,
                },
                hog_params: None,
                created_at: Utc::now(),
            },
        }
    }

    /// Record the descriptor geometry the model was trained on
    pub fn with_hog_params(mut self, params: HogParams) -> Self {
        self.metadata.hog_params = Some(params);
        self
    }

    /// Save model to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path).map_err(SVMError::IoError)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)
            .map_err(|e| SVMError::SerializationError(e.to_string()))?;
        Ok(())
    }

    /// Load model from file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SVMError::NotFound(path.to_path_buf()));
        }
        let file = File::open(path).map_err(SVMError::IoError)?;
        let reader = BufReader::new(file);
        let model = serde_json::from_reader(reader)
            .map_err(|e| SVMError::SerializationError(e.to_string()))?;
        Ok(model)
    }

    /// Convert back to a trained model
    pub fn to_trained_model(&self) -> Result<TrainedModel> {
        let kernel = match self.kernel {
            KernelKind::Linear => KernelFunction::Linear(LinearKernel::new()),
            KernelKind::RadialBasis => {
                KernelFunction::RadialBasis(RBFKernel::new(self.stored_gamma()?))
            }
            KernelKind::Sigmoid => KernelFunction::Sigmoid(SigmoidKernel::new(
                self.stored_gamma()?,
                self.coef0.unwrap_or(0.0),
            )),
        };

        // Support vectors keep their labels; only the magnitude of alpha_y is needed
        let support_vectors: Vec<Sample> = self.support_vectors.iter().map(Sample::from).collect();
        let alpha: Vec<f64> = self.alpha_y.iter().map(|a| a.abs()).collect();

        let params = &self.metadata.training_params;
        let config = OptimizerConfig {
            c: params.c,
            epsilon: params.epsilon,
            max_iterations: params.max_iterations,
            seed: params.seed,
            ..OptimizerConfig::default()
        };

        let svm = TrainedSVM::from_parts(kernel, support_vectors, alpha, self.bias)?;
        Ok(TrainedModel::from_svm(svm, config))
    }

    fn stored_gamma(&self) -> Result<f64> {
        match self.gamma {
            Some(gamma) if gamma > 0.0 && gamma.is_finite() => Ok(gamma),
            other => Err(SVMError::InvalidParameter(format!(
                "{} model needs a positive gamma, found {:?}",
                self.kernel, other
            ))),
        }
    }

    /// Print model summary
    pub fn print_summary(&self) {
        println!("=== SVM Model Summary ===");
        println!("Kernel Type: {}", self.kernel);
        if let Some(gamma) = self.gamma {
            println!("Gamma: {gamma:.6e}");
        }
        if let Some(coef0) = self.coef0 {
            println!("Coef0: {coef0}");
        }
        println!("Support Vectors: {}", self.metadata.n_support_vectors);
        if let Some(n_features) = self.metadata.n_features {
            println!("Features: {n_features}");
        }
        println!("Bias: {:.6}", self.bias);
        if let Some(hog) = &self.metadata.hog_params {
            println!(
                "HOG: {}x{} image, {} orientations, {} px cells, {} cell blocks",
                hog.image_size,
                hog.image_size,
                hog.orientations,
                hog.pixels_per_cell,
                hog.cells_per_block
            );
        }
        println!("Library Version: {}", self.metadata.library_version);
        println!("Created: {}", self.metadata.created_at.to_rfc3339());
        println!("Training Parameters:");
        println!("  C: {}", self.metadata.training_params.c);
        println!("  Epsilon: {}", self.metadata.training_params.epsilon);
        println!(
            "  Max Iterations: {}",
            self.metadata.training_params.max_iterations
        );
        match self.metadata.training_params.seed {
            Some(seed) => println!("  Seed: {seed}"),
            None => println!("  Seed: none"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::train_classifier;
    use crate::config::KernelSpec;
    use crate::core::{CAT, DOG};
    use tempfile::NamedTempFile;

    fn training_table() -> (Vec<FeatureVector>, Vec<i32>) {
        (
            vec![
                FeatureVector::new(vec![0.1, 0.9]),
                FeatureVector::new(vec![0.2, 0.7]),
                FeatureVector::new(vec![0.9, 0.2]),
                FeatureVector::new(vec![0.8, 0.1]),
            ],
            vec![CAT, CAT, DOG, DOG],
        )
    }

    #[test]
    fn test_serializable_sample_conversion() {
        let sample = Sample::new(FeatureVector::new(vec![1.0, 2.0, 3.0]), 1.0);

        let serializable = SerializableSample::from(&sample);
        assert_eq!(serializable.values, vec![1.0, 2.0, 3.0]);
        assert_eq!(serializable.label, 1.0);

        let converted_back = Sample::from(&serializable);
        assert_eq!(converted_back.features, sample.features);
        assert_eq!(converted_back.label, sample.label);
    }

    #[test]
    fn test_model_round_trip_all_kernels() -> Result<()> {
        let (features, labels) = training_table();
        let config = OptimizerConfig::default();
        let queries = [
            FeatureVector::new(vec![0.15, 0.8]),
            FeatureVector::new(vec![0.85, 0.15]),
            FeatureVector::new(vec![0.5, 0.5]),
        ];

        for kind in KernelKind::ALL {
            let spec = KernelSpec::new(kind).with_seed(1);
            let model = train_classifier(&features, &labels, &spec, &config)?;
            let serializable = SerializableModel::from_trained_model(&model)
                .with_hog_params(HogParams::default());

            let temp_file = NamedTempFile::new().expect("Failed to create temp file");
            serializable.save_to_file(temp_file.path())?;
            let loaded = SerializableModel::load_from_file(temp_file.path())?;

            assert_eq!(loaded.kernel, kind);
            assert_eq!(loaded.metadata.training_params.seed, Some(1));
            assert_eq!(loaded.metadata.n_features, Some(2));
            assert_eq!(loaded.metadata.hog_params, Some(HogParams::default()));

            let restored = loaded.to_trained_model()?;
            assert_eq!(restored.kind(), kind);
            assert_eq!(restored.config().seed, Some(1));
            assert_eq!(restored.config().c, config.c);
            for query in &queries {
                let before = model.predict(query).decision_value;
                let after = restored.predict(query).decision_value;
                assert!((before - after).abs() < 1e-12, "{kind}: {before} vs {after}");
            }
        }

        Ok(())
    }

    #[test]
    fn test_missing_gamma_rejected() {
        let model = SerializableModel {
            support_vectors: vec![],
            alpha_y: vec![],
            bias: 0.0,
            kernel: KernelKind::RadialBasis,
            gamma: None,
            coef0: None,
            metadata: ModelMetadata {
                library_version: "0".to_string(),
                n_support_vectors: 0,
                n_features: None,
                training_params: TrainingParams {
                    c: 1.0,
                    epsilon: 0.001,
                    max_iterations: 1,
                    seed: None,
                },
                hog_params: None,
                created_at: Utc::now(),
            },
        };

        assert!(matches!(
            model.to_trained_model(),
            Err(SVMError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let result = SerializableModel::load_from_file("/definitely/not/here.json");
        assert!(matches!(result, Err(SVMError::NotFound(_))));
    }
}
