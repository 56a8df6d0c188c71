//! Pipeline configuration
//!
//! Every option has a default, so a JSON config file only needs the keys it
//! changes:
//!
//! ```json
//! {
//!   "train_dir": "data/train",
//!   "test_dir": "data/test",
//!   "kernels": [{ "kind": "linear" }, { "kind": "rbf", "seed": 42 }]
//! }
//! ```

use crate::core::{OptimizerConfig, Result, SVMError};
use crate::features::HogParams;
use crate::kernel::{Gamma, KernelKind};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Seed of the RBF variant in the default kernel list
pub const DEFAULT_RBF_SEED: u64 = 42;

/// One classifier variant to train
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KernelSpec {
    pub kind: KernelKind,
    /// Solver RNG seed; unseeded variants draw from entropy
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub gamma: Gamma,
    #[serde(default)]
    pub coef0: f64,
}

impl KernelSpec {
    pub fn new(kind: KernelKind) -> Self {
        Self {
            kind,
            seed: None,
            gamma: Gamma::default(),
            coef0: 0.0,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_gamma(mut self, gamma: Gamma) -> Self {
        self.gamma = gamma;
        self
    }

    /// Check the kernel parameters before any variant is trained
    pub fn validate(&self) -> Result<()> {
        if !self.kind.is_parameterized() {
            return Ok(());
        }
        self.gamma
            .validate()
            .map_err(|e| SVMError::InvalidParameter(format!("{} kernel: {e}", self.kind)))?;
        if !self.coef0.is_finite() {
            return Err(SVMError::InvalidParameter(format!(
                "{} kernel: coef0 must be finite, got: {}",
                self.kind, self.coef0
            )));
        }
        Ok(())
    }

    /// Linear and sigmoid unseeded, RBF seeded with [`DEFAULT_RBF_SEED`]
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new(KernelKind::Linear),
            Self::new(KernelKind::RadialBasis).with_seed(DEFAULT_RBF_SEED),
            Self::new(KernelKind::Sigmoid),
        ]
    }
}

/// Everything a pipeline run needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Side of the square images are resized to
    pub image_size: u32,
    pub hog_orientations: usize,
    pub hog_pixels_per_cell: usize,
    pub hog_cells_per_block: usize,
    /// Classifier variants, trained and exported in this order
    pub kernels: Vec<KernelSpec>,
    pub train_dir: PathBuf,
    pub test_dir: PathBuf,
    /// Results go to `<output_prefix>_<kernel>.csv`
    pub output_prefix: String,
    pub c: f64,
    pub epsilon: f64,
    pub max_iterations: usize,
    /// Extract features on the rayon thread pool
    pub parallel: bool,
    /// Print each result table and report to stdout
    pub print_reports: bool,
    /// Also write `<output_prefix>_<kernel>.json` models
    pub save_models: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let hog = HogParams::default();
        let optimizer = OptimizerConfig::default();
        Self {
            image_size: hog.image_size,
            hog_orientations: hog.orientations,
            hog_pixels_per_cell: hog.pixels_per_cell,
            hog_cells_per_block: hog.cells_per_block,
            kernels: KernelSpec::defaults(),
            train_dir: PathBuf::from("data/train"),
            test_dir: PathBuf::from("data/test"),
            output_prefix: "results".to_string(),
            c: optimizer.c,
            epsilon: optimizer.epsilon,
            max_iterations: optimizer.max_iterations,
            parallel: true,
            print_reports: true,
            save_models: false,
        }
    }
}

impl PipelineConfig {
    /// Load and validate a JSON config file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SVMError::NotFound(path.to_path_buf()));
        }
        let reader = BufReader::new(File::open(path)?);
        let config: Self = serde_json::from_reader(reader)
            .map_err(|e| SVMError::SerializationError(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Write the config as pretty JSON
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, self)
            .map_err(|e| SVMError::SerializationError(e.to_string()))
    }

    pub fn hog_params(&self) -> HogParams {
        HogParams {
            image_size: self.image_size,
            orientations: self.hog_orientations,
            pixels_per_cell: self.hog_pixels_per_cell,
            cells_per_block: self.hog_cells_per_block,
        }
    }

    pub fn optimizer_config(&self) -> OptimizerConfig {
        OptimizerConfig {
            c: self.c,
            epsilon: self.epsilon,
            max_iterations: self.max_iterations,
            ..OptimizerConfig::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.hog_params().validate()?;

        if self.kernels.is_empty() {
            return Err(SVMError::InvalidParameter(
                "At least one kernel must be configured".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        for spec in &self.kernels {
            spec.validate()?;
            if !seen.insert(spec.kind) {
                return Err(SVMError::InvalidParameter(format!(
                    "Kernel '{}' is listed twice; both runs would write {}",
                    spec.kind,
                    self.output_path(spec.kind).display()
                )));
            }
        }

        if !(self.c > 0.0) {
            return Err(SVMError::InvalidParameter(format!(
                "C must be positive, got: {}",
                self.c
            )));
        }
        if !(self.epsilon > 0.0) {
            return Err(SVMError::InvalidParameter(format!(
                "Epsilon must be positive, got: {}",
                self.epsilon
            )));
        }
        if self.max_iterations == 0 {
            return Err(SVMError::InvalidParameter(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        if self.output_prefix.is_empty() {
            return Err(SVMError::InvalidParameter(
                "output_prefix must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// `<output_prefix>_<kernel>.csv`
    pub fn output_path(&self, kind: KernelKind) -> PathBuf {
        PathBuf::from(format!("{}_{}.csv", self.output_prefix, kind))
    }

    /// `<output_prefix>_<kernel>.json`
    pub fn model_path(&self, kind: KernelKind) -> PathBuf {
        PathBuf::from(format!("{}_{}.json", self.output_prefix, kind))
    }
}
