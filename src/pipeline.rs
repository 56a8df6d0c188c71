//! End-to-end run: load → describe → fit → predict → report → export
//!
//! Both splits are loaded once and shared by every configured kernel
//! variant. Variants run in configuration order and the first error stops the
//! run, so no result file is written for variants after a failure.

use crate::api::train_classifier;
use crate::config::PipelineConfig;
use crate::core::{Dataset, Result};
use crate::data::{load_split, DatasetSplit, LabelStrategy, SubstringLabel};
use crate::evaluation::{evaluate, Evaluation};
use crate::export::write_result_table;
use crate::features::{FeatureExtractor, HogDescriptor};
use crate::kernel::KernelKind;
use crate::persistence::SerializableModel;
use log::{info, warn};
use std::path::{Path, PathBuf};

/// Outcome of one kernel variant
#[derive(Debug, Clone)]
pub struct ModelRun {
    pub kind: KernelKind,
    pub evaluation: Evaluation,
    /// Exported result table
    pub output_path: PathBuf,
    /// Saved model, when `save_models` is on
    pub model_path: Option<PathBuf>,
}

/// Pipeline context: configuration plus the extractor and label rule
pub struct Pipeline {
    config: PipelineConfig,
    extractor: Box<dyn FeatureExtractor>,
    label_strategy: Box<dyn LabelStrategy>,
}

impl Pipeline {
    /// Validate the configuration and build the HOG extractor it describes
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        let extractor = HogDescriptor::new(config.hog_params())?;
        Ok(Self {
            config,
            extractor: Box::new(extractor),
            label_strategy: Box::new(SubstringLabel::default()),
        })
    }

    /// Replace the feature extractor
    pub fn with_extractor<E: FeatureExtractor + 'static>(mut self, extractor: E) -> Self {
        self.extractor = Box::new(extractor);
        self
    }

    /// Replace the bucket-name → label rule
    pub fn with_label_strategy<L: LabelStrategy + 'static>(mut self, strategy: L) -> Self {
        self.label_strategy = Box::new(strategy);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Load a single split with this pipeline's extractor and label rule
    pub fn load_split(&self, root: &Path) -> Result<DatasetSplit> {
        load_split(
            root,
            self.extractor.as_ref(),
            self.label_strategy.as_ref(),
            self.config.parallel,
        )
    }

    /// Load the train and test splits
    pub fn load(&self) -> Result<(DatasetSplit, DatasetSplit)> {
        let train = self.load_split(&self.config.train_dir)?;
        let test = self.load_split(&self.config.test_dir)?;
        Ok((train, test))
    }

    /// Load both splits and run every configured variant
    pub fn run(&self) -> Result<Vec<ModelRun>> {
        let (train, test) = self.load()?;
        self.run_on(&train, &test)
    }

    /// Run every configured variant on already loaded splits
    pub fn run_on(&self, train: &DatasetSplit, test: &DatasetSplit) -> Result<Vec<ModelRun>> {
        let optimizer_config = self.config.optimizer_config();
        let mut runs = Vec::with_capacity(self.config.kernels.len());

        let unseeded: Vec<String> = self
            .config
            .kernels
            .iter()
            .filter(|spec| spec.seed.is_none())
            .map(|spec| spec.kind.to_string())
            .collect();
        if !unseeded.is_empty() && unseeded.len() < self.config.kernels.len() {
            info!(
                "Only some variants are seeded; unseeded: {}",
                unseeded.join(", ")
            );
        }
        if test.is_empty() {
            warn!("Test split is empty; accuracies will be reported as 0");
        }

        for spec in &self.config.kernels {
            let model = train_classifier(train.features(), train.labels(), spec, &optimizer_config)?;
            let evaluation = evaluate(&model, test)?;

            if self.config.print_reports {
                evaluation.print();
            }

            let output_path = self.config.output_path(spec.kind);
            let comment = format!(
                "{} kernel SVM on HOG features: {} of {} test images correct (accuracy {:.4})",
                spec.kind,
                evaluation.table.n_correct(),
                evaluation.table.len(),
                evaluation.accuracy()
            );
            write_result_table(&evaluation.table, &output_path, &comment)?;

            let model_path = if self.config.save_models {
                let path = self.config.model_path(spec.kind);
                SerializableModel::from_trained_model(&model)
                    .with_hog_params(self.config.hog_params())
                    .save_to_file(&path)?;
                info!("Saved {} model to {}", spec.kind, path.display());
                Some(path)
            } else {
                None
            };

            runs.push(ModelRun {
                kind: spec.kind,
                evaluation,
                output_path,
                model_path,
            });
        }

        Ok(runs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::KernelSpec;
    use crate::core::{FeatureVector, SVMError, CAT, DOG};
    use crate::kernel::Gamma;
    use tempfile::TempDir;

    fn split(rows: &[(&str, [f64; 2], i32)]) -> DatasetSplit {
        DatasetSplit::new(
            rows.iter().map(|r| FeatureVector::new(r.1.to_vec())).collect(),
            rows.iter().map(|r| r.2).collect(),
            rows.iter().map(|r| r.0.to_string()).collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = PipelineConfig {
            kernels: vec![],
            ..PipelineConfig::default()
        };
        assert!(matches!(
            Pipeline::new(config),
            Err(SVMError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_run_on_writes_one_file_per_kernel() {
        let dir = TempDir::new().unwrap();
        let config = PipelineConfig {
            output_prefix: dir.path().join("res").to_string_lossy().into_owned(),
            print_reports: false,
            save_models: true,
            kernels: vec![
                KernelSpec::new(KernelKind::Linear),
                KernelSpec::new(KernelKind::RadialBasis).with_seed(42),
            ],
            ..PipelineConfig::default()
        };
        let pipeline = Pipeline::new(config).unwrap();

        let train = split(&[
            ("c1", [-2.0, -1.0], CAT),
            ("c2", [-1.5, -1.0], CAT),
            ("d1", [2.0, 1.0], DOG),
            ("d2", [1.5, 1.0], DOG),
        ]);
        let test = split(&[("c3", [-1.8, -0.9], CAT), ("d3", [1.8, 0.9], DOG)]);

        let runs = pipeline.run_on(&train, &test).unwrap();

        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].kind, KernelKind::Linear);
        assert_eq!(runs[0].evaluation.accuracy(), 1.0);
        assert_eq!(runs[1].output_path, dir.path().join("res_rbf.csv"));
        for run in &runs {
            assert!(run.output_path.exists());
            assert!(run.model_path.as_ref().unwrap().exists());
        }

        let saved = SerializableModel::load_from_file(runs[1].model_path.as_ref().unwrap())
            .unwrap();
        assert_eq!(saved.metadata.training_params.seed, Some(42));
        let saved = SerializableModel::load_from_file(runs[0].model_path.as_ref().unwrap())
            .unwrap();
        assert_eq!(saved.metadata.training_params.seed, None);
    }

    #[test]
    fn test_failure_stops_later_variants() {
        let dir = TempDir::new().unwrap();
        let prefix = dir.path().join("res");
        let config = PipelineConfig {
            output_prefix: prefix.to_string_lossy().into_owned(),
            print_reports: false,
            ..PipelineConfig::default()
        };
        // A directory where the rbf table should go makes its export fail
        std::fs::create_dir(dir.path().join("res_rbf.csv")).unwrap();
        let pipeline = Pipeline::new(config).unwrap();

        let train = split(&[
            ("c1", [-2.0, -1.0], CAT),
            ("c2", [-1.5, -1.0], CAT),
            ("d1", [2.0, 1.0], DOG),
            ("d2", [1.5, 1.0], DOG),
        ]);
        let test = split(&[("c3", [-1.8, -0.9], CAT), ("d3", [1.8, 0.9], DOG)]);

        let result = pipeline.run_on(&train, &test);
        assert!(matches!(result, Err(SVMError::IoError(_))));
        assert!(dir.path().join("res_linear.csv").is_file());
        assert!(!dir.path().join("res_rbf.csv").is_file());
        assert!(!dir.path().join("res_sigmoid.csv").exists());
    }

    #[test]
    fn test_bad_kernel_rejected_before_any_export() {
        let dir = TempDir::new().unwrap();
        let config = PipelineConfig {
            output_prefix: dir.path().join("res").to_string_lossy().into_owned(),
            kernels: vec![
                KernelSpec::new(KernelKind::Linear),
                KernelSpec::new(KernelKind::RadialBasis).with_gamma(Gamma::Value(-1.0)),
                KernelSpec::new(KernelKind::Sigmoid),
            ],
            ..PipelineConfig::default()
        };

        assert!(matches!(
            Pipeline::new(config),
            Err(SVMError::InvalidParameter(_))
        ));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_missing_train_dir() {
        let dir = TempDir::new().unwrap();
        let config = PipelineConfig {
            train_dir: dir.path().join("train"),
            test_dir: dir.path().join("test"),
            ..PipelineConfig::default()
        };
        let pipeline = Pipeline::new(config).unwrap();
        assert!(matches!(pipeline.run(), Err(SVMError::NotFound(_))));
    }
}
