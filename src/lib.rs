//! Cats vs. dogs image classification with HOG descriptors and kernel SVMs
//!
//! Images are read from `root/<class bucket>/<image>` trees, turned into
//! Histogram of Oriented Gradients descriptors and classified by SVMs trained
//! with Sequential Minimal Optimization. Each kernel variant's predictions are
//! reported and exported as a CSV result table.
//!
//! ```no_run
//! use hogsvm::config::PipelineConfig;
//! use hogsvm::pipeline::Pipeline;
//!
//! # fn main() -> hogsvm::Result<()> {
//! let pipeline = Pipeline::new(PipelineConfig::default())?;
//! for run in pipeline.run()? {
//!     println!("{}: {:.4}", run.kind, run.evaluation.accuracy());
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod cache;
pub mod config;
pub mod core;
pub mod data;
pub mod evaluation;
pub mod export;
pub mod features;
pub mod kernel;
pub mod optimizer;
pub mod persistence;
pub mod pipeline;
pub mod solver;

// Re-export main types for convenience
pub use crate::api::{train_classifier, ModelInfo, TrainedModel, SVM};
pub use crate::cache::{CacheStats, KernelCache};
pub use crate::config::{KernelSpec, PipelineConfig};
pub use crate::core::error::*;
pub use crate::core::traits::*;
pub use crate::core::types::*;
pub use crate::data::{load_split, DatasetSplit};
pub use crate::evaluation::{evaluate, ClassificationReport, Evaluation, ResultTable};
pub use crate::features::{FeatureExtractor, HogDescriptor, HogParams};
pub use crate::kernel::{Kernel, KernelFunction, KernelKind};
pub use crate::optimizer::{SVMOptimizer, TrainedSVM};
pub use crate::pipeline::{ModelRun, Pipeline};

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
