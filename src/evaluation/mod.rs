//! Model evaluation on a held-out split

pub mod metrics;
pub mod table;

pub use self::metrics::{ClassMetrics, ClassificationReport, ConfusionMatrix};
pub use self::table::{ResultRow, ResultTable};

use crate::api::TrainedModel;
use crate::core::{Dataset, Label, Result, SVMError};
use crate::data::DatasetSplit;
use crate::kernel::KernelKind;
use log::info;

/// Everything produced by evaluating one classifier
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub kind: KernelKind,
    pub table: ResultTable,
    pub report: ClassificationReport,
}

impl Evaluation {
    pub fn accuracy(&self) -> f64 {
        self.table.accuracy()
    }

    /// Dump the result table and metrics to stdout
    pub fn print(&self) {
        println!("=== {} kernel ===", self.kind);
        print!("{}", self.table);
        println!();
        println!("Accuracy: {:.4}", self.accuracy());
        println!();
        print!("{}", self.report);
        println!();
    }
}

/// Predict every sample of `split` and compare against its labels
pub fn evaluate(model: &TrainedModel, split: &DatasetSplit) -> Result<Evaluation> {
    if let Some(dim) = model.info().dim {
        if !split.is_empty() && split.dim() != dim {
            return Err(SVMError::DimensionMismatch {
                expected: dim,
                actual: split.dim(),
            });
        }
    }

    let predictions: Vec<Label> = split
        .features()
        .iter()
        .map(|features| model.predict_label(features))
        .collect();

    let table = ResultTable::from_predictions(split.filenames(), &predictions, split.labels())?;
    let report = ClassificationReport::from_labels(split.labels(), &predictions);

    info!(
        "{} kernel: {}/{} correct (accuracy {:.4})",
        model.kind(),
        table.n_correct(),
        table.len(),
        table.accuracy()
    );

    Ok(Evaluation {
        kind: model.kind(),
        table,
        report,
    })
}
