//! Per-sample prediction results

use crate::core::{Label, Result, SVMError};
use crate::data::labels::label_name;
use std::fmt;

/// One test sample: its file, what the model said, and what it is
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRow {
    pub filename: String,
    pub prediction: Label,
    pub actual: Label,
    pub correct: bool,
}

impl ResultRow {
    /// Build a row; `correct` compares the symbolic classes, so any two
    /// nonzero labels agree
    pub fn new(filename: impl Into<String>, prediction: Label, actual: Label) -> Self {
        Self {
            filename: filename.into(),
            prediction,
            actual,
            correct: label_name(prediction) == label_name(actual),
        }
    }
}

/// Prediction results in test-split order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultTable {
    rows: Vec<ResultRow>,
}

impl ResultTable {
    pub fn new(rows: Vec<ResultRow>) -> Self {
        Self { rows }
    }

    /// Join file names, predictions and ground truth row by row
    pub fn from_predictions(
        filenames: &[String],
        predictions: &[Label],
        actual: &[Label],
    ) -> Result<Self> {
        if predictions.len() != filenames.len() {
            return Err(SVMError::DimensionMismatch {
                expected: filenames.len(),
                actual: predictions.len(),
            });
        }
        if actual.len() != filenames.len() {
            return Err(SVMError::DimensionMismatch {
                expected: filenames.len(),
                actual: actual.len(),
            });
        }

        let rows = filenames
            .iter()
            .zip(predictions.iter().zip(actual.iter()))
            .map(|(name, (&p, &a))| ResultRow::new(name.clone(), p, a))
            .collect();
        Ok(Self { rows })
    }

    pub fn rows(&self) -> &[ResultRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn n_correct(&self) -> usize {
        self.rows.iter().filter(|r| r.correct).count()
    }

    /// Fraction of rows whose prediction matches; 0.0 for an empty table
    pub fn accuracy(&self) -> f64 {
        if self.rows.is_empty() {
            0.0
        } else {
            self.n_correct() as f64 / self.rows.len() as f64
        }
    }

    pub fn predictions(&self) -> Vec<Label> {
        self.rows.iter().map(|r| r.prediction).collect()
    }

    pub fn actuals(&self) -> Vec<Label> {
        self.rows.iter().map(|r| r.actual).collect()
    }
}

const HEADERS: [&str; 4] = ["Filename", "Prediction", "Actual", "Correct?"];

impl fmt::Display for ResultTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cells: Vec<[String; 4]> = self
            .rows
            .iter()
            .map(|r| {
                [
                    r.filename.clone(),
                    label_name(r.prediction).to_string(),
                    label_name(r.actual).to_string(),
                    if r.correct { "True" } else { "False" }.to_string(),
                ]
            })
            .collect();

        let index_width = self.rows.len().saturating_sub(1).to_string().len();
        let mut widths = HEADERS.map(str::len);
        for row in &cells {
            for (width, cell) in widths.iter_mut().zip(row.iter()) {
                *width = (*width).max(cell.chars().count());
            }
        }

        write!(f, "{:index_width$}", "")?;
        for (header, width) in HEADERS.iter().zip(widths.iter().copied()) {
            write!(f, "  {header:>width$}")?;
        }
        writeln!(f)?;

        for (i, row) in cells.iter().enumerate() {
            write!(f, "{i:<index_width$}")?;
            for (cell, width) in row.iter().zip(widths.iter().copied()) {
                write!(f, "  {cell:>width$}")?;
            }
            writeln!(f)?;
        }

        if self.rows.is_empty() {
            writeln!(f, "(no rows)")?;
        }
        Ok(())
    }
}
