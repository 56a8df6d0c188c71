//! Aggregate classification metrics

use crate::core::{Label, CAT};
use std::fmt;

/// Confusion counts with "dog" as the positive class
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfusionMatrix {
    pub true_positives: usize,
    pub true_negatives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
}

impl ConfusionMatrix {
    pub fn new(tp: usize, tn: usize, fp: usize, fn_: usize) -> Self {
        Self {
            true_positives: tp,
            true_negatives: tn,
            false_positives: fp,
            false_negatives: fn_,
        }
    }

    /// Count outcomes; any nonzero label is a dog
    pub fn from_labels(actual: &[Label], predicted: &[Label]) -> Self {
        let mut matrix = Self::default();
        for (&a, &p) in actual.iter().zip(predicted.iter()) {
            match (p != CAT, a != CAT) {
                (true, true) => matrix.true_positives += 1,
                (false, false) => matrix.true_negatives += 1,
                (true, false) => matrix.false_positives += 1,
                (false, true) => matrix.false_negatives += 1,
            }
        }
        matrix
    }

    pub fn total(&self) -> usize {
        self.true_positives + self.true_negatives + self.false_positives + self.false_negatives
    }

    /// Calculate accuracy: (TP + TN) / (TP + TN + FP + FN)
    pub fn accuracy(&self) -> f64 {
        ratio(self.true_positives + self.true_negatives, self.total())
    }

    /// Calculate precision: TP / (TP + FP)
    pub fn precision(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_positives)
    }

    /// Calculate recall (sensitivity): TP / (TP + FN)
    pub fn recall(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_negatives)
    }

    /// Calculate F1 score: 2 * (precision * recall) / (precision + recall)
    pub fn f1_score(&self) -> f64 {
        f1(self.precision(), self.recall())
    }
}

/// Precision, recall and F1 for one class
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub support: usize,
}

/// Per-class and averaged metrics for the cat/dog problem
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationReport {
    pub cat: ClassMetrics,
    pub dog: ClassMetrics,
    pub accuracy: f64,
    pub macro_avg: ClassMetrics,
    pub weighted_avg: ClassMetrics,
    pub confusion: ConfusionMatrix,
}

impl ClassificationReport {
    pub fn from_labels(actual: &[Label], predicted: &[Label]) -> Self {
        let confusion = ConfusionMatrix::from_labels(actual, predicted);
        let ConfusionMatrix {
            true_positives: tp,
            true_negatives: tn,
            false_positives: fp,
            false_negatives: fn_,
        } = confusion;

        let dog = class_metrics(tp, fp, fn_);
        // Cat is the positive class from its own point of view
        let cat = class_metrics(tn, fn_, fp);
        let total = confusion.total();

        let macro_avg = ClassMetrics {
            precision: (cat.precision + dog.precision) / 2.0,
            recall: (cat.recall + dog.recall) / 2.0,
            f1_score: (cat.f1_score + dog.f1_score) / 2.0,
            support: total,
        };

        let weighted = |get: fn(&ClassMetrics) -> f64| {
            if total == 0 {
                0.0
            } else {
                (get(&cat) * cat.support as f64 + get(&dog) * dog.support as f64) / total as f64
            }
        };
        let weighted_avg = ClassMetrics {
            precision: weighted(|m| m.precision),
            recall: weighted(|m| m.recall),
            f1_score: weighted(|m| m.f1_score),
            support: total,
        };

        Self {
            cat,
            dog,
            accuracy: confusion.accuracy(),
            macro_avg,
            weighted_avg,
            confusion,
        }
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:>12} {:>9} {:>9} {:>9} {:>9}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        writeln!(f)?;
        for (name, m) in [("cat", &self.cat), ("dog", &self.dog)] {
            write_metrics_line(f, name, m)?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>12} {:>9} {:>9} {:>9.2} {:>9}",
            "accuracy",
            "",
            "",
            self.accuracy,
            self.confusion.total()
        )?;
        write_metrics_line(f, "macro avg", &self.macro_avg)?;
        write_metrics_line(f, "weighted avg", &self.weighted_avg)
    }
}

fn write_metrics_line(f: &mut fmt::Formatter<'_>, name: &str, m: &ClassMetrics) -> fmt::Result {
    writeln!(
        f,
        "{:>12} {:>9.2} {:>9.2} {:>9.2} {:>9}",
        name, m.precision, m.recall, m.f1_score, m.support
    )
}

fn class_metrics(tp: usize, fp: usize, fn_: usize) -> ClassMetrics {
    let precision = ratio(tp, tp + fp);
    let recall = ratio(tp, tp + fn_);
    ClassMetrics {
        precision,
        recall,
        f1_score: f1(precision, recall),
        support: tp + fn_,
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

fn f1(precision: f64, recall: f64) -> f64 {
    if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * (precision * recall) / (precision + recall)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DOG;
    use approx::assert_relative_eq;

    #[test]
    fn test_confusion_matrix_metrics() {
        let metrics = ConfusionMatrix::new(10, 5, 2, 3);

        assert_eq!(metrics.accuracy(), 0.75); // (10+5)/(10+5+2+3)
        assert_eq!(metrics.precision(), 10.0 / 12.0);
        assert_eq!(metrics.recall(), 10.0 / 13.0);
        assert!(metrics.f1_score() > 0.0);
    }

    #[test]
    fn test_report_hand_computed() {
        // 3 cats, 2 dogs; one cat called dog, one dog called cat
        let actual = vec![CAT, CAT, CAT, DOG, DOG];
        let predicted = vec![CAT, CAT, DOG, DOG, CAT];
        let report = ClassificationReport::from_labels(&actual, &predicted);

        assert_eq!(report.confusion, ConfusionMatrix::new(1, 2, 1, 1));
        assert_relative_eq!(report.accuracy, 0.6);

        assert_relative_eq!(report.cat.precision, 2.0 / 3.0);
        assert_relative_eq!(report.cat.recall, 2.0 / 3.0);
        assert_eq!(report.cat.support, 3);
        assert_relative_eq!(report.dog.precision, 0.5);
        assert_relative_eq!(report.dog.recall, 0.5);
        assert_eq!(report.dog.support, 2);

        assert_relative_eq!(report.macro_avg.precision, (2.0 / 3.0 + 0.5) / 2.0);
        assert_relative_eq!(
            report.weighted_avg.f1_score,
            (2.0 / 3.0 * 3.0 + 0.5 * 2.0) / 5.0
        );
        assert_eq!(report.weighted_avg.support, 5);
    }

    #[test]
    fn test_report_zero_denominators() {
        // Never predicts dog
        let report = ClassificationReport::from_labels(&[CAT, DOG], &[CAT, CAT]);
        assert_eq!(report.dog.precision, 0.0);
        assert_eq!(report.dog.recall, 0.0);
        assert_eq!(report.dog.f1_score, 0.0);
        assert_relative_eq!(report.cat.precision, 0.5);
        assert_relative_eq!(report.cat.recall, 1.0);

        let empty = ClassificationReport::from_labels(&[], &[]);
        assert_eq!(empty.accuracy, 0.0);
        assert_eq!(empty.weighted_avg.precision, 0.0);
    }

    #[test]
    fn test_report_any_nonzero_is_dog() {
        let report = ClassificationReport::from_labels(&[2, 0], &[1, 0]);
        assert_eq!(report.accuracy, 1.0);
        assert_eq!(report.dog.support, 1);
    }

    #[test]
    fn test_report_display() {
        let report = ClassificationReport::from_labels(&[CAT, DOG], &[CAT, DOG]);
        let rendered = report.to_string();

        assert!(rendered.contains("precision"));
        assert!(rendered.contains("macro avg"));
        assert!(rendered.contains("weighted avg"));
        assert!(rendered.contains("1.00"));
    }
}
