//! Held-out evaluation: accuracy and a per-class precision/recall/F1 table.

use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::{FAIL, PASS};

pub const CLASS_NAMES: [&str; 2] = ["Fail", "Pass"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub name: String,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub classes: Vec<ClassMetrics>,
    pub accuracy: f64,
    pub macro_avg: ClassMetrics,
    pub weighted_avg: ClassMetrics,
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

pub fn calculate_accuracy(predictions: &Array1<usize>, targets: &Array1<usize>) -> f64 {
    let hits = predictions
        .iter()
        .zip(targets.iter())
        .filter(|(pred, actual)| pred == actual)
        .count();
    ratio(hits, targets.len())
}

impl ClassificationReport {
    pub fn new(y_true: &Array1<usize>, y_pred: &Array1<usize>) -> Self {
        let classes: Vec<ClassMetrics> = [FAIL, PASS]
            .iter()
            .map(|&class| {
                let mut tp = 0;
                let mut predicted = 0;
                let mut actual = 0;
                for (t, p) in y_true.iter().zip(y_pred.iter()) {
                    if *p == class {
                        predicted += 1;
                    }
                    if *t == class {
                        actual += 1;
                        if *p == class {
                            tp += 1;
                        }
                    }
                }
                let precision = ratio(tp, predicted);
                let recall = ratio(tp, actual);
                let f1 = if precision + recall > 0.0 {
                    2.0 * precision * recall / (precision + recall)
                } else {
                    0.0
                };
                ClassMetrics {
                    name: CLASS_NAMES[class].to_string(),
                    precision,
                    recall,
                    f1,
                    support: actual,
                }
            })
            .collect();

        let total: usize = classes.iter().map(|c| c.support).sum();
        let k = classes.len() as f64;
        let macro_avg = ClassMetrics {
            name: "macro avg".into(),
            precision: classes.iter().map(|c| c.precision).sum::<f64>() / k,
            recall: classes.iter().map(|c| c.recall).sum::<f64>() / k,
            f1: classes.iter().map(|c| c.f1).sum::<f64>() / k,
            support: total,
        };
        let weight = |f: fn(&ClassMetrics) -> f64| {
            if total == 0 {
                0.0
            } else {
                classes.iter().map(|c| f(c) * c.support as f64).sum::<f64>() / total as f64
            }
        };
        let weighted_avg = ClassMetrics {
            name: "weighted avg".into(),
            precision: weight(|c| c.precision),
            recall: weight(|c| c.recall),
            f1: weight(|c| c.f1),
            support: total,
        };

        Self {
            accuracy: calculate_accuracy(y_pred, y_true),
            classes,
            macro_avg,
            weighted_avg,
        }
    }
}

fn write_row(f: &mut fmt::Formatter<'_>, m: &ClassMetrics) -> fmt::Result {
    writeln!(
        f,
        "{:>12} {:>9.2} {:>9.2} {:>9.2} {:>9}",
        m.name, m.precision, m.recall, m.f1, m.support
    )
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:>12} {:>9} {:>9} {:>9} {:>9}", "", "precision", "recall", "f1-score", "support")?;
        writeln!(f)?;
        for class in &self.classes {
            write_row(f, class)?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>12} {:>9} {:>9} {:>9.2} {:>9}",
            "accuracy", "", "", self.accuracy, self.macro_avg.support
        )?;
        write_row(f, &self.macro_avg)?;
        write_row(f, &self.weighted_avg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_accuracy_calculation() {
        let predictions = array![1, 1, 0, 1];
        let targets = array![1, 0, 0, 1];
        assert_eq!(calculate_accuracy(&predictions, &targets), 0.75);
    }

    #[test]
    fn test_per_class_metrics() {
        let y_true = array![0, 0, 1, 1, 1];
        let y_pred = array![0, 1, 1, 1, 0];
        let report = ClassificationReport::new(&y_true, &y_pred);

        let fail = &report.classes[0];
        assert_eq!(fail.support, 2);
        assert!((fail.precision - 0.5).abs() < 1e-12);
        assert!((fail.recall - 0.5).abs() < 1e-12);

        let pass = &report.classes[1];
        assert_eq!(pass.support, 3);
        assert!((pass.precision - 2.0 / 3.0).abs() < 1e-12);
        assert!((pass.recall - 2.0 / 3.0).abs() < 1e-12);

        assert!((report.accuracy - 0.6).abs() < 1e-12);
        assert!((report.weighted_avg.recall - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_missing_class_reports_zero() {
        let y_true = array![1, 1];
        let y_pred = array![1, 1];
        let report = ClassificationReport::new(&y_true, &y_pred);
        assert_eq!(report.classes[0].precision, 0.0);
        assert_eq!(report.classes[0].f1, 0.0);
        assert_eq!(report.classes[1].f1, 1.0);
    }

    #[test]
    fn test_display_lists_both_classes() {
        let report = ClassificationReport::new(&array![0, 1], &array![0, 1]);
        let text = report.to_string();
        assert!(text.contains("precision"));
        assert!(text.contains("Fail"));
        assert!(text.contains("Pass"));
        assert!(text.contains("weighted avg"));
    }
}
