//! Scoring functions for fitted models

use std::fmt::Write as _;

/// Fraction of exact matches.
pub fn accuracy(y_true: &[f64], y_pred: &[f64]) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let correct = y_true.iter().zip(y_pred).filter(|(a, p)| a == p).count();
    correct as f64 / y_true.len() as f64
}

pub fn mean_squared_error(y_true: &[f64], y_pred: &[f64]) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    y_true
        .iter()
        .zip(y_pred)
        .map(|(a, p)| (a - p).powi(2))
        .sum::<f64>()
        / y_true.len() as f64
}

/// Coefficient of determination. A constant target scores 1.0 when predicted
/// perfectly and 0.0 otherwise.
pub fn r2_score(y_true: &[f64], y_pred: &[f64]) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let mean = y_true.iter().sum::<f64>() / y_true.len() as f64;
    let ss_res: f64 = y_true.iter().zip(y_pred).map(|(a, p)| (a - p).powi(2)).sum();
    let ss_tot: f64 = y_true.iter().map(|a| (a - mean).powi(2)).sum();
    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

// ---------------------------------------------------------------------------
// Classification report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct ClassMetrics {
    pub label: String,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Per-class precision / recall / F1 plus averages. Zero divisions yield 0.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationReport {
    pub classes: Vec<ClassMetrics>,
    pub accuracy: f64,
    pub macro_avg: ClassMetrics,
    pub weighted_avg: ClassMetrics,
}

/// Build a report over class indices `0..labels.len()`. Classes that appear
/// in neither `y_true` nor `y_pred` are skipped.
pub fn classification_report(y_true: &[f64], y_pred: &[f64], labels: &[String]) -> ClassificationReport {
    let k = labels.len();
    let mut tp = vec![0usize; k];
    let mut pred_count = vec![0usize; k];
    let mut true_count = vec![0usize; k];

    for (&a, &p) in y_true.iter().zip(y_pred) {
        let (a, p) = (a as usize, p as usize);
        if a < k {
            true_count[a] += 1;
        }
        if p < k {
            pred_count[p] += 1;
        }
        if a == p && a < k {
            tp[a] += 1;
        }
    }

    let ratio = |num: usize, den: usize| if den == 0 { 0.0 } else { num as f64 / den as f64 };

    let classes: Vec<ClassMetrics> = (0..k)
        .filter(|&c| true_count[c] > 0 || pred_count[c] > 0)
        .map(|c| {
            let precision = ratio(tp[c], pred_count[c]);
            let recall = ratio(tp[c], true_count[c]);
            let f1 = if precision + recall == 0.0 {
                0.0
            } else {
                2.0 * precision * recall / (precision + recall)
            };
            ClassMetrics {
                label: labels[c].clone(),
                precision,
                recall,
                f1,
                support: true_count[c],
            }
        })
        .collect();

    let total: usize = classes.iter().map(|c| c.support).sum();
    let n = classes.len().max(1) as f64;
    let macro_avg = ClassMetrics {
        label: "macro avg".to_string(),
        precision: classes.iter().map(|c| c.precision).sum::<f64>() / n,
        recall: classes.iter().map(|c| c.recall).sum::<f64>() / n,
        f1: classes.iter().map(|c| c.f1).sum::<f64>() / n,
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
        label: "weighted avg".to_string(),
        precision: weight(|c| c.precision),
        recall: weight(|c| c.recall),
        f1: weight(|c| c.f1),
        support: total,
    };

    ClassificationReport {
        accuracy: accuracy(y_true, y_pred),
        classes,
        macro_avg,
        weighted_avg,
    }
}

impl ClassificationReport {
    /// Fixed-width text rendering in the familiar report layout.
    pub fn to_text(&self) -> String {
        let width = self
            .classes
            .iter()
            .map(|c| c.label.len())
            .chain(["weighted avg".len()])
            .max()
            .unwrap_or(12);

        let mut out = String::new();
        let _ = writeln!(
            out,
            "{:>width$} {:>9} {:>9} {:>9} {:>9}\n",
            "", "precision", "recall", "f1-score", "support"
        );
        for c in &self.classes {
            let _ = writeln!(out, "{}", row(c, width));
        }
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "{:>width$} {:>9} {:>9} {:>9.2} {:>9}",
            "accuracy", "", "", self.accuracy, self.macro_avg.support
        );
        let _ = writeln!(out, "{}", row(&self.macro_avg, width));
        let _ = writeln!(out, "{}", row(&self.weighted_avg, width));
        out
    }
}

fn row(c: &ClassMetrics, width: usize) -> String {
    format!(
        "{:>width$} {:>9.2} {:>9.2} {:>9.2} {:>9}",
        c.label, c.precision, c.recall, c.f1, c.support
    )
}
